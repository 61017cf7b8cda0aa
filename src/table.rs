//! Table layout – column sizing, row heights, row/column spans and
//! page-aware row rendering.
//!
//! Row spans are resolved per render into a [`TableLayout`]: an arena of
//! cells where a spanning cell owns the indices of the placeholders it
//! injected into the following rows, and each placeholder points back at
//! its origin. Placeholders are never drawn; an origin is drawn after the
//! rows it spans are laid out, down to the lowest of their bottoms.

use crate::classes::ClassTable;
use crate::error::{ForgeError, Result};
use crate::instruction::{Table, TableCell, TableRow};
use crate::pagination::{draw_box, Processor};
use crate::style::{Snapshot, VAlign};
use crate::surface::Surface;
use crate::text;

/// Widest row, in cells, counting row-span placeholders.
pub fn max_column_count(layout: &TableLayout<'_>) -> usize {
    layout.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0)
}

/// Resolve the width of every column.
///
/// Columns are indexed after row-span placeholders are spliced in, so a
/// cell pushed right by a placeholder sizes the column it is drawn in.
/// The largest explicit `column-width` seen in a column fixes it; the
/// remaining columns share what is left of `available` evenly.
pub fn column_widths(
    layout: &TableLayout<'_>,
    classes: &ClassTable,
    table_styles: &Snapshot,
    available: f32,
) -> Vec<f32> {
    let mut explicit: Vec<Option<f32>> = vec![None; max_column_count(layout)];
    for laid in &layout.rows {
        let row_styles = laid.row.styled.resolve(classes, None, table_styles);
        for (i, &index) in laid.cells.iter().enumerate() {
            let column_width = match layout.cells[index].slot {
                Slot::Content { cell, .. } => {
                    cell.styled
                        .resolve(classes, None, &row_styles)
                        .dimension
                        .column_width
                }
                Slot::Placeholder { .. } => row_styles.dimension.column_width,
            };
            if let Some(w) = column_width.filter(|w| *w > 0.0) {
                explicit[i] = Some(explicit[i].map_or(w, |seen| seen.max(w)));
            }
        }
    }

    let used: f32 = explicit.iter().flatten().sum();
    let auto = explicit.iter().filter(|w| w.is_none()).count();
    let share = if auto > 0 {
        ((available - used) / auto as f32).max(0.0)
    } else {
        0.0
    };
    explicit.into_iter().map(|w| w.unwrap_or(share)).collect()
}

// ---------------------------------------------------------------------------
// Span arena
// ---------------------------------------------------------------------------

/// Drawn bounds of a laid-out cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Slot<'t> {
    /// A cell from the source; owns the placeholders its row span created.
    Content {
        cell: &'t TableCell,
        placeholders: Vec<usize>,
    },
    /// Space reserved by the row span of `origin`.
    Placeholder { origin: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArenaCell<'t> {
    pub slot: Slot<'t>,
    /// Set once the row holding the cell is laid out.
    pub bounds: Option<Bounds>,
}

impl ArenaCell<'_> {
    pub fn is_placeholder(&self) -> bool {
        matches!(self.slot, Slot::Placeholder { .. })
    }

    /// True for placeholders and for cells that span rows.
    pub fn in_span(&self) -> bool {
        match &self.slot {
            Slot::Content { placeholders, .. } => !placeholders.is_empty(),
            Slot::Placeholder { .. } => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaidRow<'t> {
    pub row: &'t TableRow,
    /// Arena indices, in column order.
    pub cells: Vec<usize>,
}

/// Per-render table state with row spans resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout<'t> {
    pub cells: Vec<ArenaCell<'t>>,
    pub rows: Vec<LaidRow<'t>>,
}

impl<'t> TableLayout<'t> {
    /// Inject a placeholder into each row covered by a `row-span` greater
    /// than one, at the column index of the spanning cell.
    pub fn build(table: &'t Table, classes: &ClassTable, table_styles: &Snapshot) -> Result<Self> {
        let mut layout = TableLayout {
            cells: Vec::new(),
            rows: Vec::with_capacity(table.rows.len()),
        };
        for row in &table.rows {
            let mut indices = Vec::with_capacity(row.cells.len());
            for cell in &row.cells {
                indices.push(layout.cells.len());
                layout.cells.push(ArenaCell {
                    slot: Slot::Content {
                        cell,
                        placeholders: Vec::new(),
                    },
                    bounds: None,
                });
            }
            layout.rows.push(LaidRow { row, cells: indices });
        }

        let row_count = layout.rows.len();
        for ir in 0..row_count {
            let row_styles = layout.rows[ir].row.styled.resolve(classes, None, table_styles);
            // Placeholders injected by earlier rows shift the column index.
            let indices = layout.rows[ir].cells.clone();
            for (ic, origin) in indices.into_iter().enumerate() {
                let Slot::Content { cell, .. } = layout.cells[origin].slot else {
                    continue;
                };
                let span = cell
                    .styled
                    .resolve(classes, None, &row_styles)
                    .table
                    .row_span;
                for target in ir + 1..ir + span {
                    if target >= row_count {
                        return Err(ForgeError::SpanOverflow {
                            row: ir,
                            column: ic,
                            span,
                            rows: row_count,
                        });
                    }
                    if ic > layout.rows[target].cells.len() {
                        continue;
                    }
                    let placeholder = layout.cells.len();
                    layout.cells.push(ArenaCell {
                        slot: Slot::Placeholder { origin },
                        bounds: None,
                    });
                    layout.rows[target].cells.insert(ic, placeholder);
                    if let Slot::Content { placeholders, .. } = &mut layout.cells[origin].slot {
                        placeholders.push(placeholder);
                    }
                }
            }
        }
        Ok(layout)
    }

    /// Lowest bottom among `origin` and the placeholders laid out so far.
    pub fn span_bottom(&self, origin: usize) -> Option<f32> {
        let cell = self.cells.get(origin)?;
        let mut bottom = cell.bounds?.y1;
        if let Slot::Content { placeholders, .. } = &cell.slot {
            for p in placeholders {
                if let Some(b) = self.cells[*p].bounds {
                    bottom = bottom.max(b.y1);
                }
            }
        }
        Some(bottom)
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// A cell of a row, ready to be placed.
struct Placed {
    index: usize,
    styles: Snapshot,
    /// Offset of the cell's left edge from the table's left edge.
    offset: f32,
    width: f32,
}

fn selector(index: usize, len: usize) -> Option<&'static str> {
    if index == 0 {
        Some("first")
    } else if index + 1 == len {
        Some("last")
    } else {
        None
    }
}

fn place_row(
    layout: &TableLayout<'_>,
    ir: usize,
    classes: &ClassTable,
    table_styles: &Snapshot,
    widths: &[f32],
) -> Vec<Placed> {
    let laid = &layout.rows[ir];
    let row_styles = laid
        .row
        .styled
        .resolve(classes, selector(ir, layout.rows.len()), table_styles);

    let mut placed = Vec::with_capacity(laid.cells.len());
    let mut column = 0;
    let mut offset = 0.0;
    for (ic, &index) in laid.cells.iter().enumerate() {
        let styles = match layout.cells[index].slot {
            Slot::Content { cell, .. } => {
                cell.styled
                    .resolve(classes, selector(ic, laid.cells.len()), &row_styles)
            }
            Slot::Placeholder { .. } => row_styles.clone(),
        };
        let span = styles.table.column_span.max(1);
        let width: f32 = widths.iter().skip(column).take(span).sum();
        placed.push(Placed {
            index,
            styles,
            offset,
            width,
        });
        column += span;
        offset += width;
    }
    placed
}

fn cell_height<S: Surface + ?Sized>(
    surface: &mut S,
    content: &str,
    width: f32,
    styles: &Snapshot,
) -> f32 {
    let padding = styles.box_model.padding;
    text::text_height(
        surface,
        content,
        width - padding.horizontal(),
        styles.dimension.line_height,
        &styles.font,
    ) + padding.vertical()
}

/// Height of a row; cells taking part in a row span do not count.
fn row_height<S: Surface>(
    p: &mut Processor<'_, S>,
    layout: &TableLayout<'_>,
    placed: &[Placed],
) -> f32 {
    let mut height: f32 = 0.0;
    for cell in placed {
        let arena = &layout.cells[cell.index];
        if arena.in_span() {
            continue;
        }
        if let Slot::Content { cell: source, .. } = arena.slot {
            let content = p.substitute(&source.content);
            height = height.max(cell_height(
                p.surface_mut(),
                &content,
                cell.width,
                &cell.styles,
            ));
        }
    }
    height
}

/// Draw a table at the cursor.
pub(crate) fn render<S: Surface>(
    p: &mut Processor<'_, S>,
    table: &Table,
    table_styles: &Snapshot,
) -> Result<()> {
    let classes = p.classes();
    let mut layout = TableLayout::build(table, classes, table_styles)?;
    if max_column_count(&layout) == 0 {
        return Ok(());
    }
    let widths = column_widths(&layout, classes, table_styles, p.printable_width());

    let rows: Vec<Vec<Placed>> = (0..layout.rows.len())
        .map(|ir| place_row(&layout, ir, classes, table_styles, &widths))
        .collect();
    let heights: Vec<f32> = rows
        .iter()
        .map(|placed| row_height(p, &layout, placed))
        .collect();

    let x0 = p.surface_mut().x();
    p.ensure_room(heights.iter().sum())?;
    let mut y = p.surface_mut().y();

    let mut deferred: Vec<(usize, Snapshot)> = Vec::new();
    for (placed, &height) in rows.into_iter().zip(&heights) {
        if y + height > p.page_bottom() {
            flush_spans(p, &layout, &mut deferred)?;
            p.break_page()?;
            y = p.surface_mut().y();
        }
        for cell in placed {
            let bounds = Bounds {
                x0: x0 + cell.offset,
                y0: y,
                x1: x0 + cell.offset + cell.width,
                y1: y + height,
            };
            let arena = &mut layout.cells[cell.index];
            arena.bounds = Some(bounds);
            match &arena.slot {
                Slot::Placeholder { .. } => {}
                Slot::Content { placeholders, .. } if !placeholders.is_empty() => {
                    deferred.push((cell.index, cell.styles));
                }
                Slot::Content { cell: source, .. } => {
                    render_cell(p, bounds, source, &cell.styles)?;
                }
            }
        }
        y += height;
    }
    flush_spans(p, &layout, &mut deferred)?;

    let left = p.surface_mut().margins().left;
    p.surface_mut().set_xy(left, y);
    Ok(())
}

/// Draw the row-spanning cells collected so far, each down to the lowest
/// bottom of the rows it covers.
fn flush_spans<S: Surface>(
    p: &mut Processor<'_, S>,
    layout: &TableLayout<'_>,
    deferred: &mut Vec<(usize, Snapshot)>,
) -> Result<()> {
    for (index, styles) in deferred.drain(..) {
        let (Some(bounds), Some(bottom)) = (layout.cells[index].bounds, layout.span_bottom(index))
        else {
            continue;
        };
        if let Slot::Content { cell, .. } = layout.cells[index].slot {
            let bounds = Bounds {
                y1: bottom,
                ..bounds
            };
            render_cell(p, bounds, cell, &styles)?;
        }
    }
    Ok(())
}

fn render_cell<S: Surface>(
    p: &mut Processor<'_, S>,
    bounds: Bounds,
    cell: &TableCell,
    styles: &Snapshot,
) -> Result<()> {
    let padding = styles.box_model.padding;
    let content = p.substitute(&cell.content);
    let text_width = (bounds.x1 - bounds.x0) - padding.horizontal();
    let factor = styles.dimension.line_height;

    let surface = p.surface_mut();
    draw_box(surface, bounds.x0, bounds.y0, bounds.x1, bounds.y1, styles);

    let height = text::text_height(surface, &content, text_width, factor, &styles.font);
    let free = (bounds.y1 - bounds.y0 - padding.vertical() - height).max(0.0);
    let shift = match styles.align.vertical {
        VAlign::Top => 0.0,
        VAlign::Middle => free / 2.0,
        VAlign::Bottom => free,
    };
    surface.set_xy(bounds.x0 + padding.left, bounds.y0 + padding.top + shift);
    text::write(
        surface,
        &content,
        text_width,
        factor,
        styles.align.horizontal,
        &styles.font,
        styles.color.text,
    );

    for child in &cell.children {
        p.surface_mut()
            .set_xy(bounds.x0 + padding.left, bounds.y0 + padding.top);
        p.render_nested(child, text_width)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::instruction::InstructionKind;
    use crate::recording::{DrawOp, RecordingSurface};

    fn table_of(xml: &str) -> (Document, Table) {
        let doc = Document::load(&format!("<document><body>{xml}</body></document>")).unwrap();
        let InstructionKind::Table(table) = doc.body[0].kind.clone() else {
            panic!("expected a table");
        };
        (doc, table)
    }

    #[test]
    fn explicit_and_auto_widths() {
        let (doc, table) = table_of(
            r#"<table><tr><td style="column-width: 40">a</td><td>b</td></tr></table>"#,
        );
        let layout = TableLayout::build(&table, &doc.classes, &Snapshot::default()).unwrap();
        let widths = column_widths(&layout, &doc.classes, &Snapshot::default(), 100.0);
        assert_eq!(widths, vec![40.0, 60.0]);
    }

    #[test]
    fn largest_explicit_width_wins() {
        let (doc, table) = table_of(
            r#"<table>
                 <tr><td style="column-width: 20">a</td><td>b</td><td>c</td></tr>
                 <tr><td style="column-width: 30">a</td></tr>
               </table>"#,
        );
        let layout = TableLayout::build(&table, &doc.classes, &Snapshot::default()).unwrap();
        assert_eq!(max_column_count(&layout), 3);
        let widths = column_widths(&layout, &doc.classes, &Snapshot::default(), 100.0);
        assert_eq!(widths, vec![30.0, 35.0, 35.0]);
    }

    #[test]
    fn placeholders_widen_the_column_count() {
        let (doc, table) = table_of(
            r#"<table>
                 <tr><td style="row-span: 2">a</td><td>b</td></tr>
                 <tr><td>c</td><td>d</td></tr>
               </table>"#,
        );
        let layout = TableLayout::build(&table, &doc.classes, &Snapshot::default()).unwrap();
        assert_eq!(max_column_count(&layout), 3);
        let widths = column_widths(&layout, &doc.classes, &Snapshot::default(), 90.0);
        assert_eq!(widths, vec![30.0, 30.0, 30.0]);
    }

    #[test]
    fn column_width_right_of_placeholder_uses_shifted_column() {
        let (doc, table) = table_of(
            r#"<table>
                 <tr><td style="row-span: 2">a</td><td>b</td></tr>
                 <tr><td style="column-width: 100">c</td><td>d</td></tr>
               </table>"#,
        );
        let layout = TableLayout::build(&table, &doc.classes, &Snapshot::default()).unwrap();
        let widths = column_widths(&layout, &doc.classes, &Snapshot::default(), 400.0);
        assert_eq!(widths, vec![150.0, 100.0, 150.0]);
    }

    #[test]
    fn shifted_cells_stay_on_the_page() {
        let doc = Document::load(
            r#"<document><default><unit>pt</unit>
                 <page-margins><left>0</left><top>0</top><right>0</right><bottom>0</bottom></page-margins>
               </default><body>
                 <table>
                   <tr><td style="row-span: 2">a</td><td>b</td></tr>
                   <tr><td>c</td><td>d</td></tr>
                 </table>
               </body></document>"#,
        )
        .unwrap();
        let mut p = Processor::new(&doc, RecordingSurface::default(), None);
        p.render().unwrap();
        let surface = p.into_surface();
        let rects: Vec<(f32, f32, f32)> = surface
            .ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Rect { x, w, h, .. } => Some((*x, *w, *h)),
                _ => None,
            })
            .collect();
        let third = 595.28 / 3.0;
        // b, c, d, then the deferred origin a.
        assert_eq!(rects.len(), 4);
        assert!((rects[0].0 - third).abs() < 1e-2);
        assert!((rects[1].0 - third).abs() < 1e-2);
        assert!((rects[2].0 - 2.0 * third).abs() < 1e-2);
        assert!(rects[3].0.abs() < 1e-2);
        for (_, w, _) in &rects {
            assert!((w - third).abs() < 1e-2);
        }
        assert!((rects[3].2 - (rects[0].2 + rects[1].2)).abs() < 1e-3);
    }

    #[test]
    fn row_span_injects_one_placeholder() {
        let (doc, table) = table_of(
            r#"<table>
                 <tr><td style="row-span: 2">a</td><td>b</td></tr>
                 <tr><td>c</td></tr>
               </table>"#,
        );
        let layout = TableLayout::build(&table, &doc.classes, &Snapshot::default()).unwrap();
        assert_eq!(layout.rows[1].cells.len(), 2);
        let placeholder = layout.rows[1].cells[0];
        assert_eq!(layout.cells[placeholder].slot, Slot::Placeholder { origin: 0 });
        match &layout.cells[0].slot {
            Slot::Content { placeholders, .. } => assert_eq!(placeholders, &vec![placeholder]),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(
            layout.cells.iter().filter(|c| c.is_placeholder()).count(),
            1
        );
    }

    #[test]
    fn row_span_from_class() {
        let doc = Document::load(
            r#"<document><style>tall { row-span: 3; }</style><body>
                 <table><tr><td class="tall">a</td></tr><tr><td>b</td></tr></table>
               </body></document>"#,
        )
        .unwrap();
        let InstructionKind::Table(table) = &doc.body[0].kind else {
            panic!("expected a table");
        };
        let err = TableLayout::build(table, &doc.classes, &Snapshot::default()).unwrap_err();
        assert!(matches!(
            err,
            ForgeError::SpanOverflow {
                row: 0,
                column: 0,
                span: 3,
                rows: 2
            }
        ));
    }

    #[test]
    fn spanning_cell_covers_both_rows() {
        let doc = Document::load(
            r#"<document><default><unit>pt</unit></default><body>
                 <table>
                   <tr><td style="row-span: 2; background-color: #ff0000">a</td><td>b</td></tr>
                   <tr><td>c</td></tr>
                 </table>
               </body></document>"#,
        )
        .unwrap();
        let mut p = Processor::new(&doc, RecordingSurface::default(), None);
        p.render().unwrap();
        let surface = p.into_surface();

        let fills: Vec<(f32, f32, f32)> = surface
            .ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Rect { y, h, color, .. } => Some((*y, *h, color.r as f32)),
                _ => None,
            })
            .collect();
        // b, c, then the deferred red origin.
        assert_eq!(fills.len(), 3);
        let (b_y, b_h, _) = fills[0];
        let (c_y, c_h, _) = fills[1];
        let (a_y, a_h, red) = fills[2];
        assert_eq!(red, 255.0);
        assert_eq!(a_y, b_y);
        assert!((a_y + a_h - (c_y + c_h)).abs() < 1e-3);
        assert!((c_y - (b_y + b_h)).abs() < 1e-3);
    }

    #[test]
    fn column_span_sums_widths() {
        let doc = Document::load(
            r#"<document><default><unit>pt</unit>
                 <page-margins><left>0</left><top>0</top><right>0</right><bottom>0</bottom></page-margins>
               </default><body>
                 <table>
                   <tr><td style="column-span: 2">wide</td><td>x</td></tr>
                   <tr><td>a</td><td>b</td><td>c</td></tr>
                 </table>
               </body></document>"#,
        )
        .unwrap();
        let mut p = Processor::new(&doc, RecordingSurface::default(), None);
        p.render().unwrap();
        let surface = p.into_surface();
        let widths: Vec<f32> = surface
            .ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Rect { w, .. } => Some(*w),
                _ => None,
            })
            .collect();
        let third = 595.28 / 3.0;
        assert!((widths[0] - 2.0 * third).abs() < 1e-2);
        assert!((widths[1] - third).abs() < 1e-2);
        assert_eq!(widths.len(), 5);
    }

    #[test]
    fn rows_break_across_pages() {
        let rows: String = (0..80)
            .map(|i| format!("<tr><td>r{i}</td><td>x</td></tr>"))
            .collect();
        let doc = Document::load(&format!(
            "<document><body><table>{rows}</table></body></document>"
        ))
        .unwrap();
        let mut p = Processor::new(&doc, RecordingSurface::default(), None);
        p.render().unwrap();
        let pages = p.page_count();
        assert!(pages >= 3);
        let rec = p.into_surface().recording();
        // Too tall for the space left on page 1, so the table starts afresh.
        assert!(rec.texts_on_page(1).is_empty());
        assert_eq!(rec.page_of("r0"), Some(2));
        assert_eq!(rec.page_of("r79"), Some(pages));
    }

    #[test]
    fn vertical_alignment_in_tall_cell() {
        let doc = Document::load(
            r#"<document><default><unit>pt</unit></default><body>
                 <table><tr>
                   <td style="padding: 0, 0, 0, 0; v-align: bottom">low</td>
                   <td style="padding: 0, 0, 0, 0">one two three four five six seven eight nine ten eleven twelve thirteen fourteen fifteen sixteen seventeen eighteen nineteen twenty</td>
                 </tr></table>
               </body></document>"#,
        )
        .unwrap();
        let mut p = Processor::new(&doc, RecordingSurface::default(), None);
        p.render().unwrap();
        let surface = p.into_surface();
        let (row_y, row_h) = surface
            .ops()
            .iter()
            .find_map(|op| match op {
                DrawOp::Rect { y, h, .. } => Some((*y, *h)),
                _ => None,
            })
            .unwrap();
        let low_y = surface
            .ops()
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { text, y, .. } if text == "low" => Some(*y),
                _ => None,
            })
            .unwrap();
        assert!(row_h > 18.0);
        assert!((low_y - (row_y + row_h - 18.0)).abs() < 1e-3);
    }
}
