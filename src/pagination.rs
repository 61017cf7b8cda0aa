//! Pagination – walks the instruction tree in document order, owns the
//! write cursor and decides page breaks.
//!
//! Handles:
//! - header/footer replay on every new page, guarded against recursion
//! - automatic breaks before text lines, boxes and table rows
//! - manual break mode (overflow is only logged)
//! - `{cp}`/`{np}` page tokens, given the total from an earlier pass

use crate::classes::ClassTable;
use crate::document::Document;
use crate::error::Result;
use crate::instruction::{Instruction, InstructionKind, Styled};
use crate::style::Snapshot;
use crate::surface::{PageBreaks, Surface};
use crate::table;
use crate::text;

/// One render pass over a [`Document`].
///
/// A processor is used for exactly one pass; the two-pass pipeline builds a
/// fresh one per pass.
pub struct Processor<'d, S: Surface> {
    doc: &'d Document,
    surface: S,
    /// Cascade base for every instruction; mutated by `Font` directives.
    current: Snapshot,
    page: usize,
    total_pages: Option<usize>,
    prevent_page_break: bool,
}

impl<'d, S: Surface> Processor<'d, S> {
    /// `total_pages` is substituted for `{np}`; `None` renders `0`.
    pub fn new(doc: &'d Document, mut surface: S, total_pages: Option<usize>) -> Self {
        surface.setup(&doc.setup);
        Self {
            doc,
            surface,
            current: Snapshot::default(),
            page: 0,
            total_pages,
            prevent_page_break: false,
        }
    }

    /// Render the body, starting on a fresh page.
    pub fn render(&mut self) -> Result<()> {
        self.add_page()?;
        text::use_font(&mut self.surface, &self.current.font);
        let doc = self.doc;
        self.process_all(&doc.body)
    }

    /// Logical pages started so far.
    pub fn page_count(&self) -> usize {
        self.page
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// Start a new page and replay header and footer. A no-op while the
    /// header or footer itself is being drawn.
    pub fn add_page(&mut self) -> Result<()> {
        if self.prevent_page_break {
            return Ok(());
        }
        self.surface.add_page();
        self.page += 1;
        log::debug!("page {} started", self.page);

        self.prevent_page_break = true;
        let doc = self.doc;
        let result = self.replay_header_footer(doc);
        self.prevent_page_break = false;
        result
    }

    fn replay_header_footer(&mut self, doc: &Document) -> Result<()> {
        self.process_all(&doc.header)?;
        let mut y = self.surface.y();
        self.process_all(&doc.footer)?;
        if !doc.header.is_empty() {
            y += text::line_height(&mut self.surface, &self.current.font, 1.0);
        }
        let left = self.surface.margins().left;
        self.surface.set_xy(left, y);
        Ok(())
    }

    /// Move to the start of the next line `height` below, breaking the page
    /// when the line would reach the bottom margin.
    ///
    /// The threshold is the printable bottom (page height minus the bottom
    /// margin), the same one text lines and table rows break against, so
    /// nothing is placed inside the footer area.
    pub fn line_feed(&mut self, height: f32) -> Result<()> {
        let left = self.surface.margins().left;
        self.surface.set_x(left);
        let y = self.surface.y();
        if y + height >= self.page_bottom() {
            self.break_page()
        } else {
            self.surface.set_y(y + height);
            Ok(())
        }
    }

    // -----------------------------------------------------------------------
    // Helpers shared with the table engine
    // -----------------------------------------------------------------------

    pub(crate) fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub(crate) fn classes(&self) -> &'d ClassTable {
        &self.doc.classes
    }

    /// Bottom edge of the printable area.
    pub(crate) fn page_bottom(&self) -> f32 {
        let (_, h) = self.surface.page_size();
        h - self.surface.margins().bottom
    }

    pub(crate) fn printable_width(&self) -> f32 {
        let (w, _) = self.surface.page_size();
        let margins = self.surface.margins();
        w - margins.left - margins.right
    }

    /// An automatic page break. Suppressed, with a warning, in manual mode.
    pub(crate) fn break_page(&mut self) -> Result<()> {
        if self.doc.setup.page_breaks == PageBreaks::Manual {
            if !self.prevent_page_break {
                log::warn!(
                    "content overflows page {} at y={:.1} (manual page breaks)",
                    self.page,
                    self.surface.y()
                );
            }
            return Ok(());
        }
        self.add_page()
    }

    /// Break the page if `height` does not fit below the cursor.
    pub(crate) fn ensure_room(&mut self, height: f32) -> Result<()> {
        if self.surface.y() + height > self.page_bottom() {
            self.break_page()?;
        }
        Ok(())
    }

    pub(crate) fn substitute(&self, text: &str) -> String {
        text::substitute_page_tokens(text, self.page, self.total_pages)
    }

    pub(crate) fn resolve(&self, styled: &Styled, selector: Option<&str>) -> Snapshot {
        let resolved = styled.resolve(&self.doc.classes, selector, &self.current);
        if log::log_enabled!(log::Level::Trace) {
            if let Ok(json) = serde_json::to_string(&resolved) {
                log::trace!("resolved styles: {json}");
            }
        }
        resolved
    }

    // -----------------------------------------------------------------------
    // Instructions
    // -----------------------------------------------------------------------

    fn process_all(&mut self, instructions: &[Instruction]) -> Result<()> {
        for instruction in instructions {
            self.process(instruction)?;
        }
        Ok(())
    }

    fn process(&mut self, instruction: &Instruction) -> Result<()> {
        match &instruction.kind {
            InstructionKind::Font => {
                let classes = self.classes();
                instruction
                    .styled
                    .apply_to(classes, None, &mut self.current);
                text::use_font(&mut self.surface, &self.current.font);
            }
            InstructionKind::Text { text } => {
                let styles = self.resolve(&instruction.styled, None);
                self.render_text(text, &styles)?;
            }
            InstructionKind::Box { text } => {
                let styles = self.resolve(&instruction.styled, None);
                self.render_box(text, &styles)?;
            }
            InstructionKind::Image { source } => {
                let styles = self.resolve(&instruction.styled, None);
                self.render_image(source, &styles);
            }
            InstructionKind::LineFeed { lines } => {
                let styles = self.resolve(&instruction.styled, None);
                text::use_font(&mut self.surface, &styles.font);
                let height = self.surface.font_height() * lines;
                text::use_font(&mut self.surface, &self.current.font);
                self.line_feed(height)?;
            }
            InstructionKind::SetX { x } => self.surface.set_x(*x),
            InstructionKind::SetY { y, from_bottom } => {
                let y = if *from_bottom {
                    self.surface.page_size().1 - y
                } else {
                    *y
                };
                self.surface.set_y(y);
            }
            InstructionKind::SetXY { x, y } => self.surface.set_xy(*x, *y),
            InstructionKind::Table(t) => {
                let styles = self.resolve(&instruction.styled, None);
                table::render(self, t, &styles)?;
            }
            InstructionKind::TableRow(_) | InstructionKind::TableCell(_) => {
                log::warn!(
                    "<{}> outside of a table is ignored",
                    instruction.tag()
                );
            }
        }
        Ok(())
    }

    fn render_text(&mut self, raw: &str, styles: &Snapshot) -> Result<()> {
        let content = self.substitute(raw);
        let width = styles.dimension.width.unwrap_or_else(|| self.printable_width());
        let lines = text::layout(&mut self.surface, &content, width, &styles.font);
        let height = text::line_height(
            &mut self.surface,
            &styles.font,
            styles.dimension.line_height,
        );
        let x_left = self.surface.x();
        for line in lines.iter().filter(|l| !l.is_empty()) {
            self.ensure_room(height)?;
            text::draw_line(
                &mut self.surface,
                line,
                x_left,
                width,
                height,
                styles.align.horizontal,
                &styles.font,
                styles.color.text,
            );
            let y = self.surface.y();
            self.surface.set_y(y + height);
        }
        let left = self.surface.margins().left;
        self.surface.set_x(left);
        text::use_font(&mut self.surface, &self.current.font);
        Ok(())
    }

    pub(crate) fn render_box(&mut self, raw: &str, styles: &Snapshot) -> Result<()> {
        let content = self.substitute(raw);
        let padding = styles.box_model.padding;
        let margin = styles.box_model.margin;
        let width = styles.dimension.width.unwrap_or_else(|| self.printable_width());
        let text_width = width - padding.horizontal();
        let factor = styles.dimension.line_height;

        let height = match styles.dimension.height {
            Some(h) => h,
            None if content.trim().is_empty() => {
                text::line_height(&mut self.surface, &styles.font, factor)
            }
            None => text::text_height(&mut self.surface, &content, text_width, factor, &styles.font),
        };
        let outer = height + padding.vertical();

        self.ensure_room(margin.top + styles.dimension.offset_y + outer)?;
        let x0 = self.surface.x() + margin.left + styles.dimension.offset_x;
        let y0 = self.surface.y() + margin.top + styles.dimension.offset_y;
        let (x1, y1) = (x0 + width, y0 + outer);
        draw_box(&mut self.surface, x0, y0, x1, y1, styles);

        self.surface.set_xy(x0 + padding.left, y0 + padding.top);
        text::write(
            &mut self.surface,
            &content,
            text_width,
            factor,
            styles.align.horizontal,
            &styles.font,
            styles.color.text,
        );

        let left = self.surface.margins().left;
        self.surface.set_xy(left, y1 + margin.bottom);
        text::use_font(&mut self.surface, &self.current.font);
        Ok(())
    }

    pub(crate) fn render_image(&mut self, source: &str, styles: &Snapshot) {
        let x = self.surface.x() + styles.dimension.offset_x;
        let y = self.surface.y() + styles.dimension.offset_y;
        if let Err(e) = self.surface.image(
            source,
            x,
            y,
            styles.dimension.width,
            styles.dimension.height,
        ) {
            log::warn!("image skipped: {e}");
        }
    }

    /// Draw an instruction nested in a table cell whose padded area starts
    /// at the cursor and is `width` wide. Never breaks the page.
    pub(crate) fn render_nested(&mut self, instruction: &Instruction, width: f32) -> Result<()> {
        let guard = std::mem::replace(&mut self.prevent_page_break, true);
        let mut styles = self.resolve(instruction.styled(), None);
        let result = match &instruction.kind {
            InstructionKind::Box { text } => {
                styles.dimension.width.get_or_insert(width);
                self.render_box(text, &styles)
            }
            InstructionKind::Image { source } => {
                self.render_image(source, &styles);
                Ok(())
            }
            _ => {
                log::warn!(
                    "<{}> inside a table cell is ignored",
                    instruction.tag()
                );
                Ok(())
            }
        };
        self.prevent_page_break = guard;
        result
    }
}

/// Fill `[x0, x1] × [y0, y1]` with the background colour and stroke every
/// side whose border width is positive.
pub fn draw_box<S: Surface + ?Sized>(
    surface: &mut S,
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    styles: &Snapshot,
) {
    let border = styles.box_model.border;
    surface.set_line_width(styles.box_model.line_width);
    surface.set_stroke_color(styles.color.foreground);
    surface.set_fill_color(styles.color.background);
    surface.fill_rect(x0, y0, x1 - x0, y1 - y0);
    if border.top > 0.0 {
        surface.line(x0, y0, x1, y0);
    }
    if border.right > 0.0 {
        surface.line(x1, y0, x1, y1);
    }
    if border.bottom > 0.0 {
        surface.line(x1, y1, x0, y1);
    }
    if border.left > 0.0 {
        surface.line(x0, y1, x0, y0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{DrawOp, RecordingSurface};

    fn run(xml: &str) -> (RecordingSurface, usize) {
        let doc = Document::load(xml).unwrap();
        let mut p = Processor::new(&doc, RecordingSurface::default(), None);
        p.render().unwrap();
        let pages = p.page_count();
        (p.into_surface(), pages)
    }

    fn pt_document(body: &str) -> String {
        format!(
            "<document><default><unit>pt</unit>\
             <page-margins><left>10</left><top>10</top><right>10</right><bottom>10</bottom></page-margins>\
             </default><body>{body}</body></document>"
        )
    }

    fn rects(surface: &RecordingSurface) -> Vec<(f32, f32, f32, f32)> {
        surface
            .ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Rect { x, y, w, h, .. } => Some((*x, *y, *w, *h)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn empty_body_has_one_page() {
        let (surface, pages) = run(&pt_document(""));
        assert_eq!(pages, 1);
        assert_eq!(surface.page_count(), 1);
    }

    #[test]
    fn header_guard_blocks_recursive_breaks() {
        // A header far taller than the page would otherwise recurse forever.
        let header: String = (0..200).map(|i| format!("<Text>h{i}</Text>")).collect();
        let xml = format!(
            "<document><header>{header}</header><body><Text>body</Text></body></document>"
        );
        // The body line needs a second page, whose header is again cut short.
        let (_, pages) = run(&xml);
        assert_eq!(pages, 2);
    }

    #[test]
    fn long_text_breaks_pages() {
        let body: String = (0..120).map(|i| format!("<Text>row{i}</Text>")).collect();
        let (surface, pages) = run(&pt_document(&body));
        assert!(pages > 1);
        let rec = surface.recording();
        assert_eq!(rec.page_of("row0"), Some(1));
        assert_eq!(rec.page_of("row119"), Some(pages));
    }

    #[test]
    fn manual_mode_never_breaks() {
        let body: String = (0..120).map(|i| format!("<Text>line {i}</Text>")).collect();
        let xml = format!(
            "<document><default><page-breaks>manual</page-breaks></default><body>{body}</body></document>"
        );
        let (_, pages) = run(&xml);
        assert_eq!(pages, 1);
    }

    #[test]
    fn box_geometry() {
        let (surface, _) = run(&pt_document(
            r#"<Box style="width: 100; height: 20; padding: 2, 3, 2, 5; margin: 0, 0, 0, 4">x</Box><Text>after</Text>"#,
        ));
        assert_eq!(rects(&surface), vec![(10.0, 10.0, 100.0, 28.0)]);
        let after = surface.ops().iter().find_map(|op| match op {
            DrawOp::Text { text, y, .. } if text == "after" => Some(*y),
            _ => None,
        });
        assert_eq!(after, Some(10.0 + 28.0 + 4.0));
    }

    #[test]
    fn borders_follow_positive_sides() {
        let (surface, _) = run(&pt_document(
            r#"<Box style="width: 50; height: 10; border: 0, 1, 0, 1">x</Box>"#,
        ));
        let lines: Vec<_> = surface
            .ops()
            .iter()
            .filter(|op| matches!(op, DrawOp::Line { .. }))
            .collect();
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn font_directive_changes_following_text() {
        let (surface, _) = run(&pt_document(
            r#"<Text>a</Text><Font style="font-size: 20; font-weight: bold"/><Text>b</Text>"#,
        ));
        let sizes: Vec<(f32, bool)> = surface
            .ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { size, bold, .. } => Some((*size, *bold)),
                _ => None,
            })
            .collect();
        assert_eq!(sizes, vec![(12.0, false), (20.0, true)]);
    }

    #[test]
    fn set_y_from_bottom() {
        let (surface, _) = run(&pt_document(
            r#"<SetY y="100" from-bottom="true"/><Text>foot</Text>"#,
        ));
        let y = surface.ops().iter().find_map(|op| match op {
            DrawOp::Text { y, .. } => Some(*y),
            _ => None,
        });
        assert_eq!(y, Some(841.89 - 100.0));
    }

    #[test]
    fn line_feed_breaks_at_bottom() {
        let doc = Document::load(&pt_document("")).unwrap();
        let mut p = Processor::new(&doc, RecordingSurface::default(), None);
        p.render().unwrap();
        // 840 is above the page edge (841.89) but past the printable bottom.
        p.surface_mut().set_y(800.0);
        p.line_feed(40.0).unwrap();
        assert_eq!(p.page_count(), 2);
        p.line_feed(12.0).unwrap();
        assert_eq!(p.page_count(), 2);
        assert_eq!(p.surface().x(), 10.0);
    }

    #[test]
    fn missing_image_is_skipped() {
        let (surface, _) = run(&pt_document(
            "<Image>does/not/exist.png</Image><Text>survivor</Text>",
        ));
        assert!(surface.recording().page_of("survivor").is_some());
        assert!(!surface
            .ops()
            .iter()
            .any(|op| matches!(op, DrawOp::Image { .. })));
    }
}
