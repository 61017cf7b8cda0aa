//! PDF backend – a [`Surface`] that emits `printpdf` (v0.8 ops-based API)
//! pages.
//!
//! Families loaded into the [`FontManager`] are embedded; every other family
//! is drawn with the matching built-in face.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use printpdf::*;

use crate::error::BackendError;
use crate::fonts::{BuiltinFamily, FontKey, FontManager, FontSpec};
use crate::style::{Edges, Rgb as StyleRgb};
use crate::surface::{fit_image, PageSetup, Surface};

// ---------------------------------------------------------------------------
// Image sources
// ---------------------------------------------------------------------------

/// Raw image bytes together with the pixel dimensions of the source image.
pub struct LoadedImage {
    pub bytes: Vec<u8>,
    pub px_width: u32,
    pub px_height: u32,
}

/// Read an image from a `data:` URI or from a file path, relative paths
/// being resolved against `resource_dir`.
pub fn load_image(src: &str, resource_dir: Option<&Path>) -> Result<LoadedImage, BackendError> {
    let fail = |reason: String| BackendError::Image {
        src: preview(src),
        reason,
    };

    let bytes = if src.starts_with("data:") {
        parse_data_uri(src).map_err(fail)?
    } else {
        let path = match resource_dir {
            Some(dir) if Path::new(src).is_relative() => dir.join(src),
            _ => PathBuf::from(src),
        };
        std::fs::read(&path).map_err(|e| fail(format!("{}: {e}", path.display())))?
    };

    let decoded = ::image::load_from_memory(&bytes).map_err(|e| fail(format!("decode error: {e}")))?;
    Ok(LoadedImage {
        px_width: decoded.width(),
        px_height: decoded.height(),
        bytes,
    })
}

fn preview(src: &str) -> String {
    if src.len() > 80 {
        let end = (0..=80).rev().find(|i| src.is_char_boundary(*i)).unwrap_or(0);
        format!("{}…", &src[..end])
    } else {
        src.to_string()
    }
}

/// Parse a `data:<mime>;base64,<data>` URI and return the raw decoded bytes.
fn parse_data_uri(src: &str) -> Result<Vec<u8>, String> {
    let rest = src.strip_prefix("data:").unwrap_or(src);
    let comma_pos = rest
        .find(',')
        .ok_or_else(|| "invalid data URI: missing `,` separator".to_string())?;
    let header = &rest[..comma_pos];
    if !header.contains(";base64") {
        return Err("only base64-encoded data URIs are supported".to_string());
    }
    BASE64_STD
        .decode(rest[comma_pos + 1..].trim())
        .map_err(|e| format!("base64 decode error: {e}"))
}

// ---------------------------------------------------------------------------
// PDF surface
// ---------------------------------------------------------------------------

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

#[derive(Clone)]
enum FontRef {
    Builtin(BuiltinFont),
    Embedded(FontId),
}

pub struct PdfSurface {
    doc: PdfDocument,
    fonts: FontManager,
    font_ids: HashMap<FontKey, FontId>,
    images: HashMap<String, ImageResource>,
    resource_dir: Option<PathBuf>,

    setup: PageSetup,
    /// Points per document unit.
    k: f32,
    page_w_pt: f32,
    page_h_pt: f32,

    pages: Vec<PdfPage>,
    ops: Vec<Op>,
    page_open: bool,

    x: f32,
    y: f32,
    font: FontSpec,
    underline: bool,
    text_color: StyleRgb,
    stroke_color: StyleRgb,
    fill_color: StyleRgb,
    line_width: f32,
}

impl PdfSurface {
    pub fn new(title: &str, fonts: FontManager, resource_dir: Option<PathBuf>) -> Self {
        let setup = PageSetup::default();
        let (page_w_pt, page_h_pt) = setup.size_pt();
        Self {
            doc: PdfDocument::new(title),
            fonts,
            font_ids: HashMap::new(),
            images: HashMap::new(),
            resource_dir,
            k: setup.unit.points(),
            setup,
            page_w_pt,
            page_h_pt,
            pages: Vec::new(),
            ops: Vec::new(),
            page_open: false,
            x: 0.0,
            y: 0.0,
            font: FontSpec {
                family: "arial".to_string(),
                size: 12.0,
                bold: false,
                italic: false,
            },
            underline: false,
            text_color: StyleRgb::BLACK,
            stroke_color: StyleRgb::BLACK,
            fill_color: StyleRgb::WHITE,
            line_width: 0.2,
        }
    }

    fn close_page(&mut self) {
        if self.page_open {
            let ops = std::mem::take(&mut self.ops);
            self.pages.push(PdfPage::new(
                Mm(self.page_w_pt * 0.352778),
                Mm(self.page_h_pt * 0.352778),
                ops,
            ));
            self.page_open = false;
        }
    }

    /// Document units (top-left origin) → PDF points (bottom-left origin).
    fn point(&self, x: f32, y: f32) -> LinePoint {
        LinePoint {
            p: Point {
                x: Pt(x * self.k),
                y: Pt(self.page_h_pt - y * self.k),
            },
            bezier: false,
        }
    }

    fn current_font(&mut self) -> FontRef {
        let key = self.font.key();
        if let Some(id) = self.font_ids.get(&key) {
            return FontRef::Embedded(id.clone());
        }
        if let Some(bytes) = self.fonts.font_bytes(&key) {
            let mut warnings = Vec::new();
            match ParsedFont::from_bytes(bytes, 0, &mut warnings) {
                Some(parsed) => {
                    let id = self.doc.add_font(&parsed);
                    self.font_ids.insert(key, id.clone());
                    return FontRef::Embedded(id);
                }
                None => log::warn!(
                    "font '{}' could not be embedded, using a built-in face",
                    self.font.family
                ),
            }
        }
        FontRef::Builtin(builtin_font(&self.font))
    }

    fn register_image(&mut self, src: &str) -> Result<(), BackendError> {
        if self.images.contains_key(src) {
            return Ok(());
        }
        let loaded = load_image(src, self.resource_dir.as_deref())?;
        let mut warnings = Vec::new();
        let raw = RawImage::decode_from_bytes(&loaded.bytes, &mut warnings).map_err(|e| {
            BackendError::Image {
                src: preview(src),
                reason: format!("PDF encode error: {e}"),
            }
        })?;
        let xobj_id = self.doc.add_image(&raw);
        self.images.insert(
            src.to_string(),
            ImageResource {
                xobj_id,
                px_width: loaded.px_width,
                px_height: loaded.px_height,
            },
        );
        Ok(())
    }
}

fn pdf_color(c: StyleRgb) -> Color {
    let [r, g, b] = c.as_unit();
    Color::Rgb(Rgb {
        r,
        g,
        b,
        icc_profile: None,
    })
}

fn builtin_font(spec: &FontSpec) -> BuiltinFont {
    match (BuiltinFamily::for_family(&spec.family), spec.bold, spec.italic) {
        (BuiltinFamily::Helvetica, false, false) => BuiltinFont::Helvetica,
        (BuiltinFamily::Helvetica, true, false) => BuiltinFont::HelveticaBold,
        (BuiltinFamily::Helvetica, false, true) => BuiltinFont::HelveticaOblique,
        (BuiltinFamily::Helvetica, true, true) => BuiltinFont::HelveticaBoldOblique,
        (BuiltinFamily::Times, false, false) => BuiltinFont::TimesRoman,
        (BuiltinFamily::Times, true, false) => BuiltinFont::TimesBold,
        (BuiltinFamily::Times, false, true) => BuiltinFont::TimesItalic,
        (BuiltinFamily::Times, true, true) => BuiltinFont::TimesBoldItalic,
        (BuiltinFamily::Courier, false, false) => BuiltinFont::Courier,
        (BuiltinFamily::Courier, true, false) => BuiltinFont::CourierBold,
        (BuiltinFamily::Courier, false, true) => BuiltinFont::CourierOblique,
        (BuiltinFamily::Courier, true, true) => BuiltinFont::CourierBoldOblique,
    }
}

impl Surface for PdfSurface {
    fn setup(&mut self, page: &PageSetup) {
        self.setup = page.clone();
        self.k = page.unit.points();
        let (w, h) = page.size_pt();
        self.page_w_pt = w;
        self.page_h_pt = h;
    }

    fn add_page(&mut self) {
        self.close_page();
        self.page_open = true;
        self.x = self.setup.margins.left;
        self.y = self.setup.margins.top;
    }

    fn page_count(&self) -> usize {
        self.pages.len() + usize::from(self.page_open)
    }

    fn page_size(&self) -> (f32, f32) {
        (self.page_w_pt / self.k, self.page_h_pt / self.k)
    }

    fn margins(&self) -> Edges {
        self.setup.margins
    }

    fn x(&self) -> f32 {
        self.x
    }

    fn y(&self) -> f32 {
        self.y
    }

    fn set_x(&mut self, x: f32) {
        self.x = x;
    }

    fn set_y(&mut self, y: f32) {
        self.y = y;
    }

    fn set_font(&mut self, font: &FontSpec, underline: bool) {
        self.font = font.clone();
        self.underline = underline;
    }

    fn font_height(&self) -> f32 {
        self.font.size / self.k
    }

    fn text_width(&self, text: &str) -> f32 {
        self.fonts.measure_text_width(text, &self.font) / self.k
    }

    fn set_text_color(&mut self, color: StyleRgb) {
        self.text_color = color;
    }

    fn set_stroke_color(&mut self, color: StyleRgb) {
        self.stroke_color = color;
    }

    fn set_fill_color(&mut self, color: StyleRgb) {
        self.fill_color = color;
    }

    fn set_line_width(&mut self, width: f32) {
        self.line_width = width;
    }

    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        let points = vec![self.point(x1, y1), self.point(x2, y2)];
        self.ops.push(Op::SetOutlineColor {
            col: pdf_color(self.stroke_color),
        });
        self.ops.push(Op::SetOutlineThickness {
            pt: Pt(self.line_width * self.k),
        });
        self.ops.push(Op::DrawLine {
            line: Line {
                points,
                is_closed: false,
            },
        });
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let points = vec![
            self.point(x, y + h),
            self.point(x + w, y + h),
            self.point(x + w, y),
            self.point(x, y),
        ];
        self.ops.push(Op::SetFillColor {
            col: pdf_color(self.fill_color),
        });
        self.ops.push(Op::DrawPolygon {
            polygon: Polygon {
                rings: vec![PolygonRing { points }],
                mode: PaintMode::Fill,
                winding_order: WindingOrder::NonZero,
            },
        });
    }

    fn text(&mut self, line_height: f32, text: &str) {
        let width = self.text_width(text);
        if !text.trim().is_empty() {
            let font_height = self.font_height();
            let baseline = self.y + line_height / 2.0 + 0.3 * font_height;
            let cursor = self.point(self.x, baseline).p;
            let size = Pt(self.font.size);

            self.ops.push(Op::StartTextSection);
            self.ops.push(Op::SetTextCursor { pos: cursor });
            self.ops.push(Op::SetFillColor {
                col: pdf_color(self.text_color),
            });
            match self.current_font() {
                FontRef::Builtin(font) => {
                    self.ops.push(Op::SetFontSizeBuiltinFont { size, font });
                    self.ops.push(Op::WriteTextBuiltinFont {
                        items: vec![TextItem::Text(text.to_string())],
                        font,
                    });
                }
                FontRef::Embedded(font) => {
                    self.ops.push(Op::SetFontSize {
                        size,
                        font: font.clone(),
                    });
                    self.ops.push(Op::WriteText {
                        items: vec![TextItem::Text(text.to_string())],
                        font,
                    });
                }
            }
            self.ops.push(Op::EndTextSection);

            if self.underline {
                let underline_y = baseline + font_height * 0.1;
                let (x1, x2) = (self.x, self.x + width);
                let stroke = self.stroke_color;
                let thickness = self.line_width;
                self.stroke_color = self.text_color;
                self.line_width = font_height * 0.05;
                self.line(x1, underline_y, x2, underline_y);
                self.stroke_color = stroke;
                self.line_width = thickness;
            }
        }
        self.x += width;
    }

    fn image(
        &mut self,
        src: &str,
        x: f32,
        y: f32,
        w: Option<f32>,
        h: Option<f32>,
    ) -> Result<(), BackendError> {
        self.register_image(src)?;
        let Some(res) = self.images.get(src) else {
            return Ok(());
        };
        let (w, h) = fit_image(res.px_width, res.px_height, w, h, self.k);

        // At dpi=72 printpdf renders 1 px = 1 pt, so scale = desired_pt / px.
        let scale_x = w * self.k / res.px_width.max(1) as f32;
        let scale_y = h * self.k / res.px_height.max(1) as f32;
        let bottom = self.page_h_pt - (y + h) * self.k;

        self.ops.push(Op::UseXobject {
            id: res.xobj_id.clone(),
            transform: XObjectTransform {
                translate_x: Some(Pt(x * self.k)),
                translate_y: Some(Pt(bottom)),
                dpi: Some(72.0),
                scale_x: Some(scale_x),
                scale_y: Some(scale_y),
                rotate: None,
            },
        });
        Ok(())
    }

    fn finish(&mut self, out: &mut dyn Write) -> Result<(), BackendError> {
        self.close_page();
        let mut pages = std::mem::take(&mut self.pages);
        if pages.is_empty() {
            pages.push(PdfPage::new(
                Mm(self.page_w_pt * 0.352778),
                Mm(self.page_h_pt * 0.352778),
                Vec::new(),
            ));
        }
        self.doc.with_pages(pages);
        let bytes = self.doc.save(&PdfSaveOptions::default(), &mut Vec::new());
        out.write_all(&bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::Unit;

    fn pt_setup() -> PageSetup {
        PageSetup {
            unit: Unit::Pt,
            ..PageSetup::default()
        }
    }

    #[test]
    fn render_empty_document() {
        let mut surface = PdfSurface::new("empty", FontManager::new(), None);
        surface.setup(&pt_setup());
        let mut bytes = Vec::new();
        surface.finish(&mut bytes).unwrap();
        assert!(bytes.len() > 100, "PDF should have content");
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn text_advances_cursor() {
        let mut surface = PdfSurface::new("text", FontManager::new(), None);
        surface.setup(&pt_setup());
        surface.add_page();
        surface.set_font(
            &FontSpec {
                family: "helvetica".into(),
                size: 10.0,
                bold: false,
                italic: false,
            },
            true,
        );
        let start = surface.x();
        surface.text(15.0, "abcd");
        assert!((surface.x() - start - 20.0).abs() < 0.01);
        assert_eq!(surface.page_count(), 1);
    }

    #[test]
    fn builtin_text_stays_utf8_until_save() {
        let mut surface = PdfSurface::new("latin", FontManager::new(), None);
        surface.setup(&pt_setup());
        surface.add_page();
        surface.set_font(
            &FontSpec {
                family: "helvetica".into(),
                size: 10.0,
                bold: false,
                italic: false,
            },
            false,
        );
        surface.text(15.0, "café € 10");
        let written: Vec<&str> = surface
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::WriteTextBuiltinFont { items, .. } => Some(items),
                _ => None,
            })
            .flatten()
            .filter_map(|item| match item {
                TextItem::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(written, vec!["café € 10"]);

        let mut bytes = Vec::new();
        surface.finish(&mut bytes).unwrap();
        assert_eq!(&bytes[0..5], b"%PDF-");
    }

    #[test]
    fn missing_image_reports_error() {
        let mut surface = PdfSurface::new("img", FontManager::new(), None);
        surface.setup(&pt_setup());
        surface.add_page();
        let err = surface
            .image("does/not/exist.png", 0.0, 0.0, None, None)
            .unwrap_err();
        assert!(matches!(err, BackendError::Image { .. }));
    }

    #[test]
    fn data_uri_requires_base64() {
        assert!(parse_data_uri("data:image/png,abcd").is_err());
        assert_eq!(parse_data_uri("data:text/plain;base64,aGk=").unwrap(), b"hi");
    }

    #[test]
    fn builtin_faces() {
        let spec = FontSpec {
            family: "Courier".into(),
            size: 9.0,
            bold: true,
            italic: true,
        };
        assert!(matches!(builtin_font(&spec), BuiltinFont::CourierBoldOblique));
    }
}
