//! Recording backend – a [`Surface`] that logs every drawing call as a
//! serialisable [`DrawOp`].
//!
//! Used by tests and by `typeset --layout-json` to inspect a layout without
//! producing PDF bytes. Measurement goes through the same [`FontManager`] as
//! the PDF backend, so both produce identical geometry.

use std::io::Write;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::fonts::{FontManager, FontSpec};
use crate::render::load_image;
use crate::style::{Edges, Rgb};
use crate::surface::{fit_image, PageSetup, Surface, Unit};

/// One recorded drawing call, in document units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum DrawOp {
    AddPage {
        page: usize,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
        color: Rgb,
    },
    Rect {
        x: f32,
        y: f32,
        w: f32,
        h: f32,
        color: Rgb,
    },
    Text {
        x: f32,
        y: f32,
        height: f32,
        text: String,
        family: String,
        size: f32,
        bold: bool,
        italic: bool,
        underline: bool,
        color: Rgb,
    },
    Image {
        src: String,
        x: f32,
        y: f32,
        w: f32,
        h: f32,
    },
}

/// Serialised form of a finished recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    pub unit: Unit,
    pub page_width: f32,
    pub page_height: f32,
    pub pages: usize,
    pub ops: Vec<DrawOp>,
}

impl Recording {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Text drawn on `page` (1-based), in drawing order.
    pub fn texts_on_page(&self, page: usize) -> Vec<&str> {
        let mut current = 0;
        let mut texts = Vec::new();
        for op in &self.ops {
            match op {
                DrawOp::AddPage { page: p } => current = *p,
                DrawOp::Text { text, .. } if current == page => texts.push(text.as_str()),
                _ => {}
            }
        }
        texts
    }

    /// First page (1-based) on which a text fragment containing `needle` is
    /// drawn.
    pub fn page_of(&self, needle: &str) -> Option<usize> {
        (1..=self.pages).find(|p| self.texts_on_page(*p).iter().any(|t| t.contains(needle)))
    }
}

pub struct RecordingSurface {
    fonts: FontManager,
    resource_dir: Option<PathBuf>,
    setup: PageSetup,
    ops: Vec<DrawOp>,
    pages: usize,
    x: f32,
    y: f32,
    font: FontSpec,
    underline: bool,
    text_color: Rgb,
    stroke_color: Rgb,
    fill_color: Rgb,
    line_width: f32,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new(FontManager::new(), None)
    }
}

impl RecordingSurface {
    pub fn new(fonts: FontManager, resource_dir: Option<PathBuf>) -> Self {
        Self {
            fonts,
            resource_dir,
            setup: PageSetup::default(),
            ops: Vec::new(),
            pages: 0,
            x: 0.0,
            y: 0.0,
            font: FontSpec {
                family: "arial".to_string(),
                size: 12.0,
                bold: false,
                italic: false,
            },
            underline: false,
            text_color: Rgb::BLACK,
            stroke_color: Rgb::BLACK,
            fill_color: Rgb::WHITE,
            line_width: 0.2,
        }
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Snapshot of everything drawn so far.
    pub fn recording(&self) -> Recording {
        let (page_width, page_height) = self.setup.size();
        Recording {
            unit: self.setup.unit,
            page_width,
            page_height,
            pages: self.pages,
            ops: self.ops.clone(),
        }
    }

    fn k(&self) -> f32 {
        self.setup.unit.points()
    }
}

impl Surface for RecordingSurface {
    fn setup(&mut self, page: &PageSetup) {
        self.setup = page.clone();
    }

    fn add_page(&mut self) {
        self.pages += 1;
        self.ops.push(DrawOp::AddPage { page: self.pages });
        self.x = self.setup.margins.left;
        self.y = self.setup.margins.top;
    }

    fn page_count(&self) -> usize {
        self.pages
    }

    fn page_size(&self) -> (f32, f32) {
        self.setup.size()
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
        self.font.size / self.k()
    }

    fn text_width(&self, text: &str) -> f32 {
        self.fonts.measure_text_width(text, &self.font) / self.k()
    }

    fn set_text_color(&mut self, color: Rgb) {
        self.text_color = color;
    }

    fn set_stroke_color(&mut self, color: Rgb) {
        self.stroke_color = color;
    }

    fn set_fill_color(&mut self, color: Rgb) {
        self.fill_color = color;
    }

    fn set_line_width(&mut self, width: f32) {
        self.line_width = width;
    }

    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.ops.push(DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            width: self.line_width,
            color: self.stroke_color,
        });
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        self.ops.push(DrawOp::Rect {
            x,
            y,
            w,
            h,
            color: self.fill_color,
        });
    }

    fn text(&mut self, line_height: f32, text: &str) {
        let width = self.text_width(text);
        if !text.is_empty() {
            self.ops.push(DrawOp::Text {
                x: self.x,
                y: self.y,
                height: line_height,
                text: text.to_string(),
                family: self.font.family.clone(),
                size: self.font.size,
                bold: self.font.bold,
                italic: self.font.italic,
                underline: self.underline,
                color: self.text_color,
            });
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
        let loaded = load_image(src, self.resource_dir.as_deref())?;
        let (w, h) = fit_image(loaded.px_width, loaded.px_height, w, h, self.k());
        let src = if src.starts_with("data:") {
            "data-uri".to_string()
        } else {
            src.to_string()
        };
        self.ops.push(DrawOp::Image { src, x, y, w, h });
        Ok(())
    }

    fn finish(&mut self, out: &mut dyn Write) -> Result<(), BackendError> {
        let json = self
            .recording()
            .to_json()
            .map_err(|e| BackendError::Write(e.into()))?;
        out.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_pages_and_text() {
        let mut surface = RecordingSurface::default();
        surface.setup(&PageSetup {
            unit: Unit::Pt,
            ..PageSetup::default()
        });
        surface.add_page();
        surface.text(18.0, "hello");
        surface.add_page();
        surface.text(18.0, "world");

        let rec = surface.recording();
        assert_eq!(rec.pages, 2);
        assert_eq!(rec.texts_on_page(1), vec!["hello"]);
        assert_eq!(rec.page_of("world"), Some(2));
        // 5 chars × 12 × 0.5
        assert!((surface.x() - 10.0 - 30.0).abs() < 0.01);
    }

    #[test]
    fn json_round_trip_preserves_ops() {
        let mut surface = RecordingSurface::default();
        surface.add_page();
        surface.set_fill_color(Rgb { r: 1, g: 2, b: 3 });
        surface.fill_rect(1.0, 2.0, 3.0, 4.0);

        let mut out = Vec::new();
        surface.finish(&mut out).unwrap();
        let rec = Recording::from_json(std::str::from_utf8(&out).unwrap()).unwrap();
        assert_eq!(rec, surface.recording());
        assert!(matches!(rec.ops[1], DrawOp::Rect { color: Rgb { r: 1, g: 2, b: 3 }, .. }));
    }
}
