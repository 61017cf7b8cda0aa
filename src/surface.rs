//! Drawing surface contract and page geometry.
//!
//! The layout engine talks to its backend exclusively through [`Surface`].
//! All coordinates are in the document unit with the origin at the top-left
//! corner of the page; font sizes are always points.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::fonts::FontSpec;
use crate::style::{Edges, Rgb};

// ---------------------------------------------------------------------------
// Page setup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Pt,
    #[default]
    Mm,
    Cm,
    In,
}

impl Unit {
    pub fn points(self) -> f32 {
        match self {
            Self::Pt => 1.0,
            Self::Mm => 72.0 / 25.4,
            Self::Cm => 72.0 / 2.54,
            Self::In => 72.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageFormat {
    A3,
    #[default]
    A4,
    A5,
    Letter,
    Legal,
}

impl PageFormat {
    /// Portrait width and height in points.
    pub fn size_pt(self) -> (f32, f32) {
        match self {
            Self::A3 => (841.89, 1190.55),
            Self::A4 => (595.28, 841.89),
            Self::A5 => (419.53, 595.28),
            Self::Letter => (612.0, 792.0),
            Self::Legal => (612.0, 1008.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageBreaks {
    #[default]
    Auto,
    Manual,
}

/// Page configuration from the document's `default` block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PageSetup {
    pub orientation: Orientation,
    pub unit: Unit,
    pub format: PageFormat,
    pub page_breaks: PageBreaks,
    pub margins: Edges,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            orientation: Orientation::Portrait,
            unit: Unit::Mm,
            format: PageFormat::A4,
            page_breaks: PageBreaks::Auto,
            margins: Edges::uniform(10.0),
        }
    }
}

impl PageSetup {
    /// Page width and height in points, after orientation.
    pub fn size_pt(&self) -> (f32, f32) {
        let (w, h) = self.format.size_pt();
        match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }

    /// Page width and height in document units.
    pub fn size(&self) -> (f32, f32) {
        let (w, h) = self.size_pt();
        let k = self.unit.points();
        (w / k, h / k)
    }
}

// ---------------------------------------------------------------------------
// Backend contract
// ---------------------------------------------------------------------------

/// Drawing backend used by the layout engine.
pub trait Surface {
    /// Configure page format and margins. Called once, before any page.
    fn setup(&mut self, page: &PageSetup);

    /// Start a new page and move the cursor to the top-left margin corner.
    fn add_page(&mut self);

    /// Pages started so far.
    fn page_count(&self) -> usize;

    /// Page width and height.
    fn page_size(&self) -> (f32, f32);

    fn margins(&self) -> Edges;

    fn x(&self) -> f32;
    fn y(&self) -> f32;
    fn set_x(&mut self, x: f32);
    fn set_y(&mut self, y: f32);

    fn set_xy(&mut self, x: f32, y: f32) {
        self.set_x(x);
        self.set_y(y);
    }

    /// Select the font used by [`Surface::text_width`] and [`Surface::text`].
    fn set_font(&mut self, font: &FontSpec, underline: bool);

    /// Point size of the current font in document units.
    fn font_height(&self) -> f32;

    /// Width of `text` under the current font.
    fn text_width(&self, text: &str) -> f32;

    fn set_text_color(&mut self, color: Rgb);
    fn set_stroke_color(&mut self, color: Rgb);
    fn set_fill_color(&mut self, color: Rgb);
    fn set_line_width(&mut self, width: f32);

    fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32);
    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32);

    /// Write `text` at the cursor inside a line of height `line_height` and
    /// advance the cursor by its width.
    fn text(&mut self, line_height: f32, text: &str);

    /// Place an image with its top-left corner at `(x, y)`. A missing
    /// dimension follows the image's aspect ratio.
    fn image(
        &mut self,
        src: &str,
        x: f32,
        y: f32,
        w: Option<f32>,
        h: Option<f32>,
    ) -> Result<(), BackendError>;

    /// Finalise output into `out`.
    fn finish(&mut self, out: &mut dyn Write) -> Result<(), BackendError>;
}

/// Resolve the drawn size of an image of `px_w × px_h` pixels, taking one
/// pixel as one point when neither dimension is given.
pub fn fit_image(
    px_w: u32,
    px_h: u32,
    w: Option<f32>,
    h: Option<f32>,
    points_per_unit: f32,
) -> (f32, f32) {
    let (px_w, px_h) = (px_w.max(1) as f32, px_h.max(1) as f32);
    match (w, h) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, w * px_h / px_w),
        (None, Some(h)) => (h * px_w / px_h, h),
        (None, None) => (px_w / points_per_unit, px_h / points_per_unit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn landscape_swaps_dimensions() {
        let mut setup = PageSetup {
            unit: Unit::Pt,
            ..PageSetup::default()
        };
        assert_eq!(setup.size(), (595.28, 841.89));
        setup.orientation = Orientation::Landscape;
        assert_eq!(setup.size(), (841.89, 595.28));
    }

    #[test]
    fn millimetre_a4() {
        let (w, h) = PageSetup::default().size();
        assert!((w - 210.0).abs() < 0.05, "width {w}");
        assert!((h - 297.0).abs() < 0.05, "height {h}");
    }

    #[test]
    fn image_fit_keeps_aspect() {
        assert_eq!(fit_image(200, 100, Some(50.0), None, 1.0), (50.0, 25.0));
        assert_eq!(fit_image(200, 100, None, Some(10.0), 1.0), (20.0, 10.0));
        assert_eq!(fit_image(200, 100, None, None, 2.0), (100.0, 50.0));
    }

    #[test]
    fn page_setup_from_json() {
        let setup: PageSetup =
            serde_json::from_str(r#"{"format":"letter","unit":"in","page-breaks":"manual"}"#)
                .unwrap();
        assert_eq!(setup.format, PageFormat::Letter);
        assert_eq!(setup.unit, Unit::In);
        assert_eq!(setup.page_breaks, PageBreaks::Manual);
        assert_eq!(setup.size(), (8.5, 11.0));
    }
}
