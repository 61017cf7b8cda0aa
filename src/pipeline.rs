//! Pipeline – ties together loading, the two render passes and the output
//! backend into single function calls.

use std::path::PathBuf;

use crate::document::Document;
use crate::error::{BackendError, Result};
use crate::fonts::FontManager;
use crate::pagination::Processor;
use crate::recording::{Recording, RecordingSurface};
use crate::render::PdfSurface;
use crate::surface::Surface;

/// Configuration for the PDF generation pipeline.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Title embedded in the PDF metadata; the document's `subject` when
    /// unset.
    pub title: Option<String>,
    /// Directory of `<Family>-Regular.ttf` (and `-Bold`, `-Italic`,
    /// `-BoldItalic`) font files.
    pub font_dir: Option<PathBuf>,
    /// Base directory for relative image paths.
    pub resource_dir: Option<PathBuf>,
}

impl PipelineConfig {
    /// Fonts from `font_dir`, or none.
    pub fn font_manager(&self) -> std::result::Result<FontManager, BackendError> {
        let mut fonts = FontManager::new();
        if let Some(dir) = &self.font_dir {
            let loaded = fonts.load_dir(dir)?;
            log::debug!("loaded {loaded} font faces from {}", dir.display());
        }
        Ok(fonts)
    }

    fn title_for(&self, doc: &Document) -> String {
        self.title
            .clone()
            .unwrap_or_else(|| doc.meta.subject.clone())
    }
}

/// Output of a compile.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub bytes: Vec<u8>,
    pub pages: usize,
}

/// Render `doc` twice: once to learn the page count, then for real with
/// `{np}` known. Each pass gets a fresh surface from `make_surface` and a
/// fresh [`Processor`].
pub fn render_two_pass<S, F>(doc: &Document, mut make_surface: F) -> Result<(S, usize)>
where
    S: Surface,
    F: FnMut() -> S,
{
    let mut measure = Processor::new(doc, make_surface(), None);
    measure.render()?;
    let total = measure.page_count();
    drop(measure);
    log::debug!("pass 1 finished: {total} pages");

    let mut processor = Processor::new(doc, make_surface(), Some(total));
    processor.render()?;
    let pages = processor.page_count();
    if pages != total {
        log::warn!("pass 2 produced {pages} pages, pass 1 counted {total}");
    }
    log::debug!("pass 2 finished: {pages} pages");
    Ok((processor.into_surface(), pages))
}

/// Compile a loaded document to PDF bytes.
pub fn compile(doc: &Document, config: &PipelineConfig) -> Result<Compiled> {
    let fonts = config.font_manager()?;
    let title = config.title_for(doc);
    let (mut surface, pages) = render_two_pass(doc, || {
        PdfSurface::new(&title, fonts.clone(), config.resource_dir.clone())
    })?;
    let mut bytes = Vec::new();
    surface.finish(&mut bytes)?;
    Ok(Compiled { bytes, pages })
}

/// Full pipeline: XML source → PDF bytes and page count.
pub fn generate_pdf(xml: &str, config: &PipelineConfig) -> Result<Compiled> {
    let doc = Document::load(xml)?;
    compile(&doc, config)
}

/// Run the layout against the recording backend only – useful for testing
/// and for inspecting geometry.
pub fn generate_layout(xml: &str, config: &PipelineConfig) -> Result<Recording> {
    let doc = Document::load(xml)?;
    let fonts = config.font_manager()?;
    let (surface, _) = render_two_pass(&doc, || {
        RecordingSurface::new(fonts.clone(), config.resource_dir.clone())
    })?;
    Ok(surface.recording())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_basic() {
        let xml = "<document><body><Text>Hello</Text><Box>World</Box></body></document>";
        let compiled = generate_pdf(xml, &PipelineConfig::default()).unwrap();
        assert_eq!(compiled.pages, 1);
        assert_eq!(&compiled.bytes[0..5], b"%PDF-");
    }

    #[test]
    fn total_pages_known_in_second_pass() {
        let body: String = (0..150).map(|i| format!("<Text>n{i}</Text>")).collect();
        let xml = format!(
            "<document><footer><SetY y=\"8\" from-bottom=\"true\"/><Text>{{cp}}/{{np}}</Text></footer>\
             <body>{body}</body></document>"
        );
        let rec = generate_layout(&xml, &PipelineConfig::default()).unwrap();
        assert!(rec.pages > 1);
        let last = format!("{}/{}", rec.pages, rec.pages);
        assert!(rec.texts_on_page(rec.pages).contains(&last.as_str()));
        assert!(rec.texts_on_page(1).contains(&format!("1/{}", rec.pages).as_str()));
    }

    #[test]
    fn missing_font_dir_is_an_error() {
        let config = PipelineConfig {
            font_dir: Some(PathBuf::from("/definitely/not/here")),
            ..PipelineConfig::default()
        };
        assert!(generate_pdf("<document/>", &config).is_err());
    }
}
