//! Font loading and text measurement using `ttf-parser`.
//!
//! Families found in a font directory are measured with their real glyph
//! advances and embedded by the PDF backend. Every other family falls back
//! to one of the built-in PDF faces with heuristic metrics.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::BackendError;

/// Family, point size and face flags of a text run.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
    pub bold: bool,
    pub italic: bool,
}

impl FontSpec {
    pub fn key(&self) -> FontKey {
        FontKey {
            family: self.family.to_ascii_lowercase(),
            bold: self.bold,
            italic: self.italic,
        }
    }
}

/// A loaded font face with metrics.
#[derive(Clone)]
pub struct FontData {
    /// Raw font bytes (kept alive for ttf-parser's zero-copy API).
    pub bytes: Vec<u8>,
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct FontKey {
    /// Lower-cased family name.
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

/// Built-in face group a family maps to when no font file is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinFamily {
    Helvetica,
    Times,
    Courier,
}

impl BuiltinFamily {
    pub fn for_family(family: &str) -> Self {
        let family = family.to_ascii_lowercase();
        if family.contains("courier") || family.contains("mono") {
            Self::Courier
        } else if family.contains("times") || (family.contains("serif") && !family.contains("sans")) {
            Self::Times
        } else {
            Self::Helvetica
        }
    }

    /// Average advance as a fraction of the point size.
    fn average_advance(self, bold: bool) -> f32 {
        match (self, bold) {
            (Self::Courier, _) => 0.6,
            (_, true) => 0.55,
            (_, false) => 0.5,
        }
    }
}

/// Manages loaded fonts.
#[derive(Clone, Default)]
pub struct FontManager {
    fonts: HashMap<FontKey, FontData>,
}

impl FontManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a TTF/OTF font from bytes.
    pub fn load_font(
        &mut self,
        family: &str,
        bold: bool,
        italic: bool,
        bytes: Vec<u8>,
    ) -> Result<(), BackendError> {
        let face = ttf_parser::Face::parse(&bytes, 0)
            .map_err(|e| BackendError::Font(format!("failed to parse '{family}': {e}")))?;

        let data = FontData {
            units_per_em: face.units_per_em() as f32,
            ascender: face.ascender() as f32,
            descender: face.descender() as f32,
            bytes,
        };

        let key = FontKey {
            family: family.to_ascii_lowercase(),
            bold,
            italic,
        };
        log::debug!("loaded font {key:?}");
        self.fonts.insert(key, data);
        Ok(())
    }

    /// Load every `<Family>-<Regular|Bold|Italic|BoldItalic>.ttf` file in
    /// `dir`. Returns the number of faces loaded.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, BackendError> {
        let unreadable = |e: std::io::Error| {
            BackendError::Font(format!("cannot read font directory {}: {e}", dir.display()))
        };
        let mut loaded = 0;
        for entry in fs::read_dir(dir).map_err(unreadable)? {
            let path = entry.map_err(unreadable)?.path();
            let is_font = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("otf"))
                .unwrap_or(false);
            if !is_font {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let (family, bold, italic) = match stem.rsplit_once('-') {
                Some((family, "Regular")) => (family, false, false),
                Some((family, "Bold")) => (family, true, false),
                Some((family, "Italic")) => (family, false, true),
                Some((family, "BoldItalic")) => (family, true, true),
                _ => (stem, false, false),
            };
            let bytes = fs::read(&path).map_err(unreadable)?;
            match self.load_font(family, bold, italic, bytes) {
                Ok(()) => loaded += 1,
                Err(e) => log::warn!("skipping {}: {e}", path.display()),
            }
        }
        Ok(loaded)
    }

    /// Loaded face for `spec`, falling back to the regular face of the same
    /// family.
    pub fn get(&self, spec: &FontSpec) -> Option<&FontData> {
        let key = spec.key();
        self.fonts.get(&key).or_else(|| {
            self.fonts.get(&FontKey {
                bold: false,
                italic: false,
                ..key
            })
        })
    }

    /// Width of `text` in points.
    ///
    /// Loaded faces sum glyph advances. Otherwise an average character width
    /// of the built-in face is used.
    pub fn measure_text_width(&self, text: &str, spec: &FontSpec) -> f32 {
        let heuristic = |t: &str| {
            let avg = BuiltinFamily::for_family(&spec.family).average_advance(spec.bold);
            t.chars().count() as f32 * spec.size * avg
        };
        let Some(data) = self.get(spec) else {
            return heuristic(text);
        };

        if let Ok(face) = ttf_parser::Face::parse(&data.bytes, 0) {
            let scale = spec.size / data.units_per_em;
            let mut width = 0.0f32;
            for ch in text.chars() {
                if let Some(gid) = face.glyph_index(ch) {
                    let advance = face.glyph_hor_advance(gid).unwrap_or(0);
                    width += advance as f32 * scale;
                } else {
                    width += spec.size * 0.5;
                }
            }
            width
        } else {
            heuristic(text)
        }
    }

    /// Ascender in points.
    pub fn ascender(&self, spec: &FontSpec) -> f32 {
        match self.get(spec) {
            Some(data) => data.ascender * spec.size / data.units_per_em,
            None => spec.size * 0.75,
        }
    }

    pub fn has_family(&self, family: &str) -> bool {
        let family = family.to_ascii_lowercase();
        self.fonts.keys().any(|k| k.family == family)
    }

    /// Get all loaded font keys, sorted.
    pub fn keys(&self) -> Vec<FontKey> {
        let mut keys: Vec<FontKey> = self.fonts.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Get font bytes for embedding in PDF.
    pub fn font_bytes(&self, key: &FontKey) -> Option<&[u8]> {
        self.fonts.get(key).map(|d| d.bytes.as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(family: &str, bold: bool) -> FontSpec {
        FontSpec {
            family: family.into(),
            size: 16.0,
            bold,
            italic: false,
        }
    }

    #[test]
    fn heuristic_text_width() {
        let mgr = FontManager::new();
        // 5 chars × 16 × 0.5 = 40
        let w = mgr.measure_text_width("Hello", &spec("arial", false));
        assert!((w - 40.0).abs() < 0.1);
        let bold = mgr.measure_text_width("Hello", &spec("arial", true));
        assert!((bold - 44.0).abs() < 0.1);
    }

    #[test]
    fn courier_is_wider() {
        let mgr = FontManager::new();
        let w = mgr.measure_text_width("abcd", &spec("Courier", false));
        assert!((w - 38.4).abs() < 0.1);
    }

    #[test]
    fn builtin_family_mapping() {
        assert_eq!(BuiltinFamily::for_family("Arial"), BuiltinFamily::Helvetica);
        assert_eq!(BuiltinFamily::for_family("Times New Roman"), BuiltinFamily::Times);
        assert_eq!(BuiltinFamily::for_family("DejaVu Sans Mono"), BuiltinFamily::Courier);
        assert_eq!(BuiltinFamily::for_family("sans-serif"), BuiltinFamily::Helvetica);
    }

    #[test]
    fn invalid_font_bytes_rejected() {
        let mut mgr = FontManager::new();
        assert!(mgr.load_font("broken", false, false, vec![0, 1, 2, 3]).is_err());
        assert!(!mgr.has_family("broken"));
    }
}
