//! Text reflow – whitespace normalisation, greedy line packing of emphasis
//! words, height measurement and aligned line drawing.
//!
//! Widths are always measured through the [`Surface`], under the font each
//! word resolves to, so layout and drawing agree for every backend.

use crate::fonts::FontSpec;
use crate::markdown::{self, Emphasis, Item};
use crate::style::{FontStyles, HAlign, Rgb};
use crate::surface::Surface;

/// Family used for code spans.
pub const CODE_FAMILY: &str = "Courier";

/// Collapse line breaks and tabs into single spaces and trim every line.
pub fn normalize(text: &str) -> String {
    let text = text.replace('\r', "\n").replace('\t', " ");
    let joined = text
        .split('\n')
        .filter(|line| !line.is_empty())
        .map(|line| line.trim_matches(' '))
        .collect::<Vec<_>>()
        .join(" ");

    let mut out = String::with_capacity(joined.len());
    let mut previous_space = false;
    for c in joined.chars() {
        if c == ' ' && previous_space {
            continue;
        }
        previous_space = c == ' ';
        out.push(c);
    }
    out
}

/// Replace `{cp}`/`{current-page}` and `{np}`/`{total-pages}`. An unknown
/// total renders as `0`.
pub fn substitute_page_tokens(text: &str, current: usize, total: Option<usize>) -> String {
    if !text.contains('{') {
        return text.to_string();
    }
    let current = current.to_string();
    let total = total.unwrap_or(0).to_string();
    text.replace("{cp}", &current)
        .replace("{current-page}", &current)
        .replace("{np}", &total)
        .replace("{total-pages}", &total)
}

/// Font a word with `emphasis` is drawn in.
pub fn word_font(font: &FontStyles, emphasis: Emphasis) -> FontSpec {
    FontSpec {
        family: if emphasis.code {
            CODE_FAMILY.to_string()
        } else {
            font.family.clone()
        },
        size: font.size,
        bold: font.bold() || emphasis.bold,
        italic: font.italic() || emphasis.italic,
    }
}

/// Select the plain font of `font` on the surface.
pub fn use_font<S: Surface + ?Sized>(surface: &mut S, font: &FontStyles) {
    surface.set_font(&word_font(font, Emphasis::default()), font.underline());
}

/// One packed line.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextLine {
    pub words: Vec<Item>,
    /// Width including trailing spaces.
    pub width: f32,
    /// Width without the trailing spaces of the last word.
    pub trimmed_width: f32,
}

impl TextLine {
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Greedily pack `words` into lines no wider than `width`.
///
/// A word that does not fit starts a new line; a line never starts empty
/// because of an overflow, so a single word wider than `width` overflows on
/// its own line. A forced-break word always closes the current line.
pub fn text_lines<S: Surface + ?Sized>(
    surface: &mut S,
    words: Vec<Item>,
    width: f32,
    font: &FontStyles,
) -> Vec<TextLine> {
    let mut lines = Vec::new();
    let mut current = TextLine::default();

    for mut word in words {
        if word.newline {
            lines.push(std::mem::take(&mut current));
            if word.text.is_empty() {
                continue;
            }
        }
        surface.set_font(&word_font(font, word.emphasis), font.underline());
        let mut word_width = surface.text_width(&word.text);

        if !current.is_empty() && current.width + word_width > width {
            lines.push(std::mem::take(&mut current));
        }
        if current.is_empty() {
            word.text = word.text.trim_start_matches(' ').to_string();
            if word.text.is_empty() {
                continue;
            }
            word_width = surface.text_width(&word.text);
        }
        let trimmed = surface.text_width(word.text.trim_end_matches(' '));
        current.trimmed_width = current.width + trimmed;
        current.width += word_width;
        current.words.push(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    for line in &mut lines {
        if let Some(last) = line.words.last_mut() {
            last.text.truncate(last.text.trim_end_matches(' ').len());
        }
    }
    use_font(surface, font);
    lines
}

/// Normalise, tokenize and pack `text`.
pub fn layout<S: Surface + ?Sized>(
    surface: &mut S,
    text: &str,
    width: f32,
    font: &FontStyles,
) -> Vec<TextLine> {
    text_lines(surface, markdown::words(&normalize(text)), width, font)
}

/// Height of one line of `font` scaled by the `line_height` factor.
pub fn line_height<S: Surface + ?Sized>(surface: &mut S, font: &FontStyles, factor: f32) -> f32 {
    use_font(surface, font);
    surface.font_height() * factor
}

/// Non-empty line count × font height × `factor`.
pub fn text_height<S: Surface + ?Sized>(
    surface: &mut S,
    text: &str,
    width: f32,
    factor: f32,
    font: &FontStyles,
) -> f32 {
    let lines = layout(surface, text, width, font);
    let height = line_height(surface, font, factor);
    lines.iter().filter(|l| !l.is_empty()).count() as f32 * height
}

/// Draw `line` at the cursor row, aligned within `[x_left, x_left + width]`.
/// The cursor row is not advanced.
#[allow(clippy::too_many_arguments)]
pub fn draw_line<S: Surface + ?Sized>(
    surface: &mut S,
    line: &TextLine,
    x_left: f32,
    width: f32,
    height: f32,
    align: HAlign,
    font: &FontStyles,
    color: Rgb,
) {
    let x = match align {
        HAlign::Left => x_left,
        HAlign::Center => x_left + (width - line.trimmed_width) / 2.0,
        HAlign::Right => x_left + width - line.trimmed_width,
    };
    surface.set_x(x);
    surface.set_text_color(color);
    for word in &line.words {
        surface.set_font(&word_font(font, word.emphasis), font.underline());
        surface.text(height, &word.text);
    }
    use_font(surface, font);
}

/// Lay out `text` and draw it line by line from the cursor. Returns the
/// height written. Never breaks pages.
#[allow(clippy::too_many_arguments)]
pub fn write<S: Surface + ?Sized>(
    surface: &mut S,
    text: &str,
    width: f32,
    factor: f32,
    align: HAlign,
    font: &FontStyles,
    color: Rgb,
) -> f32 {
    let lines = layout(surface, text, width, font);
    let height = line_height(surface, font, factor);
    let x_left = surface.x();
    let mut written = 0.0;
    for line in lines.iter().filter(|l| !l.is_empty()) {
        draw_line(surface, line, x_left, width, height, align, font, color);
        let y = surface.y();
        surface.set_xy(x_left, y + height);
        written += height;
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{DrawOp, RecordingSurface};
    use crate::style::Snapshot;
    use crate::surface::{PageSetup, Unit};

    fn surface() -> RecordingSurface {
        let mut s = RecordingSurface::default();
        s.setup(&PageSetup {
            unit: Unit::Pt,
            ..PageSetup::default()
        });
        s.add_page();
        s
    }

    fn font() -> FontStyles {
        // Heuristic metrics: every character is 5pt wide at size 10.
        FontStyles {
            size: 10.0,
            ..Snapshot::default().font
        }
    }

    fn texts(lines: &[TextLine]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.words.iter().map(|w| w.text.as_str()).collect())
            .collect()
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(
            normalize("  first line \r\n\tsecond   line\n\nthird "),
            "first line second line third"
        );
    }

    #[test]
    fn page_tokens() {
        assert_eq!(
            substitute_page_tokens("page {cp} of {np}", 2, Some(5)),
            "page 2 of 5"
        );
        assert_eq!(
            substitute_page_tokens("{current-page}/{total-pages}", 1, None),
            "1/0"
        );
    }

    #[test]
    fn short_text_is_one_trimmed_line() {
        let mut s = surface();
        let lines = layout(&mut s, "  hello   wide world  ", 1000.0, &font());
        assert_eq!(texts(&lines), vec!["hello wide world"]);
    }

    #[test]
    fn wraps_at_width() {
        let mut s = surface();
        // "aaaa " = 25pt, "bbbb " = 25pt, "cccc" = 20pt
        let lines = layout(&mut s, "aaaa bbbb cccc", 50.0, &font());
        assert_eq!(texts(&lines), vec!["aaaa bbbb", "cccc"]);
        assert_eq!(lines[0].width, 50.0);
        assert_eq!(lines[0].trimmed_width, 45.0);
    }

    #[test]
    fn overlong_word_gets_own_line() {
        let mut s = surface();
        let lines = layout(&mut s, "a bbbbbbbbbbbb c", 20.0, &font());
        assert_eq!(texts(&lines), vec!["a", "bbbbbbbbbbbb", "c"]);
        assert!(lines.iter().all(|l| !l.is_empty()));
    }

    #[test]
    fn forced_break_and_trailing_break() {
        let mut s = surface();
        let lines = layout(&mut s, "one\\ two three\\", 1000.0, &font());
        assert_eq!(texts(&lines), vec!["one", "two three"]);
        let height = text_height(&mut s, "one\\ two three\\", 1000.0, 1.5, &font());
        assert_eq!(height, 2.0 * 15.0);
    }

    #[test]
    fn code_words_measured_in_courier() {
        let mut s = surface();
        let lines = layout(&mut s, "`abcd`", 1000.0, &font());
        // 4 × 10 × 0.6
        assert!((lines[0].width - 24.0).abs() < 0.01);
    }

    #[test]
    fn right_alignment_ignores_trailing_space() {
        let mut s = surface();
        let line = layout(&mut s, "ab", 100.0, &font()).remove(0);
        s.set_y(50.0);
        draw_line(&mut s, &line, 0.0, 100.0, 15.0, HAlign::Right, &font(), Rgb::BLACK);
        match s.ops().last().unwrap() {
            DrawOp::Text { x, text, .. } => {
                assert_eq!(text, "ab");
                assert_eq!(*x, 90.0);
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn write_advances_per_line() {
        let mut s = surface();
        s.set_xy(20.0, 30.0);
        let written = write(
            &mut s,
            "aaaa bbbb cccc",
            50.0,
            1.5,
            HAlign::Left,
            &font(),
            Rgb::BLACK,
        );
        assert_eq!(written, 30.0);
        assert_eq!((s.x(), s.y()), (20.0, 60.0));
        let rows: Vec<f32> = s
            .ops()
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { y, .. } => Some(*y),
                _ => None,
            })
            .collect();
        assert_eq!(rows.first(), Some(&30.0));
        assert_eq!(rows.last(), Some(&45.0));
    }
}
