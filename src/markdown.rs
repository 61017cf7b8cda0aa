//! Inline emphasis tokenizer.
//!
//! Recognised markers:
//!
//! | marker        | effect                                   |
//! |---------------|------------------------------------------|
//! | `**` or `__`  | toggle bold                              |
//! | `*` or `_`    | toggle italic                            |
//! | `` ` ``       | toggle code (fixed-width face)           |
//! | `\`           | forced line break; the next character is |
//! |               | taken literally                          |
//!
//! The tokenizer is lenient: an unmatched marker leaves its toggle on until
//! the end of the text, and nothing is ever rejected.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize)]
pub struct Emphasis {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
}

/// A run of text sharing one emphasis, or (after [`word_items`]) one word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub text: String,
    pub emphasis: Emphasis,
    /// The item starts a new line.
    pub newline: bool,
}

impl Item {
    fn new(text: String, emphasis: Emphasis, newline: bool) -> Self {
        Self {
            text,
            emphasis,
            newline,
        }
    }
}

/// Split `text` into emphasis runs. Marker characters are consumed.
pub fn tokenize(text: &str) -> Vec<Item> {
    let mut items = Vec::new();
    let mut emphasis = Emphasis::default();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    let flush = |items: &mut Vec<Item>, current: &mut String, emphasis: Emphasis| {
        if !current.is_empty() {
            items.push(Item::new(std::mem::take(current), emphasis, false));
        }
    };

    while let Some(c) = chars.next() {
        match c {
            '*' | '_' => {
                flush(&mut items, &mut current, emphasis);
                if chars.peek() == Some(&c) {
                    chars.next();
                    emphasis.bold = !emphasis.bold;
                } else {
                    emphasis.italic = !emphasis.italic;
                }
            }
            '`' => {
                flush(&mut items, &mut current, emphasis);
                emphasis.code = !emphasis.code;
            }
            '\\' => {
                flush(&mut items, &mut current, emphasis);
                let literal = chars.next().map(String::from).unwrap_or_default();
                items.push(Item::new(literal, emphasis, true));
            }
            _ => current.push(c),
        }
    }
    flush(&mut items, &mut current, emphasis);
    items
}

/// Split runs into words. A space stays attached to the word before it;
/// forced-break items are kept whole.
pub fn word_items(runs: &[Item]) -> Vec<Item> {
    let mut words = Vec::new();
    for run in runs {
        if run.newline {
            words.push(run.clone());
            continue;
        }
        let mut word = String::new();
        for c in run.text.chars() {
            word.push(c);
            if c == ' ' {
                words.push(Item::new(std::mem::take(&mut word), run.emphasis, false));
            }
        }
        if !word.is_empty() {
            words.push(Item::new(word, run.emphasis, false));
        }
    }
    words
}

/// [`tokenize`] followed by [`word_items`].
pub fn words(text: &str) -> Vec<Item> {
    word_items(&tokenize(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find<'a>(items: &'a [Item], text: &str) -> &'a Item {
        items
            .iter()
            .find(|i| i.text.trim() == text)
            .unwrap_or_else(|| panic!("no item {text:?} in {items:?}"))
    }

    #[test]
    fn tricky_markers() {
        let items = words("*some* tricky `__ways__` to cut-off your tail\\");

        let some = find(&items, "some");
        assert!(some.emphasis.italic && !some.emphasis.bold && !some.emphasis.code);

        let ways = find(&items, "ways");
        assert!(ways.emphasis.bold && ways.emphasis.code && !ways.emphasis.italic);

        let tail = find(&items, "tail");
        assert_eq!(tail.emphasis, Emphasis::default());

        let last = items.last().unwrap();
        assert!(last.newline);
        assert_eq!(last.text, "");
    }

    #[test]
    fn escaped_character_is_literal() {
        let items = tokenize("a\\*b");
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].text, "*");
        assert!(items[1].newline);
        assert_eq!(items[2].text, "b");
        assert_eq!(items[2].emphasis, Emphasis::default());
    }

    #[test]
    fn unmatched_marker_stays_on() {
        let items = words("plain _open to the end");
        assert_eq!(find(&items, "plain").emphasis, Emphasis::default());
        assert!(find(&items, "end").emphasis.italic);
    }

    #[test]
    fn spaces_stay_with_preceding_word() {
        let items = words("one two  three");
        let texts: Vec<&str> = items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["one ", "two ", " ", "three"]);
    }

    #[test]
    fn empty_text_has_no_items() {
        assert!(words("").is_empty());
        assert!(words("**").is_empty());
    }
}
