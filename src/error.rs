//! Error taxonomy shared by the loader, the layout engine and the drawing
//! backends.
//!
//! Load-time problems ([`ForgeError::Syntax`], [`ForgeError::Xml`],
//! [`ForgeError::Structure`], [`ForgeError::UnknownReference`]) abort a
//! compile. [`ForgeError::SpanOverflow`] aborts the render of the document
//! containing the offending table. Image failures surface as
//! [`BackendError::Image`] and are logged and skipped by the processor.

use thiserror::Error;

/// Errors in the style declaration and class block grammar.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StyleError {
    #[error("unknown style property '{0}'")]
    UnknownProperty(String),

    #[error("invalid value '{value}' for '{property}': {reason}")]
    InvalidValue {
        property: String,
        value: String,
        reason: String,
    },

    #[error("style property '{0}' already set")]
    Duplicate(String),

    #[error("malformed declaration '{0}', expected 'name: value'")]
    Declaration(String),

    #[error("style class without name")]
    MissingClassName,

    #[error("non matching brace in class '{0}'")]
    UnmatchedBrace(String),

    #[error("selector '{selector}' of class '{class}' has no base class")]
    MissingBaseClass { class: String, selector: String },

    #[error("unexpected text outside of a class block: '{0}'")]
    TrailingContent(String),
}

/// Errors raised by a drawing backend.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("image '{src}': {reason}")]
    Image { src: String, reason: String },

    #[error("font error: {0}")]
    Font(String),

    #[error("failed to write output: {0}")]
    Write(#[from] std::io::Error),
}

/// Top-level error for loading and compiling a document.
#[derive(Error, Debug)]
pub enum ForgeError {
    #[error("{context}: {source}")]
    Syntax {
        context: String,
        #[source]
        source: StyleError,
    },

    #[error("XML error at byte {position}: {source}")]
    Xml {
        #[source]
        source: quick_xml::Error,
        position: u64,
    },

    #[error("document structure error: {0}")]
    Structure(String),

    #[error("unknown instruction <{tag}>")]
    UnknownReference { tag: String },

    #[error("row-span {span} of cell {column} in row {row} exceeds the {rows} rows of the table")]
    SpanOverflow {
        row: usize,
        column: usize,
        span: usize,
        rows: usize,
    },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl ForgeError {
    pub(crate) fn syntax(context: impl Into<String>, source: StyleError) -> Self {
        Self::Syntax {
            context: context.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ForgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntax_error_names_its_context() {
        let err = ForgeError::syntax(
            "style of <Box>",
            StyleError::UnknownProperty("colour".into()),
        );
        assert_eq!(
            err.to_string(),
            "style of <Box>: unknown style property 'colour'"
        );
    }

    #[test]
    fn backend_errors_are_transparent() {
        let err: ForgeError = BackendError::Font("no glyphs".into()).into();
        assert_eq!(err.to_string(), "font error: no glyphs");
    }
}
