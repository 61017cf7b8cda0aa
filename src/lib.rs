//! # typeset-forge – styled instruction documents → paginated PDF
//!
//! This crate compiles an XML document of styled instructions into a
//! paginated PDF. The pipeline stages are:
//!
//! 1. **Load** – XML source → [`document::Document`] of instructions
//!    ([`document`], [`instruction`])
//! 2. **Style** – cascade defaults, classes and inline styles
//!    ([`style`], [`classes`])
//! 3. **Reflow** – inline markdown and greedy line packing ([`markdown`], [`text`])
//! 4. **Paginate** – cursor, page breaks, header/footer, tables
//!    ([`pagination`], [`table`])
//! 5. **Render** – two passes against a [`surface::Surface`]; PDF via
//!    printpdf ([`render`]) or a JSON draw-op log ([`recording`])
//!
//! A C-compatible FFI surface is exposed via the [`ffi`] module.

pub mod classes;
pub mod document;
pub mod error;
pub mod ffi;
pub mod fonts;
pub mod instruction;
pub mod markdown;
pub mod pagination;
pub mod pipeline;
pub mod recording;
pub mod render;
pub mod style;
pub mod surface;
pub mod table;
pub mod templates;
pub mod text;

// Re-exports for convenience
pub use document::Document;
pub use error::{ForgeError, Result};
pub use pipeline::{generate_layout, generate_pdf, Compiled, PipelineConfig};
