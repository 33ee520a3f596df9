//! Core shared types for jrewrite.
//!
//! Byte-offset text ranges, line/column lookup and text edits. The parser
//! records spans with these types and the printer turns model changes into
//! [`TextEdit`]s over the original source.

mod edit;
mod text;

pub use edit::{apply_text_edits, normalize_text_edits, EditError, TextEdit};
pub use text::{range_of, LineCol, LineIndex, TextRange, TextSize};
