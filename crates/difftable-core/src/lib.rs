//! Difftable Core - Diff rendering with word-level highlights
//!
//! This library turns a line-tagged textual diff into numbered table rows,
//! pairing removal/insertion runs and marking the characters that changed.

pub mod chunk;
pub mod engine;
pub mod highlight;
pub mod line;
pub mod marked;
pub mod render;

pub use chunk::{Direction, OperationChunk};
pub use engine::{DiffAlgorithm, DiffChunk, DiffEngine, DiffOp};
pub use highlight::{CharToken, HighlightError, Highlighter};
pub use line::{DiffLine, LineKind, LineNumbers, Row, RowKind};
pub use marked::{Escaper, HtmlEscaper, MarkedLine, Markup, NoEscape, Span};
pub use render::{DiffRenderer, DiffTable, RenderError, RenderOptions, RenderedDiff};
