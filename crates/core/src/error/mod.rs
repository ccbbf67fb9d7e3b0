// this_file: src/error/mod.rs

//! Error handling for the minifier and its parallel execution strategies.
//!
//! The taxonomy is intentionally small: every variant names the JSON
//! production it violates or the resource/concurrency limit it hit, and
//! carries enough position information for a caller to build a
//! line/column diagnostic without re-scanning the input itself.

/// Result type alias for convenience.
pub mod result;
/// Byte-span and line/column tracking for error reporting.
pub mod span;
/// Error type definitions and implementations.
pub mod types;

pub use result::Result;
pub use span::{byte_to_line_col, LineCol, Span};
pub use types::{Error, ErrorKind};
