// this_file: src/error/types.rs

//! The error taxonomy returned by every public operation.

use std::fmt;

use super::span::{byte_to_line_col, LineCol};

/// The stable, matchable kind of a [`Error`], independent of its position
/// payload. Mirrors the abstract `MinifyError` enumeration: syntactic
/// errors name the violated production, structural/resource/concurrency
/// errors name the limit that was hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A byte sequence that does not match any JSON production at the
    /// current parser state (e.g. a stray value terminator, an unexpected
    /// top-level byte).
    InvalidJson,
    /// Input ended while the parser was in a non-terminal state.
    UnexpectedEndOfInput,
    /// A `\` inside a string was followed by a byte other than
    /// `"\/bfnrtu`.
    InvalidEscapeSequence,
    /// A malformed number literal.
    InvalidNumber,
    /// A `\u` escape not followed by exactly four hex digits.
    InvalidUnicodeEscape,
    /// The context stack would exceed its configured depth.
    NestingTooDeep,
    /// A raw control byte (`< 0x20`) appeared inside a string literal.
    UnescapedControlCharacter,
    /// An allocation or buffer bound could not be satisfied.
    OutOfMemory,
    /// A coordinator-level wait exceeded its deadline.
    Timeout,
    /// Writing to the caller-supplied sink failed. Not part of the
    /// abstract `MinifyError` enumeration in spec.md (the core's wire
    /// contract is I/O-free by design), but `minify_to_writer` and the
    /// streaming API hand a `Write` impl to the output buffer, and that
    /// write can fail (full disk, broken pipe); callers match on this
    /// the same way as any other kind.
    Io,
}

impl ErrorKind {
    /// A short, stable, machine-matchable identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidJson => "InvalidJson",
            ErrorKind::UnexpectedEndOfInput => "UnexpectedEndOfInput",
            ErrorKind::InvalidEscapeSequence => "InvalidEscapeSequence",
            ErrorKind::InvalidNumber => "InvalidNumber",
            ErrorKind::InvalidUnicodeEscape => "InvalidUnicodeEscape",
            ErrorKind::NestingTooDeep => "NestingTooDeep",
            ErrorKind::UnescapedControlCharacter => "UnescapedControlCharacter",
            ErrorKind::OutOfMemory => "OutOfMemory",
            ErrorKind::Timeout => "Timeout",
            ErrorKind::Io => "Io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error type returned by every fallible operation in this crate.
///
/// Every syntactic variant carries the byte offset at which the
/// violation was detected, so callers can recover a [`LineCol`] without
/// the crate re-scanning the input itself.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed JSON at `position`.
    #[error("invalid JSON at byte {position}")]
    InvalidJson {
        /// Byte offset of the offending byte.
        position: usize,
    },

    /// The input ended while the parser was mid-token.
    #[error("unexpected end of input")]
    UnexpectedEndOfInput {
        /// Byte offset one past the last byte consumed.
        position: usize,
    },

    /// A `\` inside a string was followed by an invalid escape byte.
    #[error("invalid escape sequence at byte {position}")]
    InvalidEscapeSequence {
        /// Byte offset of the `\`.
        position: usize,
    },

    /// A malformed number literal.
    #[error("invalid number at byte {position}")]
    InvalidNumber {
        /// Byte offset where the number began.
        position: usize,
    },

    /// A `\u` escape not followed by exactly four hex digits.
    #[error("invalid unicode escape at byte {position}")]
    InvalidUnicodeEscape {
        /// Byte offset of the `\u`.
        position: usize,
    },

    /// The context stack would exceed its configured depth.
    #[error("nesting too deep at byte {position}")]
    NestingTooDeep {
        /// Byte offset of the container open that would overflow the stack.
        position: usize,
    },

    /// A raw control byte appeared inside a string literal.
    #[error("unescaped control character at byte {position}")]
    UnescapedControlCharacter {
        /// Byte offset of the control byte.
        position: usize,
    },

    /// An allocation or buffer bound could not be satisfied.
    #[error("out of memory")]
    OutOfMemory,

    /// A coordinator-level wait exceeded its deadline.
    #[error("operation timed out")]
    Timeout,

    /// A TURBO worker's wait for chunk completion exceeded the configured
    /// deadline even after a final counter re-check.
    #[error("timed out waiting for {pending} pending chunk(s) to complete")]
    TimeoutWaitingForCompletion {
        /// Number of chunks still outstanding at the deadline.
        pending: usize,
    },

    /// The caller-supplied sink returned an I/O error.
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl Error {
    /// The stable kind of this error, for programmatic matching.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidJson { .. } => ErrorKind::InvalidJson,
            Error::UnexpectedEndOfInput { .. } => ErrorKind::UnexpectedEndOfInput,
            Error::InvalidEscapeSequence { .. } => ErrorKind::InvalidEscapeSequence,
            Error::InvalidNumber { .. } => ErrorKind::InvalidNumber,
            Error::InvalidUnicodeEscape { .. } => ErrorKind::InvalidUnicodeEscape,
            Error::NestingTooDeep { .. } => ErrorKind::NestingTooDeep,
            Error::UnescapedControlCharacter { .. } => ErrorKind::UnescapedControlCharacter,
            Error::OutOfMemory => ErrorKind::OutOfMemory,
            Error::Timeout | Error::TimeoutWaitingForCompletion { .. } => ErrorKind::Timeout,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// The byte offset this error was detected at, when one exists.
    ///
    /// Resource and concurrency errors have no single offending byte and
    /// return `None`.
    pub fn position(&self) -> Option<usize> {
        match self {
            Error::InvalidJson { position }
            | Error::UnexpectedEndOfInput { position }
            | Error::InvalidEscapeSequence { position }
            | Error::InvalidNumber { position }
            | Error::InvalidUnicodeEscape { position }
            | Error::NestingTooDeep { position }
            | Error::UnescapedControlCharacter { position } => Some(*position),
            Error::OutOfMemory
            | Error::Timeout
            | Error::TimeoutWaitingForCompletion { .. }
            | Error::Io(_) => None,
        }
    }

    /// The 1-based line/column of [`Error::position`], resolved against
    /// `input`.
    pub fn line_col(&self, input: &[u8]) -> Option<LineCol> {
        self.position().map(|pos| byte_to_line_col(input, pos))
    }
}
