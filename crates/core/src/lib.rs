// this_file: src/lib.rs
#![warn(
    missing_docs,
    rust_2018_idioms,
    unused_lifetimes,
    unused_qualifications
)]

//! Core minification logic for `turbomin`, a high-throughput JSON
//! minifier with three selectable execution strategies.
//!
//! [`minify`] removes insignificant whitespace outside string literals
//! from a complete, valid JSON document and returns the result
//! byte-for-byte identical regardless of which strategy ran it: the byte
//! state machine ([`StateMachine`], via [`eco::minify_eco`]) is the
//! ground truth, and the block-scan (SPORT) and parallel-chunked
//! (TURBO) strategies are fast paths constrained to agree with it
//! exactly.

use std::io::Write;

/// Byte classification and SIMD scan primitives shared by every
/// execution strategy.
pub mod classify;

/// The mode dispatcher and adaptive chunk-size tuning.
pub mod dispatch;

/// The streaming (ECO) execution strategy.
pub mod eco;

/// The error type returned by every fallible operation in this crate.
pub mod error;

/// The bounded output buffer used by streaming minification.
pub mod output_buffer;

/// The work-stealing worker pool used by TURBO.
pub mod scheduler;

/// The block/vector fast-path (SPORT) execution strategy.
pub mod sport;

/// The byte-by-byte DFA that every other strategy must agree with.
pub mod state_machine;

/// JSON-aware chunk splitting for TURBO.
pub mod chunk;

/// The parallel chunked (TURBO) execution strategy.
pub mod turbo;

/// Strict structural validation without producing output.
pub mod validate;

pub use dispatch::{AdaptiveChunker, Dispatcher, ProcessingMode};
pub use eco::{streaming_minifier, StreamingMinifier};
pub use error::{byte_to_line_col, Error, ErrorKind, LineCol, Result, Span};
pub use scheduler::{Scheduler, SchedulerConfig, VictimStrategy};
pub use sport::estimate_minified_size;
pub use state_machine::StateMachine;
pub use turbo::TurboConfig;
pub use validate::validate;

/// Minifies a complete JSON document, selecting an execution strategy
/// automatically from input size, available memory, and CPU features
/// (spec.md §4.9's policy, via [`dispatch::select_mode`]).
///
/// Equivalent to `minify_with_mode(input, None)`.
pub fn minify(input: &[u8]) -> Result<Vec<u8>> {
    minify_with_mode(input, None)
}

/// Minifies a complete JSON document, optionally pinning the execution
/// strategy instead of letting the dispatcher choose.
pub fn minify_with_mode(input: &[u8], mode: Option<ProcessingMode>) -> Result<Vec<u8>> {
    let dispatcher = Dispatcher::new();
    match mode {
        Some(mode) => dispatcher.minify_with_mode(input, mode),
        None => dispatcher.minify(input),
    }
}

/// Minifies a complete JSON document with explicit control over both the
/// execution strategy and SPORT/TURBO's trailing-comma strictness. `mode:
/// None` lets the dispatcher choose; `strict: false` accepts trailing
/// commas in the SPORT/TURBO fast paths (the CLI's `--lenient` flag).
pub fn minify_with_options(
    input: &[u8],
    mode: Option<ProcessingMode>,
    strict: bool,
) -> Result<Vec<u8>> {
    let dispatcher = Dispatcher::new();
    let mode = mode.unwrap_or_else(|| {
        dispatch::select_mode(
            input.len(),
            dispatch::available_memory(),
            classify::simd_available(),
            num_cpus::get().max(1),
        )
    });
    dispatcher.minify_with_options(input, mode, strict)
}

/// Minifies `input` and writes the result to `writer`, selecting a
/// strategy the same way [`minify`] does unless `mode` pins one.
///
/// For [`ProcessingMode::Eco`] this streams through [`StreamingMinifier`]
/// directly; other modes build the output in memory first (they already
/// require the whole document resident) and write it in one call.
pub fn minify_to_writer<W: Write>(
    input: &[u8],
    mut writer: W,
    mode: Option<ProcessingMode>,
) -> Result<()> {
    let resolved = mode.unwrap_or_else(|| {
        dispatch::select_mode(
            input.len(),
            dispatch::available_memory(),
            classify::simd_available(),
            num_cpus::get().max(1),
        )
    });
    if resolved == ProcessingMode::Eco {
        let mut minifier = StreamingMinifier::new(&mut writer);
        minifier.feed(input)?;
        minifier.flush()?;
        return Ok(());
    }
    let out = minify_with_mode(input, Some(resolved))?;
    writer.write_all(&out).map_err(Error::from)
}
