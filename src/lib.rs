// this_file: src/lib.rs
#![warn(missing_docs, rust_2018_idioms, unused_lifetimes, unused_qualifications)]

//! `turbomin`: a high-throughput JSON minifier.
//!
//! This crate is a thin facade over [`turbomin_core`], which holds the
//! actual byte state machine, block/vector and parallel-chunked fast
//! paths, and the mode dispatcher. See [`turbomin_core`]'s docs for the
//! full surface; the most common entry points are re-exported here.

pub use turbomin_core::{
    minify, minify_to_writer, minify_with_mode, minify_with_options, streaming_minifier, validate,
    AdaptiveChunker, Dispatcher, Error, ErrorKind, LineCol, ProcessingMode, Result,
    SchedulerConfig, StreamingMinifier, TurboConfig, VictimStrategy,
};

/// Re-exports of the individual execution strategies, for callers who
/// want to bypass the dispatcher and pin one directly.
pub mod strategies {
    pub use turbomin_core::chunk::{adaptive_chunk_size, split_chunks, ChunkRange};
    pub use turbomin_core::eco::minify_eco;
    pub use turbomin_core::sport::{estimate_minified_size, minify_lenient, minify_strict};
    pub use turbomin_core::turbo::minify_turbo;
}
