// this_file: src/eco.rs

//! ECO: the streaming, constant-memory execution strategy (C4).
//!
//! Wraps [`StateMachine`] (C2) and [`OutputBuffer`] (C3). Working memory
//! is the output buffer's capacity plus the machine's bounded context
//! stack and scalar fields — independent of input size, which is the
//! whole point of this mode.

use std::io::Write;

use crate::error::Result;
use crate::output_buffer::{OutputBuffer, DEFAULT_CAPACITY};
use crate::state_machine::StateMachine;

/// A handle returned by [`crate::streaming_minifier`]. Feed it bytes as
/// they arrive; call [`StreamingMinifier::flush`] once, at end of input.
pub struct StreamingMinifier<W: Write> {
    machine: StateMachine,
    buffer: OutputBuffer<W>,
}

impl<W: Write> StreamingMinifier<W> {
    /// Creates a minifier writing to `writer`, with [`DEFAULT_CAPACITY`]
    /// of output buffering.
    pub fn new(writer: W) -> Self {
        Self::with_capacity(writer, DEFAULT_CAPACITY)
    }

    /// As [`StreamingMinifier::new`], with an explicit output buffer size.
    pub fn with_capacity(writer: W, capacity: usize) -> Self {
        StreamingMinifier {
            machine: StateMachine::new(),
            buffer: OutputBuffer::with_capacity(writer, capacity),
        }
    }

    /// Feeds one batch of input bytes. Output lags by at most one atomic
    /// token (a string, number, or literal spanning a batch boundary is
    /// held until its terminator arrives in a later batch or `flush`).
    pub fn feed(&mut self, bytes: &[u8]) -> Result<()> {
        self.machine.feed(bytes, &mut self.buffer)?;
        self.check_io_error()
    }

    /// Signals end of input. Fails with `UnexpectedEndOfInput` if the
    /// document was left incomplete; otherwise drains the output buffer.
    pub fn flush(&mut self) -> Result<()> {
        self.machine.flush()?;
        self.buffer.flush().map_err(crate::error::Error::from)?;
        self.check_io_error()
    }

    fn check_io_error(&mut self) -> Result<()> {
        match self.buffer.take_error() {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

/// Creates a [`StreamingMinifier`] writing minified bytes to `writer`.
pub fn streaming_minifier<W: Write>(writer: W) -> StreamingMinifier<W> {
    StreamingMinifier::new(writer)
}

/// One-shot ECO minification directly into an owned `Vec<u8>`, used by
/// [`crate::minify`] when no external writer is involved. Bypasses
/// [`OutputBuffer`] — an in-memory `Vec` has no flush boundary to honor —
/// but still runs through the same [`StateMachine`] oracle.
pub fn minify_eco(input: &[u8]) -> Result<Vec<u8>> {
    let mut machine = StateMachine::new();
    let mut out = Vec::with_capacity(input.len());
    machine.feed(input, &mut out)?;
    machine.flush()?;
    Ok(out)
}
