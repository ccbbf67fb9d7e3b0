// this_file: src/output_buffer.rs

//! Bounded write buffer with a flush-to-sink contract (C3).
//!
//! This is the only allocation ECO's working-memory guarantee depends on:
//! its capacity is fixed at construction and never grows, regardless of
//! input size.

use std::io::{self, Write};

use crate::state_machine::Emit;

/// Default capacity: 64 KiB, matching spec.md §4.3's default.
pub const DEFAULT_CAPACITY: usize = 64 * 1024;

/// A fixed-capacity byte buffer that flushes to a `Write` sink once full.
///
/// Writes larger than the buffer's capacity bypass it entirely and stream
/// straight to the sink, so no single `write_bytes` call can force an
/// over-capacity allocation.
pub struct OutputBuffer<W: Write> {
    sink: W,
    buf: Vec<u8>,
    capacity: usize,
    error: Option<io::Error>,
}

impl<W: Write> OutputBuffer<W> {
    /// Creates a buffer with [`DEFAULT_CAPACITY`].
    pub fn new(sink: W) -> Self {
        Self::with_capacity(sink, DEFAULT_CAPACITY)
    }

    /// Creates a buffer with an explicit capacity in bytes.
    pub fn with_capacity(sink: W, capacity: usize) -> Self {
        OutputBuffer {
            sink,
            buf: Vec::with_capacity(capacity),
            capacity,
            error: None,
        }
    }

    /// The buffer's fixed capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Appends a single byte, flushing first if it would overflow.
    pub fn write_byte(&mut self, b: u8) -> io::Result<()> {
        self.write_bytes(&[b])
    }

    /// Appends `bytes`, flushing first if they would overflow, and
    /// bypassing the buffer entirely for writes larger than its capacity.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.buf.len() + bytes.len() > self.capacity {
            self.flush()?;
            if bytes.len() > self.capacity {
                return self.sink.write_all(bytes);
            }
        }
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Writes any buffered bytes to the sink and resets the cursor to
    /// zero, then flushes the sink itself.
    pub fn flush(&mut self) -> io::Result<()> {
        if !self.buf.is_empty() {
            self.sink.write_all(&self.buf)?;
            self.buf.clear();
        }
        self.sink.flush()
    }

    /// Flushes and returns the wrapped sink.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.flush()?;
        Ok(self.sink)
    }

    /// Takes the first I/O error recorded by the [`Emit`] impl, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }
}

impl<W: Write> Emit for OutputBuffer<W> {
    /// [`Emit::emit`] is infallible by contract (the state machine never
    /// checks its return value), so a failed write is recorded here and
    /// surfaced the next time the caller checks [`OutputBuffer::take_error`].
    fn emit(&mut self, bytes: &[u8]) {
        if self.error.is_none() {
            if let Err(e) = self.write_bytes(bytes) {
                self.error = Some(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffers_below_capacity() {
        let mut sink = Vec::new();
        {
            let mut buf = OutputBuffer::with_capacity(&mut sink, 16);
            buf.write_bytes(b"hello").unwrap();
            // Not yet flushed: the sink hasn't seen anything.
        }
        assert_eq!(sink, b"hello");
    }

    #[test]
    fn flushes_when_capacity_would_be_exceeded() {
        let mut sink = Vec::new();
        let mut buf = OutputBuffer::with_capacity(&mut sink, 4);
        buf.write_bytes(b"ab").unwrap();
        buf.write_bytes(b"cd").unwrap(); // exactly fills to 4, no flush yet
        buf.write_bytes(b"e").unwrap(); // forces a flush of "abcd" first
        buf.flush().unwrap();
        drop(buf);
        assert_eq!(sink, b"abcde");
    }

    #[test]
    fn oversized_write_bypasses_buffer() {
        let mut sink = Vec::new();
        let mut buf = OutputBuffer::with_capacity(&mut sink, 4);
        buf.write_bytes(b"ab").unwrap();
        buf.write_bytes(b"0123456789").unwrap();
        buf.flush().unwrap();
        drop(buf);
        assert_eq!(sink, b"ab0123456789");
    }

    #[test]
    fn emit_records_io_errors() {
        struct FailingSink;
        impl Write for FailingSink {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "nope"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut buf = OutputBuffer::with_capacity(FailingSink, 1);
        buf.emit(b"xx");
        assert!(buf.take_error().is_some());
    }
}
