// this_file: src/dispatch.rs

//! Mode dispatcher (C9) and adaptive chunk sizing.
//!
//! Grounded in the teacher's `parallel::detect_input_type`-style decision
//! function: a small, cheap classifier run before the real work starts,
//! generalized here to the memory/CPU-feature-driven policy spec.md §4.9
//! describes instead of the teacher's structural-shape heuristic.

use std::env;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::chunk::adaptive_chunk_size;
use crate::error::Result;
use crate::scheduler::SchedulerConfig;
use crate::turbo::TurboConfig;

/// Which execution strategy processes a given `minify` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessingMode {
    /// Streaming, constant-memory (C4).
    Eco,
    /// Block/vector fast path over a complete buffer (C5).
    Sport,
    /// Chunked, work-stealing parallel (C8).
    Turbo,
}

/// Threshold below which TURBO is never selected regardless of other
/// inputs — spec.md §4.9's "`input_size >= 1 MiB`" condition.
pub const TURBO_MIN_INPUT: usize = 1024 * 1024;

/// Selects a mode from spec.md §4.9's policy:
/// - ECO when available memory is less than a tenth of the input size
///   (there isn't room to hold a second, fully-materialized copy).
/// - TURBO when the input is at least 1 MiB, more than one worker is
///   available, and the SIMD fast paths this build was compiled with are
///   actually supported by the running CPU.
/// - SPORT otherwise.
pub fn select_mode(
    input_len: usize,
    available_memory: usize,
    simd_available: bool,
    workers: usize,
) -> ProcessingMode {
    if available_memory < input_len / 10 {
        return ProcessingMode::Eco;
    }
    if input_len >= TURBO_MIN_INPUT && workers > 1 && simd_available {
        return ProcessingMode::Turbo;
    }
    ProcessingMode::Sport
}

/// Best-effort available system memory, in bytes, via `sysinfo`. Reads
/// fresh on every call — callers invoke this once per dispatch decision,
/// not in a hot loop. Falls back to `usize::MAX` (effectively "memory is
/// never the constraint") if the platform query fails, which is the
/// fail-open choice: a wrong-but-permissive answer costs throughput, not
/// correctness, since every mode produces identical output.
pub fn available_memory() -> usize {
    let mut sys = sysinfo::System::new();
    sys.refresh_memory();
    let bytes = sys.available_memory();
    if bytes == 0 {
        usize::MAX
    } else {
        usize::try_from(bytes).unwrap_or(usize::MAX)
    }
}

/// `TURBOMIN_JOBS` overrides the worker-count hint; spec.md §6 allows the
/// core to consume or ignore such a hint. An unparsable or zero value is
/// ignored, not an error.
fn worker_count_hint() -> usize {
    env::var("TURBOMIN_JOBS")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&n| n > 0)
        .unwrap_or_else(|| num_cpus::get().max(1))
}

/// `TURBOMIN_NO_SIMD=1` overrides the SIMD-availability hint to `false`
/// regardless of what the CPU actually supports.
fn simd_hint() -> bool {
    if env::var("TURBOMIN_NO_SIMD").as_deref() == Ok("1") {
        return false;
    }
    crate::classify::simd_available()
}

/// One `(chunk_size, bytes_per_sec)` throughput sample.
#[derive(Debug, Clone, Copy)]
struct Sample {
    chunk_size: usize,
    bytes_per_sec: f64,
}

/// Optional hill-climbing chunk-size tuner (spec.md §4.9's "may adjust
/// chunk size between runs"). The default dispatch path never uses this;
/// it only activates when a caller holds a [`Dispatcher`] across repeated
/// calls and opts in via [`Dispatcher::with_adaptive_chunking`].
#[derive(Debug, Default)]
pub struct AdaptiveChunker {
    samples: Mutex<Vec<Sample>>,
    step: usize,
}

impl AdaptiveChunker {
    /// Creates a tuner that nudges chunk size by `step` bytes per call.
    pub fn new(step: usize) -> Self {
        AdaptiveChunker {
            samples: Mutex::new(Vec::new()),
            step: step.max(1),
        }
    }

    /// Records a completed run's throughput and returns the next chunk
    /// size to try, climbing in whichever direction the last move helped.
    fn record_and_suggest(&self, current: usize, elapsed: Duration, bytes: usize) -> usize {
        let bytes_per_sec = if elapsed.as_secs_f64() > 0.0 {
            bytes as f64 / elapsed.as_secs_f64()
        } else {
            f64::MAX
        };
        let mut samples = self.samples.lock().unwrap_or_else(|e| e.into_inner());
        let suggestion = match samples.last() {
            Some(prev) if bytes_per_sec > prev.bytes_per_sec && current > prev.chunk_size => {
                current + self.step
            }
            Some(prev) if bytes_per_sec > prev.bytes_per_sec && current < prev.chunk_size => {
                current.saturating_sub(self.step).max(self.step)
            }
            Some(prev) if bytes_per_sec <= prev.bytes_per_sec => {
                // Last move didn't help; reverse direction.
                if current >= prev.chunk_size {
                    current.saturating_sub(self.step).max(self.step)
                } else {
                    current + self.step
                }
            }
            _ => current + self.step,
        };
        samples.push(Sample {
            chunk_size: current,
            bytes_per_sec,
        });
        suggestion
    }
}

/// Holds dispatcher-wide state (worker count, SIMD hint, optional
/// adaptive chunker) across repeated [`Dispatcher::minify`] calls.
pub struct Dispatcher {
    workers: usize,
    simd_available: bool,
    chunker: Option<AdaptiveChunker>,
    last_chunk_size: Mutex<Option<usize>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Dispatcher {
            workers: worker_count_hint(),
            simd_available: simd_hint(),
            chunker: None,
            last_chunk_size: Mutex::new(None),
        }
    }
}

impl Dispatcher {
    /// A dispatcher using the environment's worker-count/SIMD hints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables hill-climbing chunk-size adjustment across calls.
    pub fn with_adaptive_chunking(mut self, step: usize) -> Self {
        self.chunker = Some(AdaptiveChunker::new(step));
        self
    }

    /// Selects a mode for `input` and runs it, returning minified bytes.
    pub fn minify(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mode = select_mode(
            input.len(),
            available_memory(),
            self.simd_available,
            self.workers,
        );
        tracing::debug!(?mode, len = input.len(), workers = self.workers, "dispatch");
        self.minify_with_mode(input, mode)
    }

    /// Runs `input` through an explicitly chosen mode, bypassing policy,
    /// with the SPORT/TURBO fast paths in strict mode (rejecting trailing
    /// commas the way the byte state machine does).
    pub fn minify_with_mode(&self, input: &[u8], mode: ProcessingMode) -> Result<Vec<u8>> {
        self.minify_with_options(input, mode, true)
    }

    /// As [`Dispatcher::minify_with_mode`], additionally controlling
    /// whether SPORT/TURBO accept the trailing-comma leniency spec.md §9
    /// leaves as an open question. ECO is unaffected: the byte state
    /// machine enforces strict grammar regardless.
    pub fn minify_with_options(
        &self,
        input: &[u8],
        mode: ProcessingMode,
        strict: bool,
    ) -> Result<Vec<u8>> {
        match mode {
            ProcessingMode::Eco => crate::eco::minify_eco(input),
            ProcessingMode::Sport => {
                if strict {
                    crate::sport::minify_strict(input)
                } else {
                    crate::sport::minify_lenient(input)
                }
            }
            ProcessingMode::Turbo => {
                let chunk_size = self.chunk_size_for(input.len());
                let config = TurboConfig {
                    strict,
                    chunk_size: Some(chunk_size),
                    scheduler: SchedulerConfig {
                        workers: self.workers,
                        ..Default::default()
                    },
                    ..Default::default()
                };
                let start = Instant::now();
                let result = crate::turbo::minify_turbo(input, &config);
                if let (Ok(out), Some(chunker)) = (&result, &self.chunker) {
                    let next = chunker.record_and_suggest(chunk_size, start.elapsed(), out.len());
                    *self.last_chunk_size.lock().unwrap_or_else(|e| e.into_inner()) = Some(next);
                }
                result
            }
        }
    }

    fn chunk_size_for(&self, input_len: usize) -> usize {
        if let Some(size) = *self.last_chunk_size.lock().unwrap_or_else(|e| e.into_inner()) {
            return size;
        }
        adaptive_chunk_size(input_len, self.workers)
    }
}
