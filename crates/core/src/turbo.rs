// this_file: src/turbo.rs

//! TURBO: the parallel chunked execution strategy (C8).
//!
//! Splits a complete, already-validated document into byte ranges with
//! [`crate::chunk::split_chunks`] (C6), minifies each range independently
//! with SPORT's lenient block scan (C5) on [`crate::scheduler::Scheduler`]'s
//! worker pool (C7), then reassembles the output by concatenating chunk
//! results in input order. No chunk is independently-balanced JSON, so
//! merging is byte concatenation, not a second parse.
//!
//! Grounded in the teacher's `parallel_chunked::{parse_parallel_chunked,
//! ChunkedProcessor::merge_results}` for the overall split/dispatch/merge
//! shape, re-pointed at this crate's scheduler instead of `rayon` (see
//! DESIGN.md Open Question OQ-1).

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::chunk::{adaptive_chunk_size, split_chunks};
use crate::error::{Error, Result};
use crate::scheduler::{Scheduler, SchedulerConfig};

/// Default wall-clock budget a TURBO run waits for all chunks to finish
/// before giving up with [`Error::TimeoutWaitingForCompletion`].
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// Tuning knobs for [`minify_turbo`].
#[derive(Debug, Clone)]
pub struct TurboConfig {
    /// Validate the whole document up front (C10) before chunking. When
    /// `false`, malformed input may still surface an error from a
    /// per-chunk scan (an unterminated string at end of input, say), but
    /// grammar errors further from a chunk boundary can slip through —
    /// mirrors SPORT's strict/lenient split.
    pub strict: bool,
    /// Explicit chunk target size; `None` asks [`adaptive_chunk_size`] to
    /// pick one from input length and worker count.
    pub chunk_size: Option<usize>,
    /// How far a chunk boundary search may overshoot the target before
    /// it stops refusing unsafe cuts.
    pub overshoot: usize,
    /// Worker pool configuration.
    pub scheduler: SchedulerConfig,
    /// How long to wait for all chunks to complete before timing out.
    pub deadline: Duration,
}

impl Default for TurboConfig {
    fn default() -> Self {
        TurboConfig {
            strict: true,
            chunk_size: None,
            overshoot: crate::chunk::DEFAULT_OVERSHOOT,
            scheduler: SchedulerConfig::default(),
            deadline: DEFAULT_DEADLINE,
        }
    }
}

/// Minifies `input` using the TURBO parallel strategy.
pub fn minify_turbo(input: &[u8], config: &TurboConfig) -> Result<Vec<u8>> {
    if config.strict {
        crate::validate::validate(input)?;
    }
    if input.is_empty() {
        return Ok(Vec::new());
    }

    let chunk_size = config
        .chunk_size
        .unwrap_or_else(|| adaptive_chunk_size(input.len(), config.scheduler.workers));
    let ranges = split_chunks(input, chunk_size, config.overshoot);

    if ranges.len() <= 1 {
        // Not enough work to justify a thread pool; run inline.
        return ranges
            .first()
            .map(|r| crate::sport::minify_lenient(r.slice(input)))
            .unwrap_or(Ok(Vec::new()));
    }

    tracing::debug!(chunks = ranges.len(), chunk_size, "turbo split");

    let results: Arc<Vec<Mutex<Option<Result<Vec<u8>>>>>> =
        Arc::new((0..ranges.len()).map(|_| Mutex::new(None)).collect());

    let scheduler = Scheduler::start(config.scheduler.clone());
    for range in &ranges {
        let slot = Arc::clone(&results);
        let idx = range.id as usize;
        // Each chunk is an owned copy so the job outlives the borrow of
        // `input` inside this function's stack frame.
        let bytes = range.slice(input).to_vec();
        scheduler.submit_blocking(Box::new(move || {
            let out = crate::sport::minify_lenient(&bytes);
            *slot[idx].lock().unwrap_or_else(|e| e.into_inner()) = Some(out);
        }));
    }

    let wait_result = scheduler.wait_for_completion(ranges.len(), config.deadline);
    scheduler.stop();

    if let Err(pending) = wait_result {
        return Err(Error::TimeoutWaitingForCompletion { pending });
    }

    let mut out = Vec::with_capacity(input.len());
    for slot in results.iter() {
        let mut guard = slot.lock().unwrap_or_else(|e| e.into_inner());
        match guard.take() {
            Some(Ok(bytes)) => out.extend_from_slice(&bytes),
            Some(Err(e)) => return Err(e),
            None => {
                // wait_for_completion already confirmed every slot ran.
                unreachable!("chunk result missing after completion barrier")
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(workers: usize) -> TurboConfig {
        TurboConfig {
            scheduler: SchedulerConfig {
                workers,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn matches_eco_output_for_large_input() {
        let mut s = String::from("[");
        for i in 0..5000 {
            if i > 0 {
                s.push(',');
            }
            s.push_str(&format!(r#"{{"id": {i}, "name": "item {i}", "ok": true}}"#));
        }
        s.push(']');
        let input = s.as_bytes();

        let expected = crate::eco::minify_eco(input).unwrap();
        let actual = minify_turbo(input, &config(4)).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn small_input_runs_inline() {
        let input = br#"{"a":1}"#;
        assert_eq!(minify_turbo(input, &config(4)).unwrap(), input.to_vec());
    }

    #[test]
    fn strict_mode_rejects_invalid_json() {
        assert!(minify_turbo(br#"{"a":}"#, &config(2)).is_err());
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(minify_turbo(b"", &config(2)).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn small_chunk_size_forces_many_workers_to_cooperate() {
        let input = br#"[1,2,3,4,5,6,7,8,9,10,11,12,13,14,15,16,17,18,19,20]"#;
        let mut cfg = config(4);
        cfg.chunk_size = Some(4);
        let expected = crate::eco::minify_eco(input).unwrap();
        assert_eq!(minify_turbo(input, &cfg).unwrap(), expected);
    }
}
