// this_file: src/validate.rs

//! Strict validation pre-pass (C10), used by SPORT/TURBO before their fast
//! paths run.
//!
//! This reuses [`StateMachine`] in its no-emit configuration rather than
//! duplicating the grammar: the machine already tracks exactly the state
//! a validator needs, and simply declining to copy bytes to a sink is
//! cheaper than a second, independently-maintained DFA that could drift
//! out of sync with the minifying one.

use crate::error::Result;
use crate::state_machine::StateMachine;

/// Validates that `input` is a complete, well-formed JSON document,
/// without producing any output. Returns the same error an equivalent
/// [`crate::minify`] call would return; emits nothing on success.
pub fn validate(input: &[u8]) -> Result<()> {
    validate_with_max_depth(input, crate::state_machine::DEFAULT_MAX_DEPTH)
}

/// As [`validate`], with an explicit context-stack depth bound.
pub fn validate_with_max_depth(input: &[u8], max_depth: usize) -> Result<()> {
    let mut machine = StateMachine::with_capacity(max_depth, false);
    let mut sink = NullSink;
    machine.feed(input, &mut sink)?;
    machine.flush()
}

/// An [`crate::state_machine::Emit`] sink that discards everything handed
/// to it; kept distinct from `Vec<u8>` so validation never allocates.
struct NullSink;

impl crate::state_machine::Emit for NullSink {
    fn emit(&mut self, _bytes: &[u8]) {}
}
