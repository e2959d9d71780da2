//! Caller hooks for a running walk.
//!
//! This module defines the WalkHooks trait, which decouples the walker
//! from any specific UI technology (CLI, host dialog, headless run).
//! Progress reporting, conflict decisions and the external cancellation
//! query all pass through it.
//!
//! All methods are called synchronously on the walker's thread; they are
//! the only points where control yields back to the caller.

use crate::model::{Decision, Item};

/// Hooks invoked by `execute_run`.
///
/// Every method has a headless default: progress is dropped, conflicts
/// resolve to `Yes`, and no external cancellation is ever observed.
pub trait WalkHooks {
    /// Called after every item with cumulative progress.
    ///
    /// `bytes_total` is the estimate-pass upper bound; `bytes_processed`
    /// never exceeds it for a tree unchanged between the passes.
    fn on_progress(&mut self, bytes_processed: u64, bytes_total: u64) {
        let _ = (bytes_processed, bytes_total);
    }

    /// Called when the operation reports a conflict for `item` and no
    /// sticky decision has been recorded for this run.
    fn on_decision(&mut self, item: &Item) -> Decision {
        let _ = item;
        Decision::Yes
    }

    /// Polled after every item and at each directory level. Returning
    /// true cancels the rest of the run; an in-flight operation is never
    /// interrupted.
    fn cancelled(&self) -> bool {
        false
    }
}

/// Hooks that do nothing; for headless runs and tests.
pub struct NullHooks;

impl WalkHooks for NullHooks {}
