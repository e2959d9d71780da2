//! Core data model for batch walk runs.
//!
//! This module defines the main data structures for representing a walk:
//! - BatchRun: one two-pass walk over a set of root items
//! - Item, SubPath: a single enumerated file or directory and its location
//! - RunState, RunSummary: per-run counters and the final report
//! - Phase, Decision, OperationResult: enums controlling behavior

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use serde::Serialize;
use uuid::Uuid;
use crate::mask::MaskGroup;

/// A parent-relative path built from ordered name segments.
///
/// Replaces ad-hoc string concatenation of path fragments: segments are
/// joined through `join`/`to_path`, so leading and trailing separators
/// cannot leak into the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubPath {
    segments: Vec<String>,
}

impl SubPath {
    /// The empty path, addressing the walk's source root itself.
    pub fn root() -> Self {
        SubPath { segments: Vec::new() }
    }

    /// Returns a new path with one more segment appended.
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        SubPath { segments }
    }

    /// Appends one segment in place.
    pub fn push(&mut self, segment: &str) {
        self.segments.push(segment.to_string());
    }

    /// True for the source root itself.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Resolves this path against a base directory.
    pub fn join(&self, base: &Path) -> PathBuf {
        let mut out = base.to_path_buf();
        for segment in &self.segments {
            out.push(segment);
        }
        out
    }

    /// This path as a relative `PathBuf` (empty for the root).
    pub fn to_path(&self) -> PathBuf {
        self.join(Path::new(""))
    }
}

impl fmt::Display for SubPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, ".");
        }
        write!(f, "{}", self.segments.join("/"))
    }
}

/// Kind of an enumerated item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    File,
    Directory,
}

/// A single file or directory as seen by the walker.
#[derive(Debug, Clone)]
pub struct Item {
    /// Plain name, no separators
    pub name: String,

    /// Path of the containing directory, relative to the walk's source root
    pub parent: SubPath,

    /// Size in bytes (0 for directories)
    pub size_bytes: u64,

    pub kind: ItemKind,
}

impl Item {
    /// Full sub-path of this item (parent plus name).
    pub fn sub_path(&self) -> SubPath {
        self.parent.child(&self.name)
    }
}

/// Ordered root items plus the validated name mask.
///
/// Roots are names of top-level entries under the walk's source directory
/// (the selection in the original scripts). The mask is validated at
/// construction; an invalid mask never reaches the walk itself.
#[derive(Debug, Clone)]
pub struct WalkRequest {
    pub roots: Vec<String>,
    pub mask: MaskGroup,
}

/// A user or caller decision at a conflict point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Process this item
    Yes,
    /// Process this item and all later conflicting items without asking
    YesToAll,
    /// Skip this item
    Skip,
    /// Skip this item and all later conflicting items without asking
    SkipAll,
    /// Abort the rest of the run
    Cancel,
}

/// Outcome of applying an operation to one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    Success,
    Skipped,
    Failed(String),
    /// The operation itself requested cancellation of the run
    Cancelled,
}

/// Sticky decision recorded for the remainder of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StickyDecision {
    YesToAll,
    SkipAll,
}

/// Mutable counters owned by a single run.
///
/// Created fresh when execution starts and discarded once the summary has
/// been produced; no state leaks between runs.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    /// Upper bound from the estimate pass
    pub bytes_total: u64,

    /// Bytes accounted for so far (processed, skipped and failed items)
    pub bytes_processed: u64,

    pub items_processed: u64,
    pub items_skipped: u64,
    pub error_count: u64,

    /// Set by a Cancel decision or the external cancellation query
    pub cancelled: bool,

    /// YesToAll/SkipAll once given, None until then
    pub sticky: Option<StickyDecision>,
}

impl RunState {
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            items_processed: self.items_processed,
            items_skipped: self.items_skipped,
            error_count: self.error_count,
            bytes_processed: self.bytes_processed,
            bytes_total: self.bytes_total,
            cancelled: self.cancelled,
        }
    }
}

/// Final report of one run; every matched item is accounted for in
/// exactly one of the three counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub items_processed: u64,
    pub items_skipped: u64,
    pub error_count: u64,
    pub bytes_processed: u64,
    pub bytes_total: u64,
    pub cancelled: bool,
}

/// Totals produced by the first pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Estimate {
    /// Number of files matched by the mask
    pub item_count: u64,
    /// Sum of sizes of the matched files
    pub total_bytes: u64,
}

/// Lifecycle of a run.
///
/// The only state machine in the engine: Idle -> Estimating -> Executing
/// -> Done | Cancelled. Both terminal phases yield a RunSummary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Created, or estimated and waiting for execution
    Idle,
    /// First pass in progress
    Estimating,
    /// Second pass in progress
    Executing,
    /// All matched items processed
    Done,
    /// Run aborted by a decision or the external cancellation signal
    Cancelled,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "Idle"),
            Phase::Estimating => write!(f, "Estimating"),
            Phase::Executing => write!(f, "Executing"),
            Phase::Done => write!(f, "Done"),
            Phase::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// One two-pass batch walk.
///
/// Holds the request, the lifecycle phase, the estimate recorded by the
/// first pass and the counters of the second.
#[derive(Debug)]
pub struct BatchRun {
    /// Unique identifier for this run (appears in log lines)
    pub id: Uuid,

    pub request: WalkRequest,

    pub phase: Phase,

    /// Totals from the estimate pass; None until it has run
    pub estimate: Option<Estimate>,

    /// Counters of the execution pass
    pub state: RunState,

    pub created_at: SystemTime,

    /// When execution started
    pub start_time: Option<SystemTime>,

    /// When execution finished (Done or Cancelled)
    pub end_time: Option<SystemTime>,
}
