//! # batchwalk engine - Two-Pass Batch Walk Library
//!
//! A reusable directory-walk-and-batch-operate engine, generalized from a
//! family of file-manager automation scripts (image conversion, archive
//! unpacking, line counting, CSV listing).
//!
//! ## Overview
//!
//! Every walk is two passes over the same tree: an estimate pass that
//! counts the files matched by a name mask and sums their sizes, and an
//! execution pass that applies a caller-supplied operation to each match.
//! The engine features:
//! - Recursive enumeration with a stable shape across both passes
//!   (subdirectories depth-first before files, native order)
//! - Case-insensitive multi-pattern name masks with an invert prefix
//! - Per-item error isolation: operation failures are counted and logged,
//!   never fatal to the run
//! - A uniform conflict policy (Yes / YesToAll / Skip / SkipAll / Cancel)
//!   with sticky all-decisions per run
//! - Cooperative, polled cancellation
//! - Progress, decisions and logging decoupled behind collaborator traits
//!
//! ## Basic Usage
//!
//! ```no_run
//! use engine::{create_run, estimate_run, execute_run};
//! use engine::{LocalDirSource, LineCountOp, NullHooks, NullLog};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let source = LocalDirSource::new("/data/photos");
//! let mut run = create_run(&source, vec!["album".to_string()], "*.jpg;*.png")?;
//!
//! // Pass 1: count matches and total bytes
//! let estimate = estimate_run(&mut run, &source)?;
//! println!("{} file(s), {} byte(s)", estimate.item_count, estimate.total_bytes);
//!
//! // Pass 2: apply an operation with progress and conflict hooks
//! let mut op = LineCountOp::new("/data/photos");
//! let summary = execute_run(&mut run, &source, &mut op, &mut NullHooks, &mut NullLog)?;
//! println!("{} processed, {} failed", summary.items_processed, summary.error_count);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - **model**: Core data structures (BatchRun, Item, SubPath, enums)
//! - **error**: Error types and handling
//! - **mask**: Name-mask parsing and matching
//! - **fs**: Directory enumeration trait and local implementation
//! - **walker**: Run orchestration (create, estimate, execute)
//! - **hooks**: Progress/decision/cancellation hooks
//! - **logsink**: Line-oriented log sinks
//! - **exec**: External process invocation
//! - **ops**: Built-in operations (external tool, line count, CSV list)

pub mod model;
pub mod error;
pub mod mask;
pub mod fs;
pub mod walker;
pub mod hooks;
pub mod logsink;
pub mod exec;
pub mod ops;

// Re-export main types and functions
pub use model::{
    BatchRun, Decision, Estimate, Item, ItemKind, OperationResult, Phase, RunState, RunSummary,
    StickyDecision, SubPath, WalkRequest,
};
pub use error::WalkerError;
pub use mask::MaskGroup;
pub use fs::{DirSource, FsEntry, LocalDirSource};
pub use walker::{create_run, estimate_run, execute_run, Operation};
pub use hooks::{NullHooks, WalkHooks};
pub use logsink::{FileLog, LogSink, MemoryLog, NullLog};
pub use exec::{ProcessInvoker, SystemInvoker};
pub use ops::{CsvListOp, ExternalToolOp, LineCountOp, ARG_IN, ARG_OUT};
