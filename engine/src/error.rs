//! Error types for the walk engine.
//!
//! The primary error type is `WalkerError`, which represents structural
//! errors that prevent a run from starting or abort the estimate pass.
//! Item-level failures are never surfaced as WalkerError: they are counted
//! in RunState, written to the log sink and reported by the RunSummary.

use std::fmt::{Display, self};
use std::path::PathBuf;
use std::io;
use std::error::Error;

use crate::model::Phase;

/// Structural errors of a batch walk.
///
/// Everything here aborts the whole operation: an invalid request never
/// starts a walk, and a directory-read failure aborts the estimate pass.
/// Per-item operation failures during execution stay in the run counters.
#[derive(Debug)]
pub enum WalkerError {
    /// A root item named in the request does not exist under the source
    RootNotFound { root: String },

    /// Directory metadata unreadable during the estimate pass
    DirectoryRead { path: PathBuf, source: io::Error },

    /// Mask string failed to validate; position is a character index
    InvalidMask { mask: String, position: usize },

    /// Run used out of lifecycle order (e.g., executed before estimating)
    WrongPhase { expected: Phase, actual: Phase },
}

impl Display for WalkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootNotFound { root } => {
                write!(f, "Root item not found: {}", root)
            }
            Self::DirectoryRead { path, source } => {
                write!(f, "Failed to read directory: {} ({})", path.display(), source)
            }
            Self::InvalidMask { mask, position } => {
                write!(f, "Invalid mask \"{}\" at position {}", mask, position)
            }
            Self::WrongPhase { expected, actual } => {
                write!(f, "Run is in phase {} but {} was required", actual, expected)
            }
        }
    }
}

impl Error for WalkerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::DirectoryRead { source, .. } => Some(source),
            _ => None,
        }
    }
}
