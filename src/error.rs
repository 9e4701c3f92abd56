//! Error types for the export engine.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while exporting a single revision.
#[derive(Debug, Error)]
pub enum ExportError {
    /// Revision text is neither empty nor a 40 character hex id.
    #[error("invalid revision '{revision}': expected 40 hex characters or an empty string")]
    InvalidRevision { revision: String },

    /// The backend has no commit with this id.
    #[error("revision not found: {revision}")]
    RevisionNotFound { revision: String },

    /// The commit is a root commit.
    #[error("revision {revision} has no parent commit")]
    ParentNotFound { revision: String },

    /// Content for one side of an entry could not be materialized.
    #[error("content unavailable for '{path}': {reason}")]
    ContentUnavailable { path: String, reason: String },

    /// A filesystem operation failed.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Any other failure reported by git.
    #[error("git error: {0}")]
    Backend(#[from] git2::Error),
}

impl ExportError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn unavailable(path: impl Into<String>, reason: impl fmt::Display) -> Self {
        ExportError::ContentUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Stage of the export pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Validating,
    Resolving,
    Classifying,
    Exporting,
    WritingManifest,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::Resolving => "resolving",
            Stage::Classifying => "classifying",
            Stage::Exporting => "exporting",
            Stage::WritingManifest => "writing manifest",
            Stage::Done => "done",
        };
        f.write_str(name)
    }
}

/// A failed export: which revision, at which stage, and why.
#[derive(Debug, Error)]
#[error("export of {revision} failed while {stage}: {source}")]
pub struct ExportFailure {
    pub revision: String,
    pub stage: Stage,
    #[source]
    pub source: ExportError,
}
