//! Version-control capability consumed by the export engine.
//!
//! ```text
//! export::{classify, content}
//!            |
//!            v
//!      Backend (trait)
//!            |
//!            v
//!   git::Repository (git2)
//! ```

use super::diff::DiffEntry;
use crate::error::ExportError;
use git2::Oid;
use std::path::{Path, PathBuf};

/// Read-only queries the export engine needs from a repository.
///
/// All calls block. Implementations are used from a single thread; each
/// export task owns its own backend.
pub trait Backend {
    /// Root of the working tree, if the repository has one.
    fn workdir(&self) -> Option<&Path>;

    /// Find a commit by id.
    ///
    /// # Errors
    ///
    /// `RevisionNotFound` if no such commit exists.
    fn lookup_commit(&self, id: Oid) -> Result<Oid, ExportError>;

    /// First parent of `commit`.
    ///
    /// # Errors
    ///
    /// `ParentNotFound` for a root commit.
    fn parent_of(&self, commit: Oid) -> Result<Oid, ExportError>;

    /// Tree diff from `parent` to `commit`, renames detected.
    fn diff_tree_to_parent(&self, commit: Oid, parent: Oid) -> Result<Vec<DiffEntry>, ExportError>;

    /// Staged and unstaged changes relative to HEAD. Change kinds are
    /// accurate; content references are not provided.
    fn diff_index_to_worktree_or_head(&self) -> Result<Vec<DiffEntry>, ExportError>;

    /// HEAD tree against the working tree (through the index). Content
    /// references are provided; renames are not detected.
    fn diff_head_to_worktree(&self) -> Result<Vec<DiffEntry>, ExportError>;

    /// Untracked paths, relative to the working tree root. May include
    /// directories.
    fn list_untracked_paths(&self) -> Result<Vec<PathBuf>, ExportError>;

    /// Full content of a blob.
    ///
    /// # Errors
    ///
    /// `ContentUnavailable` if the object cannot be read.
    fn read_blob(&self, blob: Oid) -> Result<Vec<u8>, ExportError>;
}
