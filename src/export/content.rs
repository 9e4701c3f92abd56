//! Fetches the bytes for each side of a classified entry.

use crate::error::ExportError;
use crate::git::{Backend, ContentRef, DiffEntry, FileSide};
use std::fs;
use std::path::{Path, PathBuf};

/// Where new-side content comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentMode {
    /// New content comes from the content reference recorded in the diff
    Committed,
    /// New content is read live from the working tree, at the file the
    /// diff points to or else at the entry's own path
    WorkingTree,
}

/// Resolved bytes for one entry, keyed by relative path
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ResolvedContent {
    pub old: Option<(PathBuf, Vec<u8>)>,
    pub new: Option<(PathBuf, Vec<u8>)>,
}

pub struct ContentResolver<'a, B: ?Sized> {
    backend: &'a B,
    mode: ContentMode,
}

impl<'a, B: Backend + ?Sized> ContentResolver<'a, B> {
    pub fn new(backend: &'a B, mode: ContentMode) -> Self {
        Self { backend, mode }
    }

    /// Fetch the old side (modified, deleted, renamed) and the new side
    /// (modified, added, renamed) of `entry`. Either both succeed or the
    /// whole entry is unavailable.
    pub fn resolve(&self, entry: &DiffEntry) -> Result<ResolvedContent, ExportError> {
        let old = match entry {
            DiffEntry::Added { .. } => None,
            DiffEntry::Modified { old, .. }
            | DiffEntry::Deleted { old }
            | DiffEntry::Renamed { old, .. } => Some((old.path.clone(), self.old_bytes(old)?)),
        };
        let new = match entry {
            DiffEntry::Deleted { .. } => None,
            DiffEntry::Added { new }
            | DiffEntry::Modified { new, .. }
            | DiffEntry::Renamed { new, .. } => Some((new.path.clone(), self.new_bytes(new)?)),
        };
        Ok(ResolvedContent { old, new })
    }

    fn old_bytes(&self, side: &FileSide) -> Result<Vec<u8>, ExportError> {
        self.from_reference(side)
    }

    fn new_bytes(&self, side: &FileSide) -> Result<Vec<u8>, ExportError> {
        match (self.mode, &side.content) {
            (ContentMode::WorkingTree, Some(ContentRef::File(relative))) => {
                self.read_worktree(&side.path, relative)
            }
            // Index blobs may be stale; the working tree is what gets exported
            (ContentMode::WorkingTree, _) => self.read_worktree(&side.path, &side.path),
            (ContentMode::Committed, _) => self.from_reference(side),
        }
    }

    fn from_reference(&self, side: &FileSide) -> Result<Vec<u8>, ExportError> {
        match &side.content {
            Some(ContentRef::Blob(id)) => self
                .backend
                .read_blob(*id)
                .map_err(|e| ExportError::unavailable(side.path.to_string_lossy(), e)),
            Some(ContentRef::File(relative)) => self.read_worktree(&side.path, relative),
            None => Err(ExportError::unavailable(
                side.path.to_string_lossy(),
                "no content reference",
            )),
        }
    }

    fn read_worktree(&self, path: &Path, relative: &Path) -> Result<Vec<u8>, ExportError> {
        let root = self.backend.workdir().ok_or_else(|| {
            ExportError::unavailable(path.to_string_lossy(), "repository has no working tree")
        })?;
        fs::read(root.join(relative)).map_err(|e| ExportError::unavailable(path.to_string_lossy(), e))
    }
}
