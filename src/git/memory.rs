//! In-memory backend for tests.

use super::backend::Backend;
use super::diff::{ContentRef, DiffEntry, FileSide};
use crate::error::ExportError;
use git2::{ObjectType, Oid};
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Default)]
pub struct MemoryBackend {
    commits: HashMap<Oid, Option<Oid>>,
    tree_diffs: HashMap<Oid, Vec<DiffEntry>>,
    blobs: HashMap<Oid, Vec<u8>>,
    pub index_view: Vec<DiffEntry>,
    pub head_view: Vec<DiffEntry>,
    pub untracked: Vec<PathBuf>,
    workdir: Option<PathBuf>,
    blob_reads: RefCell<Vec<Oid>>,
    next_commit: u64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workdir(path: impl Into<PathBuf>) -> Self {
        Self {
            workdir: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn add_commit(&mut self, parent: Option<Oid>) -> Oid {
        self.next_commit += 1;
        let id = Oid::from_str(&format!("{:040x}", self.next_commit)).unwrap();
        self.commits.insert(id, parent);
        id
    }

    pub fn add_blob(&mut self, bytes: &[u8]) -> Oid {
        let id = Oid::hash_object(ObjectType::Blob, bytes).unwrap();
        self.blobs.insert(id, bytes.to_vec());
        id
    }

    /// A side whose content is a freshly stored blob
    pub fn blob_side(&mut self, path: &str, bytes: &[u8]) -> FileSide {
        let id = self.add_blob(bytes);
        FileSide::new(path, Some(ContentRef::Blob(id)))
    }

    pub fn set_tree_diff(&mut self, commit: Oid, entries: Vec<DiffEntry>) {
        self.tree_diffs.insert(commit, entries);
    }

    pub fn blob_reads(&self) -> Vec<Oid> {
        self.blob_reads.borrow().clone()
    }
}

impl Backend for MemoryBackend {
    fn workdir(&self) -> Option<&Path> {
        self.workdir.as_deref()
    }

    fn lookup_commit(&self, id: Oid) -> Result<Oid, ExportError> {
        if self.commits.contains_key(&id) {
            Ok(id)
        } else {
            Err(ExportError::RevisionNotFound {
                revision: id.to_string(),
            })
        }
    }

    fn parent_of(&self, commit: Oid) -> Result<Oid, ExportError> {
        self.commits
            .get(&commit)
            .copied()
            .flatten()
            .ok_or_else(|| ExportError::ParentNotFound {
                revision: commit.to_string(),
            })
    }

    fn diff_tree_to_parent(&self, commit: Oid, _parent: Oid) -> Result<Vec<DiffEntry>, ExportError> {
        Ok(self.tree_diffs.get(&commit).cloned().unwrap_or_default())
    }

    fn diff_index_to_worktree_or_head(&self) -> Result<Vec<DiffEntry>, ExportError> {
        Ok(self.index_view.clone())
    }

    fn diff_head_to_worktree(&self) -> Result<Vec<DiffEntry>, ExportError> {
        Ok(self.head_view.clone())
    }

    fn list_untracked_paths(&self) -> Result<Vec<PathBuf>, ExportError> {
        Ok(self.untracked.clone())
    }

    fn read_blob(&self, blob: Oid) -> Result<Vec<u8>, ExportError> {
        self.blob_reads.borrow_mut().push(blob);
        self.blobs
            .get(&blob)
            .cloned()
            .ok_or_else(|| ExportError::unavailable(blob.to_string(), "blob missing"))
    }
}
