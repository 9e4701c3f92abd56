use super::backend::Backend;
use super::diff::{ChangeKind, ContentRef, DiffEntry, FileSide};
use crate::error::ExportError;
use git2::{
    Delta, DiffDelta, DiffFile, DiffFindOptions, DiffOptions, ErrorCode, Oid,
    Repository as Git2Repo, Status, StatusOptions, Tree,
};
use std::path::{Path, PathBuf};

pub struct Repository {
    repo: Git2Repo,
}

impl Repository {
    /// Open the repository whose root is `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ExportError> {
        let repo = Git2Repo::open(path.as_ref())?;
        Ok(Self { repo })
    }

    /// Tree of the HEAD commit, or `None` on an unborn branch
    fn head_tree(&self) -> Result<Option<Tree<'_>>, ExportError> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_tree()?)),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl Backend for Repository {
    fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    fn lookup_commit(&self, id: Oid) -> Result<Oid, ExportError> {
        let commit = self
            .repo
            .find_commit(id)
            .map_err(|_| ExportError::RevisionNotFound {
                revision: id.to_string(),
            })?;
        Ok(commit.id())
    }

    fn parent_of(&self, commit: Oid) -> Result<Oid, ExportError> {
        let commit = self.repo.find_commit(commit)?;
        commit
            .parent_id(0)
            .map_err(|_| ExportError::ParentNotFound {
                revision: commit.id().to_string(),
            })
    }

    fn diff_tree_to_parent(&self, commit: Oid, parent: Oid) -> Result<Vec<DiffEntry>, ExportError> {
        let new_tree = self.repo.find_commit(commit)?.tree()?;
        let old_tree = self.repo.find_commit(parent)?.tree()?;

        let mut diff = self
            .repo
            .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), None)?;
        let mut find = DiffFindOptions::new();
        find.renames(true);
        diff.find_similar(Some(&mut find))?;

        Ok(diff
            .deltas()
            .filter_map(|delta| entry_from_delta(&delta, NewContent::Blob))
            .collect())
    }

    fn diff_index_to_worktree_or_head(&self) -> Result<Vec<DiffEntry>, ExportError> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(false)
            .include_ignored(false)
            .renames_head_to_index(true);
        let statuses = self.repo.statuses(Some(&mut opts))?;

        let mut entries = Vec::new();
        for status in statuses.iter() {
            let Some(kind) = kind_from_status(status.status()) else {
                continue;
            };
            let path = path_from_bytes(status.path_bytes());

            // Staged renames report both paths on the head-to-index delta
            let (old_path, new_path) = match status.head_to_index() {
                Some(delta) if delta.status() == Delta::Renamed => (
                    delta_path(&delta.old_file()).unwrap_or_else(|| path.clone()),
                    delta_path(&delta.new_file()).unwrap_or_else(|| path.clone()),
                ),
                _ => (path.clone(), path),
            };

            let entry = DiffEntry::from_parts(
                kind,
                Some(FileSide::new(old_path, None)),
                Some(FileSide::new(new_path, None)),
            );
            entries.extend(entry);
        }
        Ok(entries)
    }

    fn diff_head_to_worktree(&self) -> Result<Vec<DiffEntry>, ExportError> {
        let head_tree = self.head_tree()?;
        let mut opts = DiffOptions::new();
        opts.include_untracked(false);

        let diff = self
            .repo
            .diff_tree_to_workdir_with_index(head_tree.as_ref(), Some(&mut opts))?;

        Ok(diff
            .deltas()
            .filter_map(|delta| entry_from_delta(&delta, NewContent::Worktree))
            .collect())
    }

    fn list_untracked_paths(&self) -> Result<Vec<PathBuf>, ExportError> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut opts))?;

        Ok(statuses
            .iter()
            .filter(|s| s.status().contains(Status::WT_NEW))
            .map(|s| path_from_bytes(s.path_bytes()))
            .collect())
    }

    fn read_blob(&self, blob: Oid) -> Result<Vec<u8>, ExportError> {
        let blob = self
            .repo
            .find_blob(blob)
            .map_err(|e| ExportError::unavailable(blob.to_string(), e.message()))?;
        Ok(blob.content().to_vec())
    }
}

/// Where the new side of a delta is read from
#[derive(Clone, Copy)]
enum NewContent {
    Blob,
    Worktree,
}

fn delta_path(file: &DiffFile<'_>) -> Option<PathBuf> {
    file.path_bytes().map(path_from_bytes)
}

/// Git stores paths as raw bytes; keep them intact where the platform allows
#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

fn blob_side(file: &DiffFile<'_>) -> Option<FileSide> {
    let path = delta_path(file)?;
    let content = (file.exists() && !file.id().is_zero()).then(|| ContentRef::Blob(file.id()));
    Some(FileSide::new(path, content))
}

fn entry_from_delta(delta: &DiffDelta<'_>, new_content: NewContent) -> Option<DiffEntry> {
    let kind = ChangeKind::from_delta(delta.status())?;
    let old = blob_side(&delta.old_file());
    let new = match new_content {
        NewContent::Blob => blob_side(&delta.new_file()),
        NewContent::Worktree => delta_path(&delta.new_file()).map(|path| {
            let content = (kind != ChangeKind::Deleted).then(|| ContentRef::File(path.clone()));
            FileSide::new(path, content)
        }),
    };
    DiffEntry::from_parts(kind, old, new)
}

/// Combined change kind of a path relative to HEAD
fn kind_from_status(status: Status) -> Option<ChangeKind> {
    if status.contains(Status::INDEX_NEW) {
        // Staged then removed from disk: nothing changed relative to HEAD
        return (!status.contains(Status::WT_DELETED)).then_some(ChangeKind::Added);
    }
    if status.intersects(Status::INDEX_RENAMED | Status::WT_RENAMED) {
        return Some(ChangeKind::Renamed);
    }
    if status.intersects(Status::INDEX_DELETED | Status::WT_DELETED) {
        return Some(ChangeKind::Deleted);
    }
    if status.intersects(
        Status::INDEX_MODIFIED
            | Status::WT_MODIFIED
            | Status::INDEX_TYPECHANGE
            | Status::WT_TYPECHANGE
            | Status::CONFLICTED,
    ) {
        return Some(ChangeKind::Modified);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_status() {
        assert_eq!(kind_from_status(Status::INDEX_NEW), Some(ChangeKind::Added));
        assert_eq!(kind_from_status(Status::INDEX_NEW | Status::WT_MODIFIED), Some(ChangeKind::Added));
        assert_eq!(kind_from_status(Status::INDEX_NEW | Status::WT_DELETED), None);
        assert_eq!(kind_from_status(Status::INDEX_MODIFIED | Status::WT_DELETED), Some(ChangeKind::Deleted));
        assert_eq!(kind_from_status(Status::WT_MODIFIED), Some(ChangeKind::Modified));
        assert_eq!(kind_from_status(Status::INDEX_RENAMED), Some(ChangeKind::Renamed));
        assert_eq!(kind_from_status(Status::CURRENT), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_path_from_bytes_keeps_non_utf8() {
        use std::os::unix::ffi::OsStrExt;
        let path = path_from_bytes(b"dir/caf\xe9.txt");
        assert_eq!(path.as_os_str().as_bytes(), b"dir/caf\xe9.txt");
        assert!(path.to_str().is_none());
    }

    #[test]
    fn test_open_missing_repository() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Repository::open(dir.path()).is_err());
    }
}
