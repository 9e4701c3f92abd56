use git2::{Delta, Oid};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Kind of change reported for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "added",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Renamed => "renamed",
        }
    }

    /// Map a git delta status. Returns `None` for deltas that carry no change.
    pub fn from_delta(status: Delta) -> Option<Self> {
        match status {
            Delta::Added | Delta::Copied | Delta::Untracked => Some(ChangeKind::Added),
            Delta::Deleted => Some(ChangeKind::Deleted),
            Delta::Modified | Delta::Typechange | Delta::Conflicted => Some(ChangeKind::Modified),
            Delta::Renamed => Some(ChangeKind::Renamed),
            Delta::Unmodified | Delta::Ignored | Delta::Unreadable => None,
        }
    }
}

/// Where the bytes for one side of a change live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRef {
    /// Object in the repository's object store
    Blob(Oid),
    /// File in the working tree, relative to the repository root
    File(PathBuf),
}

/// One side (old or new) of a changed file. The path is relative to the
/// repository root and keeps the exact bytes git reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSide {
    pub path: PathBuf,
    pub content: Option<ContentRef>,
}

impl FileSide {
    pub fn new(path: impl Into<PathBuf>, content: Option<ContentRef>) -> Self {
        Self {
            path: path.into(),
            content,
        }
    }
}

/// A changed file, tagged by kind. Added entries have no old side and
/// deleted entries have no new side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffEntry {
    Added { new: FileSide },
    Modified { old: FileSide, new: FileSide },
    Deleted { old: FileSide },
    Renamed { old: FileSide, new: FileSide },
}

impl DiffEntry {
    /// Build an entry of `kind` from whatever sides are available. Returns
    /// `None` when a side the kind requires is missing.
    pub fn from_parts(kind: ChangeKind, old: Option<FileSide>, new: Option<FileSide>) -> Option<Self> {
        match (kind, old, new) {
            (ChangeKind::Added, _, Some(new)) => Some(DiffEntry::Added { new }),
            (ChangeKind::Deleted, Some(old), _) => Some(DiffEntry::Deleted { old }),
            (ChangeKind::Modified, Some(old), Some(new)) => Some(DiffEntry::Modified { old, new }),
            (ChangeKind::Renamed, Some(old), Some(new)) => Some(DiffEntry::Renamed { old, new }),
            _ => None,
        }
    }

    pub fn into_parts(self) -> (ChangeKind, Option<FileSide>, Option<FileSide>) {
        match self {
            DiffEntry::Added { new } => (ChangeKind::Added, None, Some(new)),
            DiffEntry::Modified { old, new } => (ChangeKind::Modified, Some(old), Some(new)),
            DiffEntry::Deleted { old } => (ChangeKind::Deleted, Some(old), None),
            DiffEntry::Renamed { old, new } => (ChangeKind::Renamed, Some(old), Some(new)),
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            DiffEntry::Added { .. } => ChangeKind::Added,
            DiffEntry::Modified { .. } => ChangeKind::Modified,
            DiffEntry::Deleted { .. } => ChangeKind::Deleted,
            DiffEntry::Renamed { .. } => ChangeKind::Renamed,
        }
    }

    pub fn old(&self) -> Option<&FileSide> {
        match self {
            DiffEntry::Added { .. } => None,
            DiffEntry::Modified { old, .. }
            | DiffEntry::Deleted { old }
            | DiffEntry::Renamed { old, .. } => Some(old),
        }
    }

    pub fn new_side(&self) -> Option<&FileSide> {
        match self {
            DiffEntry::Deleted { .. } => None,
            DiffEntry::Added { new }
            | DiffEntry::Modified { new, .. }
            | DiffEntry::Renamed { new, .. } => Some(new),
        }
    }

    /// Path used to pair entries from different diff views: the old path,
    /// or the new path for additions.
    pub fn lookup_path(&self) -> &Path {
        match self {
            DiffEntry::Added { new } => &new.path,
            DiffEntry::Modified { old, .. }
            | DiffEntry::Deleted { old }
            | DiffEntry::Renamed { old, .. } => &old.path,
        }
    }
}

/// Which bucket of a change set an entry belongs in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Modified,
    Added,
    Deleted,
}

/// Changed files split into three disjoint, ordered sets
#[derive(Debug, Clone, Default)]
pub struct ClassifiedChangeSet {
    modified: Vec<DiffEntry>,
    added: Vec<DiffEntry>,
    deleted: Vec<DiffEntry>,
    seen: HashSet<PathBuf>,
}

impl ClassifiedChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry to `bucket`. A path already present in any bucket is
    /// rejected and `false` is returned.
    pub fn insert(&mut self, bucket: Bucket, entry: DiffEntry) -> bool {
        let key = match bucket {
            Bucket::Added => entry.new_side().map(|side| side.path.clone()),
            Bucket::Modified | Bucket::Deleted => entry.old().map(|side| side.path.clone()),
        };
        let Some(key) = key else {
            return false;
        };
        if !self.seen.insert(key) {
            return false;
        }

        match bucket {
            Bucket::Modified => self.modified.push(entry),
            Bucket::Added => self.added.push(entry),
            Bucket::Deleted => self.deleted.push(entry),
        }
        true
    }

    pub fn contains_path(&self, path: &Path) -> bool {
        self.seen.contains(path)
    }

    /// Drop added entries for which `keep` returns false.
    pub fn retain_added(&mut self, mut keep: impl FnMut(&DiffEntry) -> bool) {
        let seen = &mut self.seen;
        self.added.retain(|entry| {
            let kept = keep(entry);
            if !kept {
                if let Some(new) = entry.new_side() {
                    seen.remove(&new.path);
                }
            }
            kept
        });
    }

    pub fn modified(&self) -> &[DiffEntry] {
        &self.modified
    }

    pub fn added(&self) -> &[DiffEntry] {
        &self.added
    }

    pub fn deleted(&self) -> &[DiffEntry] {
        &self.deleted
    }

    pub fn len(&self) -> usize {
        self.modified.len() + self.added.len() + self.deleted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All entries in manifest order: modified, added, deleted
    pub fn iter(&self) -> impl Iterator<Item = &DiffEntry> {
        self.modified
            .iter()
            .chain(self.added.iter())
            .chain(self.deleted.iter())
    }
}
