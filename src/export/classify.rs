//! Turns raw diff views into a [`ClassifiedChangeSet`].
//!
//! Committed revisions come from a single tree diff. The working tree is
//! assembled from three views:
//!
//! ```text
//!  (a) index/worktree vs HEAD   kinds only     --probe--+
//!  (b) HEAD vs worktree         content refs   --index--+--> modified/added/deleted
//!  (c) untracked paths          always added   ---------+
//! ```

use crate::error::ExportError;
use crate::git::{Backend, Bucket, ChangeKind, ClassifiedChangeSet, ContentRef, DiffEntry, FileSide};
use git2::Oid;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Where renamed files end up in a change set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum RenamePolicy {
    /// Old content under the old path, new content under the new path
    #[value(name = "modified")]
    #[serde(rename = "modified")]
    AsModified,
    /// Only the old content, under the old path
    #[value(name = "deleted")]
    #[serde(rename = "deleted")]
    AsDeleted,
}

impl RenamePolicy {
    /// Kind a change is classified as under this policy
    pub fn fold(self, kind: ChangeKind) -> ChangeKind {
        match (kind, self) {
            (ChangeKind::Renamed, RenamePolicy::AsModified) => ChangeKind::Modified,
            (ChangeKind::Renamed, RenamePolicy::AsDeleted) => ChangeKind::Deleted,
            (kind, _) => kind,
        }
    }
}

/// Rename handling for each export mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenameRules {
    pub committed: RenamePolicy,
    pub working_tree: RenamePolicy,
}

impl Default for RenameRules {
    fn default() -> Self {
        Self {
            committed: RenamePolicy::AsModified,
            working_tree: RenamePolicy::AsDeleted,
        }
    }
}

fn bucket_of(kind: ChangeKind) -> Bucket {
    match kind {
        ChangeKind::Added => Bucket::Added,
        ChangeKind::Deleted => Bucket::Deleted,
        ChangeKind::Modified | ChangeKind::Renamed => Bucket::Modified,
    }
}

/// Classify the changes between `parent` and `commit`.
pub fn classify_commit<B: Backend + ?Sized>(
    backend: &B,
    commit: Oid,
    parent: Oid,
    renames: RenamePolicy,
) -> Result<ClassifiedChangeSet, ExportError> {
    let mut set = ClassifiedChangeSet::new();

    for raw in backend.diff_tree_to_parent(commit, parent)? {
        let (kind, old, new) = raw.into_parts();
        let kind = renames.fold(kind);
        let Some(entry) = DiffEntry::from_parts(kind, old, new) else {
            continue;
        };

        if kind == ChangeKind::Modified && entry.new_side().is_some_and(|n| n.content.is_none()) {
            debug!(path = %entry.lookup_path().display(), "dropping modified entry without new content");
            continue;
        }
        set.insert(bucket_of(kind), entry);
    }

    Ok(set)
}

/// Classify uncommitted changes: staged, unstaged and untracked.
pub fn classify_working_tree<B: Backend + ?Sized>(
    backend: &B,
    renames: RenamePolicy,
) -> Result<ClassifiedChangeSet, ExportError> {
    let labelled = backend.diff_index_to_worktree_or_head()?;

    let mut by_path: HashMap<PathBuf, Vec<DiffEntry>> = HashMap::new();
    for entry in backend.diff_head_to_worktree()? {
        by_path
            .entry(entry.lookup_path().to_path_buf())
            .or_default()
            .push(entry);
    }

    let mut set = ClassifiedChangeSet::new();
    for label in &labelled {
        if label.kind() == ChangeKind::Renamed && renames == RenamePolicy::AsModified {
            if let Some(entry) = pair_rename(label, &by_path) {
                set.insert(Bucket::Modified, entry);
            }
            continue;
        }

        let kind = renames.fold(label.kind());
        let Some(matches) = by_path.get(label.lookup_path()) else {
            debug!(
                path = %label.lookup_path().display(),
                kind = kind.as_str(),
                "no content for labelled change"
            );
            continue;
        };
        for matched in matches {
            let (_, old, new) = matched.clone().into_parts();
            if let Some(entry) = DiffEntry::from_parts(kind, old, new) {
                set.insert(bucket_of(kind), entry);
            }
        }
    }

    for path in backend.list_untracked_paths()? {
        if set.contains_path(&path) {
            continue;
        }
        let content = Some(ContentRef::File(path.clone()));
        set.insert(Bucket::Added, DiffEntry::Added { new: FileSide::new(path, content) });
    }

    if let Some(root) = backend.workdir() {
        set.retain_added(|entry| {
            let Some(new) = entry.new_side() else {
                return true;
            };
            let is_dir = new.path.to_string_lossy().ends_with('/') || root.join(&new.path).is_dir();
            if is_dir {
                debug!(path = %new.path.display(), "skipping directory reported as added");
            }
            !is_dir
        });
    }

    Ok(set)
}

/// Rebuild a staged rename as a modification: old content from the old
/// path, live content from the new path.
fn pair_rename(label: &DiffEntry, by_path: &HashMap<PathBuf, Vec<DiffEntry>>) -> Option<DiffEntry> {
    let old = by_path
        .get(label.lookup_path())?
        .iter()
        .find_map(|e| e.old().cloned())?;
    let new = by_path
        .get(&label.new_side()?.path)?
        .iter()
        .find_map(|e| e.new_side().cloned())?;
    DiffEntry::from_parts(ChangeKind::Modified, Some(old), Some(new))
}
