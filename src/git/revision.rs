//! Revision parsing and resolution.

use super::backend::Backend;
use crate::error::ExportError;
use git2::Oid;
use std::fmt;

/// Length of a full SHA-1 commit id in hex.
pub const SHA1_HEX_LEN: usize = 40;

/// A validated revision request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Revision {
    /// A full commit id, normalized to lowercase
    Commit(String),
    /// Uncommitted changes in the working tree
    WorkingTree,
}

impl Revision {
    /// Validate revision text. The empty string means the working tree;
    /// anything else must be exactly 40 hex characters.
    pub fn parse(text: &str) -> Result<Self, ExportError> {
        if text.is_empty() {
            return Ok(Revision::WorkingTree);
        }
        if text.len() == SHA1_HEX_LEN && text.chars().all(|c| c.is_ascii_hexdigit()) {
            return Ok(Revision::Commit(text.to_ascii_lowercase()));
        }
        Err(ExportError::InvalidRevision {
            revision: text.to_string(),
        })
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Revision::Commit(sha) => f.write_str(sha),
            Revision::WorkingTree => f.write_str("working tree"),
        }
    }
}

/// A resolved revision, ready for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionHandle {
    Committed { commit: Oid, parent: Oid },
    WorkingTree,
}

/// Look up `sha` and its first parent.
pub fn resolve_commit<B: Backend + ?Sized>(backend: &B, sha: &str) -> Result<RevisionHandle, ExportError> {
    let id = Oid::from_str(sha).map_err(|_| ExportError::InvalidRevision {
        revision: sha.to_string(),
    })?;
    let commit = backend.lookup_commit(id)?;
    let parent = backend.parent_of(commit)?;
    Ok(RevisionHandle::Committed { commit, parent })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::memory::MemoryBackend;

    const SHA: &str = "0123456789abcdef0123456789abcdef01234567";

    #[test]
    fn test_parse_empty_is_working_tree() {
        assert_eq!(Revision::parse("").unwrap(), Revision::WorkingTree);
    }

    #[test]
    fn test_parse_uppercase_hex() {
        let upper = SHA.to_ascii_uppercase();
        assert_eq!(Revision::parse(&upper).unwrap(), Revision::Commit(SHA.to_string()));
    }

    #[test]
    fn test_parse_rejects_39_chars() {
        assert!(matches!(
            Revision::parse(&SHA[..39]),
            Err(ExportError::InvalidRevision { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_41_chars() {
        let long = format!("{}0", SHA);
        assert!(matches!(
            Revision::parse(&long),
            Err(ExportError::InvalidRevision { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        let bad = format!("g{}", &SHA[1..]);
        assert_eq!(bad.len(), 40);
        assert!(matches!(
            Revision::parse(&bad),
            Err(ExportError::InvalidRevision { .. })
        ));
    }

    #[test]
    fn test_resolve_commit_with_parent() {
        let mut backend = MemoryBackend::new();
        let parent = backend.add_commit(None);
        let child = backend.add_commit(Some(parent));

        let handle = resolve_commit(&backend, &child.to_string()).unwrap();
        assert_eq!(
            handle,
            RevisionHandle::Committed {
                commit: child,
                parent
            }
        );
    }

    #[test]
    fn test_resolve_root_commit_fails() {
        let mut backend = MemoryBackend::new();
        let root = backend.add_commit(None);

        let result = resolve_commit(&backend, &root.to_string());
        assert!(matches!(result, Err(ExportError::ParentNotFound { .. })));
    }

    #[test]
    fn test_resolve_unknown_commit_fails() {
        let backend = MemoryBackend::new();
        let result = resolve_commit(&backend, SHA);
        assert!(matches!(result, Err(ExportError::RevisionNotFound { .. })));
    }
}
