mod backend;
mod diff;
#[cfg(test)]
pub(crate) mod fixture;
#[cfg(test)]
pub(crate) mod memory;
mod repository;
mod revision;

pub use backend::Backend;
pub use diff::{Bucket, ChangeKind, ClassifiedChangeSet, ContentRef, DiffEntry, FileSide};
pub use repository::Repository;
pub use revision::{resolve_commit, Revision, RevisionHandle};
