//! Writes exported content into the `org/` and `mod/` trees.

use crate::error::ExportError;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Directory holding new/current content
pub const NEW_DIR: &str = "mod";
/// Directory holding old content
pub const OLD_DIR: &str = "org";

/// Writer rooted at one export destination (`<output>/<label>`)
#[derive(Debug)]
pub struct TreeWriter {
    root: PathBuf,
}

impl TreeWriter {
    /// Create `mod/` and `org/` under `root`.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, ExportError> {
        let root = root.into();
        for dir in [NEW_DIR, OLD_DIR] {
            let path = root.join(dir);
            fs::create_dir_all(&path).map_err(|e| ExportError::io(&path, e))?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write old content to `org/<relative>`.
    pub fn write_old(&self, relative: impl AsRef<Path>, bytes: &[u8]) -> Result<PathBuf, ExportError> {
        let target = self.root.join(OLD_DIR).join(relative);
        write_atomic(&target, bytes)?;
        Ok(target)
    }

    /// Write new content to `mod/<relative>`.
    pub fn write_new(&self, relative: impl AsRef<Path>, bytes: &[u8]) -> Result<PathBuf, ExportError> {
        let target = self.root.join(NEW_DIR).join(relative);
        write_atomic(&target, bytes)?;
        Ok(target)
    }

    /// Write a file directly under the destination root.
    pub fn write_root_file(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
        let target = self.root.join(name);
        write_atomic(&target, bytes)?;
        Ok(target)
    }
}

/// Replace `target` with `bytes`. The data goes to a temporary file in the
/// same directory first, so `target` is never observed half-written.
fn write_atomic(target: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let parent = target
        .parent()
        .ok_or_else(|| ExportError::io(target, std::io::ErrorKind::InvalidInput.into()))?;
    fs::create_dir_all(parent).map_err(|e| ExportError::io(parent, e))?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|e| ExportError::io(parent, e))?;
    tmp.write_all(bytes).map_err(|e| ExportError::io(target, e))?;
    tmp.persist(target)
        .map_err(|e| ExportError::io(target, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_makes_both_trees() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TreeWriter::create(dir.path().join("label")).unwrap();
        assert!(writer.root().join("mod").is_dir());
        assert!(writer.root().join("org").is_dir());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TreeWriter::create(dir.path()).unwrap();

        let path = writer.write_new("deep/nested/file.rs", b"fn main() {}").unwrap();
        assert_eq!(path, dir.path().join("mod/deep/nested/file.rs"));
        assert_eq!(fs::read(&path).unwrap(), b"fn main() {}");

        let path = writer.write_old("deep/old.rs", b"old").unwrap();
        assert_eq!(path, dir.path().join("org/deep/old.rs"));
    }

    #[test]
    fn test_write_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TreeWriter::create(dir.path()).unwrap();

        writer.write_new("a.txt", b"a much longer first version").unwrap();
        let path = writer.write_new("a.txt", b"short").unwrap();
        assert_eq!(fs::read(path).unwrap(), b"short");
    }

    #[test]
    fn test_write_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TreeWriter::create(dir.path()).unwrap();
        writer.write_old("only.txt", b"x").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path().join("org"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("only.txt")]);
    }

    #[test]
    fn test_write_fails_when_parent_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = TreeWriter::create(dir.path()).unwrap();
        writer.write_new("blocker", b"file").unwrap();

        let err = writer.write_new("blocker/child.txt", b"x").unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }
}
