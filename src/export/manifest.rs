//! `note.txt`: a plain-text summary of a classified change set.

use super::tree::TreeWriter;
use crate::error::ExportError;
use crate::git::{ClassifiedChangeSet, DiffEntry};
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE: &str = "note.txt";

/// Render the manifest text for `set`. Paths that are not valid UTF-8 are
/// listed lossily.
pub fn render(set: &ClassifiedChangeSet) -> String {
    let sections: [(&str, &[DiffEntry], fn(&DiffEntry) -> Option<&Path>); 3] = [
        ("Changed files:", set.modified(), old_path),
        ("Added files:", set.added(), new_path),
        ("Deleted files:", set.deleted(), old_path),
    ];

    let mut out = String::new();
    for (i, (header, entries, path_of)) in sections.into_iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        out.push_str(header);
        out.push('\n');
        for path in entries.iter().filter_map(path_of) {
            out.push_str(&path.to_string_lossy());
            out.push('\n');
        }
    }
    out
}

/// Write `note.txt` at the destination root.
pub fn write(writer: &TreeWriter, set: &ClassifiedChangeSet) -> Result<PathBuf, ExportError> {
    writer.write_root_file(MANIFEST_FILE, render(set).as_bytes())
}

fn old_path(entry: &DiffEntry) -> Option<&Path> {
    entry.old().map(|side| side.path.as_path())
}

fn new_path(entry: &DiffEntry) -> Option<&Path> {
    entry.new_side().map(|side| side.path.as_path())
}
