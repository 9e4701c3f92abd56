//! Export pipeline: one revision in, one `<output>/<label>/` tree out.
//!
//! ```text
//! Validating -> Resolving -> Classifying -> Exporting -> WritingManifest -> Done
//!      \            \             \             \              \
//!       +------------+-------------+-------------+--------------+--> Failed(stage)
//! ```
//!
//! Nothing is written to disk before `Exporting`, so a revision that fails
//! validation or resolution leaves no output behind.

mod classify;
mod content;
mod manifest;
mod tree;


pub use classify::{RenamePolicy, RenameRules};

use crate::error::{ExportError, ExportFailure, Stage};
use crate::git::{resolve_commit, Backend, Repository, Revision, RevisionHandle};
use chrono::{Local, NaiveDateTime};
use classify::{classify_commit, classify_working_tree};
use content::{ContentMode, ContentResolver, ResolvedContent};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span, warn};
use tree::TreeWriter;

/// Knobs shared by every export in a run
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOptions {
    pub renames: RenameRules,
}

/// Outcome of a successful export
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub revision: Revision,
    pub label: String,
    pub destination: PathBuf,
    pub modified: usize,
    pub added: usize,
    pub deleted: usize,
    /// Paths whose content could not be read and were left out
    pub skipped: Vec<PathBuf>,
}

/// Export `sha` against its first parent into `output_root/<sha>/`.
pub fn export_commit(
    repo_path: &Path,
    sha: &str,
    output_root: &Path,
    options: &ExportOptions,
) -> Result<ExportReport, ExportFailure> {
    export_commit_with(|| Repository::open(repo_path), sha, output_root, options)
}

/// Export uncommitted changes into `output_root/<YYYYMMDDHHMM>/`.
pub fn export_working_tree(
    repo_path: &Path,
    output_root: &Path,
    options: &ExportOptions,
) -> Result<ExportReport, ExportFailure> {
    export_working_tree_with(|| Repository::open(repo_path), output_root, options)
}

/// Like [`export_commit`], with the backend supplied by `open`. `open` is
/// only called once the revision text has been validated.
pub fn export_commit_with<B, F>(
    open: F,
    sha: &str,
    output_root: &Path,
    options: &ExportOptions,
) -> Result<ExportReport, ExportFailure>
where
    B: Backend,
    F: FnOnce() -> Result<B, ExportError>,
{
    let _span = info_span!("export", revision = %sha).entered();
    let mut pipeline = Pipeline::start(sha);

    let revision = match Revision::parse(sha) {
        Ok(revision @ Revision::Commit(_)) => revision,
        Ok(Revision::WorkingTree) => {
            return Err(pipeline.fail(ExportError::InvalidRevision {
                revision: sha.to_string(),
            }))
        }
        Err(e) => return Err(pipeline.fail(e)),
    };

    pipeline.enter(Stage::Resolving);
    let backend = open().map_err(|e| pipeline.fail(e))?;
    let handle = resolve_commit(&backend, &revision.to_string()).map_err(|e| pipeline.fail(e))?;
    let RevisionHandle::Committed { commit, .. } = handle else {
        return Err(pipeline.fail(ExportError::InvalidRevision {
            revision: sha.to_string(),
        }));
    };

    let target = Target {
        revision,
        label: commit.to_string(),
        claim: Claim::Reuse,
    };
    run(&backend, pipeline, handle, target, output_root, options)
}

/// Like [`export_working_tree`], with the backend supplied by `open`.
pub fn export_working_tree_with<B, F>(
    open: F,
    output_root: &Path,
    options: &ExportOptions,
) -> Result<ExportReport, ExportFailure>
where
    B: Backend,
    F: FnOnce() -> Result<B, ExportError>,
{
    let revision = Revision::WorkingTree;
    let _span = info_span!("export", revision = %revision).entered();
    let mut pipeline = Pipeline::start(&revision.to_string());

    pipeline.enter(Stage::Resolving);
    let backend = open().map_err(|e| pipeline.fail(e))?;

    let target = Target {
        revision,
        label: working_tree_label(Local::now().naive_local()),
        claim: Claim::Unique,
    };
    run(&backend, pipeline, RevisionHandle::WorkingTree, target, output_root, options)
}

/// Tracks the current stage of one export
struct Pipeline {
    revision: String,
    stage: Stage,
}

impl Pipeline {
    fn start(revision: &str) -> Self {
        debug!(stage = %Stage::Validating, "export started");
        Self {
            revision: revision.to_string(),
            stage: Stage::Validating,
        }
    }

    fn enter(&mut self, next: Stage) {
        debug_assert!(next > self.stage, "stage {next} entered after {}", self.stage);
        self.stage = next;
        debug!(stage = %next, "entering stage");
    }

    fn fail(&self, source: ExportError) -> ExportFailure {
        ExportFailure {
            revision: self.revision.clone(),
            stage: self.stage,
            source,
        }
    }
}

/// How a destination directory is claimed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Claim {
    /// Reuse an existing directory; files inside are overwritten
    Reuse,
    /// Never share a directory; append `-N` until an unused name is found
    Unique,
}

struct Target {
    revision: Revision,
    label: String,
    claim: Claim,
}

fn run<B: Backend + ?Sized>(
    backend: &B,
    mut pipeline: Pipeline,
    handle: RevisionHandle,
    target: Target,
    output_root: &Path,
    options: &ExportOptions,
) -> Result<ExportReport, ExportFailure> {
    pipeline.enter(Stage::Classifying);
    let (set, mode) = match handle {
        RevisionHandle::Committed { commit, parent } => (
            classify_commit(backend, commit, parent, options.renames.committed),
            ContentMode::Committed,
        ),
        RevisionHandle::WorkingTree => (
            classify_working_tree(backend, options.renames.working_tree),
            ContentMode::WorkingTree,
        ),
    };
    let set = set.map_err(|e| pipeline.fail(e))?;
    debug!(
        modified = set.modified().len(),
        added = set.added().len(),
        deleted = set.deleted().len(),
        "classified changes"
    );
    if set.is_empty() {
        info!("no changes found");
    }

    pipeline.enter(Stage::Exporting);
    let (label, destination) =
        claim_destination(output_root, &target.label, target.claim).map_err(|e| pipeline.fail(e))?;
    let writer = TreeWriter::create(destination).map_err(|e| pipeline.fail(e))?;
    let resolver = ContentResolver::new(backend, mode);

    let mut skipped = Vec::new();
    for entry in set.iter() {
        match resolver.resolve(entry) {
            Ok(content) => write_content(&writer, content).map_err(|e| pipeline.fail(e))?,
            Err(ExportError::ContentUnavailable { path, reason }) => {
                warn!(%path, %reason, kind = entry.kind().as_str(), "skipping entry");
                skipped.push(entry.lookup_path().to_path_buf());
            }
            Err(e) => return Err(pipeline.fail(e)),
        }
    }

    pipeline.enter(Stage::WritingManifest);
    manifest::write(&writer, &set).map_err(|e| pipeline.fail(e))?;

    pipeline.enter(Stage::Done);
    info!(
        destination = %writer.root().display(),
        files = set.len() - skipped.len(),
        skipped = skipped.len(),
        "export complete"
    );

    Ok(ExportReport {
        revision: target.revision,
        label,
        destination: writer.root().to_path_buf(),
        modified: set.modified().len(),
        added: set.added().len(),
        deleted: set.deleted().len(),
        skipped,
    })
}

fn write_content(writer: &TreeWriter, content: ResolvedContent) -> Result<(), ExportError> {
    if let Some((path, bytes)) = content.old {
        writer.write_old(&path, &bytes)?;
    }
    if let Some((path, bytes)) = content.new {
        writer.write_new(&path, &bytes)?;
    }
    Ok(())
}

/// Label for a working-tree export: local date and time to the minute
fn working_tree_label(now: NaiveDateTime) -> String {
    now.format("%Y%m%d%H%M").to_string()
}

/// Create `output_root/<label>` and return the label actually used.
fn claim_destination(
    output_root: &Path,
    label: &str,
    claim: Claim,
) -> Result<(String, PathBuf), ExportError> {
    fs::create_dir_all(output_root).map_err(|e| ExportError::io(output_root, e))?;

    if claim == Claim::Reuse {
        let destination = output_root.join(label);
        fs::create_dir_all(&destination).map_err(|e| ExportError::io(&destination, e))?;
        return Ok((label.to_string(), destination));
    }

    let mut suffix = 0u32;
    loop {
        let candidate = if suffix == 0 {
            label.to_string()
        } else {
            format!("{label}-{suffix}")
        };
        let destination = output_root.join(&candidate);
        // create_dir (not create_dir_all) fails if another export got there first
        match fs::create_dir(&destination) {
            Ok(()) => return Ok((candidate, destination)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => suffix += 1,
            Err(e) => return Err(ExportError::io(&destination, e)),
        }
    }
}
