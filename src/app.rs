use crate::cli::Args;
use crate::config::{self, Config};
use crate::export::{self, ExportOptions, ExportReport, RenameRules};
use crate::git::{Repository, Revision};
use anyhow::{anyhow, bail, Context, Result};
use std::path::PathBuf;
use std::thread;
use tracing::{error, warn};

pub struct App {
    repo_path: PathBuf,
    output_root: PathBuf,
    revisions: Vec<Revision>,
    options: ExportOptions,
    config: Config,
    /// Where the config is saved after a run
    config_path: Option<PathBuf>,
}

impl App {
    pub fn new(args: Args, config: Config) -> Result<Self> {
        // Every revision is validated before any export starts
        let revisions = args
            .requested_revisions()
            .context("Nothing was exported")?;

        let repo_path = args
            .repo
            .clone()
            .or_else(|| config.last_repo_path.clone())
            .unwrap_or_else(|| PathBuf::from("."));
        Repository::open(&repo_path)
            .with_context(|| format!("Not a git repository: {}", repo_path.display()))?;

        let output_root = args.output.clone().unwrap_or_else(|| config.output_root.clone());
        let options = ExportOptions {
            renames: RenameRules {
                committed: args.commit_renames.unwrap_or(config.commit_renames),
                working_tree: args.worktree_renames.unwrap_or(config.worktree_renames),
            },
        };

        Ok(Self {
            repo_path,
            output_root,
            revisions,
            options,
            config,
            config_path: config::config_path(),
        })
    }

    pub fn run(mut self) -> Result<()> {
        let results = self.export_all();
        self.remember_repo();

        let mut failed = Vec::new();
        for (revision, result) in results {
            match result {
                Ok(report) => print_report(&report),
                Err(e) => {
                    error!("{e:#}");
                    failed.push(revision.to_string());
                }
            }
        }

        if !failed.is_empty() {
            bail!(
                "{} of {} exports failed: {}",
                failed.len(),
                self.revisions.len(),
                failed.join(", ")
            );
        }
        println!("The operation has been completed successfully.");
        Ok(())
    }

    /// Run one export per revision on its own thread and wait for all of them.
    /// Each thread opens its own repository handle and writes to its own
    /// `<output>/<label>` folder.
    fn export_all(&self) -> Vec<(Revision, Result<ExportReport>)> {
        thread::scope(|scope| {
            let handles: Vec<_> = self
                .revisions
                .iter()
                .map(|revision| {
                    let task = revision.clone();
                    let handle = scope.spawn(move || match &task {
                        Revision::Commit(sha) => export::export_commit(
                            &self.repo_path,
                            sha,
                            &self.output_root,
                            &self.options,
                        ),
                        Revision::WorkingTree => export::export_working_tree(
                            &self.repo_path,
                            &self.output_root,
                            &self.options,
                        ),
                    });
                    (revision.clone(), handle)
                })
                .collect();

            handles
                .into_iter()
                .map(|(revision, handle)| {
                    let result = match handle.join() {
                        Ok(result) => result.map_err(anyhow::Error::from),
                        Err(_) => Err(anyhow!("export of {revision} panicked")),
                    };
                    (revision, result)
                })
                .collect()
        })
    }

    fn remember_repo(&mut self) {
        let path = std::fs::canonicalize(&self.repo_path).unwrap_or_else(|_| self.repo_path.clone());
        if self.config.last_repo_path.as_ref() == Some(&path) {
            return;
        }
        self.config.last_repo_path = Some(path);
        let Some(config_path) = &self.config_path else {
            warn!("could not determine config directory");
            return;
        };
        if let Err(e) = config::save(&self.config, config_path) {
            warn!("failed to save config: {e}");
        }
    }
}

fn print_report(report: &ExportReport) {
    println!(
        "{} -> {}: {} changed, {} added, {} deleted",
        report.revision,
        report.destination.display(),
        report.modified,
        report.added,
        report.deleted
    );
    if report.label != report.revision.to_string() {
        println!("  exported as {}", report.label);
    }
    for path in &report.skipped {
        println!("  skipped (content unavailable): {}", path.display());
    }
}
