use crate::error::ExportError;
use crate::export::RenamePolicy;
use crate::git::Revision;
use clap::{ArgAction, CommandFactory, Parser, ValueHint};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

/// diffsnap - export the before/after content of a change set
#[derive(Parser, Debug)]
#[command(name = "diffsnap", version, about, long_about = None)]
pub struct Args {
    /// Commits to export (full 40 character ids).
    /// An empty string exports uncommitted changes.
    /// If omitted, uncommitted changes are exported.
    #[arg(value_hint = ValueHint::Other)]
    pub revisions: Vec<String>,

    /// Repository root (defaults to the last repository used, then ".")
    #[arg(short = 'C', long, value_hint = ValueHint::DirPath)]
    pub repo: Option<PathBuf>,

    /// Directory that receives one folder per exported revision
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Also export uncommitted changes
    #[arg(short, long)]
    pub worktree: bool,

    /// How renames are exported for commits
    #[arg(long, value_enum)]
    pub commit_renames: Option<RenamePolicy>,

    /// How renames are exported for uncommitted changes
    #[arg(long, value_enum)]
    pub worktree_renames: Option<RenamePolicy>,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate shell completions
    #[arg(long, value_enum)]
    pub completions: Option<Shell>,
}

impl Args {
    /// Validate every requested revision before anything is exported.
    /// Duplicates are collapsed so no two exports share an output folder.
    pub fn requested_revisions(&self) -> Result<Vec<Revision>, ExportError> {
        let mut revisions: Vec<Revision> = Vec::new();
        for text in &self.revisions {
            let revision = Revision::parse(text)?;
            if !revisions.contains(&revision) {
                revisions.push(revision);
            }
        }

        if (self.worktree || revisions.is_empty()) && !revisions.contains(&Revision::WorkingTree) {
            revisions.push(Revision::WorkingTree);
        }
        Ok(revisions)
    }
}

/// Generate shell completions to stdout
pub fn generate_completions(shell: Shell) {
    let mut cmd = Args::command();
    generate(shell, &mut cmd, "diffsnap", &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA: &str = "0123456789abcdef0123456789abcdef01234567";

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("diffsnap").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_no_revisions_means_working_tree() {
        let args = parse(&[]);
        assert_eq!(args.requested_revisions().unwrap(), vec![Revision::WorkingTree]);
    }

    #[test]
    fn test_empty_string_means_working_tree() {
        let args = parse(&[SHA, ""]);
        assert_eq!(
            args.requested_revisions().unwrap(),
            vec![Revision::Commit(SHA.to_string()), Revision::WorkingTree]
        );
    }

    #[test]
    fn test_worktree_flag_adds_working_tree() {
        let args = parse(&["--worktree", SHA]);
        assert_eq!(
            args.requested_revisions().unwrap(),
            vec![Revision::Commit(SHA.to_string()), Revision::WorkingTree]
        );
    }

    #[test]
    fn test_duplicates_collapse() {
        let upper = SHA.to_ascii_uppercase();
        let args = parse(&[SHA, upper.as_str(), "", "-w"]);
        assert_eq!(args.requested_revisions().unwrap().len(), 2);
    }

    #[test]
    fn test_any_invalid_revision_rejects_all() {
        let args = parse(&[SHA, "HEAD~1"]);
        assert!(matches!(
            args.requested_revisions(),
            Err(ExportError::InvalidRevision { revision }) if revision == "HEAD~1"
        ));
    }

    #[test]
    fn test_rename_policy_values() {
        let args = parse(&["--commit-renames", "deleted", "--worktree-renames", "modified"]);
        assert_eq!(args.commit_renames, Some(RenamePolicy::AsDeleted));
        assert_eq!(args.worktree_renames, Some(RenamePolicy::AsModified));
    }

    #[test]
    fn test_verbose_conflicts_with_quiet() {
        let result = Args::try_parse_from(["diffsnap", "-v", "-q"]);
        assert!(result.is_err());
    }
}
