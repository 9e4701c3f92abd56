//! Configuration persistence for diffsnap settings.
//!
//! Settings are stored in `~/.config/diffsnap/config.toml`.

use crate::export::{RenamePolicy, RenameRules};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Repository used by the previous run
    pub last_repo_path: Option<PathBuf>,
    pub output_root: PathBuf,
    /// `tracing` filter directive used when neither -v/-q nor RUST_LOG is set
    pub log_level: String,
    pub commit_renames: RenamePolicy,
    pub worktree_renames: RenamePolicy,
}

impl Default for Config {
    fn default() -> Self {
        let renames = RenameRules::default();
        Self {
            last_repo_path: None,
            output_root: PathBuf::from("."),
            log_level: "info".to_string(),
            commit_renames: renames.committed,
            worktree_renames: renames.working_tree,
        }
    }
}

/// Returns the path to the config file: `~/.config/diffsnap/config.toml`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("diffsnap").join("config.toml"))
}

/// Load configuration from the default location. Returns default if the
/// file is missing or invalid.
pub fn load() -> Config {
    config_path().map(|path| load_from(&path)).unwrap_or_default()
}

/// Load configuration from `path`. Returns default if file is missing or invalid.
pub fn load_from(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}

/// Save configuration to `path`. Creates the config directory if needed.
pub fn save(config: &Config, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    std::fs::write(path, contents)
}
