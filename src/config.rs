//! Run configuration.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::registry::DEFAULT_REGISTRY_FILE;

/// Environment variable holding the directory the registry names resolve under.
pub const BASE_DIR_ENV: &str = "PATH_REPOS";

/// Remote whose stale tracking refs are pruned.
pub const DEFAULT_REMOTE: &str = "origin";

/// Optional steps of the per-repository sequence.
///
/// Checkout, branch enumeration and deletion always run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PruneSteps {
    /// `git reset --hard` + `git clean -fd`
    pub reset: bool,
    /// `git pull --rebase` on the main branch
    pub pull: bool,
    /// `git remote prune <remote>`
    pub prune_remote: bool,
    /// `git gc --aggressive` + `git repack`
    pub compact: bool,
}

impl Default for PruneSteps {
    fn default() -> Self {
        Self {
            reset: true,
            pull: true,
            prune_remote: true,
            compact: true,
        }
    }
}

impl PruneSteps {
    /// Only switch to main and delete the other branches.
    pub fn minimal() -> Self {
        Self {
            reset: false,
            pull: false,
            prune_remote: false,
            compact: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PruneConfig {
    /// Directory the registry names are joined onto. Empty means the
    /// current directory.
    pub base_dir: PathBuf,
    pub registry_path: PathBuf,
    /// Stop after this many resolved repositories (None = unlimited)
    pub max_repos: Option<usize>,
    pub remote: String,
    pub steps: PruneSteps,
    /// Enumerate only; run no git command that changes the repository
    pub dry_run: bool,
}

impl Default for PruneConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::new(),
            registry_path: PathBuf::from(DEFAULT_REGISTRY_FILE),
            max_repos: None,
            remote: DEFAULT_REMOTE.to_string(),
            steps: PruneSteps::default(),
            dry_run: false,
        }
    }
}

impl PruneConfig {
    /// Defaults, with the base directory taken from `PATH_REPOS`.
    pub fn from_env() -> Self {
        let base_dir = std::env::var(BASE_DIR_ENV)
            .map(|raw| expand_home(&raw))
            .unwrap_or_default();
        Self {
            base_dir,
            ..Self::default()
        }
    }

    /// Path a registry name resolves to.
    pub fn repo_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }
}

/// Expand a leading `~` to the home directory. Anything else is taken as-is.
pub fn expand_home(raw: &str) -> PathBuf {
    let home = dirs::home_dir();
    match (raw, home) {
        ("~", Some(home)) => home,
        (_, Some(home)) if raw.starts_with("~/") => home.join(&raw[2..]),
        _ => Path::new(raw).to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn defaults_enable_every_step() {
        let config = PruneConfig::default();
        assert_eq!(config.steps, PruneSteps::default());
        assert!(config.steps.reset && config.steps.pull);
        assert!(config.steps.prune_remote && config.steps.compact);
        assert_eq!(config.registry_path, PathBuf::from("dir.json"));
        assert_eq!(config.remote, "origin");
        assert!(config.max_repos.is_none());
        assert!(!config.dry_run);
    }

    #[test]
    fn minimal_disables_optional_steps() {
        let steps = PruneSteps::minimal();
        assert!(!steps.reset && !steps.pull && !steps.prune_remote && !steps.compact);
    }

    #[test]
    #[serial]
    fn from_env_reads_base_dir() {
        std::env::set_var(BASE_DIR_ENV, "/srv/clones");
        let config = PruneConfig::from_env();
        std::env::remove_var(BASE_DIR_ENV);

        assert_eq!(config.base_dir, PathBuf::from("/srv/clones"));
        assert_eq!(config.repo_path("api"), PathBuf::from("/srv/clones/api"));
    }

    #[test]
    #[serial]
    fn from_env_unset_means_current_dir() {
        std::env::remove_var(BASE_DIR_ENV);
        let config = PruneConfig::from_env();

        assert_eq!(config.base_dir, PathBuf::new());
        assert_eq!(config.repo_path("api"), PathBuf::from("api"));
    }

    #[test]
    fn expand_home_handles_tilde() {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        assert_eq!(expand_home("~"), home);
        assert_eq!(expand_home("~/work"), home.join("work"));
        assert_eq!(expand_home("/abs/~/x"), PathBuf::from("/abs/~/x"));
        assert_eq!(expand_home("~other"), PathBuf::from("~other"));
    }
}
