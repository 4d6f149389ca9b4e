//! Branch pruning across the registered repositories.
//!
//! Each repository is reset, switched to its main branch, optionally synced
//! and compacted, and stripped of every other local branch. Git failures are
//! tolerated and recorded; only losing access to a repository marks it failed.

use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, error, info, warn};
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::config::PruneConfig;
use crate::git::{self, GitOutcome};
use crate::outcome::{RepoOutcome, RepoStatus, RunSummary};
use crate::registry::{load_registry_or_empty, Registry};
use crate::report::Reporter;

/// A registry entry resolved to a repository on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoHandle {
    pub name: String,
    pub path: PathBuf,
    pub main_branch: String,
}

/// Branches to delete: everything except `main_branch`, compared by exact name.
pub fn branches_to_delete(branches: &[String], main_branch: &str) -> Vec<String> {
    branches
        .iter()
        .filter(|b| b.as_str() != main_branch)
        .cloned()
        .collect()
}

/// Split registry entries into repositories to process and skipped entries.
///
/// Every skipped entry is logged exactly once.
pub fn resolve_handles(registry: &Registry, base_dir: &Path) -> (Vec<RepoHandle>, Vec<RepoOutcome>) {
    let mut handles = Vec::new();
    let mut skipped = Vec::new();

    for entry in registry.iter() {
        let path = base_dir.join(&entry.name);
        let reason = if entry.name.trim().is_empty() {
            Some("empty repository name")
        } else if !is_plain_relative(&entry.name) {
            Some("repository name must be a directory name under the base directory")
        } else if !path.is_dir() {
            Some("directory not found")
        } else if !git::is_git_repo(&path) {
            Some("not a git repository")
        } else {
            None
        };

        match reason {
            Some(reason) => {
                warn!(
                    "Repository '{}' skipped: {} ({})",
                    entry.name,
                    reason,
                    path.display()
                );
                skipped.push(RepoOutcome::skipped(
                    &entry.name,
                    path,
                    &entry.main_branch,
                    reason.to_string(),
                ));
            }
            None => handles.push(RepoHandle {
                name: entry.name.clone(),
                path,
                main_branch: entry.main_branch.clone(),
            }),
        }
    }

    (handles, skipped)
}

/// Only normal components, so the name cannot leave `base_dir`.
fn is_plain_relative(name: &str) -> bool {
    Path::new(name)
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
}

fn tolerate(outcome: &mut RepoOutcome, step: &str, result: GitOutcome) {
    if !result.success {
        outcome.record_step_failure(step, result.failure_message());
    }
}

/// Run the pruning sequence on one repository.
pub fn prune_repository(handle: &RepoHandle, config: &PruneConfig, reporter: &Reporter) -> RepoOutcome {
    if !git::is_git_repo(&handle.path) {
        warn!(
            "Repository '{}' skipped: not a git repository ({})",
            handle.name,
            handle.path.display()
        );
        return RepoOutcome::skipped(
            &handle.name,
            handle.path.clone(),
            &handle.main_branch,
            "not a git repository".to_string(),
        );
    }

    let mut outcome = RepoOutcome::new(&handle.name, handle.path.clone(), &handle.main_branch);
    let result = if config.dry_run {
        plan_repository(handle, reporter, &mut outcome)
    } else {
        clean_repository(handle, config, reporter, &mut outcome)
    };

    if let Err(e) = result {
        error!("Error in {}: {:#}", handle.path.display(), e);
        outcome.fail(format!("{e:#}"));
    } else if config.dry_run {
        if !outcome.step_failures.is_empty() {
            outcome.status = RepoStatus::Partial;
        }
    } else {
        outcome.settle();
    }
    outcome
}

fn clean_repository(
    handle: &RepoHandle,
    config: &PruneConfig,
    reporter: &Reporter,
    outcome: &mut RepoOutcome,
) -> Result<()> {
    let path = handle.path.as_path();
    let main = handle.main_branch.as_str();
    fs::metadata(path).with_context(|| format!("Cannot access {}", path.display()))?;

    if config.steps.reset {
        reporter.step("Discarding local changes");
        tolerate(outcome, "reset", git::reset_hard(path)?);
        tolerate(outcome, "clean", git::clean_untracked(path)?);
    }

    reporter.step(&format!("Switching to {main}"));
    tolerate(outcome, "checkout", git::checkout(path, main)?);

    if config.steps.pull {
        reporter.step(&format!("Pulling {main}"));
        tolerate(outcome, "pull", git::pull_rebase(path)?);
    }

    if config.steps.prune_remote {
        reporter.step(&format!("Pruning stale refs from {}", config.remote));
        tolerate(outcome, "remote prune", git::remote_prune(path, &config.remote)?);
    }

    match git::list_local_branches(path) {
        Ok(branches) => {
            let doomed = branches_to_delete(&branches, main);
            if doomed.is_empty() {
                reporter.step("No local branches to delete");
            }
            for branch in doomed {
                reporter.step(&format!("Deleting {branch}"));
                let result = git::delete_branch(path, &branch)?;
                if result.success {
                    outcome.deleted.push(branch);
                } else {
                    warn!(
                        "Failed to delete branch '{}' in {}: {}",
                        branch,
                        path.display(),
                        result.failure_message()
                    );
                    outcome.record_failed_deletion(&branch, result.failure_message());
                }
            }
        }
        Err(e) => {
            warn!("Could not list branches in {}: {:#}", path.display(), e);
            outcome.record_step_failure("list branches", format!("{e:#}"));
        }
    }

    if config.steps.compact {
        reporter.step("Compacting repository");
        tolerate(outcome, "gc", git::gc_aggressive(path)?);
        tolerate(outcome, "repack", git::repack(path)?);
    }

    outcome.final_branch = git::current_branch(path);
    Ok(())
}

/// Dry run: report what would be deleted without changing anything.
fn plan_repository(handle: &RepoHandle, reporter: &Reporter, outcome: &mut RepoOutcome) -> Result<()> {
    let path = handle.path.as_path();
    fs::metadata(path).with_context(|| format!("Cannot access {}", path.display()))?;

    outcome.final_branch = git::current_branch(path);
    if outcome.final_branch.as_deref() != Some(handle.main_branch.as_str()) {
        reporter.step(&format!("Would switch to {}", handle.main_branch));
    }

    match git::list_local_branches(path) {
        Ok(branches) => {
            outcome.deleted = branches_to_delete(&branches, &handle.main_branch);
            for branch in &outcome.deleted {
                reporter.step(&format!("Would delete {branch}"));
            }
        }
        Err(e) => {
            warn!("Could not list branches in {}: {:#}", path.display(), e);
            outcome.record_step_failure("list branches", format!("{e:#}"));
        }
    }
    Ok(())
}

/// Load the registry and prune every resolved repository in order.
pub fn run(config: &PruneConfig, reporter: &mut Reporter) -> RunSummary {
    let started_at = Utc::now();
    let (registry, config_error) = load_registry_or_empty(&config.registry_path);
    let (mut handles, mut repos) = resolve_handles(&registry, &config.base_dir);

    if let Some(max) = config.max_repos {
        if handles.len() > max {
            info!(
                "max_repos = {}: leaving {} repositories unprocessed",
                max,
                handles.len() - max
            );
            handles.truncate(max);
        }
    }
    debug!("{} repositories to process", handles.len());

    reporter.start(handles.len());
    for handle in &handles {
        reporter.repo_started(&handle.name, &handle.main_branch);
        let outcome = prune_repository(handle, config, reporter);
        reporter.repo_finished(&outcome);
        repos.push(outcome);
    }
    reporter.finish();

    RunSummary {
        started_at,
        finished_at: Utc::now(),
        registry: config.registry_path.clone(),
        dry_run: config.dry_run,
        config_error,
        repos,
    }
}
