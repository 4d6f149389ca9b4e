//! Git operations used by the pruner.
//!
//! Every function takes the repository path and runs `git` with that path as
//! the child's working directory. The process working directory is never
//! touched.

use anyhow::{Context, Result};
use log::debug;
use std::path::Path;
use std::process::{Command, Stdio};

/// Exit status and captured output of a git invocation.
#[derive(Debug, Clone)]
pub struct GitOutcome {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl GitOutcome {
    /// Short failure description: first stderr line, or a fallback.
    pub fn failure_message(&self) -> String {
        self.stderr
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("git exited with a non-zero status")
            .to_string()
    }
}

fn git_command(repo_path: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new("git");
    cmd.args(args)
        .current_dir(repo_path)
        // fail instead of prompting for credentials
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    cmd
}

/// Run a git command whose non-zero exit is tolerated.
///
/// Only a failure to launch git at all is an error.
pub fn run_tolerant(repo_path: &Path, args: &[&str]) -> Result<GitOutcome> {
    let display = args.join(" ");
    debug!("git {} ({})", display, repo_path.display());

    let output = git_command(repo_path, args)
        .output()
        .with_context(|| format!("Failed to run git {} in {}", display, repo_path.display()))?;

    let outcome = GitOutcome {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    };
    if !outcome.success {
        debug!(
            "git {} failed in {}: {}",
            display,
            repo_path.display(),
            outcome.failure_message()
        );
    }
    Ok(outcome)
}

/// Check if a path is a git repository (`.git` directory or gitfile).
pub fn is_git_repo(path: &Path) -> bool {
    path.join(".git").exists()
}

/// Discard changes to tracked files.
pub fn reset_hard(repo_path: &Path) -> Result<GitOutcome> {
    run_tolerant(repo_path, &["reset", "--hard"])
}

/// Remove untracked files and directories (ignored files are kept).
pub fn clean_untracked(repo_path: &Path) -> Result<GitOutcome> {
    run_tolerant(repo_path, &["clean", "-fd"])
}

pub fn checkout(repo_path: &Path, branch: &str) -> Result<GitOutcome> {
    // trailing "--" keeps a same-named file from being read as a pathspec
    run_tolerant(repo_path, &["checkout", branch, "--"])
}

pub fn pull_rebase(repo_path: &Path) -> Result<GitOutcome> {
    run_tolerant(repo_path, &["pull", "--rebase"])
}

/// Drop remote-tracking refs whose branch no longer exists on `remote`.
pub fn remote_prune(repo_path: &Path, remote: &str) -> Result<GitOutcome> {
    run_tolerant(repo_path, &["remote", "prune", remote])
}

pub fn delete_branch(repo_path: &Path, branch: &str) -> Result<GitOutcome> {
    run_tolerant(repo_path, &["branch", "-D", branch])
}

pub fn gc_aggressive(repo_path: &Path) -> Result<GitOutcome> {
    run_tolerant(repo_path, &["gc", "--aggressive", "--prune=now"])
}

pub fn repack(repo_path: &Path) -> Result<GitOutcome> {
    run_tolerant(
        repo_path,
        &["repack", "-a", "-d", "--depth=250", "--window=250"],
    )
}

/// Local branch names, in ref order, without decoration.
///
/// `lstrip=2` always yields the full branch name; `refname:short` turns into
/// `heads/<name>` when a tag of the same name exists.
pub fn list_local_branches(repo_path: &Path) -> Result<Vec<String>> {
    let outcome = run_tolerant(
        repo_path,
        &["for-each-ref", "--format=%(refname:lstrip=2)", "refs/heads/"],
    )?;
    if !outcome.success {
        anyhow::bail!(
            "git for-each-ref failed in {}: {}",
            repo_path.display(),
            outcome.failure_message()
        );
    }
    Ok(parse_branch_list(&outcome.stdout))
}

/// Split `for-each-ref` output into branch names.
pub fn parse_branch_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Branch HEAD points at, or None when detached or unreadable.
pub fn current_branch(repo_path: &Path) -> Option<String> {
    // full ref, since --short is ambiguous next to a same-named tag
    let outcome = run_tolerant(repo_path, &["symbolic-ref", "-q", "HEAD"]).ok()?;
    if !outcome.success {
        return None;
    }
    let name = outcome.stdout.trim().strip_prefix("refs/heads/")?;
    (!name.is_empty()).then(|| name.to_string())
}
