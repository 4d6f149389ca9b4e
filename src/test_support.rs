//! Helpers for tests that need real repositories.

use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run git in `dir` and assert it succeeded.
pub fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();
    assert!(status.success(), "git {args:?} failed in {}", dir.display());
}

/// Create a repository at `dir` with one commit on `main_branch`.
pub fn init_repo(dir: &Path, main_branch: &str) {
    fs::create_dir_all(dir).unwrap();
    git(dir, &["init", "-q"]);
    git(
        dir,
        &["symbolic-ref", "HEAD", &format!("refs/heads/{main_branch}")],
    );
    git(dir, &["config", "user.email", "test@test.com"]);
    git(dir, &["config", "user.name", "Test"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
    fs::write(dir.join("README.md"), "init\n").unwrap();
    git(dir, &["add", "README.md"]);
    git(dir, &["commit", "-q", "-m", "initial"]);
}

/// Local branches of the repository at `dir`.
pub fn branches(dir: &Path) -> Vec<String> {
    crate::git::list_local_branches(dir).unwrap()
}
