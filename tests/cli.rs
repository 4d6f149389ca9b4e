//! End-to-end checks of the `branch-prune` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::{Command as StdCommand, Stdio};
use tempfile::TempDir;

fn git(dir: &Path, args: &[&str]) {
    let status = StdCommand::new("git")
        .args(args)
        .current_dir(dir)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();
    assert!(status.success(), "git {args:?} failed");
}

fn init_repo(dir: &Path, main_branch: &str) {
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

fn local_branches(dir: &Path) -> Vec<String> {
    let out = StdCommand::new("git")
        .args(["for-each-ref", "--format=%(refname:lstrip=2)", "refs/heads/"])
        .current_dir(dir)
        .output()
        .unwrap();
    String::from_utf8_lossy(&out.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

fn bin(cwd: &Path) -> Command {
    let mut cmd = Command::cargo_bin("branch-prune").unwrap();
    cmd.current_dir(cwd)
        .env_remove("RUST_LOG")
        .env_remove("PATH_REPOS")
        .env_remove("BRANCH_PRUNE_REGISTRY");
    cmd
}

#[test]
fn help_lists_options() {
    let tmp = TempDir::new().unwrap();
    bin(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--max-repos"))
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn missing_registry_is_not_fatal() {
    let tmp = TempDir::new().unwrap();
    bin(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("0 repositories processed"))
        .stderr(predicate::str::contains("Failed to read registry file"));
}

#[test]
fn invalid_max_repos_is_a_usage_error() {
    let tmp = TempDir::new().unwrap();
    bin(tmp.path())
        .args(["--max-repos", "many"])
        .assert()
        .code(2);
}

#[test]
fn prunes_repositories_under_path_repos() {
    let tmp = TempDir::new().unwrap();
    let clones = tmp.path().join("clones");
    let repo_a = clones.join("repoA");
    init_repo(&repo_a, "main");
    git(&repo_a, &["branch", "feature-x"]);
    git(&repo_a, &["branch", "main-backup"]);
    fs::write(
        tmp.path().join("dir.json"),
        r#"{"repoA": "main", "repoB": "develop"}"#,
    )
    .unwrap();

    let output = bin(tmp.path())
        .env("PATH_REPOS", &clones)
        .args(["--minimal", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("'repoB' skipped").count(), 1, "{stderr}");

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let repos = summary["repos"].as_array().unwrap();
    assert_eq!(repos.len(), 2);

    let a = repos.iter().find(|r| r["name"] == "repoA").unwrap();
    assert_eq!(a["status"], "success");
    assert_eq!(a["deleted"], serde_json::json!(["feature-x", "main-backup"]));

    let b = repos.iter().find(|r| r["name"] == "repoB").unwrap();
    assert_eq!(b["status"], "skipped");

    assert_eq!(local_branches(&repo_a), vec!["main"]);
}

#[test]
fn dry_run_reports_without_deleting() {
    let tmp = TempDir::new().unwrap();
    let repo = tmp.path().join("svc");
    init_repo(&repo, "develop");
    git(&repo, &["branch", "old"]);
    fs::write(tmp.path().join("repos.yaml"), "svc: develop\n").unwrap();

    bin(tmp.path())
        .args(["--registry", "repos.yaml", "--base-dir"])
        .arg(tmp.path())
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Would delete old"))
        .stdout(predicate::str::contains("branches would be deleted"));

    assert_eq!(local_branches(&repo), vec!["develop", "old"]);
}

#[test]
fn unreachable_git_fails_the_run() {
    let tmp = TempDir::new().unwrap();
    let repo = tmp.path().join("svc");
    init_repo(&repo, "main");
    fs::write(tmp.path().join("dir.json"), r#"{"svc": "main"}"#).unwrap();

    let output = bin(tmp.path())
        .env("PATH", "")
        .arg("--json")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error in svc"), "{stderr}");

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let svc = &summary["repos"][0];
    assert_eq!(svc["name"], "svc");
    assert_eq!(svc["status"], "failed");
    assert!(svc["message"]
        .as_str()
        .unwrap()
        .contains("Failed to run git"));
}
