//! Per-repository outcomes and the run summary.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// How a single registry entry ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoStatus {
    /// On the main branch with every other branch deleted
    Success,
    /// Processed, but main could not be checked out or a deletion failed
    Partial,
    /// Not a git repository (or missing); nothing was run
    Skipped,
    /// The repository could not be accessed while processing
    Failed,
}

/// A best-effort step that exited non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    pub step: String,
    pub message: String,
}

/// A branch that `git branch -D` refused to delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchFailure {
    pub branch: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepoOutcome {
    pub name: String,
    pub path: PathBuf,
    pub main_branch: String,
    pub status: RepoStatus,
    /// Deleted branches (branches that would be deleted, in a dry run)
    pub deleted: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_deletions: Vec<BranchFailure>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub step_failures: Vec<StepFailure>,
    /// Branch checked out once processing finished
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_branch: Option<String>,
    /// Reason for a skip or failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RepoOutcome {
    pub fn new(name: &str, path: PathBuf, main_branch: &str) -> Self {
        Self {
            name: name.to_string(),
            path,
            main_branch: main_branch.to_string(),
            status: RepoStatus::Success,
            deleted: Vec::new(),
            failed_deletions: Vec::new(),
            step_failures: Vec::new(),
            final_branch: None,
            message: None,
        }
    }

    pub fn skipped(name: &str, path: PathBuf, main_branch: &str, message: String) -> Self {
        Self {
            status: RepoStatus::Skipped,
            message: Some(message),
            ..Self::new(name, path, main_branch)
        }
    }

    pub fn record_step_failure(&mut self, step: &str, message: String) {
        self.step_failures.push(StepFailure {
            step: step.to_string(),
            message,
        });
    }

    pub fn record_failed_deletion(&mut self, branch: &str, message: String) {
        self.failed_deletions.push(BranchFailure {
            branch: branch.to_string(),
            message,
        });
    }

    /// Mark as failed, keeping whatever was already recorded.
    pub fn fail(&mut self, message: String) {
        self.status = RepoStatus::Failed;
        self.message = Some(message);
    }

    /// Settle Success vs Partial from what was recorded. Skipped and Failed
    /// are left alone.
    pub fn settle(&mut self) {
        if matches!(self.status, RepoStatus::Skipped | RepoStatus::Failed) {
            return;
        }
        let on_main = self.final_branch.as_deref() == Some(self.main_branch.as_str());
        self.status = if on_main && self.failed_deletions.is_empty() {
            RepoStatus::Success
        } else {
            RepoStatus::Partial
        };
    }
}

/// Everything a run did, in registry order.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub registry: PathBuf,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_error: Option<String>,
    pub repos: Vec<RepoOutcome>,
}

impl RunSummary {
    pub fn count(&self, status: RepoStatus) -> usize {
        self.repos.iter().filter(|r| r.status == status).count()
    }

    /// Repositories the step sequence was started on.
    pub fn processed(&self) -> usize {
        self.repos
            .iter()
            .filter(|r| r.status != RepoStatus::Skipped)
            .count()
    }

    pub fn deleted_total(&self) -> usize {
        self.repos.iter().map(|r| r.deleted.len()).sum()
    }

    /// 1 when any repository hit a hard failure, else 0.
    pub fn exit_code(&self) -> i32 {
        if self.count(RepoStatus::Failed) > 0 {
            1
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: RepoStatus) -> RepoOutcome {
        RepoOutcome {
            status,
            ..RepoOutcome::new("repo", PathBuf::from("repo"), "main")
        }
    }

    fn summary(repos: Vec<RepoOutcome>) -> RunSummary {
        RunSummary {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            registry: PathBuf::from("dir.json"),
            dry_run: false,
            config_error: None,
            repos,
        }
    }

    #[test]
    fn settle_success_when_on_main_and_all_deleted() {
        let mut o = RepoOutcome::new("repo", PathBuf::from("repo"), "main");
        o.final_branch = Some("main".to_string());
        o.deleted.push("feature".to_string());
        o.record_step_failure("pull", "no upstream".to_string());
        o.settle();
        assert_eq!(o.status, RepoStatus::Success);
    }

    #[test]
    fn settle_partial_when_deletion_failed() {
        let mut o = RepoOutcome::new("repo", PathBuf::from("repo"), "main");
        o.final_branch = Some("main".to_string());
        o.record_failed_deletion("locked", "checked out elsewhere".to_string());
        o.settle();
        assert_eq!(o.status, RepoStatus::Partial);
    }

    #[test]
    fn settle_partial_when_not_on_main() {
        let mut o = RepoOutcome::new("repo", PathBuf::from("repo"), "main");
        o.final_branch = Some("develop".to_string());
        o.settle();
        assert_eq!(o.status, RepoStatus::Partial);
    }

    #[test]
    fn settle_keeps_failed() {
        let mut o = RepoOutcome::new("repo", PathBuf::from("repo"), "main");
        o.fail("gone".to_string());
        o.settle();
        assert_eq!(o.status, RepoStatus::Failed);
    }

    #[test]
    fn exit_code_only_reflects_failures() {
        let ok = summary(vec![
            outcome(RepoStatus::Success),
            outcome(RepoStatus::Skipped),
            outcome(RepoStatus::Partial),
        ]);
        assert_eq!(ok.exit_code(), 0);
        assert_eq!(ok.processed(), 2);

        let bad = summary(vec![outcome(RepoStatus::Success), outcome(RepoStatus::Failed)]);
        assert_eq!(bad.exit_code(), 1);
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_value(outcome(RepoStatus::Skipped)).unwrap();
        assert_eq!(json["status"], "skipped");
        assert!(json.get("failed_deletions").is_none());
    }
}
