//! Console progress and run summary output.

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::outcome::{RepoOutcome, RepoStatus, RunSummary};

/// Progress output for a run.
///
/// With a terminal on stdout, a progress bar tracks repositories and every
/// line goes through it. `quiet` suppresses everything (used for `--json`).
pub struct Reporter {
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl Reporter {
    pub fn new(quiet: bool) -> Self {
        Self { bar: None, quiet }
    }

    /// Reporter that prints nothing.
    pub fn silent() -> Self {
        Self::new(true)
    }

    /// Called once the number of repositories to process is known.
    pub fn start(&mut self, total: usize) {
        if self.quiet || total == 0 || !console::Term::stdout().is_term() {
            return;
        }
        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        self.bar = Some(bar);
    }

    pub fn line(&self, msg: impl AsRef<str>) {
        if self.quiet {
            return;
        }
        match &self.bar {
            Some(bar) => bar.println(msg.as_ref()),
            None => println!("{}", msg.as_ref()),
        }
    }

    pub fn repo_started(&self, name: &str, main_branch: &str) {
        if let Some(bar) = &self.bar {
            bar.set_message(format!("{name} ({main_branch})"));
        }
        self.line(format!(
            "{} {} {}",
            style("==>").cyan().bold(),
            style(name).bold(),
            style(format!("[{main_branch}]")).dim()
        ));
    }

    pub fn step(&self, description: &str) {
        self.line(format!("    {description}"));
    }

    pub fn repo_finished(&self, outcome: &RepoOutcome) {
        self.line(outcome_line(outcome));
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

fn branch_list(names: &[String]) -> String {
    if names.is_empty() {
        String::new()
    } else {
        format!(" ({})", names.join(", "))
    }
}

/// One-line description of a repository outcome.
pub fn outcome_line(outcome: &RepoOutcome) -> String {
    let verb = if outcome.status == RepoStatus::Skipped {
        ""
    } else if outcome.deleted.is_empty() {
        "no branches to delete"
    } else {
        "deleted"
    };
    let deleted = if outcome.deleted.is_empty() {
        verb.to_string()
    } else {
        format!(
            "{verb} {} branch{}{}",
            outcome.deleted.len(),
            if outcome.deleted.len() == 1 { "" } else { "es" },
            branch_list(&outcome.deleted)
        )
    };

    match outcome.status {
        RepoStatus::Success => format!("{} {}: {}", style("✓").green(), outcome.name, deleted),
        RepoStatus::Partial => {
            let mut parts = vec![deleted];
            if outcome.final_branch.as_deref() != Some(outcome.main_branch.as_str()) {
                parts.push(format!("not on {}", outcome.main_branch));
            }
            if !outcome.failed_deletions.is_empty() {
                let failed: Vec<String> = outcome
                    .failed_deletions
                    .iter()
                    .map(|f| f.branch.clone())
                    .collect();
                parts.push(format!(
                    "{} not deleted{}",
                    failed.len(),
                    branch_list(&failed)
                ));
            }
            format!(
                "{} {}: {}",
                style("!").yellow().bold(),
                outcome.name,
                parts.join(", ")
            )
        }
        RepoStatus::Skipped => format!(
            "{} {}: skipped ({})",
            style("-").dim(),
            outcome.name,
            outcome.message.as_deref().unwrap_or("not a git repository")
        ),
        RepoStatus::Failed => format!(
            "{} {}: failed: {}",
            style("✗").red().bold(),
            outcome.name,
            outcome.message.as_deref().unwrap_or("unknown error")
        ),
    }
}

/// Print the closing human-readable summary.
pub fn print_summary(summary: &RunSummary) {
    println!();
    if let Some(err) = &summary.config_error {
        println!("{} {}", style("Registry not loaded:").red().bold(), err);
    }
    for outcome in summary.repos.iter() {
        for failure in &outcome.step_failures {
            println!(
                "  {} {}: {} failed: {}",
                style("note").dim(),
                outcome.name,
                failure.step,
                failure.message
            );
        }
    }
    let deleted_label = if summary.dry_run {
        "branches would be deleted"
    } else {
        "branches deleted"
    };
    println!(
        "{} repositories processed ({} ok, {} partial, {} failed), {} skipped, {} {}",
        summary.processed(),
        style(summary.count(RepoStatus::Success)).green(),
        style(summary.count(RepoStatus::Partial)).yellow(),
        style(summary.count(RepoStatus::Failed)).red(),
        summary.count(RepoStatus::Skipped),
        summary.deleted_total(),
        deleted_label,
    );
}

/// Print the summary as pretty JSON on stdout.
pub fn print_json(summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("Failed to serialize run summary")?;
    println!("{json}");
    Ok(())
}
