//! Reset registered git clones to their main branch and delete every other
//! local branch.
//!
//! The registry (`dir.json` by default) maps repository directory names under
//! a base directory to the branch each one keeps. All git work goes through
//! the `git` CLI with the repository path passed explicitly.

pub mod config;
pub mod git;
pub mod outcome;
pub mod pruner;
pub mod registry;
pub mod report;

#[cfg(test)]
mod test_support;

pub use config::{PruneConfig, PruneSteps};
pub use outcome::{RepoOutcome, RepoStatus, RunSummary};
pub use pruner::{branches_to_delete, prune_repository, resolve_handles, run, RepoHandle};
pub use registry::{load_registry, load_registry_or_empty, Registry};
pub use report::Reporter;
