//! `branch-prune`: reset registered clones and delete their stale local branches.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use branch_prune::config::{expand_home, BASE_DIR_ENV, DEFAULT_REMOTE};
use branch_prune::registry::DEFAULT_REGISTRY_FILE;
use branch_prune::{report, PruneConfig, PruneSteps, Reporter};

/// Reset each registered repository to its main branch and delete every
/// other local branch.
#[derive(Parser, Debug)]
#[command(name = "branch-prune")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Registry file mapping repository directory names to their main branch
    #[arg(long, env = "BRANCH_PRUNE_REGISTRY", default_value = DEFAULT_REGISTRY_FILE)]
    registry: PathBuf,

    /// Directory the registry names are resolved under
    #[arg(long, env = BASE_DIR_ENV, default_value = "")]
    base_dir: String,

    /// Process at most this many repositories
    #[arg(long)]
    max_repos: Option<usize>,

    /// Remote whose stale tracking refs are pruned
    #[arg(long, default_value = DEFAULT_REMOTE)]
    remote: String,

    /// Skip `git reset --hard` and `git clean -fd`
    #[arg(long)]
    no_reset: bool,

    /// Skip `git pull --rebase`
    #[arg(long)]
    no_pull: bool,

    /// Skip `git remote prune`
    #[arg(long)]
    no_prune_remote: bool,

    /// Skip `git gc` and `git repack`
    #[arg(long)]
    no_compact: bool,

    /// Only switch to the main branch and delete the others
    #[arg(long)]
    minimal: bool,

    /// Show which branches would be deleted without changing anything
    #[arg(long)]
    dry_run: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging (every git command)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn steps(&self) -> PruneSteps {
        if self.minimal {
            return PruneSteps::minimal();
        }
        PruneSteps {
            reset: !self.no_reset,
            pull: !self.no_pull,
            prune_remote: !self.no_prune_remote,
            compact: !self.no_compact,
        }
    }

    fn into_config(self) -> PruneConfig {
        let steps = self.steps();
        PruneConfig {
            base_dir: expand_home(&self.base_dir),
            registry_path: self.registry,
            max_repos: self.max_repos,
            remote: self.remote,
            steps,
            dry_run: self.dry_run,
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "warn,branch_prune=debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let json = cli.json;
    let config = cli.into_config();
    log::debug!("{config:?}");

    let mut reporter = Reporter::new(json);
    let summary = branch_prune::run(&config, &mut reporter);

    if json {
        report::print_json(&summary)?;
    } else {
        report::print_summary(&summary);
    }

    std::process::exit(summary.exit_code());
}
