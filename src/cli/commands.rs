use crate::collectors::RepoIdentity;
use clap::{Args, Parser, Subcommand};

/// `contribscore` - plugin-driven contributor capability scoring.
#[derive(Parser, Debug)]
#[command(name = "contribscore")]
#[command(version)]
#[command(
    about = "Score contributor capabilities from repository commit history.",
    long_about = None
)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List discovered scan plugins and the default
    Plugins,

    /// Fetch new commits for one or more repositories into the local index
    Sync {
        /// Repository URLs (github.com/owner/repo, gitee.com/owner/repo)
        #[arg(required = true, num_args = 1.., value_parser = parse_repo)]
        repos: Vec<RepoIdentity>,

        /// Ignore the sync bookmark and refetch the full window
        #[arg(long)]
        full: bool,
    },

    /// List commit authors in a repository, most active first
    Authors {
        #[arg(value_parser = parse_repo)]
        repo: RepoIdentity,
    },

    /// Authors who committed to at least two of the given synced repositories
    Contributors {
        #[arg(required = true, num_args = 2.., value_parser = parse_repo)]
        repos: Vec<RepoIdentity>,

        /// Comma-separated names of one person to count as a single contributor
        #[arg(long)]
        aliases: Option<String>,
    },

    /// Evaluate one contributor in one repository
    Evaluate {
        #[arg(value_parser = parse_repo)]
        repo: RepoIdentity,

        /// Commit author name
        author: String,

        #[command(flatten)]
        options: EvaluateArgs,
    },

    /// Evaluate one contributor across several repositories
    Compare {
        contributor: String,

        #[arg(required = true, num_args = 1.., value_parser = parse_repo)]
        repos: Vec<RepoIdentity>,

        #[command(flatten)]
        options: EvaluateArgs,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct EvaluateArgs {
    /// Scan plugin id (default plugin when omitted)
    #[arg(long)]
    pub plugin: Option<String>,

    /// Recompute instead of reusing a cached evaluation
    #[arg(long)]
    pub no_cache: bool,

    /// Model passed through to the plugin
    #[arg(long)]
    pub model: Option<String>,

    /// Comma-separated identities of the same person (must include the contributor)
    #[arg(long)]
    pub aliases: Option<String>,
}

pub fn parse_repo(raw: &str) -> Result<RepoIdentity, String> {
    RepoIdentity::parse_url(raw).ok_or_else(|| format!("not a GitHub or Gitee repository: {raw}"))
}
