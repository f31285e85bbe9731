//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Keep a local mirror of a git content repository and publish it as an
/// in-memory snapshot
#[derive(Parser, Debug, Clone)]
#[command(name = "folio", version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root; the config file and relative paths resolve against it
    #[arg(short, long, global = true)]
    pub root: Option<PathBuf>,

    /// Config file name (default: folio.toml)
    #[arg(short = 'C', long, default_value = "folio.toml", global = true)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Overrides for the `[source]` section
#[derive(clap::Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Content repository URL
    #[arg(long)]
    pub url: Option<String>,

    /// Branch to track
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Local mirror directory (relative to project root)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Sync and load once, then keep refreshing until interrupted
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// Refresh period, e.g. `30s`, `5m`, `1h`
        #[arg(short, long)]
        interval: Option<String>,
    },

    /// Run a single sync and load cycle, then exit
    Sync {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Load a local content directory without touching git
    Check {
        /// Content directory holding `blog/`, `projects/` and `resume/`
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
}

impl Cli {
    pub const fn source_args(&self) -> Option<&SourceArgs> {
        match &self.command {
            Commands::Run { source, .. } | Commands::Sync { source } => Some(source),
            Commands::Check { .. } => None,
        }
    }

    pub fn interval(&self) -> Option<&str> {
        match &self.command {
            Commands::Run { interval, .. } => interval.as_deref(),
            _ => None,
        }
    }
}
