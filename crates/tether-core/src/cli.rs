use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::filter::{PriorityFilter, StatusFilter};
use crate::task::{Priority, Status};

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "todo",
    version,
    about = "Tether: CLI client for the todo REST backend",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List tasks, narrowed by client-side search and filters.
    List {
        /// Case-insensitive match against title or description.
        #[arg(long, default_value = "")]
        search: String,

        /// all, pending, in_progress or completed.
        #[arg(
            long,
            default_value = "all",
            value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<StatusFilter>())
        )]
        status: StatusFilter,

        /// all, low, medium or high.
        #[arg(
            long,
            default_value = "all",
            value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<PriorityFilter>())
        )]
        priority: PriorityFilter,
    },

    /// Show summary counts over the full collection.
    Stats,

    /// Create a task.
    Add {
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(
            long,
            default_value = "pending",
            value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<Status>())
        )]
        status: Status,

        #[arg(
            long,
            default_value = "medium",
            value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<Priority>())
        )]
        priority: Priority,

        /// PDF attachment to upload with the task.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Replace a task's fields wholesale.
    Modify {
        id: String,

        #[arg(long)]
        title: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(
            long,
            default_value = "pending",
            value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<Status>())
        )]
        status: Status,

        #[arg(
            long,
            default_value = "medium",
            value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<Priority>())
        )]
        priority: Priority,

        /// New PDF attachment to upload with the update.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Toggle a task between pending and completed.
    Done { id: String },

    /// Delete a task.
    Delete { id: String },

    /// Show one task in detail.
    Info { id: String },

    /// Print the URL the task's attachment is served from.
    Open { id: String },

    /// Print the effective configuration.
    Config,

    /// Print the version.
    Version,
}

impl Default for Command {
    fn default() -> Self {
        Command::List {
            search: String::new(),
            status: StatusFilter::All,
            priority: PriorityFilter::All,
        }
    }
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
