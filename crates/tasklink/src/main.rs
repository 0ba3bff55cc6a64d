//! CLI entry point for tasklink.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tasklink_client::{ClientConfig, TaskClient};
use tasklink_core::{SpecialFilter, TaskId};
use tracing_subscriber::{EnvFilter, fmt::format::FmtSpan};

mod commands;

const DEFAULT_LOG_LEVEL: &str = "info";

/// Talk to a remote task server from the command line.
#[derive(Parser, Debug)]
#[command(
    name = "tasklink",
    version,
    about = "tasklink: cached client for a remote task server"
)]
struct Cli {
    /// Configuration file (defaults to ./tasklink.toml, then the user config dir).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Server host, overriding configuration and environment.
    #[arg(long)]
    host: Option<String>,

    /// Server port, overriding configuration and environment.
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List tasks that are not archived.
    Ls,

    /// Show one cached task as JSON.
    Show {
        #[arg(long)]
        id: TaskId,
    },

    /// Create a task on the server.
    Add {
        #[arg(long)]
        description: String,
        /// Due date as YYYY-MM-DD.
        #[arg(long)]
        date: Option<String>,
        #[arg(short = 't', long = "tag")]
        tags: Vec<String>,
        #[arg(short = 's', long = "subtask")]
        subtasks: Vec<String>,
    },

    /// Archive a task.
    Rm {
        #[arg(long)]
        id: TaskId,
    },

    /// Mark a task as done.
    Done {
        #[arg(long)]
        id: TaskId,
    },

    /// Reload the snapshot and report whether anything changed.
    Sync,

    /// Print the tasks selected by a filter.
    Filter {
        /// Only tasks that are not done.
        #[arg(long)]
        open: bool,
        /// Only tasks that are done (wins over --open).
        #[arg(long)]
        done: bool,
        /// Ignore completion (wins over --open and --done).
        #[arg(long)]
        all: bool,
        /// Only tasks due within a week, overdue included.
        #[arg(long)]
        due_soon: bool,
        /// Comma-separated tags that must all be present.
        #[arg(long)]
        tags: Option<String>,
        /// Case-insensitive description substring.
        #[arg(long)]
        text: Option<String>,
        /// Special filter by name or index (1-5).
        #[arg(long)]
        special: Option<SpecialFilter>,
    },
}

fn main() -> Result<()> {
    let Cli {
        config,
        host,
        port,
        cmd,
    } = Cli::parse();

    install_tracing();

    let config = load_config(config, host, port)?;
    let client = TaskClient::connect(&config)
        .with_context(|| format!("Failed to connect to {}", config.endpoint()))?;
    let result = commands::run(cmd, &client);
    client.close();
    result
}

fn load_config(path: Option<PathBuf>, host: Option<String>, port: Option<u16>) -> Result<ClientConfig> {
    let mut config = match path {
        Some(path) => ClientConfig::from_path(path)?,
        None => {
            let cwd = std::env::current_dir().context("Failed to resolve current directory")?;
            ClientConfig::discover(cwd)?
        }
    };
    config.apply_env_overrides()?;
    config.override_endpoint(host, port)?;
    Ok(config)
}

fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .filter(|value| !value.trim().is_empty())
        .map_or_else(|| EnvFilter::new(DEFAULT_LOG_LEVEL), EnvFilter::new)
}

fn install_tracing() {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(directives.as_deref());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}
