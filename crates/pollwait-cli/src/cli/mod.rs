//! CLI for pollwait.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use pollwait_core::config;
use std::path::PathBuf;

use commands::{run_probe, run_schedule, run_watch};

/// Top-level CLI for pollwait.
#[derive(Debug, Parser)]
#[command(name = "pollwait")]
#[command(about = "pollwait: adaptive idle backoff for polling workers", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Print the configured idle schedule and error wait.
    Schedule,

    /// Show which pause a worker idle for the given time would use.
    Probe {
        /// Idle time in seconds (fractions allowed, e.g. 1.9).
        #[arg(long, value_name = "SECS")]
        idle_secs: f64,
    },

    /// Poll a directory for files, consuming each one, and back off while it is empty.
    Watch {
        /// Directory to poll.
        dir: PathBuf,
        /// Stop after this many files have been consumed.
        #[arg(long, value_name = "N")]
        max_messages: Option<u64>,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Schedule => run_schedule(&cfg.backoff)?,
            CliCommand::Probe { idle_secs } => run_probe(&cfg.backoff, idle_secs)?,
            CliCommand::Watch { dir, max_messages } => {
                run_watch(&cfg.backoff, dir, max_messages).await?
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
