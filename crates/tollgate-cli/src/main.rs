//! Tollgate CLI - operator surface for the action safety gate.
//!
//! `classify` shows how a single action would be presented, `review` feeds a
//! file of submissions through a live gate and prompts for each decision,
//! and `config` inspects the resolved configuration.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config_bridge;
mod theme;

use commands::{classify, config, review};
use theme::Theme;

/// Tollgate - human confirmation for side-effecting actions
#[derive(Parser)]
#[command(name = "tollgate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify an action without submitting it
    Classify {
        /// Action type (write-file, install-package, run-shell-command, ...)
        kind: String,

        /// Parameter as key=value; values that parse as JSON are kept typed
        #[arg(short = 'p', long = "param", value_parser = parse_key_val)]
        params: Vec<(String, String)>,

        /// Print the classified action as JSON
        #[arg(long)]
        json: bool,
    },

    /// Submit actions from a JSON-lines file and review them
    Review {
        /// File with one submission per line
        file: PathBuf,

        /// Dispatch submissions without waiting for confirmation
        #[arg(long)]
        no_gate: bool,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the resolved configuration and where each value came from
    Show,
    /// List the config files that are consulted
    Paths,
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty parameter name in '{s}'"));
    }
    Ok((key.to_owned(), value.to_owned()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let workspace_root = std::env::current_dir().ok();
    let loaded = tollgate_config::Config::load(workspace_root.as_deref());

    let log_config = match &loaded {
        Ok(resolved) => {
            let mut lc = config_bridge::to_log_config(&resolved.config);
            if cli.verbose {
                "debug".clone_into(&mut lc.level);
            }
            lc
        },
        Err(_) => {
            let level = if cli.verbose { "debug" } else { "info" };
            tollgate_telemetry::LogConfig::new(level)
        },
    };
    if let Err(e) = tollgate_telemetry::setup_logging(&log_config) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match cli.command {
        Commands::Classify { kind, params, json } => {
            classify::run_classify(&kind, &params, json)?;
        },
        Commands::Review { file, no_gate } => {
            let resolved = loaded?;
            let mut options = config_bridge::to_gate_options(&resolved.config);
            if no_gate {
                options.enabled = false;
                println!(
                    "{}",
                    Theme::warning("Gate disabled: submissions run without confirmation")
                );
            }
            review::run_review(&file, options).await?;
        },
        Commands::Config { command } => match command {
            ConfigCommands::Show => config::show_config(workspace_root.as_deref())?,
            ConfigCommands::Paths => config::show_paths(workspace_root.as_deref()),
        },
    }

    Ok(())
}
