//! CLI parse: clap types for Beacon. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Beacon CLI - drive progress sessions in a terminal
#[derive(Parser, Debug)]
#[command(name = "beacon")]
#[command(about = "Progress session registry demo host")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the user config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Emit render events as JSON lines instead of terminal lines
    #[arg(long)]
    pub json: bool,

    /// Disable ANSI colors in terminal output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose logging
    #[arg(long)]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run a scripted tour: phases, cancellation, tracked work, notification
    Demo {
        /// Delay between scripted steps in milliseconds
        #[arg(long, default_value = "40")]
        step_ms: u64,
    },
    /// Show a timed notification and wait for it to expire
    Notify {
        /// Notification text
        message: String,
        /// Display duration in milliseconds (defaults to the configured duration)
        #[arg(long)]
        duration_ms: Option<u64>,
    },
    /// Print the effective configuration as TOML
    Config,
}
