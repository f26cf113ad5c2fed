//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Maze Walker - polling client for the server-authoritative maze
#[derive(Parser, Debug)]
#[command(
    name = "maze-walker",
    author,
    version,
    about = "Maze walker polling client",
    long_about = "A polling client for the server-authoritative maze walker.\n\n\
                  Establishes a session, fetches the maze layout, then polls the \n\
                  avatar position on a fixed cadence and publishes accepted state \n\
                  transitions to observers."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "MAZE_WALKER_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "MAZE_WALKER_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a polling session against the maze server
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(short, long, default_value = "config.toml", env = "MAZE_WALKER_CONFIG")]
    pub config: PathBuf,

    /// Override API base URL from configuration
    #[arg(long, env = "MAZE_WALKER_BASE_URL")]
    pub base_url: Option<String>,

    /// Override position poll interval in milliseconds
    #[arg(long, env = "MAZE_WALKER_INTERVAL_MS")]
    pub interval_ms: Option<u64>,

    /// Maximum number of applied updates before stopping (0 = unlimited)
    #[arg(long, default_value = "0", env = "MAZE_WALKER_MAX_UPDATES")]
    pub max_updates: u64,

    /// Session timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "MAZE_WALKER_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running a session
    #[arg(long)]
    pub dry_run: bool,

    /// Run against the built-in mock server instead of the network
    #[arg(long)]
    pub mock: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "0", env = "MAZE_WALKER_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}
