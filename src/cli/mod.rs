//! Command-line interface for rec-cue.
//!
//! This module handles CLI argument parsing and the `check` / `init` subcommands.
//! Subcommand implementations live in the [`commands`] submodule.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// rec-cue - Recording indicator driven by folder activity
#[derive(Parser, Debug)]
#[command(name = "rec-cue")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Folder to monitor (repeatable; replaces the configured folders)
    #[arg(long = "folder", value_name = "DIR")]
    pub folders: Vec<String>,

    /// Inactivity timeout in milliseconds (overrides config)
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Poll fallback interval in milliseconds (overrides config)
    #[arg(long, value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// Exit after the specified number of seconds
    #[arg(long, value_name = "SECONDS")]
    pub exit_after: Option<f64>,

    /// Set debug log level (overrides config and RUST_LOG)
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevelArg>,
}

/// Log level argument for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogLevelArg {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevelArg {
    /// Convert to `log::LevelFilter`
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevelArg::Off => log::LevelFilter::Off,
            LogLevelArg::Error => log::LevelFilter::Error,
            LogLevelArg::Warn => log::LevelFilter::Warn,
            LogLevelArg::Info => log::LevelFilter::Info,
            LogLevelArg::Debug => log::LevelFilter::Debug,
            LogLevelArg::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Report whether each configured folder can be monitored
    Check,

    /// Write a default config file
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },
}

/// Runtime options passed from CLI to the application
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RuntimeOptions {
    /// Config file override
    pub config_path: Option<PathBuf>,
    /// Folders to monitor instead of the configured ones (empty = use config)
    pub folders: Vec<String>,
    /// Inactivity timeout override
    pub inactivity_timeout_ms: Option<u64>,
    /// Poll interval override
    pub poll_interval_ms: Option<u64>,
    /// Exit after this many seconds
    pub exit_after: Option<f64>,
    /// Log level override from CLI
    pub log_level: Option<log::LevelFilter>,
}

/// Result of CLI processing
#[derive(Debug, PartialEq)]
pub enum CliResult {
    /// Continue with normal startup
    Continue(RuntimeOptions),
    /// Exit with the given code (subcommand completed)
    Exit(i32),
}

/// Process CLI arguments and handle subcommands
pub fn process_cli() -> CliResult {
    process(Cli::parse())
}

/// Dispatch an already-parsed command line.
pub fn process(cli: Cli) -> CliResult {
    use commands::{check_cli, init_cli};

    match cli.command {
        Some(Commands::Check) => {
            let code = match check_cli(cli.config.as_deref()) {
                Ok(true) => 0,
                Ok(false) => 1,
                Err(e) => {
                    eprintln!("rec-cue: error: {e:#}");
                    2
                }
            };
            CliResult::Exit(code)
        }
        Some(Commands::Init { force }) => {
            let result = init_cli(cli.config.as_deref(), force);
            if let Err(e) = &result {
                eprintln!("rec-cue: error: {e:#}");
            }
            CliResult::Exit(if result.is_ok() { 0 } else { 1 })
        }
        None => CliResult::Continue(RuntimeOptions {
            config_path: cli.config,
            folders: cli.folders,
            inactivity_timeout_ms: cli.timeout_ms,
            poll_interval_ms: cli.poll_interval_ms,
            exit_after: cli.exit_after,
            log_level: cli.log_level.map(|l| l.to_level_filter()),
        }),
    }
}
