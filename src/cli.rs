// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `themesmith`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "themesmith",
    version,
    about = "Build, lint and live-reload theme assets on file changes.",
    long_about = None
)]
pub struct CliArgs {
    /// Named task to run once (e.g. `styles`, `js`, `lint-styles`,
    /// `validate-markup`, `check-accessibility`).
    ///
    /// `watch` (or no task at all) starts the full session: an initial build,
    /// the dev server and the file watcher.
    #[arg(value_name = "TASK")]
    pub task: Option<String>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Themesmith.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Themesmith.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `THEMESMITH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print tasks and watch bindings, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
