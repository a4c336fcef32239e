// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Relay Meter CLI - Claude Relay Service usage from the terminal.
//!
//! # Examples
//!
//! ```bash
//! # One-shot usage (default)
//! relaymeter
//!
//! # Interactive status line with live polling
//! relaymeter run
//!
//! # JSON output
//! relaymeter usage --format json --pretty
//!
//! # Configure by hand
//! relaymeter config set apiUrl https://relay.example.com
//! relaymeter config set apiKey cr_xxxxxxxx
//!
//! # Switch language
//! relaymeter language en
//! ```

mod commands;
mod context;
mod output;
mod terminal;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use relaymeter_store::default_log_path;
use tracing::warn;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter, Registry};

use commands::{config, dashboard, language, run, state, usage};
use context::Context;

// ============================================================================
// CLI Definition
// ============================================================================

/// Relay Meter CLI - Claude Relay Service usage monitoring.
#[derive(Parser)]
#[command(name = "relaymeter")]
#[command(about = "Claude Relay Service usage meter")]
#[command(long_about = r#"
Relay Meter shows the daily cost, limits, and rate-limit window of a
Claude Relay Service API key.

Credentials come from the settings file (apiUrl + apiId or apiKey) or,
when those are empty, from ~/.claude/settings.json
(ANTHROPIC_BASE_URL + ANTHROPIC_AUTH_TOKEN).

Examples:
  relaymeter                     # One-shot usage
  relaymeter run                 # Interactive status line
  relaymeter --format json       # JSON output
  relaymeter config show         # Current settings
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'usage' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Settings file to use instead of the default.
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// State file to use instead of the default.
    #[arg(long, global = true, value_name = "PATH")]
    pub state: Option<PathBuf>,

    /// Claude settings file to read credentials from.
    #[arg(long, global = true, value_name = "PATH")]
    pub claude_settings: Option<PathBuf>,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run the interactive status line.
    #[command(visible_alias = "r")]
    Run,

    /// Fetch current usage once (default if no command specified).
    #[command(visible_alias = "u")]
    Usage,

    /// Manage settings.
    Config(config::ConfigArgs),

    /// Set the display language.
    Language(language::LanguageArgs),

    /// Re-read credentials from the Claude settings file.
    Reload,

    /// Forget the runtime and skipped credentials.
    ClearState,

    /// Open the web dashboard.
    Dashboard(dashboard::DashboardArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    #[allow(dead_code)]
    Success = 0,
    /// General error.
    Error = 1,
}

// ============================================================================
// Logging Setup
// ============================================================================

/// Where log lines go.
enum LogTarget {
    /// stderr, for one-shot commands.
    Stderr,
    /// A file, so the interactive status line stays clean.
    File(PathBuf),
}

/// Handle for changing the log filter at runtime.
#[derive(Clone)]
pub struct LogControl {
    handle: reload::Handle<EnvFilter, Registry>,
    verbose: bool,
    enabled_level: &'static str,
}

impl LogControl {
    /// Applies the `enableLogging` setting.
    pub fn set_enabled(&self, enabled: bool) {
        let filter = log_filter(self.verbose, enabled, self.enabled_level);
        if let Err(e) = self.handle.reload(filter) {
            warn!(error = %e, "Failed to update log filter");
        }
    }
}

/// Errors are always logged; `enableLogging` only governs the rest.
fn log_filter(verbose: bool, enabled: bool, enabled_level: &str) -> EnvFilter {
    if verbose {
        EnvFilter::new("relaymeter=debug")
    } else if enabled {
        EnvFilter::new(format!("relaymeter={enabled_level}"))
    } else {
        EnvFilter::new("relaymeter=error")
    }
}

fn setup_logging(verbose: bool, enabled: bool, target: LogTarget) -> LogControl {
    let (writer, ansi, enabled_level) = match target {
        LogTarget::Stderr => (BoxMakeWriter::new(std::io::stderr), true, "warn"),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match std::fs::OpenOptions::new().create(true).append(true).open(&path) {
                Ok(file) => (BoxMakeWriter::new(std::sync::Mutex::new(file)), false, "info"),
                Err(e) => {
                    eprintln!("Cannot open log file {}: {e}", path.display());
                    (BoxMakeWriter::new(std::io::sink), false, "info")
                }
            }
        }
    };

    let (filter, handle) = reload::Layer::new(log_filter(verbose, enabled, enabled_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(ansi)
                .with_writer(writer),
        )
        .init();

    LogControl {
        handle,
        verbose,
        enabled_level,
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let ctx = Context::load(&cli).await;
    let enabled = ctx.settings.get().await.enable_logging;
    let target = match cli.command {
        Some(Commands::Run) => LogTarget::File(default_log_path()),
        _ => LogTarget::Stderr,
    };
    let logs = setup_logging(cli.verbose, enabled, target);

    let result = match &cli.command {
        Some(Commands::Run) => run::run(&cli, &ctx, logs).await,
        Some(Commands::Usage) | None => usage::run(&cli, &ctx).await,
        Some(Commands::Config(args)) => config::run(args, &cli, &ctx).await,
        Some(Commands::Language(args)) => language::run(args, &cli, &ctx).await,
        Some(Commands::Reload) => state::reload(&cli, &ctx).await,
        Some(Commands::ClearState) => state::clear(&cli, &ctx).await,
        Some(Commands::Dashboard(args)) => dashboard::run(args, &cli, &ctx).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(ExitCode::Error as i32);
    }

    Ok(())
}
