//! Config command - manage settings.

use anyhow::Result;
use clap::{Args, Subcommand};
use relaymeter_core::format::mask_api_key;
use relaymeter_store::{default_log_path, SETTING_KEYS};
use tracing::info;

use crate::context::Context;
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current settings (default).
    Show,

    /// Show file paths.
    Path,

    /// List settable keys.
    Keys,

    /// Set a value.
    Set {
        /// Setting key, e.g. `apiUrl` or `colorThresholds.low`.
        key: String,
        /// New value.
        value: String,
    },

    /// Reset to defaults.
    Reset,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli, ctx: &Context) -> Result<()> {
    match &args.action {
        Some(ConfigAction::Show) | None => show_config(cli, ctx).await,
        Some(ConfigAction::Path) => show_paths(cli, ctx),
        Some(ConfigAction::Keys) => show_keys(cli),
        Some(ConfigAction::Set { key, value }) => set_value(key, value, cli, ctx).await,
        Some(ConfigAction::Reset) => reset_config(cli, ctx).await,
    }
}

async fn show_config(cli: &Cli, ctx: &Context) -> Result<()> {
    let mut settings = ctx.settings.get().await;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.settings(&settings, ctx.settings.path()));
        }
        OutputFormat::Json => {
            if !settings.api_key.trim().is_empty() {
                settings.api_key = mask_api_key(&settings.api_key);
            }
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&settings)?);
        }
    }

    Ok(())
}

fn show_paths(cli: &Cli, ctx: &Context) -> Result<()> {
    let log_path = default_log_path();
    let paths = [
        ("Settings file:", ctx.settings.path()),
        ("State file:", ctx.state.path()),
        ("Claude settings:", ctx.resolver.claude_settings_path()),
        ("Log file:", log_path.as_path()),
    ];

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.paths(&paths));
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "settings_file": ctx.settings.path().display().to_string(),
                "state_file": ctx.state.path().display().to_string(),
                "claude_settings": ctx.resolver.claude_settings_path().display().to_string(),
                "log_file": log_path.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&output)?);
        }
    }

    Ok(())
}

fn show_keys(cli: &Cli) -> Result<()> {
    match cli.format {
        OutputFormat::Text => {
            for key in SETTING_KEYS {
                println!("{key}");
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&SETTING_KEYS)?);
        }
    }
    Ok(())
}

async fn set_value(key: &str, value: &str, cli: &Cli, ctx: &Context) -> Result<()> {
    ctx.settings.set(key, value).await?;
    info!(key = %key, "Setting updated");

    let shown = if key == "apiKey" && !value.is_empty() {
        mask_api_key(value)
    } else {
        value.to_string()
    };
    println!("{}", TextFormatter::new(!cli.no_color).success(&format!("{key} = {shown}")));
    Ok(())
}

async fn reset_config(cli: &Cli, ctx: &Context) -> Result<()> {
    ctx.settings.reset().await?;
    info!("Settings reset");
    println!("{}", TextFormatter::new(!cli.no_color).success("Settings reset to defaults"));
    Ok(())
}
