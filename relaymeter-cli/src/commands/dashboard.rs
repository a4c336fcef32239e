//! Dashboard command - open the relay's web dashboard.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use relaymeter_core::CommandId;
use tokio::sync::watch;

use crate::context::Context;
use crate::terminal::{TerminalPresenter, TerminalWindow};
use crate::Cli;

/// Arguments for the dashboard command.
#[derive(Args)]
pub struct DashboardArgs {
    /// URL to open instead of the one derived from the config.
    pub url: Option<String>,
}

/// Runs the dashboard command.
pub async fn run(args: &DashboardArgs, cli: &Cli, ctx: &Context) -> Result<()> {
    let presenter = Arc::new(TerminalPresenter::silent(!cli.no_color));
    let window = Arc::new(TerminalWindow::new(
        !cli.no_color,
        ctx.settings.path().to_path_buf(),
    ));
    let (_focus_tx, focus_rx) = watch::channel(true);
    let meter = ctx.meter(presenter, window, focus_rx, None).await?;

    meter
        .execute(CommandId::OpenWebDashboard, args.url.clone())
        .await?;
    Ok(())
}
