//! Reload and clear-state commands - manage discovered credentials.

use std::sync::Arc;

use anyhow::Result;
use relaymeter_app::Meter;
use relaymeter_core::CommandId;
use tokio::sync::watch;

use crate::context::Context;
use crate::terminal::{TerminalPresenter, TerminalWindow};
use crate::Cli;

async fn one_shot_meter(cli: &Cli, ctx: &Context) -> Result<(Meter, Arc<TerminalPresenter>)> {
    let presenter = Arc::new(TerminalPresenter::silent(!cli.no_color));
    let window = Arc::new(TerminalWindow::new(
        !cli.no_color,
        ctx.settings.path().to_path_buf(),
    ));
    let (_focus_tx, focus_rx) = watch::channel(true);
    let meter = ctx.meter(presenter.clone(), window, focus_rx, None).await?;
    Ok((meter, presenter))
}

/// Re-reads the Claude settings file and adopts a complete pair.
pub async fn reload(cli: &Cli, ctx: &Context) -> Result<()> {
    let (meter, presenter) = one_shot_meter(cli, ctx).await?;
    meter.execute(CommandId::ReloadCredentials, None).await?;
    print_status(&presenter);
    Ok(())
}

/// Forgets the runtime and skipped pairs.
pub async fn clear(cli: &Cli, ctx: &Context) -> Result<()> {
    let (meter, presenter) = one_shot_meter(cli, ctx).await?;
    meter.execute(CommandId::ClearState, None).await?;
    print_status(&presenter);
    Ok(())
}

fn print_status(presenter: &TerminalPresenter) {
    let line = presenter.line();
    if !line.is_empty() {
        println!("{line}");
    }
}
