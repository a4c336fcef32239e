//! Usage command - fetch and display usage once.

use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use relaymeter_app::CycleOutcome;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::context::Context;
use crate::output::{JsonFormatter, UnconfiguredOutput};
use crate::terminal::{TerminalPresenter, TerminalWindow};
use crate::{Cli, OutputFormat};

/// Runs the usage command.
pub async fn run(cli: &Cli, ctx: &Context) -> Result<()> {
    let use_colors = !cli.no_color && cli.format == OutputFormat::Text;
    let presenter = Arc::new(TerminalPresenter::silent(use_colors));
    let window = Arc::new(TerminalWindow::new(
        !cli.no_color,
        ctx.settings.path().to_path_buf(),
    ));
    let (_focus_tx, focus_rx) = watch::channel(true);
    let meter = ctx.meter(presenter.clone(), window, focus_rx, None).await?;

    info!("Fetching usage");
    let outcome = meter.update_stats().await;
    debug!(outcome = ?outcome, "Fetch finished");

    match outcome {
        CycleOutcome::Updated => {
            let snapshot = meter
                .last_snapshot()
                .await
                .context("no usage data after a successful fetch")?;

            match cli.format {
                OutputFormat::Text => {
                    println!("{}", presenter.line());
                    println!();
                    println!("{}", presenter.tooltip());
                }
                OutputFormat::Json => {
                    let view = meter.renderer().await.snapshot(&snapshot);
                    let formatter = JsonFormatter::new(cli.pretty);
                    println!("{}", formatter.format_usage(&snapshot, &view)?);
                }
            }
            Ok(())
        }
        CycleOutcome::Unconfigured(missing) => {
            match cli.format {
                OutputFormat::Text => {
                    println!("{}", presenter.line());
                    println!();
                    println!("{}", presenter.tooltip());
                }
                OutputFormat::Json => {
                    let output = UnconfiguredOutput {
                        status: presenter.line(),
                        missing,
                    };
                    println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
                }
            }
            bail!("not configured; set apiUrl and apiId or apiKey with `relaymeter config set`")
        }
        CycleOutcome::Failed(message) => bail!(message),
        CycleOutcome::Skipped => bail!("a refresh is already running"),
    }
}
