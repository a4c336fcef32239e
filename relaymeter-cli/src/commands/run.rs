//! Run command - the interactive status line.
//!
//! The status line is printed to stdout whenever it changes. Each stdin
//! line is a command; while a prompt is open, the next line answers it.

use std::sync::Arc;

use anyhow::Result;
use relaymeter_app::{LoggingHook, Meter};
use relaymeter_core::format::mask_api_key;
use relaymeter_core::CommandId;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{error, info};

use crate::context::Context;
use crate::output::{NoticeLevel, TextFormatter};
use crate::terminal::{TerminalPresenter, TerminalWindow};
use crate::{Cli, LogControl};

const HELP: &str = "\
Commands:
  <enter>        run the status item's command
  r              refresh now
  t              show the tooltip
  s              open settings
  l              select language
  d              open the web dashboard
  c              reload credentials from the Claude settings file
  x              clear stored credentials state
  p              pause / resume polling
  set <k> <v>    change a setting
  h              this help
  q              quit";

/// One line of user input.
#[derive(Debug, PartialEq, Eq)]
enum Input {
    Click,
    Command(CommandId),
    Tooltip,
    TogglePause,
    Set { key: String, value: String },
    Help,
    Quit,
    Unknown(String),
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    match line {
        "" => Input::Click,
        "r" => Input::Command(CommandId::RefreshStats),
        "s" => Input::Command(CommandId::OpenSettings),
        "l" => Input::Command(CommandId::SelectLanguage),
        "d" => Input::Command(CommandId::OpenWebDashboard),
        "c" => Input::Command(CommandId::ReloadCredentials),
        "x" => Input::Command(CommandId::ClearState),
        "t" => Input::Tooltip,
        "p" => Input::TogglePause,
        "h" | "?" | "help" => Input::Help,
        "q" | "quit" | "exit" => Input::Quit,
        _ => {
            let mut parts = line.splitn(3, char::is_whitespace);
            match (parts.next(), parts.next(), parts.next()) {
                (Some("set"), Some(key), Some(value)) => Input::Set {
                    key: key.to_string(),
                    value: value.trim().to_string(),
                },
                (Some("set"), Some(key), None) => Input::Set {
                    key: key.to_string(),
                    value: String::new(),
                },
                _ => Input::Unknown(line.to_string()),
            }
        }
    }
}

/// Runs a command without blocking the input loop.
fn spawn_command(meter: &Meter, command: CommandId, formatter: TextFormatter) {
    let meter = meter.clone();
    tokio::spawn(async move {
        if let Err(e) = meter.execute(command, None).await {
            error!(command = %command, error = %e, "Command failed");
            eprintln!("{}", formatter.notice(NoticeLevel::Error, &e.to_string()));
        }
    });
}

/// Runs the run command.
pub async fn run(cli: &Cli, ctx: &Context, logs: LogControl) -> Result<()> {
    let use_colors = !cli.no_color;
    let formatter = TextFormatter::new(use_colors);
    let presenter = Arc::new(TerminalPresenter::new(use_colors));
    let window = Arc::new(
        TerminalWindow::new(use_colors, ctx.settings.path().to_path_buf()).interactive(),
    );
    let (focus_tx, focus_rx) = watch::channel(true);
    let hook: LoggingHook = Arc::new(move |enabled: bool| logs.set_enabled(enabled));

    let meter = ctx
        .meter(presenter.clone(), window.clone(), focus_rx, Some(hook))
        .await?;

    info!(settings = %ctx.settings.path().display(), "Starting interactive host");
    eprintln!("Type h for help, q to quit.");
    meter.activate().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };
        if window.answer(&line) {
            continue;
        }

        match parse_input(&line) {
            Input::Click => {
                if let Some(command) = presenter.command() {
                    spawn_command(&meter, command, formatter);
                }
            }
            Input::Command(command) => spawn_command(&meter, command, formatter),
            Input::Tooltip => println!("{}", presenter.tooltip()),
            Input::TogglePause => {
                focus_tx.send_modify(|focused| *focused = !*focused);
                let message = if *focus_tx.borrow() { "Resumed" } else { "Paused" };
                eprintln!("{}", formatter.notice(NoticeLevel::Info, message));
            }
            Input::Set { key, value } => match ctx.settings.set(&key, &value).await {
                Ok(()) => {
                    let shown = if key == "apiKey" && !value.is_empty() {
                        mask_api_key(&value)
                    } else {
                        value
                    };
                    eprintln!("{}", formatter.success(&format!("{key} = {shown}")));
                }
                Err(e) => eprintln!("{}", formatter.notice(NoticeLevel::Error, &e.to_string())),
            },
            Input::Help => eprintln!("{HELP}"),
            Input::Quit => break,
            Input::Unknown(other) => {
                let message = format!("Unknown input: {other} (h for help)");
                eprintln!("{}", formatter.notice(NoticeLevel::Warning, &message));
            }
        }
    }

    info!("Shutting down");
    meter.deactivate().await;
    Ok(())
}
