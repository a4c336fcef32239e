//! Terminal host: the status line on stdout and prompts answered on stdin.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use relaymeter_app::{HostWindow, Presenter};
use relaymeter_core::{CommandId, StatusColor, ThemeColor, Tooltip};
use tokio::sync::oneshot;
use tracing::debug;

use crate::output::{NoticeLevel, TextFormatter};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ============================================================================
// Presenter
// ============================================================================

#[derive(Default)]
struct StatusItem {
    text: String,
    color: Option<StatusColor>,
    tooltip: Tooltip,
    command: Option<CommandId>,
    printed: Option<String>,
}

/// Prints the status line whenever it changes.
pub struct TerminalPresenter {
    formatter: TextFormatter,
    echo: bool,
    item: Mutex<StatusItem>,
}

impl TerminalPresenter {
    /// Creates a presenter that prints on every change.
    pub fn new(use_colors: bool) -> Self {
        Self {
            formatter: TextFormatter::new(use_colors),
            echo: true,
            item: Mutex::new(StatusItem::default()),
        }
    }

    /// Creates a presenter that only records; used by one-shot commands.
    pub fn silent(use_colors: bool) -> Self {
        Self {
            echo: false,
            ..Self::new(use_colors)
        }
    }

    /// Current status line, formatted.
    pub fn line(&self) -> String {
        let item = lock(&self.item);
        let color = item
            .color
            .clone()
            .unwrap_or(StatusColor::Theme(ThemeColor::Foreground));
        self.formatter.status_line(&item.text, &color)
    }

    /// Current tooltip, formatted.
    pub fn tooltip(&self) -> String {
        self.formatter.tooltip(&lock(&self.item).tooltip)
    }

    /// Command bound to the status item.
    pub fn command(&self) -> Option<CommandId> {
        lock(&self.item).command
    }
}

impl Presenter for TerminalPresenter {
    fn set_text(&self, text: &str) {
        lock(&self.item).text = text.to_string();
    }

    fn set_tooltip(&self, tooltip: &Tooltip) {
        lock(&self.item).tooltip = tooltip.clone();
    }

    fn set_color(&self, color: &StatusColor) {
        lock(&self.item).color = Some(color.clone());
    }

    fn set_command(&self, command: Option<CommandId>) {
        lock(&self.item).command = command;
    }

    fn show(&self) {
        if !self.echo {
            return;
        }
        let line = self.line();
        let mut item = lock(&self.item);
        if item.printed.as_deref() != Some(line.as_str()) {
            println!("{line}");
            item.printed = Some(line);
        }
    }
}

// ============================================================================
// Window
// ============================================================================

/// Notifications on stderr; prompts answered by the next stdin line.
///
/// A non-interactive window prints prompts and dismisses them at once.
pub struct TerminalWindow {
    formatter: TextFormatter,
    settings_path: PathBuf,
    interactive: bool,
    pending: Mutex<Option<oneshot::Sender<String>>>,
    prompt: tokio::sync::Mutex<()>,
}

impl TerminalWindow {
    /// Creates a non-interactive window.
    pub fn new(use_colors: bool, settings_path: PathBuf) -> Self {
        Self {
            formatter: TextFormatter::new(use_colors),
            settings_path,
            interactive: false,
            pending: Mutex::new(None),
            prompt: tokio::sync::Mutex::new(()),
        }
    }

    /// Makes prompts wait for [`TerminalWindow::answer`].
    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    /// Hands a stdin line to the open prompt. Returns false if none is open.
    pub fn answer(&self, line: &str) -> bool {
        match lock(&self.pending).take() {
            Some(tx) => {
                let _ = tx.send(line.to_string());
                true
            }
            None => false,
        }
    }

    /// Whether a prompt waits for an answer.
    #[cfg(test)]
    pub fn is_prompting(&self) -> bool {
        lock(&self.pending).is_some()
    }

    async fn ask(&self, level: NoticeLevel, message: &str, items: &[String]) -> Option<String> {
        eprintln!("{}", self.formatter.notice(level, message));
        if items.is_empty() {
            return None;
        }
        if !self.interactive {
            return None;
        }

        // One prompt at a time; later prompts queue behind the open one.
        let _turn = self.prompt.lock().await;
        eprintln!("{}", self.formatter.actions(items));

        let (tx, rx) = oneshot::channel();
        *lock(&self.pending) = Some(tx);
        let line = rx.await.ok()?;

        let choice = parse_choice(&line, items);
        debug!(answer = %line.trim(), choice = ?choice, "Prompt answered");
        choice
    }
}

/// Maps a 1-based number to an item. Anything else dismisses.
pub fn parse_choice(line: &str, items: &[String]) -> Option<String> {
    let index: usize = line.trim().parse().ok()?;
    index.checked_sub(1).and_then(|i| items.get(i)).cloned()
}

#[async_trait]
impl HostWindow for TerminalWindow {
    async fn show_info(&self, message: &str) {
        eprintln!("{}", self.formatter.notice(NoticeLevel::Info, message));
    }

    async fn show_warning(&self, message: &str, actions: &[String]) -> Option<String> {
        self.ask(NoticeLevel::Warning, message, actions).await
    }

    async fn show_error(&self, message: &str, actions: &[String]) -> Option<String> {
        self.ask(NoticeLevel::Error, message, actions).await
    }

    async fn quick_pick(&self, prompt: &str, items: &[String]) -> Option<String> {
        self.ask(NoticeLevel::Info, prompt, items).await
    }

    async fn open_external(&self, url: &str) -> std::io::Result<()> {
        eprintln!("{}", self.formatter.notice(NoticeLevel::Info, url));
        open_url(url)
    }

    async fn open_settings(&self) {
        let message = format!(
            "Settings file: {} (edit it, or type `set <key> <value>`)",
            self.settings_path.display()
        );
        eprintln!("{}", self.formatter.notice(NoticeLevel::Info, &message));
    }
}

/// Opens a URL with the platform opener.
fn open_url(url: &str) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    let mut command = {
        let mut c = std::process::Command::new("open");
        c.arg(url);
        c
    };

    #[cfg(target_os = "windows")]
    let mut command = {
        let mut c = std::process::Command::new("cmd");
        c.args(["/C", "start", "", url]);
        c
    };

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut command = {
        let mut c = std::process::Command::new("xdg-open");
        c.arg(url);
        c
    };

    command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map(|_| ())
}
