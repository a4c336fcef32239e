//! Host surface.
//!
//! The meter never talks to a UI directly. A host provides:
//!
//! - a [`Presenter`] for the status item
//! - a [`HostWindow`] for notifications, quick-picks and links
//! - a focus signal (`watch::Receiver<bool>`)
//!
//! Everything the meter subscribes to is tracked as a [`Disposable`] so
//! deactivation can release it in one call.

use async_trait::async_trait;
use relaymeter_core::{CommandId, StatusColor, Tooltip};
use tokio::task::JoinHandle;

// ============================================================================
// Presenter
// ============================================================================

/// The status item.
pub trait Presenter: Send + Sync {
    /// Sets the one-line text.
    fn set_text(&self, text: &str);

    /// Sets the hover tooltip.
    fn set_tooltip(&self, tooltip: &Tooltip);

    /// Sets the foreground color.
    fn set_color(&self, color: &StatusColor);

    /// Sets the command run when the item is clicked.
    fn set_command(&self, command: Option<CommandId>);

    /// Makes the item visible and flushes pending changes.
    fn show(&self);
}

// ============================================================================
// Window
// ============================================================================

/// Notifications and other window-level interactions.
///
/// Methods that offer actions resolve to the chosen action label, or
/// `None` when the user dismisses the prompt.
#[async_trait]
pub trait HostWindow: Send + Sync {
    /// Shows an informational message.
    async fn show_info(&self, message: &str);

    /// Shows a warning with optional actions.
    async fn show_warning(&self, message: &str, actions: &[String]) -> Option<String>;

    /// Shows an error with optional actions.
    async fn show_error(&self, message: &str, actions: &[String]) -> Option<String>;

    /// Lets the user pick one item.
    async fn quick_pick(&self, prompt: &str, items: &[String]) -> Option<String>;

    /// Opens a URL outside the host.
    ///
    /// # Errors
    ///
    /// Returns an error if no opener could be launched.
    async fn open_external(&self, url: &str) -> std::io::Result<()>;

    /// Opens the settings editor.
    async fn open_settings(&self);
}

// ============================================================================
// Disposables
// ============================================================================

/// Something that can be released.
pub trait Disposable: Send {
    /// Releases the resource. Calling twice is a no-op.
    fn dispose(&mut self);
}

/// A spawned listener task, aborted on dispose or drop.
pub struct Subscription {
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Wraps a spawned task.
    pub fn new(handle: JoinHandle<()>) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Returns true while the task has not been disposed or finished.
    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Disposable for Subscription {
    fn dispose(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Collects disposables and releases them together.
#[derive(Default)]
pub struct DisposableStore {
    items: Vec<Box<dyn Disposable>>,
}

impl DisposableStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a disposable.
    pub fn push(&mut self, item: impl Disposable + 'static) {
        self.items.push(Box::new(item));
    }

    /// Number of held disposables.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if nothing is held.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Disposes everything in reverse registration order.
    pub fn dispose_all(&mut self) {
        while let Some(mut item) = self.items.pop() {
            item.dispose();
        }
    }
}

impl Drop for DisposableStore {
    fn drop(&mut self) {
        self.dispose_all();
    }
}
