//! Mutable state owned by one [`crate::Meter`].

use relaymeter_core::{Translator, UsageSnapshot};
use relaymeter_store::Settings;

use crate::host::{DisposableStore, Subscription};
use crate::status::StatusRenderer;
use crate::watcher::{RefreshCallback, WatcherHandle, WatcherState};

/// Process state of the meter.
///
/// Lives behind the meter's mutex; never held across host calls.
pub struct AppState {
    /// Whether the host window has focus.
    pub focused: bool,
    /// Polling timer task.
    pub timer: Option<Subscription>,
    /// Running change watcher.
    pub watcher: Option<WatcherHandle>,
    /// Renderer for the current language and colors.
    pub renderer: StatusRenderer,
    /// Last settings seen, to diff against on change.
    pub settings: Settings,
    /// Message of the current failure streak.
    pub last_error: Option<String>,
    /// Last successful snapshot.
    pub last_snapshot: Option<UsageSnapshot>,
    /// Callback handed to the watcher.
    pub refresh: Option<RefreshCallback>,
    /// Settings and focus listeners.
    pub subscriptions: DisposableStore,
}

impl AppState {
    /// Creates state for the given settings and focus.
    pub fn new(settings: Settings, focused: bool) -> Self {
        Self {
            focused,
            timer: None,
            watcher: None,
            renderer: StatusRenderer::from_settings(&settings),
            settings,
            last_error: None,
            last_snapshot: None,
            refresh: None,
            subscriptions: DisposableStore::new(),
        }
    }

    /// Translator for the current language.
    pub fn translator(&self) -> Translator {
        self.renderer.translator()
    }

    /// State of the watcher, `Idle` when none runs.
    pub fn watcher_state(&self) -> WatcherState {
        self.watcher
            .as_ref()
            .map_or(WatcherState::Idle, |h| h.watcher().state())
    }
}
