//! Claude settings change watcher.
//!
//! Watches the Claude settings file and reconciles a newly discovered
//! credential pair with the one in use:
//!
//! ```text
//! Idle -> Watching -> Debouncing -> Comparing -> Watching
//!                                        \-> PromptPending -> Watching
//! ```
//!
//! The file is compared once when watching starts, then after each burst of
//! events, which collapses into one comparison after [`DEBOUNCE`]. A pair
//! equal to the skipped pair or to the effective pair is ignored; any other
//! pair prompts the user to adopt or keep. Comparisons never overlap, so an
//! event arriving while a prompt is open is compared after the answer.

use std::sync::Arc;
use std::time::Duration;

use relaymeter_core::format::{mask_api_key, normalize_api_url};
use relaymeter_core::{CredentialPair, Translator};
use relaymeter_store::claude_settings::exists;
use relaymeter_store::{ConfigResolver, SettingsStore};
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info, warn};

use crate::error::MeterError;
use crate::file_events::{FileEvent, FileEventSource};
use crate::host::{Disposable, HostWindow, Subscription};

/// Quiet period before a burst of events is compared.
pub const DEBOUNCE: Duration = Duration::from_millis(300);

/// Called after the user adopts a new pair.
pub type RefreshCallback = Arc<dyn Fn() + Send + Sync>;

/// Observable watcher state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    /// Not watching.
    Idle,
    /// Waiting for file events.
    Watching,
    /// Collecting a burst of events.
    Debouncing,
    /// Re-reading and comparing.
    Comparing,
    /// Waiting for the user's answer.
    PromptPending,
}

/// The user's answer to a change prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    /// Use the new pair.
    Adopt,
    /// Keep the current pair.
    Keep,
    /// Open the settings editor.
    OpenSettings,
    /// Closed without answering; handled like [`PromptChoice::Keep`].
    Dismissed,
}

/// Result of one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOutcome {
    /// The file has no complete pair.
    NoPair,
    /// The pair was declined before.
    MatchesSkipped,
    /// The pair is already in use.
    MatchesEffective,
    /// The user was asked.
    Prompted(PromptChoice),
}

// ============================================================================
// Watcher
// ============================================================================

struct WatcherInner {
    settings: Arc<SettingsStore>,
    resolver: Arc<ConfigResolver>,
    window: Arc<dyn HostWindow>,
    on_adopted: RefreshCallback,
    state: watch::Sender<WatcherState>,
    comparing: Mutex<()>,
}

/// Watches the Claude settings file for credential drift.
#[derive(Clone)]
pub struct SettingsWatcher {
    inner: Arc<WatcherInner>,
}

impl SettingsWatcher {
    /// Creates an idle watcher.
    pub fn new(
        settings: Arc<SettingsStore>,
        resolver: Arc<ConfigResolver>,
        window: Arc<dyn HostWindow>,
        on_adopted: RefreshCallback,
    ) -> Self {
        let (state, _) = watch::channel(WatcherState::Idle);
        Self {
            inner: Arc::new(WatcherInner {
                settings,
                resolver,
                window,
                on_adopted,
                state,
                comparing: Mutex::new(()),
            }),
        }
    }

    /// Current state.
    pub fn state(&self) -> WatcherState {
        *self.inner.state.borrow()
    }

    /// Subscribes to state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<WatcherState> {
        self.inner.state.subscribe()
    }

    /// Starts watching and compares the file once on the watcher's task.
    ///
    /// Returns `None` and stays idle if the settings file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the event source cannot watch the file.
    pub fn start(&self, source: &dyn FileEventSource) -> Result<Option<WatcherHandle>, MeterError> {
        let path = self.inner.resolver.claude_settings_path();
        if !exists(path) {
            info!(path = %path.display(), "Claude settings not found, not watching");
            return Ok(None);
        }

        let events = source.watch(path)?;
        self.inner.set_state(WatcherState::Watching);
        info!(path = %path.display(), "Watching Claude settings");

        let inner = Arc::clone(&self.inner);
        let task = tokio::spawn(run(inner, events));

        Ok(Some(WatcherHandle {
            watcher: self.clone(),
            task: Subscription::new(task),
        }))
    }

    /// Runs one comparison now, after any comparison already in progress.
    pub async fn check_now(&self) -> CompareOutcome {
        self.inner.compare().await
    }
}

async fn run(inner: Arc<WatcherInner>, mut events: mpsc::Receiver<FileEvent>) {
    // Drift from while nothing was watching.
    let outcome = inner.compare().await;
    debug!(?outcome, "Startup comparison done");

    'outer: while let Some(event) = events.recv().await {
        debug!(?event, "Claude settings event");
        inner.set_state(WatcherState::Debouncing);

        loop {
            tokio::select! {
                next = events.recv() => match next {
                    Some(_) => {}
                    None => break 'outer,
                },
                () = tokio::time::sleep(DEBOUNCE) => break,
            }
        }

        inner.compare().await;
    }
    inner.set_state(WatcherState::Idle);
}

impl WatcherInner {
    fn set_state(&self, state: WatcherState) {
        self.state.send_replace(state);
    }

    async fn compare(&self) -> CompareOutcome {
        let _turn = self.comparing.lock().await;
        let previous = *self.state.borrow();
        self.set_state(WatcherState::Comparing);
        let outcome = self.compare_pairs().await;
        debug!(?outcome, "Claude settings compared");
        self.set_state(if previous == WatcherState::Idle {
            WatcherState::Idle
        } else {
            WatcherState::Watching
        });
        outcome
    }

    async fn compare_pairs(&self) -> CompareOutcome {
        let Some(new_pair) = self.resolver.discover().await.into_pair() else {
            return CompareOutcome::NoPair;
        };

        let skipped = self.resolver.state().skipped_config().await;
        if skipped.is_some_and(|s| same_pair(&s, &new_pair)) {
            return CompareOutcome::MatchesSkipped;
        }

        let manual = self.settings.manual_config().await;
        let current = self.resolver.current(&manual).await.map(|e| e.comparison_pair());
        if current.as_ref().is_some_and(|c| same_pair(c, &new_pair)) {
            return CompareOutcome::MatchesEffective;
        }

        self.set_state(WatcherState::PromptPending);
        let choice = self.prompt(current.as_ref(), &new_pair).await;
        self.apply_choice(choice, new_pair, manual.is_empty()).await;
        CompareOutcome::Prompted(choice)
    }

    async fn prompt(&self, current: Option<&CredentialPair>, new_pair: &CredentialPair) -> PromptChoice {
        let t = Translator::new(self.settings.language().await);
        let unknown = t.t("common.unknown");
        let (current_url, current_key) = current.map_or_else(
            || (unknown.clone(), unknown.clone()),
            |c| (c.api_url.clone(), mask_api_key(&c.api_key)),
        );
        let new_key = mask_api_key(&new_pair.api_key);

        let message = format!(
            "{}\n{}",
            t.t("notifications.configChangedTitle"),
            t.t_with(
                "notifications.configChangedDetail",
                &[
                    ("currentUrl", &current_url),
                    ("currentKey", &current_key),
                    ("newUrl", &new_pair.api_url),
                    ("newKey", &new_key),
                ],
            )
        );

        let adopt = t.t("notifications.useNewConfig");
        let keep = t.t("notifications.keepCurrentConfig");
        let open = t.t("notifications.openSettingsOption");
        let actions = [adopt.clone(), keep.clone(), open.clone()];

        match self.window.show_warning(&message, &actions).await {
            Some(choice) if choice == adopt => PromptChoice::Adopt,
            Some(choice) if choice == keep => PromptChoice::Keep,
            Some(choice) if choice == open => PromptChoice::OpenSettings,
            _ => PromptChoice::Dismissed,
        }
    }

    async fn apply_choice(&self, choice: PromptChoice, new_pair: CredentialPair, manual_empty: bool) {
        let t = Translator::new(self.settings.language().await);
        let state = self.resolver.state();

        match choice {
            PromptChoice::Adopt => {
                if let Err(e) = state.adopt(new_pair).await {
                    warn!(error = %e, "Failed to persist adopted credentials");
                    return;
                }
                if manual_empty {
                    self.window.show_info(&t.t("notifications.configUpdated")).await;
                } else {
                    warn!("Manual settings still take precedence over adopted credentials");
                    self.window.show_info(&t.t("notifications.manualConfigActive")).await;
                }
                (self.on_adopted)();
            }
            PromptChoice::Keep | PromptChoice::Dismissed => {
                info!(url = %new_pair.api_url, ?choice, "Keeping current credentials");
                if let Err(e) = state.set_skipped_config(Some(new_pair)).await {
                    warn!(error = %e, "Failed to persist skipped credentials");
                    return;
                }
                if choice == PromptChoice::Keep {
                    self.window.show_info(&t.t("notifications.configKept")).await;
                }
            }
            PromptChoice::OpenSettings => self.window.open_settings().await,
        }
    }
}

fn same_pair(a: &CredentialPair, b: &CredentialPair) -> bool {
    normalize_api_url(&a.api_url) == normalize_api_url(&b.api_url)
        && a.api_key.trim() == b.api_key.trim()
}

// ============================================================================
// Handle
// ============================================================================

/// A running watcher. Disposing stops it and returns it to idle.
pub struct WatcherHandle {
    watcher: SettingsWatcher,
    task: Subscription,
}

impl WatcherHandle {
    /// The watcher this handle runs.
    pub fn watcher(&self) -> &SettingsWatcher {
        &self.watcher
    }
}

impl Disposable for WatcherHandle {
    fn dispose(&mut self) {
        self.task.dispose();
        self.watcher.inner.set_state(WatcherState::Idle);
    }
}
