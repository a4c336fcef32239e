//! Meter lifecycle.
//!
//! [`Meter`] wires the stores, the usage source, and the host together:
//! it renders status, polls on a timer while the host has focus, follows
//! settings changes, and runs the Claude settings watcher.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use relaymeter_core::{MissingConfig, StatusView, Translator, UsageSnapshot};
use relaymeter_fetch::{
    fetch_with_retry, validate_api_config, ConfigValidation, FetchError, RetryStrategy, UsageSource,
};
use relaymeter_store::{ConfigResolver, SettingsStore, StateStore};
use tokio::sync::{Mutex, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

use crate::app_state::AppState;
use crate::error::MeterError;
use crate::file_events::FileEventSource;
use crate::host::{Disposable, HostWindow, Presenter, Subscription};
use crate::status::StatusRenderer;
use crate::watcher::{RefreshCallback, SettingsWatcher, WatcherState};

/// Receives the `enableLogging` setting whenever it changes.
pub type LoggingHook = Arc<dyn Fn(bool) + Send + Sync>;

/// Everything a [`Meter`] needs from its host and environment.
pub struct MeterDeps {
    /// User settings.
    pub settings: Arc<SettingsStore>,
    /// Runtime and skipped pairs.
    pub state: Arc<StateStore>,
    /// Config resolver (owns the Claude settings path).
    pub resolver: Arc<ConfigResolver>,
    /// Metering API.
    pub source: Arc<dyn UsageSource>,
    /// Status item.
    pub presenter: Arc<dyn Presenter>,
    /// Notifications and links.
    pub window: Arc<dyn HostWindow>,
    /// Host focus signal.
    pub focus: watch::Receiver<bool>,
    /// Change events for the Claude settings file.
    pub file_events: Arc<dyn FileEventSource>,
    /// Retry policy for each polling cycle.
    pub retry: RetryStrategy,
    /// Applies logging changes, if the host supports it.
    pub logging_hook: Option<LoggingHook>,
}

/// Outcome of one [`Meter::update_stats`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A snapshot was rendered.
    Updated,
    /// Another cycle was running.
    Skipped,
    /// No usable config.
    Unconfigured(MissingConfig),
    /// The cycle failed with this message.
    Failed(String),
}

pub(crate) struct MeterInner {
    pub(crate) settings: Arc<SettingsStore>,
    pub(crate) state: Arc<StateStore>,
    pub(crate) resolver: Arc<ConfigResolver>,
    pub(crate) source: Arc<dyn UsageSource>,
    pub(crate) presenter: Arc<dyn Presenter>,
    pub(crate) window: Arc<dyn HostWindow>,
    focus: watch::Receiver<bool>,
    file_events: Arc<dyn FileEventSource>,
    retry: RetryStrategy,
    logging_hook: Option<LoggingHook>,
    pub(crate) app: Mutex<AppState>,
    in_flight: AtomicBool,
}

/// The meter. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Meter {
    pub(crate) inner: Arc<MeterInner>,
}

/// Releases the in-flight flag on drop.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Meter {
    /// Creates an inactive meter from the store's current settings.
    pub async fn new(deps: MeterDeps) -> Self {
        let settings = deps.settings.get().await;
        let focused = *deps.focus.borrow();

        Self {
            inner: Arc::new(MeterInner {
                settings: deps.settings,
                state: deps.state,
                resolver: deps.resolver,
                source: deps.source,
                presenter: deps.presenter,
                window: deps.window,
                focus: deps.focus,
                file_events: deps.file_events,
                retry: deps.retry,
                logging_hook: deps.logging_hook,
                app: Mutex::new(AppState::new(settings, focused)),
                in_flight: AtomicBool::new(false),
            }),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Translator for the current language.
    pub async fn translator(&self) -> Translator {
        self.inner.app.lock().await.translator()
    }

    /// Renderer for the current language and colors.
    pub async fn renderer(&self) -> StatusRenderer {
        self.inner.app.lock().await.renderer.clone()
    }

    /// Last successful snapshot.
    pub async fn last_snapshot(&self) -> Option<UsageSnapshot> {
        self.inner.app.lock().await.last_snapshot.clone()
    }

    /// Message of the current failure streak, if any.
    pub async fn last_error(&self) -> Option<String> {
        self.inner.app.lock().await.last_error.clone()
    }

    /// Whether the host has focus.
    pub async fn is_focused(&self) -> bool {
        self.inner.app.lock().await.focused
    }

    /// Whether the polling timer runs.
    pub async fn is_timer_running(&self) -> bool {
        self.inner
            .app
            .lock()
            .await
            .timer
            .as_ref()
            .is_some_and(Subscription::is_active)
    }

    /// State of the Claude settings watcher.
    pub async fn watcher_state(&self) -> WatcherState {
        self.inner.app.lock().await.watcher_state()
    }

    /// Settings store in use.
    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.inner.settings
    }

    fn show(&self, view: &StatusView) {
        StatusRenderer::apply(view, &*self.inner.presenter);
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Activates the meter.
    ///
    /// # Errors
    ///
    /// Returns `MeterError::Activation` if the config cannot be resolved.
    /// The failure is also shown to the user.
    pub async fn activate(&self) -> Result<(), MeterError> {
        info!("Activating");
        let renderer = self.renderer().await;
        self.show(&renderer.initializing());

        match self.activate_inner().await {
            Ok(()) => {
                info!("Activation complete");
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Activation failed");
                let t = renderer.translator();
                let message = t.t_with("errors.activationFailed", &[("error", &e.to_string())]);
                self.inner.window.show_error(&message, &[]).await;
                Err(MeterError::Activation(e.to_string()))
            }
        }
    }

    async fn activate_inner(&self) -> Result<(), MeterError> {
        self.subscribe_settings().await;
        self.subscribe_focus().await;
        self.inner.app.lock().await.refresh = Some(self.refresh_callback());

        let settings = self.inner.settings.get().await;
        let resolution = self.inner.resolver.resolve(&settings.manual_config()).await?;
        let renderer = self.renderer().await;

        if resolution.auto_configured {
            let path = self.inner.resolver.claude_settings_path().display().to_string();
            let t = renderer.translator();
            self.inner
                .window
                .show_info(&t.t_with("notifications.autoConfigured", &[("path", &path)]))
                .await;
        }

        if resolution.effective.is_some() {
            self.show(&renderer.loading());
            self.update_stats().await;
            self.start_timer().await;
        } else {
            let missing = resolution.missing.unwrap_or(MissingConfig::Both);
            warn!(?missing, "Configuration invalid");
            self.show(&renderer.unconfigured(missing));
            self.prompt_configure(renderer.translator());
        }

        if settings.watch_claude_settings {
            self.start_watcher().await;
        }
        Ok(())
    }

    /// Stops the timer and the watcher and drops all subscriptions.
    pub async fn deactivate(&self) {
        let mut app = self.inner.app.lock().await;
        if let Some(mut timer) = app.timer.take() {
            timer.dispose();
        }
        if let Some(mut watcher) = app.watcher.take() {
            watcher.dispose();
        }
        app.subscriptions.dispose_all();
        app.refresh = None;
        info!("Deactivated");
    }

    fn prompt_configure(&self, t: Translator) {
        let window = Arc::clone(&self.inner.window);
        tokio::spawn(async move {
            let configure = t.t("commands.configureNow");
            let actions = [configure.clone(), t.t("commands.later")];
            let choice = window
                .show_warning(&t.t("notifications.configInvalid"), &actions)
                .await;
            if choice.as_deref() == Some(configure.as_str()) {
                window.open_settings().await;
            }
        });
    }

    /// Schedules [`Meter::refresh`] on its own task.
    fn refresh_callback(&self) -> RefreshCallback {
        let weak = Arc::downgrade(&self.inner);
        Arc::new(move || {
            if let Some(inner) = weak.upgrade() {
                let meter = Meter { inner };
                tokio::spawn(async move {
                    meter.refresh().await;
                });
            }
        })
    }

    /// Runs one cycle, then starts the timer if an active meter has none.
    ///
    /// Credentials adopted after an unconfigured activation begin polling here.
    pub async fn refresh(&self) {
        self.update_stats().await;

        let needs_timer = {
            let app = self.inner.app.lock().await;
            app.refresh.is_some() && !app.timer.as_ref().is_some_and(Subscription::is_active)
        };
        if needs_timer {
            self.start_timer().await;
        }
    }

    // ========================================================================
    // Polling
    // ========================================================================

    /// Runs one polling cycle.
    ///
    /// A call made while another cycle runs is skipped. The first failure
    /// of a streak raises one error notification.
    #[instrument(skip(self))]
    pub async fn update_stats(&self) -> CycleOutcome {
        let outcome = {
            let Some(_guard) = InFlightGuard::acquire(&self.inner.in_flight) else {
                debug!("Refresh already in flight, skipping");
                return CycleOutcome::Skipped;
            };
            self.run_cycle().await
        };

        match &outcome {
            CycleOutcome::Updated => {
                let mut app = self.inner.app.lock().await;
                if app.last_error.take().is_some() {
                    info!("Recovered from failure streak");
                }
            }
            CycleOutcome::Failed(message) => {
                let first_in_streak = {
                    let mut app = self.inner.app.lock().await;
                    app.last_error.replace(message.clone()).is_none()
                };
                if first_in_streak {
                    self.notify_failure(message.clone()).await;
                }
            }
            CycleOutcome::Skipped | CycleOutcome::Unconfigured(_) => {}
        }
        outcome
    }

    async fn run_cycle(&self) -> CycleOutcome {
        let renderer = self.renderer().await;
        let t = renderer.translator();
        let manual = self.inner.settings.manual_config().await;

        let resolution = match self.inner.resolver.resolve(&manual).await {
            Ok(resolution) => resolution,
            Err(e) => return self.fail(&renderer, e.to_string()),
        };

        let Some(config) = resolution.effective else {
            let missing = resolution.missing.unwrap_or(MissingConfig::Both);
            self.show(&renderer.unconfigured(missing));
            return CycleOutcome::Unconfigured(missing);
        };

        let missing = match validate_api_config(
            &config.api_url,
            config.api_id.as_deref(),
            config.api_key.as_deref(),
        ) {
            ConfigValidation::Valid => None,
            ConfigValidation::Missing(missing) => Some(missing),
            ConfigValidation::InvalidUrl(url) => {
                warn!(url = %url, "Invalid API URL");
                Some(MissingConfig::ApiUrl)
            }
            ConfigValidation::InvalidApiId(id) => {
                warn!(api_id = %id, "API id is not a UUID");
                Some(MissingConfig::ApiId)
            }
        };
        if let Some(missing) = missing {
            self.show(&renderer.unconfigured(missing));
            return CycleOutcome::Unconfigured(missing);
        }

        let api_id = match (&config.api_id, &config.api_key) {
            (Some(id), _) => id.clone(),
            (None, Some(key)) => {
                debug!(url = %config.api_url, "Resolving API id from key");
                match self.inner.source.resolve_api_id(&config.api_url, key).await {
                    Ok(id) => id,
                    Err(e) => {
                        let message = t.t_with("errors.cannotGetApiIdFromKey", &[("error", &e.root_message())]);
                        return self.fail(&renderer, message);
                    }
                }
            }
            (None, None) => {
                self.show(&renderer.unconfigured(MissingConfig::ApiId));
                return CycleOutcome::Unconfigured(MissingConfig::ApiId);
            }
        };

        self.show(&renderer.loading());
        debug!(url = %config.api_url, source = %config.source, "Fetching usage data");

        match fetch_with_retry(&*self.inner.source, &config.api_url, &api_id, &self.inner.retry).await {
            Ok(snapshot) => {
                debug!(name = %snapshot.data.name, "Usage data fetched");
                self.show(&renderer.snapshot(&snapshot));
                self.inner.app.lock().await.last_snapshot = Some(snapshot);
                CycleOutcome::Updated
            }
            Err(e) => self.fail(&renderer, describe_fetch_error(&e, t)),
        }
    }

    fn fail(&self, renderer: &StatusRenderer, message: String) -> CycleOutcome {
        warn!(error = %message, "Update failed");
        self.show(&renderer.error(&message));
        CycleOutcome::Failed(message)
    }

    async fn notify_failure(&self, message: String) {
        let t = self.translator().await;
        let meter = self.clone();
        tokio::spawn(async move {
            let retry = t.t("notifications.retryOption");
            let open = t.t("notifications.openSettingsOption");
            let text = t.t_with("notifications.errorOccurred", &[("error", &message)]);
            let choice = meter
                .inner
                .window
                .show_error(&text, &[retry.clone(), open.clone()])
                .await;
            match choice {
                Some(c) if c == retry => {
                    debug!("Retry requested");
                    (meter.refresh_callback())();
                }
                Some(c) if c == open => meter.inner.window.open_settings().await,
                _ => {}
            }
        });
    }

    /// Restarts the polling timer with the current interval.
    pub async fn start_timer(&self) {
        let period = self.inner.settings.effective_refresh_interval().await;
        let weak = Arc::downgrade(&self.inner);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else { break };
                let meter = Meter { inner };
                if !meter.is_focused().await {
                    debug!("Window unfocused, skipping tick");
                    continue;
                }
                meter.update_stats().await;
            }
        });

        let mut app = self.inner.app.lock().await;
        if let Some(mut old) = app.timer.replace(Subscription::new(task)) {
            old.dispose();
        }
        info!(interval_secs = period.as_secs(), "Timer started");
    }

    // ========================================================================
    // Subscriptions
    // ========================================================================

    async fn subscribe_settings(&self) {
        let mut changes = self.inner.settings.subscribe();
        changes.mark_unchanged();
        let weak = Arc::downgrade(&self.inner);

        let task = tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                let Some(inner) = weak.upgrade() else { break };
                Meter { inner }.on_settings_changed().await;
            }
        });
        self.inner.app.lock().await.subscriptions.push(Subscription::new(task));
    }

    async fn subscribe_focus(&self) {
        let mut focus = self.inner.focus.clone();
        focus.mark_unchanged();
        let weak = Arc::downgrade(&self.inner);

        let task = tokio::spawn(async move {
            while focus.changed().await.is_ok() {
                let focused = *focus.borrow_and_update();
                let Some(inner) = weak.upgrade() else { break };
                Meter { inner }.on_focus_changed(focused).await;
            }
        });
        self.inner.app.lock().await.subscriptions.push(Subscription::new(task));
    }

    /// Applies a focus change. Regaining focus refreshes immediately.
    pub async fn on_focus_changed(&self, focused: bool) {
        let was_focused = {
            let mut app = self.inner.app.lock().await;
            std::mem::replace(&mut app.focused, focused)
        };

        if focused && !was_focused {
            info!("Window focused");
            self.update_stats().await;
            self.start_timer().await;
        } else if !focused && was_focused {
            debug!("Window lost focus");
        }
    }

    /// Applies the current settings after a change.
    pub async fn on_settings_changed(&self) {
        let new = self.inner.settings.get().await;
        let old = {
            let mut app = self.inner.app.lock().await;
            app.renderer = StatusRenderer::from_settings(&new);
            std::mem::replace(&mut app.settings, new.clone())
        };
        info!("Configuration changed");

        if old.language != new.language {
            debug!(language = %new.language, "Language changed");
        }

        if old.enable_logging != new.enable_logging {
            if let Some(hook) = &self.inner.logging_hook {
                hook(new.enable_logging);
            }
        }

        if old.watch_claude_settings != new.watch_claude_settings {
            if new.watch_claude_settings {
                self.start_watcher().await;
            } else {
                self.stop_watcher().await;
            }
        }

        self.start_timer().await;
        self.update_stats().await;
    }

    // ========================================================================
    // Watcher
    // ========================================================================

    async fn start_watcher(&self) {
        let refresh = self
            .inner
            .app
            .lock()
            .await
            .refresh
            .clone()
            .unwrap_or_else(|| self.refresh_callback());

        let watcher = SettingsWatcher::new(
            Arc::clone(&self.inner.settings),
            Arc::clone(&self.inner.resolver),
            Arc::clone(&self.inner.window),
            refresh,
        );
        let handle = match watcher.start(&*self.inner.file_events) {
            Ok(Some(handle)) => handle,
            Ok(None) => return,
            Err(e) => {
                warn!(error = %e, "Failed to watch Claude settings");
                return;
            }
        };

        let mut app = self.inner.app.lock().await;
        if let Some(mut old) = app.watcher.replace(handle) {
            old.dispose();
        }
    }

    async fn stop_watcher(&self) {
        if let Some(mut handle) = self.inner.app.lock().await.watcher.take() {
            handle.dispose();
            info!("Stopped watching Claude settings");
        }
    }
}

fn describe_fetch_error(error: &FetchError, t: Translator) -> String {
    let root = match error {
        FetchError::RetriesExhausted { last, .. } => last.as_ref(),
        other => other,
    };
    match root {
        FetchError::Api(message) => t.t_with("errors.apiError", &[("error", message)]),
        FetchError::Http(e) => t.t_with("errors.networkError", &[("error", &e.to_string())]),
        FetchError::Status { status, .. } => {
            t.t_with("errors.apiError", &[("error", &format!("HTTP {status}"))])
        }
        FetchError::InvalidUrl(url) => t.t_with("errors.invalidApiUrl", &[("url", url)]),
        other => other.to_string(),
    }
}

