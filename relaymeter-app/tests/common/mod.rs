//! Test doubles for the host surface and the usage source.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use relaymeter_app::{ChannelFileSource, FileEvent, HostWindow, Meter, MeterDeps, Presenter};
use relaymeter_core::{CommandId, RelayUserData, StatusColor, Tooltip, UsageSnapshot};
use relaymeter_fetch::{FetchError, RetryStrategy, UsageSource};
use relaymeter_store::{ConfigResolver, SettingsStore, StateStore};
use tokio::sync::{mpsc, watch, Notify};

pub const API_URL: &str = "https://relay.example.com";
pub const API_ID: &str = "1b2c3d4e-0000-4000-8000-000000000001";
pub const RESOLVED_ID: &str = "9f8e7d6c-0000-4000-8000-000000000002";

/// Polls `check` until it holds or two seconds pass.
pub async fn wait_for<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

// ============================================================================
// Presenter
// ============================================================================

#[derive(Default)]
pub struct RecordingPresenter {
    pub texts: Mutex<Vec<String>>,
    pub color: Mutex<Option<StatusColor>>,
    pub tooltip: Mutex<Option<Tooltip>>,
    pub command: Mutex<Option<CommandId>>,
}

impl RecordingPresenter {
    pub fn last_text(&self) -> Option<String> {
        self.texts.lock().unwrap().last().cloned()
    }

    pub fn last_color(&self) -> Option<StatusColor> {
        self.color.lock().unwrap().clone()
    }
}

impl Presenter for RecordingPresenter {
    fn set_text(&self, text: &str) {
        self.texts.lock().unwrap().push(text.to_string());
    }

    fn set_tooltip(&self, tooltip: &Tooltip) {
        *self.tooltip.lock().unwrap() = Some(tooltip.clone());
    }

    fn set_color(&self, color: &StatusColor) {
        *self.color.lock().unwrap() = Some(color.clone());
    }

    fn set_command(&self, command: Option<CommandId>) {
        *self.command.lock().unwrap() = command;
    }

    fn show(&self) {}
}

// ============================================================================
// Window
// ============================================================================

/// Records every interaction; warnings and errors are answered from a
/// script of action indices (`None` dismisses).
#[derive(Default)]
pub struct ScriptedWindow {
    pub infos: Mutex<Vec<String>>,
    pub warnings: Mutex<Vec<(String, Vec<String>)>>,
    pub errors: Mutex<Vec<(String, Vec<String>)>>,
    pub opened: Mutex<Vec<String>>,
    pub settings_opened: AtomicUsize,
    pub warning_answers: Mutex<VecDeque<Option<usize>>>,
    pub error_answers: Mutex<VecDeque<Option<usize>>>,
    /// When set, each warning stays open until a permit arrives.
    pub warning_gate: Mutex<Option<Arc<Notify>>>,
    pub warning_shown: Notify,
    pub pick: Mutex<Option<String>>,
}

impl ScriptedWindow {
    pub fn answer_warnings(&self, answers: impl IntoIterator<Item = Option<usize>>) {
        self.warning_answers.lock().unwrap().extend(answers);
    }

    pub fn answer_errors(&self, answers: impl IntoIterator<Item = Option<usize>>) {
        self.error_answers.lock().unwrap().extend(answers);
    }

    pub fn info_count(&self) -> usize {
        self.infos.lock().unwrap().len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.lock().unwrap().len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.lock().unwrap().len()
    }
}

#[async_trait]
impl HostWindow for ScriptedWindow {
    async fn show_info(&self, message: &str) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    async fn show_warning(&self, message: &str, actions: &[String]) -> Option<String> {
        self.warnings
            .lock()
            .unwrap()
            .push((message.to_string(), actions.to_vec()));
        self.warning_shown.notify_one();

        let gate = self.warning_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let answer = self.warning_answers.lock().unwrap().pop_front().flatten();
        answer.and_then(|i| actions.get(i).cloned())
    }

    async fn show_error(&self, message: &str, actions: &[String]) -> Option<String> {
        self.errors
            .lock()
            .unwrap()
            .push((message.to_string(), actions.to_vec()));
        let answer = self.error_answers.lock().unwrap().pop_front().flatten();
        answer.and_then(|i| actions.get(i).cloned())
    }

    async fn quick_pick(&self, _prompt: &str, items: &[String]) -> Option<String> {
        let pick = self.pick.lock().unwrap().clone()?;
        items.iter().find(|i| **i == pick).cloned()
    }

    async fn open_external(&self, url: &str) -> std::io::Result<()> {
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }

    async fn open_settings(&self) {
        self.settings_opened.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Usage Source
// ============================================================================

pub struct StubSource {
    pub daily_used: Mutex<f64>,
    pub daily_limit: Mutex<f64>,
    pub fail: AtomicBool,
    pub fetches: AtomicUsize,
    pub resolves: AtomicUsize,
    pub fetched_ids: Mutex<Vec<String>>,
    /// When set, each fetch waits for a permit.
    pub gate: Mutex<Option<Arc<Notify>>>,
    pub started: Notify,
}

impl StubSource {
    pub fn new(daily_used: f64, daily_limit: f64) -> Self {
        Self {
            daily_used: Mutex::new(daily_used),
            daily_limit: Mutex::new(daily_limit),
            fail: AtomicBool::new(false),
            fetches: AtomicUsize::new(0),
            resolves: AtomicUsize::new(0),
            fetched_ids: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
            started: Notify::new(),
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UsageSource for StubSource {
    async fn fetch_user_stats(&self, api_url: &str, api_id: &str) -> Result<UsageSnapshot, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.fetched_ids.lock().unwrap().push(api_id.to_string());
        self.started.notify_one();

        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(FetchError::Api("relay unavailable".to_string()));
        }

        let mut data = RelayUserData {
            name: "team-key".to_string(),
            ..RelayUserData::default()
        };
        data.limits.current_daily_cost = *self.daily_used.lock().unwrap();
        data.limits.daily_cost_limit = *self.daily_limit.lock().unwrap();
        Ok(UsageSnapshot {
            data,
            api_url: api_url.to_string(),
            api_id: api_id.to_string(),
            fetched_at: Utc::now(),
        })
    }

    async fn resolve_api_id(&self, _api_url: &str, _api_key: &str) -> Result<String, FetchError> {
        self.resolves.fetch_add(1, Ordering::SeqCst);
        Ok(RESOLVED_ID.to_string())
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub dir: tempfile::TempDir,
    pub settings: Arc<SettingsStore>,
    pub state: Arc<StateStore>,
    pub resolver: Arc<ConfigResolver>,
    pub source: Arc<StubSource>,
    pub presenter: Arc<RecordingPresenter>,
    pub window: Arc<ScriptedWindow>,
    pub focus: watch::Sender<bool>,
    pub file_tx: mpsc::Sender<FileEvent>,
    pub logging: Arc<Mutex<Vec<bool>>>,
    pub meter: Meter,
}

impl Harness {
    pub fn claude_path(&self) -> PathBuf {
        self.resolver.claude_settings_path().to_path_buf()
    }
}

pub async fn write_claude(path: &Path, url: &str, key: &str) {
    let content = serde_json::json!({
        "env": { "ANTHROPIC_BASE_URL": format!("{url}/api"), "ANTHROPIC_AUTH_TOKEN": key }
    });
    tokio::fs::write(path, content.to_string()).await.unwrap();
}

/// Builds a meter. `configure` edits settings before the meter is created.
pub async fn harness<F>(source: StubSource, configure: F) -> Harness
where
    F: FnOnce(&mut relaymeter_store::Settings),
{
    let dir = tempfile::tempdir().unwrap();
    let settings = Arc::new(SettingsStore::new(dir.path().join("settings.json")));
    settings
        .update(|s| {
            s.language = "en".to_string();
            configure(s);
        })
        .await;

    let state = Arc::new(StateStore::load(dir.path().join("state.json")).await);
    let resolver = Arc::new(ConfigResolver::new(
        Arc::clone(&state),
        dir.path().join("claude-settings.json"),
    ));
    let source = Arc::new(source);
    let presenter = Arc::new(RecordingPresenter::default());
    let window = Arc::new(ScriptedWindow::default());
    let (focus, focus_rx) = watch::channel(true);
    let (file_source, file_tx) = ChannelFileSource::new();
    let logging = Arc::new(Mutex::new(Vec::new()));
    let hook_log = Arc::clone(&logging);

    let meter = Meter::new(MeterDeps {
        settings: Arc::clone(&settings),
        state: Arc::clone(&state),
        resolver: Arc::clone(&resolver),
        source: Arc::clone(&source) as Arc<dyn UsageSource>,
        presenter: Arc::clone(&presenter) as Arc<dyn Presenter>,
        window: Arc::clone(&window) as Arc<dyn HostWindow>,
        focus: focus_rx,
        file_events: Arc::new(file_source),
        retry: RetryStrategy::new(3).with_initial_delay(Duration::ZERO),
        logging_hook: Some(Arc::new(move |enabled| hook_log.lock().unwrap().push(enabled))),
    })
    .await;

    Harness {
        dir,
        settings,
        state,
        resolver,
        source,
        presenter,
        window,
        focus,
        file_tx,
        logging,
        meter,
    }
}

/// Settings with a complete manual config.
pub fn manual_id(s: &mut relaymeter_store::Settings) {
    s.api_url = API_URL.to_string();
    s.api_id = API_ID.to_string();
}
