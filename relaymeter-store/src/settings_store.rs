//! User settings store.
//!
//! Manages the user-editable settings with persistence and change
//! notification. Subscribers receive a monotonically increasing version.

use relaymeter_core::color::is_valid_hex_color;
use relaymeter_core::{ColorThresholds, CustomColors, Language, ManualConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::persistence::{default_settings_path, load_json, save_json};

/// Default polling interval in seconds.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

/// Shortest polling interval honored, in seconds.
pub const MIN_REFRESH_INTERVAL_SECS: u64 = 10;

// ============================================================================
// Settings
// ============================================================================

/// User settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Settings {
    /// Relay base URL.
    pub api_url: String,
    /// API id (UUID).
    pub api_id: String,
    /// API key (resolved to an id before polling).
    pub api_key: String,
    /// Polling interval in seconds (floored at 10 when used).
    pub refresh_interval: u64,
    /// Verbose logging.
    pub enable_logging: bool,
    /// Color the status item by usage band.
    pub enable_status_bar_colors: bool,
    /// Watch `~/.claude/settings.json` for credential drift.
    pub watch_claude_settings: bool,
    /// Band thresholds.
    pub color_thresholds: ColorThresholds,
    /// Band colors.
    pub custom_colors: CustomColors,
    /// Language code (`zh`, `en`).
    pub language: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_id: String::new(),
            api_key: String::new(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL_SECS,
            enable_logging: true,
            enable_status_bar_colors: true,
            watch_claude_settings: true,
            color_thresholds: ColorThresholds::default(),
            custom_colors: CustomColors::default(),
            language: Language::Zh.code().to_string(),
        }
    }
}

impl Settings {
    /// The manually entered credential fields.
    pub fn manual_config(&self) -> ManualConfig {
        ManualConfig::new(&self.api_url, &self.api_id, &self.api_key)
    }

    /// Polling interval, floored at [`MIN_REFRESH_INTERVAL_SECS`].
    pub fn effective_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval.max(MIN_REFRESH_INTERVAL_SECS))
    }

    /// Display language.
    pub fn language(&self) -> Language {
        Language::from_code(&self.language)
    }

    /// Applies a string-typed `key = value` assignment.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Config` for unknown keys and unparsable values.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let value = value.trim();
        match key {
            "apiUrl" => self.api_url = value.to_string(),
            "apiId" => self.api_id = value.to_string(),
            "apiKey" => self.api_key = value.to_string(),
            "refreshInterval" => self.refresh_interval = parse(key, value)?,
            "enableLogging" => self.enable_logging = parse(key, value)?,
            "enableStatusBarColors" => self.enable_status_bar_colors = parse(key, value)?,
            "watchClaudeSettings" => self.watch_claude_settings = parse(key, value)?,
            "colorThresholds.low" => self.color_thresholds.low = parse_percent(key, value)?,
            "colorThresholds.medium" => self.color_thresholds.medium = parse_percent(key, value)?,
            "customColors.low" => self.custom_colors.low = parse_color(key, value)?,
            "customColors.medium" => self.custom_colors.medium = parse_color(key, value)?,
            "customColors.high" => self.custom_colors.high = parse_color(key, value)?,
            "language" => {
                let language = Language::ALL
                    .into_iter()
                    .find(|l| l.code() == value)
                    .ok_or_else(|| {
                        StoreError::Config(format!("language must be one of zh, en (got {value:?})"))
                    })?;
                self.language = language.code().to_string();
            }
            _ => return Err(StoreError::Config(format!("unknown setting: {key}"))),
        }
        Ok(())
    }
}

/// Keys accepted by [`Settings::apply`].
pub const SETTING_KEYS: &[&str] = &[
    "apiUrl",
    "apiId",
    "apiKey",
    "refreshInterval",
    "enableLogging",
    "enableStatusBarColors",
    "watchClaudeSettings",
    "colorThresholds.low",
    "colorThresholds.medium",
    "customColors.low",
    "customColors.medium",
    "customColors.high",
    "language",
];

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, StoreError> {
    value
        .parse()
        .map_err(|_| StoreError::Config(format!("invalid value for {key}: {value:?}")))
}

fn parse_percent(key: &str, value: &str) -> Result<f64, StoreError> {
    let n: f64 = parse(key, value)?;
    if n.is_finite() && (0.0..=100.0).contains(&n) {
        Ok(n)
    } else {
        Err(StoreError::Config(format!("{key} must be within 0..=100")))
    }
}

fn parse_color(key: &str, value: &str) -> Result<String, StoreError> {
    if is_valid_hex_color(value) {
        Ok(value.to_string())
    } else {
        Err(StoreError::Config(format!("{key} must be #RGB or #RRGGBB")))
    }
}

// ============================================================================
// Settings Store
// ============================================================================

/// Persistent settings store with change notifications.
pub struct SettingsStore {
    settings: Arc<RwLock<Settings>>,
    path: PathBuf,
    notify: watch::Sender<u64>,
    version: Arc<RwLock<u64>>,
}

impl SettingsStore {
    /// Creates a store with default settings.
    pub fn new(path: PathBuf) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            settings: Arc::new(RwLock::new(Settings::default())),
            path,
            notify,
            version: Arc::new(RwLock::new(0)),
        }
    }

    /// Loads settings from the default path.
    pub async fn load_default() -> Self {
        Self::load(default_settings_path()).await
    }

    /// Loads settings from a path.
    ///
    /// A missing or unreadable file yields the defaults.
    pub async fn load(path: PathBuf) -> Self {
        let settings = if path.exists() {
            info!(path = %path.display(), "Loading settings");
            load_json(&path).await.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load settings, using defaults");
                Settings::default()
            })
        } else {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            Settings::default()
        };

        let store = Self::new(path);
        *store.settings.write().await = settings;
        store
    }

    /// File backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets a copy of the current settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Updates settings and notifies subscribers.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        {
            let mut settings = self.settings.write().await;
            f(&mut settings);
        }
        self.notify_change().await;
    }

    /// Saves settings to disk.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be written to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        let settings = self.settings.read().await;
        save_json(&self.path, &*settings).await?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    /// Subscribes to settings changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    /// Notifies subscribers of a change.
    async fn notify_change(&self) {
        let mut version = self.version.write().await;
        *version += 1;
        let _ = self.notify.send(*version);
    }

    // ========================================================================
    // Convenience Methods
    // ========================================================================

    /// Sets one key from a string value, then persists and notifies.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Config` for unknown keys or bad values (nothing
    /// is changed), or an IO error if saving fails.
    pub async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut next = self.get().await;
        next.apply(key, value)?;
        debug!(key, "Setting changed");
        self.update(|s| *s = next).await;
        self.save().await
    }

    /// Restores defaults, then persists and notifies.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be written to disk.
    pub async fn reset(&self) -> Result<(), StoreError> {
        self.update(|s| *s = Settings::default()).await;
        self.save().await
    }

    /// The manually entered credential fields.
    pub async fn manual_config(&self) -> ManualConfig {
        self.settings.read().await.manual_config()
    }

    /// Polling interval, floored at 10 seconds.
    pub async fn effective_refresh_interval(&self) -> Duration {
        self.settings.read().await.effective_refresh_interval()
    }

    /// Display language.
    pub async fn language(&self) -> Language {
        self.settings.read().await.language()
    }

    /// Persists a new language.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be written to disk.
    pub async fn set_language(&self, language: Language) -> Result<(), StoreError> {
        self.update(|s| s.language = language.code().to_string()).await;
        self.save().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.refresh_interval, 60);
        assert!(settings.enable_logging);
        assert!(settings.enable_status_bar_colors);
        assert!(settings.watch_claude_settings);
        assert_eq!(settings.language(), Language::Zh);
        assert!(settings.manual_config().is_empty());
    }

    #[test]
    fn test_refresh_interval_floor() {
        let mut settings = Settings::default();
        settings.refresh_interval = 3;
        assert_eq!(settings.effective_refresh_interval(), Duration::from_secs(10));
        settings.refresh_interval = 120;
        assert_eq!(settings.effective_refresh_interval(), Duration::from_secs(120));
    }

    #[test]
    fn test_camel_case_keys_and_partial_file() {
        let settings: Settings = serde_json::from_str(
            r#"{"apiUrl": "https://relay.example.com", "refreshInterval": 30, "colorThresholds": {"low": 40}}"#,
        )
        .unwrap();
        assert_eq!(settings.api_url, "https://relay.example.com");
        assert_eq!(settings.refresh_interval, 30);
        assert_eq!(settings.color_thresholds.low, 40.0);
        assert_eq!(settings.color_thresholds.medium, 80.0);
        assert_eq!(settings.custom_colors, CustomColors::default());

        let value = serde_json::to_value(Settings::default()).unwrap();
        assert!(value.get("watchClaudeSettings").is_some());
        assert!(value.get("enableStatusBarColors").is_some());
    }

    #[test]
    fn test_apply_parses_values() {
        let mut settings = Settings::default();
        settings.apply("refreshInterval", "30").unwrap();
        settings.apply("enableLogging", "false").unwrap();
        settings.apply("customColors.high", "#F00").unwrap();
        settings.apply("language", "en").unwrap();

        assert_eq!(settings.refresh_interval, 30);
        assert!(!settings.enable_logging);
        assert_eq!(settings.custom_colors.high, "#F00");
        assert_eq!(settings.language(), Language::En);
    }

    #[test]
    fn test_apply_rejects_bad_input() {
        let mut settings = Settings::default();
        assert!(matches!(settings.apply("nope", "1"), Err(StoreError::Config(_))));
        assert!(settings.apply("refreshInterval", "soon").is_err());
        assert!(settings.apply("customColors.low", "green").is_err());
        assert!(settings.apply("colorThresholds.low", "150").is_err());
        assert!(settings.apply("language", "fr").is_err());
        assert_eq!(settings, Settings::default());
    }

    #[tokio::test]
    async fn test_set_persists_and_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone());
        let mut rx = store.subscribe();

        store.set("apiUrl", "https://relay.example.com").await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), 1);

        let reloaded = SettingsStore::load(path).await;
        assert_eq!(reloaded.get().await.api_url, "https://relay.example.com");
    }

    #[tokio::test]
    async fn test_failed_set_does_not_notify() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let rx = store.subscribe();

        assert!(store.set("refreshInterval", "-1").await.is_err());
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_reset() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        store.set("apiId", "abc").await.unwrap();
        store.reset().await.unwrap();
        assert_eq!(store.get().await, Settings::default());
    }
}
