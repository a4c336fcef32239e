//! Credential types and the precedence rules between them.
//!
//! Three credential sources exist at the same time:
//! - **manual**: fields typed by the user into the settings (authoritative)
//! - **runtime**: a pair discovered from the Claude settings file and persisted
//! - **skipped**: a discovered pair the user declined, kept to suppress re-prompts
//!
//! Only one of them is effective at a time: manual beats runtime.

use serde::{Deserialize, Serialize};

// ============================================================================
// Credential Pair
// ============================================================================

/// One way to authenticate against the metering API.
///
/// `api_key` holds either an opaque API key or an API id, depending on where
/// the pair came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
    /// Base URL of the relay service (already normalized).
    pub api_url: String,
    /// API key or API id.
    pub api_key: String,
}

impl CredentialPair {
    /// Creates a new credential pair.
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Returns true if both fields are non-empty.
    pub fn is_complete(&self) -> bool {
        !self.api_url.trim().is_empty() && !self.api_key.trim().is_empty()
    }
}

// ============================================================================
// Manual Config
// ============================================================================

/// Credential fields entered by the user in the settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManualConfig {
    /// Base URL.
    pub api_url: String,
    /// Internal API id (preferred over the key when both are set).
    pub api_id: String,
    /// Opaque API key.
    pub api_key: String,
}

impl ManualConfig {
    /// Creates a manual config from raw setting values.
    pub fn new(
        api_url: impl Into<String>,
        api_id: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            api_id: api_id.into(),
            api_key: api_key.into(),
        }
    }

    /// Returns true if a URL plus an id or key is set.
    pub fn is_complete(&self) -> bool {
        has_value(&self.api_url) && (has_value(&self.api_id) || has_value(&self.api_key))
    }

    /// Returns true if none of the three fields is set.
    pub fn is_empty(&self) -> bool {
        !has_value(&self.api_url) && !has_value(&self.api_id) && !has_value(&self.api_key)
    }
}

fn has_value(s: &str) -> bool {
    !s.trim().is_empty()
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

// ============================================================================
// Effective Config
// ============================================================================

/// Where the effective config came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Entirely from user settings.
    Manual,
    /// User settings with missing fields filled from discovered credentials.
    Merged,
    /// The persisted runtime pair.
    Runtime,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Manual => write!(f, "manual"),
            ConfigSource::Merged => write!(f, "merged"),
            ConfigSource::Runtime => write!(f, "runtime"),
        }
    }
}

/// The single credential set actually used for polling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    /// Base URL.
    pub api_url: String,
    /// API id, if known.
    pub api_id: Option<String>,
    /// API key, if known.
    pub api_key: Option<String>,
    /// Origin of this config.
    pub source: ConfigSource,
}

impl EffectiveConfig {
    /// Builds an effective config from a runtime pair.
    pub fn from_runtime(pair: &CredentialPair) -> Self {
        Self {
            api_url: pair.api_url.clone(),
            api_id: None,
            api_key: non_empty(&pair.api_key),
            source: ConfigSource::Runtime,
        }
    }

    /// Returns the id if set, otherwise the key.
    pub fn credential(&self) -> Option<&str> {
        self.api_id.as_deref().or(self.api_key.as_deref())
    }

    /// The pair used when comparing against a freshly discovered pair.
    pub fn comparison_pair(&self) -> CredentialPair {
        CredentialPair::new(self.api_url.clone(), self.credential().unwrap_or_default())
    }
}

/// Selects the effective config by fixed precedence: manual > runtime.
///
/// A manual config counts only when the URL and an id or key are present; it
/// is then returned verbatim with the id preferred over the key.
pub fn select_effective(
    manual: &ManualConfig,
    runtime: Option<&CredentialPair>,
) -> Option<EffectiveConfig> {
    if manual.is_complete() {
        return Some(EffectiveConfig {
            api_url: manual.api_url.trim().to_string(),
            api_id: non_empty(&manual.api_id),
            api_key: non_empty(&manual.api_key),
            source: ConfigSource::Manual,
        });
    }

    runtime
        .filter(|pair| pair.is_complete())
        .map(EffectiveConfig::from_runtime)
}

/// Which part of the config is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MissingConfig {
    /// Only the URL is missing.
    ApiUrl,
    /// Only the id/key is missing.
    ApiId,
    /// Everything is missing.
    Both,
}

impl MissingConfig {
    /// Computes what is missing from a URL and credential presence.
    pub fn detect(has_url: bool, has_credential: bool) -> Option<Self> {
        match (has_url, has_credential) {
            (true, true) => None,
            (false, true) => Some(MissingConfig::ApiUrl),
            (true, false) => Some(MissingConfig::ApiId),
            (false, false) => Some(MissingConfig::Both),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime() -> CredentialPair {
        CredentialPair::new("https://relay.example.com", "cr_runtime_key_0000")
    }

    #[test]
    fn test_runtime_used_when_manual_empty() {
        let manual = ManualConfig::default();
        let effective = select_effective(&manual, Some(&runtime())).unwrap();

        assert_eq!(effective.source, ConfigSource::Runtime);
        assert_eq!(effective.comparison_pair(), runtime());
    }

    #[test]
    fn test_manual_wins_over_runtime() {
        let manual = ManualConfig::new("https://manual.example.com", "", "cr_manual_key_1111");
        let effective = select_effective(&manual, Some(&runtime())).unwrap();

        assert_eq!(effective.source, ConfigSource::Manual);
        assert_eq!(effective.api_url, "https://manual.example.com");
        assert_eq!(effective.credential(), Some("cr_manual_key_1111"));
    }

    #[test]
    fn test_manual_id_preferred_over_key() {
        let manual = ManualConfig::new(
            "https://manual.example.com",
            "1b2c3d4e-0000-4000-8000-000000000001",
            "cr_manual_key_1111",
        );
        let effective = select_effective(&manual, None).unwrap();

        assert_eq!(
            effective.credential(),
            Some("1b2c3d4e-0000-4000-8000-000000000001")
        );
        assert_eq!(effective.api_key.as_deref(), Some("cr_manual_key_1111"));
    }

    #[test]
    fn test_partial_manual_falls_back_to_runtime() {
        let manual = ManualConfig::new("https://manual.example.com", "", "");
        let effective = select_effective(&manual, Some(&runtime())).unwrap();
        assert_eq!(effective.source, ConfigSource::Runtime);
    }

    #[test]
    fn test_nothing_configured() {
        assert!(select_effective(&ManualConfig::default(), None).is_none());

        let incomplete = CredentialPair::new("https://relay.example.com", "");
        assert!(select_effective(&ManualConfig::default(), Some(&incomplete)).is_none());
    }

    #[test]
    fn test_missing_config_detection() {
        assert_eq!(MissingConfig::detect(true, true), None);
        assert_eq!(MissingConfig::detect(false, true), Some(MissingConfig::ApiUrl));
        assert_eq!(MissingConfig::detect(true, false), Some(MissingConfig::ApiId));
        assert_eq!(MissingConfig::detect(false, false), Some(MissingConfig::Both));
    }

    #[test]
    fn test_whitespace_counts_as_empty() {
        let manual = ManualConfig::new("  ", " ", "");
        assert!(manual.is_empty());
        assert!(!manual.is_complete());
    }
}
