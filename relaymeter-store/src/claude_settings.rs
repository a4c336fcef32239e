//! Claude Code settings reader.
//!
//! Claude Code keeps relay credentials in `~/.claude/settings.json`:
//!
//! ```json
//! { "env": { "ANTHROPIC_AUTH_TOKEN": "cr_...", "ANTHROPIC_BASE_URL": "https://host/api" } }
//! ```
//!
//! Reading never fails: any problem yields an empty result and a log line.

use relaymeter_core::CredentialPair;
use relaymeter_core::format::normalize_api_url;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Returns `~/.claude/settings.json`.
pub fn default_claude_settings_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".claude")
        .join("settings.json")
}

/// Returns true if the settings file exists.
pub fn exists(path: &Path) -> bool {
    path.is_file()
}

/// Credentials found in the Claude settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveredSettings {
    /// `env.ANTHROPIC_BASE_URL`, normalized.
    pub api_url: Option<String>,
    /// `env.ANTHROPIC_AUTH_TOKEN`.
    pub api_key: Option<String>,
}

impl DiscoveredSettings {
    /// Returns the pair if both fields were found.
    pub fn into_pair(self) -> Option<CredentialPair> {
        match (self.api_url, self.api_key) {
            (Some(url), Some(key)) => Some(CredentialPair::new(url, key)),
            _ => None,
        }
    }

    /// Returns true if nothing usable was found.
    pub fn is_empty(&self) -> bool {
        self.api_url.is_none() && self.api_key.is_none()
    }
}

/// Reads credentials from a Claude settings file.
pub async fn read_claude_settings(path: &Path) -> DiscoveredSettings {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Claude settings file not found");
            return DiscoveredSettings::default();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read Claude settings");
            return DiscoveredSettings::default();
        }
    };

    let root: Value = match serde_json::from_str(&content) {
        Ok(root) => root,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to parse Claude settings");
            return DiscoveredSettings::default();
        }
    };

    let Some(env) = root.get("env").and_then(Value::as_object) else {
        debug!(path = %path.display(), "Claude settings have no env object");
        return DiscoveredSettings::default();
    };

    let string_var = |name: &str| {
        env.get(name)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let discovered = DiscoveredSettings {
        api_url: string_var("ANTHROPIC_BASE_URL")
            .map(|raw| normalize_api_url(&raw))
            .filter(|url| !url.is_empty()),
        api_key: string_var("ANTHROPIC_AUTH_TOKEN"),
    };

    debug!(
        path = %path.display(),
        url = discovered.api_url.as_deref().unwrap_or(""),
        has_key = discovered.api_key.is_some(),
        "Read Claude settings"
    );
    discovered
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn read(content: &str) -> DiscoveredSettings {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        tokio::fs::write(&path, content).await.unwrap();
        read_claude_settings(&path).await
    }

    #[tokio::test]
    async fn test_reads_and_normalizes() {
        let found = read(
            r#"{"env": {"ANTHROPIC_AUTH_TOKEN": "cr_abc123", "ANTHROPIC_BASE_URL": "https://relay.example.com/API/"}}"#,
        )
        .await;

        assert_eq!(
            found.into_pair(),
            Some(CredentialPair::new("https://relay.example.com", "cr_abc123"))
        );
    }

    #[tokio::test]
    async fn test_partial_env_has_no_pair() {
        let found = read(r#"{"env": {"ANTHROPIC_AUTH_TOKEN": "cr_abc123"}}"#).await;
        assert_eq!(found.api_key.as_deref(), Some("cr_abc123"));
        assert!(found.into_pair().is_none());
    }

    #[tokio::test]
    async fn test_malformed_inputs_are_empty() {
        assert!(read("{ nope").await.is_empty());
        assert!(read(r#"{"env": "string"}"#).await.is_empty());
        assert!(read(r#"{"env": {"ANTHROPIC_AUTH_TOKEN": 42}}"#).await.is_empty());
        assert!(read("[]").await.is_empty());
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(!exists(&path));
        assert!(read_claude_settings(&path).await.is_empty());
    }

    #[test]
    fn test_default_path() {
        assert!(default_claude_settings_path().ends_with(".claude/settings.json"));
    }
}
