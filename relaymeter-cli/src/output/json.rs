//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, Utc};
use relaymeter_core::{CostStats, MissingConfig, StatusColor, StatusView, UsageSnapshot};
use serde::Serialize;

// ============================================================================
// Output Types
// ============================================================================

/// JSON output of the `usage` command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageOutput {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub name: String,
    pub api_url: String,
    pub api_id: String,
    pub daily: CostStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<CostStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_opus: Option<CostStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

/// Rate-limit window.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowOutput {
    pub window_minutes: u64,
    pub requests: u64,
    pub tokens: u64,
    pub cost: CostStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_seconds: Option<u64>,
}

/// JSON output when no usable config exists.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnconfiguredOutput {
    pub status: String,
    pub missing: MissingConfig,
}

// ============================================================================
// Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats a fetched snapshot with its rendered status.
    pub fn format_usage(&self, snapshot: &UsageSnapshot, view: &StatusView) -> Result<String> {
        self.format(&usage_output(snapshot, view))
    }
}

/// Builds the `usage` JSON document.
pub fn usage_output(snapshot: &UsageSnapshot, view: &StatusView) -> UsageOutput {
    let limits = &snapshot.data.limits;
    let shown = |stats: CostStats| stats.is_shown().then_some(stats);

    let window = snapshot.has_rate_limit_window().then(|| WindowOutput {
        window_minutes: limits.rate_limit_window,
        requests: limits.current_window_requests,
        tokens: limits.current_window_tokens,
        cost: snapshot.window_cost(),
        remaining_seconds: limits.window_remaining_seconds,
    });

    let color = match &view.color {
        StatusColor::Hex(hex) => Some(hex.clone()),
        StatusColor::Theme(_) => None,
    };

    UsageOutput {
        status: view.text.clone(),
        color,
        name: snapshot.data.name.clone(),
        api_url: snapshot.api_url.clone(),
        api_id: snapshot.api_id.clone(),
        daily: snapshot.daily(),
        total: shown(snapshot.total()),
        weekly_opus: shown(snapshot.weekly_opus()),
        window,
        expires_at: Some(snapshot.data.expires_at.clone()).filter(|s| !s.is_empty()),
        fetched_at: snapshot.fetched_at,
    }
}
