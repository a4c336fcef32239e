//! Usage payload types.
//!
//! These mirror the Claude Relay Service `user-stats` response. Every field
//! defaults when absent so older or newer relay versions still parse.
//!
//! - [`RelayApiResponse`] - Response envelope
//! - [`RelayUserData`] - Key identity, usage totals, and limits
//! - [`UsageSnapshot`] - One fetched payload plus fetch metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cost::CostStats;
use crate::error::CoreError;

// ============================================================================
// Response Envelope
// ============================================================================

/// Root of the `user-stats` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelayApiResponse {
    /// Whether the request succeeded.
    pub success: bool,
    /// Payload (absent on failure).
    pub data: Option<RelayUserData>,
    /// Error message (present on failure).
    pub message: Option<String>,
}

/// Per-key data returned by the relay.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RelayUserData {
    /// Internal API id.
    pub id: String,
    /// Key display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Whether the key is active.
    pub is_active: bool,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Expiry timestamp (RFC 3339), empty when the key never expires.
    pub expires_at: String,
    /// Expiration mode (`fixed`, `activation`).
    pub expiration_mode: String,
    /// Whether an activation-mode key was activated.
    pub is_activated: bool,
    /// Days of validity after activation.
    pub activation_days: u32,
    /// Activation timestamp.
    pub activated_at: String,
    /// Permission scope (`all`, `claude`, ...).
    pub permissions: String,
    /// Usage totals.
    pub usage: UsageData,
    /// Limits and current counters.
    pub limits: LimitsData,
    /// Bound upstream accounts.
    pub accounts: AccountsData,
    /// Model and client restrictions.
    pub restrictions: RestrictionsData,
}

/// Usage container.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsageData {
    /// Lifetime totals.
    pub total: TotalUsage,
}

/// Lifetime usage totals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TotalUsage {
    /// Tokens (input + output).
    pub tokens: u64,
    /// Input tokens.
    pub input_tokens: u64,
    /// Output tokens.
    pub output_tokens: u64,
    /// Cache creation tokens.
    pub cache_create_tokens: u64,
    /// Cache read tokens.
    pub cache_read_tokens: u64,
    /// All tokens including cache.
    pub all_tokens: u64,
    /// Request count.
    pub requests: u64,
    /// Cost in currency units.
    pub cost: f64,
    /// Server-formatted cost.
    pub formatted_cost: String,
}

/// Limits and the current counters against them.
///
/// A limit of `0` means unlimited; such counters are not displayed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LimitsData {
    /// Token limit.
    pub token_limit: u64,
    /// Concurrent request limit.
    pub concurrency_limit: u64,
    /// Rate-limit window length in minutes.
    pub rate_limit_window: u64,
    /// Requests allowed per window.
    pub rate_limit_requests: u64,
    /// Cost allowed per window.
    pub rate_limit_cost: f64,
    /// Daily cost limit.
    pub daily_cost_limit: f64,
    /// Lifetime cost limit.
    pub total_cost_limit: f64,
    /// Weekly Opus cost limit.
    pub weekly_opus_cost_limit: f64,
    /// Requests in the current window.
    pub current_window_requests: u64,
    /// Tokens in the current window.
    pub current_window_tokens: u64,
    /// Cost in the current window.
    pub current_window_cost: f64,
    /// Cost today.
    pub current_daily_cost: f64,
    /// Lifetime cost.
    pub current_total_cost: f64,
    /// Opus cost this week.
    pub weekly_opus_cost: f64,
    /// Window start.
    pub window_start_time: Option<String>,
    /// Window end.
    pub window_end_time: Option<String>,
    /// Seconds until the window resets.
    pub window_remaining_seconds: Option<u64>,
}

/// Upstream accounts bound to the key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountsData {
    /// Claude account.
    pub claude_account_id: Option<String>,
    /// Gemini account.
    pub gemini_account_id: Option<String>,
    /// OpenAI account.
    pub openai_account_id: Option<String>,
    /// Opaque account details.
    pub details: Option<serde_json::Value>,
}

/// Restrictions configured on the key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RestrictionsData {
    /// Whether model restriction is on.
    pub enable_model_restriction: bool,
    /// Restricted models.
    pub restricted_models: Vec<String>,
    /// Whether client restriction is on.
    pub enable_client_restriction: bool,
    /// Allowed clients.
    pub allowed_clients: Vec<String>,
}

// ============================================================================
// Key → Id Response
// ============================================================================

/// Response of the key-to-id endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiKeyResponse {
    /// Whether the lookup succeeded.
    pub success: bool,
    /// Payload.
    pub data: Option<ApiKeyData>,
    /// Error message.
    pub message: Option<String>,
}

/// Payload of [`ApiKeyResponse`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiKeyData {
    /// Resolved API id.
    #[serde(alias = "id")]
    pub api_id: String,
}

// ============================================================================
// Usage Snapshot
// ============================================================================

/// One fetched usage payload.
///
/// Snapshots are immutable and replace the previous one wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Key data from the relay.
    pub data: RelayUserData,
    /// Base URL the snapshot was fetched from.
    pub api_url: String,
    /// API id used for the fetch.
    pub api_id: String,
    /// When the snapshot was fetched.
    pub fetched_at: DateTime<Utc>,
}

impl UsageSnapshot {
    /// Builds a snapshot from a response envelope.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidData` if the envelope reports failure or
    /// carries no data.
    pub fn from_response(
        response: RelayApiResponse,
        api_url: impl Into<String>,
        api_id: impl Into<String>,
    ) -> Result<Self, CoreError> {
        if !response.success {
            return Err(CoreError::InvalidData(
                response
                    .message
                    .unwrap_or_else(|| "relay reported failure".to_string()),
            ));
        }
        let data = response
            .data
            .ok_or_else(|| CoreError::InvalidData("response has no data".to_string()))?;

        Ok(Self {
            data,
            api_url: api_url.into(),
            api_id: api_id.into(),
            fetched_at: Utc::now(),
        })
    }

    /// Daily cost against the daily limit.
    pub fn daily(&self) -> CostStats {
        let l = &self.data.limits;
        CostStats::new(l.current_daily_cost, l.daily_cost_limit)
    }

    /// Lifetime cost against the total limit.
    pub fn total(&self) -> CostStats {
        let l = &self.data.limits;
        CostStats::new(l.current_total_cost, l.total_cost_limit)
    }

    /// Weekly Opus cost against its limit.
    pub fn weekly_opus(&self) -> CostStats {
        let l = &self.data.limits;
        CostStats::new(l.weekly_opus_cost, l.weekly_opus_cost_limit)
    }

    /// Current window cost against the window cost limit.
    pub fn window_cost(&self) -> CostStats {
        let l = &self.data.limits;
        CostStats::new(l.current_window_cost, l.rate_limit_cost)
    }

    /// Returns true if a rate-limit window is configured.
    pub fn has_rate_limit_window(&self) -> bool {
        self.data.limits.rate_limit_window > 0
    }
}
