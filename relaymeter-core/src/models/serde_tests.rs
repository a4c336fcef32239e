//! Serde tests for the relay payload and persisted credential types.

use serde_json::json;

use crate::{ApiKeyResponse, CommandId, CredentialPair, RelayApiResponse, StatusColor, ThemeColor};

// ============================================================================
// Relay Payload
// ============================================================================

#[test]
fn test_user_stats_full_payload() {
    let raw = json!({
        "success": true,
        "data": {
            "id": "1b2c3d4e-0000-4000-8000-000000000001",
            "name": "team-key",
            "isActive": true,
            "expiresAt": "2026-01-01T00:00:00.000Z",
            "usage": {
                "total": {
                    "tokens": 1200,
                    "allTokens": 1500000,
                    "requests": 4321,
                    "cost": 12.3456
                }
            },
            "limits": {
                "dailyCostLimit": 100,
                "currentDailyCost": 40.5,
                "totalCostLimit": 0,
                "currentTotalCost": 321.75,
                "weeklyOpusCostLimit": 50,
                "weeklyOpusCost": 10,
                "rateLimitWindow": 60,
                "rateLimitCost": 5,
                "currentWindowCost": 1.25,
                "windowRemainingSeconds": 1800
            }
        }
    });

    let response: RelayApiResponse = serde_json::from_value(raw).unwrap();
    let data = response.data.unwrap();
    assert!(response.success);
    assert_eq!(data.name, "team-key");
    assert_eq!(data.usage.total.all_tokens, 1_500_000);
    assert_eq!(data.usage.total.requests, 4321);
    assert_eq!(data.limits.daily_cost_limit, 100.0);
    assert_eq!(data.limits.current_daily_cost, 40.5);
    assert_eq!(data.limits.window_remaining_seconds, Some(1800));
    assert_eq!(data.limits.window_start_time, None);
}

#[test]
fn test_user_stats_missing_fields_default() {
    let response: RelayApiResponse =
        serde_json::from_str(r#"{"success": true, "data": {"name": "bare"}}"#).unwrap();
    let data = response.data.unwrap();
    assert_eq!(data.limits.daily_cost_limit, 0.0);
    assert_eq!(data.usage.total.requests, 0);
    assert!(data.restrictions.restricted_models.is_empty());
}

#[test]
fn test_failure_envelope() {
    let response: RelayApiResponse =
        serde_json::from_str(r#"{"success": false, "message": "API key not found"}"#).unwrap();
    assert!(!response.success);
    assert!(response.data.is_none());
    assert_eq!(response.message.as_deref(), Some("API key not found"));
}

#[test]
fn test_key_id_response_accepts_both_field_names() {
    let with_api_id: ApiKeyResponse =
        serde_json::from_str(r#"{"success": true, "data": {"apiId": "abc"}}"#).unwrap();
    assert_eq!(with_api_id.data.unwrap().api_id, "abc");

    let with_id: ApiKeyResponse =
        serde_json::from_str(r#"{"success": true, "data": {"id": "xyz"}}"#).unwrap();
    assert_eq!(with_id.data.unwrap().api_id, "xyz");
}

// ============================================================================
// Persisted Types
// ============================================================================

#[test]
fn test_credential_pair_uses_camel_case() {
    let pair = CredentialPair::new("https://relay.example.com", "cr_key");
    let value = serde_json::to_value(&pair).unwrap();
    assert_eq!(
        value,
        json!({"apiUrl": "https://relay.example.com", "apiKey": "cr_key"})
    );
}

#[test]
fn test_display_enums_serialize_snake_case() {
    assert_eq!(
        serde_json::to_string(&CommandId::OpenWebDashboard).unwrap(),
        r#""open_web_dashboard""#
    );
    assert_eq!(
        serde_json::to_value(StatusColor::Theme(ThemeColor::Warning)).unwrap(),
        json!({"theme": "warning"})
    );
}
