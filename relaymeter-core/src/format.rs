//! Display formatting for amounts, percentages, durations, and credentials.
//!
//! Everything here is a pure function; none of it touches settings or I/O.

use std::sync::LazyLock;

use chrono::{DateTime, Local};
use regex::Regex;

static TRAILING_API_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:/+api)*/*$").expect("Invalid regex"));

// ============================================================================
// Numbers
// ============================================================================

/// Formats `value` with at most `decimals` decimals and no trailing zeros.
fn format_decimal(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let raw = format!("{value:.decimals$}");
    let trimmed = if raw.contains('.') {
        raw.trim_end_matches('0').trim_end_matches('.')
    } else {
        raw.as_str()
    };
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Rounds to at most 4 decimals and strips trailing zeros.
///
/// `3.9647 → "3.9647"`, `10.5 → "10.5"`, `100.0 → "100"`.
pub fn format_number(n: f64) -> String {
    format_decimal(n, 4)
}

/// Percentage of `value` in `total`, clamped to `[0, 100]`, at most
/// 2 decimals, without a `%` sign. Returns `"0"` when `total` is zero.
pub fn format_percentage(value: f64, total: f64) -> String {
    if total == 0.0 {
        return "0".to_string();
    }
    let pct = (value / total * 100.0).clamp(0.0, 100.0);
    format_decimal(pct, 2)
}

/// Formats a currency amount: `"$" + format_number(amount)`.
pub fn format_cost(amount: f64) -> String {
    format!("${}", format_number(amount))
}

/// `"$used/$limit pct%"`.
pub fn format_status_bar_text(used: f64, limit: f64) -> String {
    format!(
        "{}/{} {}%",
        format_cost(used),
        format_cost(limit),
        format_percentage(used, limit)
    )
}

/// `"label: $used/$limit (pct%)"`.
pub fn format_tooltip_line(label: &str, used: f64, limit: f64) -> String {
    format!(
        "{label}: {}/{} ({}%)",
        format_cost(used),
        format_cost(limit),
        format_percentage(used, limit)
    )
}

/// Groups digits with commas: `1000000 → "1,000,000"`.
pub fn format_with_thousands_separator(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Abbreviates large counts: `1500 → "1.5K"`, `2_500_000 → "2.5M"`.
#[allow(clippy::cast_precision_loss)]
pub fn format_large_number(n: u64) -> String {
    let value = n as f64;
    if value >= 1_000_000_000.0 {
        format!("{}B", format_decimal(value / 1_000_000_000.0, 1))
    } else if value >= 1_000_000.0 {
        format!("{}M", format_decimal(value / 1_000_000.0, 1))
    } else if value >= 1_000.0 {
        format!("{}K", format_decimal(value / 1_000.0, 1))
    } else {
        n.to_string()
    }
}

// ============================================================================
// Time
// ============================================================================

/// Compact duration: `"45s"`, `"5m 3s"`, `"1h 23m"`, `"2d 3h"`.
///
/// The smaller unit is dropped when it is zero.
pub fn format_duration(seconds: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;

    let (major, major_unit, minor, minor_unit) = if seconds >= DAY {
        (seconds / DAY, "d", (seconds % DAY) / HOUR, "h")
    } else if seconds >= HOUR {
        (seconds / HOUR, "h", (seconds % HOUR) / MINUTE, "m")
    } else if seconds >= MINUTE {
        (seconds / MINUTE, "m", seconds % MINUTE, "s")
    } else {
        return format!("{seconds}s");
    };

    if minor == 0 {
        format!("{major}{major_unit}")
    } else {
        format!("{major}{major_unit} {minor}{minor_unit}")
    }
}

/// Formats an RFC 3339 expiry as local `YYYY-MM-DD HH:MM`.
///
/// Returns `None` for empty or unparsable input (the key never expires).
pub fn format_expiry(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
}

// ============================================================================
// URLs & Credentials
// ============================================================================

/// Strips a trailing `/api` segment (any case, trailing slashes allowed).
///
/// Idempotent: normalizing twice gives the same result.
pub fn normalize_api_url(url: &str) -> String {
    TRAILING_API_RE.replace(url.trim(), "").into_owned()
}

/// Masks an API key for display.
///
/// Keys under 10 characters become `"***"`. A prefix up to the first `_`
/// is kept when at least 8 characters follow it. At most the first 4 and
/// last 4 secret characters are shown.
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    let len = chars.len();
    if len < 10 {
        return "***".to_string();
    }

    let (prefix, secret) = match chars.iter().position(|&c| c == '_') {
        Some(idx) if idx + 8 < len => chars.split_at(idx + 1),
        _ => chars.split_at(0),
    };

    let head: String = secret[..4].iter().collect();
    let tail: String = secret[secret.len() - 4..].iter().collect();
    let prefix: String = prefix.iter().collect();
    format!("{prefix}{head}***{tail}")
}
