//! Usage color bands.
//!
//! A percentage maps to one of three bands using half-open intervals:
//! `[0, low)` is low, `[low, medium)` is medium, `[medium, ∞)` is high.

use serde::{Deserialize, Serialize};

use crate::models::{StatusColor, ThemeColor};

/// Default low/medium boundary.
pub const DEFAULT_LOW_THRESHOLD: f64 = 50.0;
/// Default medium/high boundary.
pub const DEFAULT_MEDIUM_THRESHOLD: f64 = 80.0;
/// Default low-band color.
pub const DEFAULT_LOW_COLOR: &str = "#66BB6A";
/// Default medium-band color.
pub const DEFAULT_MEDIUM_COLOR: &str = "#FFD700";
/// Default high-band color.
pub const DEFAULT_HIGH_COLOR: &str = "#FF6600";

// ============================================================================
// Thresholds
// ============================================================================

/// Band boundaries in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorThresholds {
    /// Upper bound (exclusive) of the low band.
    pub low: f64,
    /// Upper bound (exclusive) of the medium band.
    pub medium: f64,
}

impl Default for ColorThresholds {
    fn default() -> Self {
        Self {
            low: DEFAULT_LOW_THRESHOLD,
            medium: DEFAULT_MEDIUM_THRESHOLD,
        }
    }
}

impl ColorThresholds {
    /// Returns self, or the defaults if the pair is inverted or out of range.
    pub fn sanitized(self) -> Self {
        let in_range = |v: f64| v.is_finite() && (0.0..=100.0).contains(&v);
        if in_range(self.low) && in_range(self.medium) && self.low < self.medium {
            self
        } else {
            Self::default()
        }
    }
}

// ============================================================================
// Colors
// ============================================================================

/// Per-band hex colors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomColors {
    /// Low-band color.
    pub low: String,
    /// Medium-band color.
    pub medium: String,
    /// High-band color.
    pub high: String,
}

impl Default for CustomColors {
    fn default() -> Self {
        Self {
            low: DEFAULT_LOW_COLOR.to_string(),
            medium: DEFAULT_MEDIUM_COLOR.to_string(),
            high: DEFAULT_HIGH_COLOR.to_string(),
        }
    }
}

impl CustomColors {
    /// Replaces every invalid color with its default.
    pub fn sanitized(self) -> Self {
        let pick = |value: String, default: &str| {
            if is_valid_hex_color(&value) {
                value
            } else {
                default.to_string()
            }
        };
        Self {
            low: pick(self.low, DEFAULT_LOW_COLOR),
            medium: pick(self.medium, DEFAULT_MEDIUM_COLOR),
            high: pick(self.high, DEFAULT_HIGH_COLOR),
        }
    }

    /// Color for a band.
    pub fn for_band(&self, band: UsageBand) -> &str {
        match band {
            UsageBand::Low => &self.low,
            UsageBand::Medium => &self.medium,
            UsageBand::High => &self.high,
        }
    }
}

// ============================================================================
// Bands
// ============================================================================

/// Usage band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageBand {
    /// Below the low threshold.
    Low,
    /// Between the thresholds.
    Medium,
    /// At or above the medium threshold.
    High,
}

/// Band for a percentage.
pub fn band_for(percentage: f64, thresholds: ColorThresholds) -> UsageBand {
    if percentage < thresholds.low {
        UsageBand::Low
    } else if percentage < thresholds.medium {
        UsageBand::Medium
    } else {
        UsageBand::High
    }
}

/// Status color for a percentage.
///
/// With colors disabled the host's default foreground is used.
pub fn status_color(
    percentage: f64,
    enabled: bool,
    thresholds: ColorThresholds,
    colors: &CustomColors,
) -> StatusColor {
    if !enabled {
        return StatusColor::Theme(ThemeColor::Foreground);
    }
    let band = band_for(percentage, thresholds.sanitized());
    StatusColor::Hex(colors.clone().sanitized().for_band(band).to_string())
}

/// Emoji shown next to a percentage in the tooltip.
pub fn band_emoji(band: UsageBand) -> &'static str {
    match band {
        UsageBand::Low => "🟢",
        UsageBand::Medium => "🟡",
        UsageBand::High => "🔴",
    }
}

// ============================================================================
// Hex Helpers
// ============================================================================

/// Returns true for `#RGB` and `#RRGGBB`.
pub fn is_valid_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Parses `#RGB` or `#RRGGBB` into components.
pub fn parse_hex(value: &str) -> Option<(u8, u8, u8)> {
    if !is_valid_hex_color(value) {
        return None;
    }
    let hex = &value[1..];
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    if hex.len() == 3 {
        let expand = |i: usize| channel(&hex[i..=i].repeat(2));
        Some((expand(0)?, expand(1)?, expand(2)?))
    } else {
        Some((channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?))
    }
}
