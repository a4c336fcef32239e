//! Derived cost statistics.

use serde::Serialize;

use crate::format::{format_cost, format_percentage};

/// A `(used, limit)` pair with its display forms.
///
/// Computed on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostStats {
    /// Amount used.
    pub used: f64,
    /// Limit (0 = unlimited).
    pub limit: f64,
    /// Usage percentage in `[0, 100]`.
    pub percentage: f64,
    /// `used` as currency.
    pub formatted_used: String,
    /// `limit` as currency.
    pub formatted_limit: String,
    /// Percentage without the `%` sign.
    pub formatted_percentage: String,
}

impl CostStats {
    /// Computes stats for a used amount against a limit.
    pub fn new(used: f64, limit: f64) -> Self {
        let percentage = if limit > 0.0 {
            (used / limit * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };

        Self {
            used,
            limit,
            percentage,
            formatted_used: format_cost(used),
            formatted_limit: format_cost(limit),
            formatted_percentage: format_percentage(used, limit),
        }
    }

    /// Returns true if the limit is set and the stat should be displayed.
    pub fn is_shown(&self) -> bool {
        self.limit > 0.0
    }
}
