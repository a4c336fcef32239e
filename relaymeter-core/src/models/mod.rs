//! Domain models for Relay Meter.
//!
//! ## Submodules
//!
//! - [`credentials`] - Credential pairs, manual config, effective config selection
//! - [`usage`] - Relay response payloads and [`UsageSnapshot`]
//! - [`cost`] - Derived [`CostStats`]
//! - [`display`] - Host-neutral status view, tooltip, and command ids

mod cost;
mod credentials;
mod display;
mod usage;

pub use cost::CostStats;
pub use credentials::{
    select_effective, ConfigSource, CredentialPair, EffectiveConfig, ManualConfig, MissingConfig,
};
pub use display::{
    CommandId, StatusColor, StatusView, ThemeColor, Tooltip, TooltipLine, TooltipLink,
    TooltipSection,
};
pub use usage::{
    AccountsData, ApiKeyData, ApiKeyResponse, LimitsData, RelayApiResponse, RelayUserData,
    RestrictionsData, TotalUsage, UsageData, UsageSnapshot,
};

#[cfg(test)]
mod serde_tests;
