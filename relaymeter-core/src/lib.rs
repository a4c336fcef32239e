// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Relay Meter Core
//!
//! Core types, models, and pure helpers for Relay Meter.
//!
//! Nothing in this crate performs I/O. It provides:
//!
//! - Domain models (credentials, relay payloads, cost stats)
//! - Config precedence (manual > runtime)
//! - Display formatting and color bands
//! - Embedded language packs
//! - Host-neutral status view types
//!
//! ## Key Types
//!
//! ### Credentials
//! - [`CredentialPair`] - URL + key/id pair (runtime, skipped, discovered)
//! - [`ManualConfig`] - Fields entered in the settings
//! - [`EffectiveConfig`] - The config actually used for polling
//!
//! ### Usage
//! - [`RelayApiResponse`] - `user-stats` envelope
//! - [`UsageSnapshot`] - One fetched payload
//! - [`CostStats`] - Derived used/limit/percentage
//!
//! ### Display
//! - [`StatusView`] - Text, tooltip, color, and click command
//! - [`Tooltip`] - Sectioned tooltip with Markdown and plain renderings
//! - [`CommandId`] - Commands exposed to the host

pub mod color;
pub mod error;
pub mod format;
pub mod i18n;
pub mod models;

pub use error::CoreError;

pub use models::{
    // Credentials
    select_effective,
    ConfigSource,
    CredentialPair,
    EffectiveConfig,
    ManualConfig,
    MissingConfig,
    // Usage
    AccountsData,
    ApiKeyData,
    ApiKeyResponse,
    CostStats,
    LimitsData,
    RelayApiResponse,
    RelayUserData,
    RestrictionsData,
    TotalUsage,
    UsageData,
    UsageSnapshot,
    // Display
    CommandId,
    StatusColor,
    StatusView,
    ThemeColor,
    Tooltip,
    TooltipLine,
    TooltipLink,
    TooltipSection,
};

pub use color::{ColorThresholds, CustomColors, UsageBand};
pub use i18n::{Language, Translator};
