// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Relay Meter Store
//!
//! Durable state for Relay Meter.
//!
//! - **SettingsStore**: User settings with persistence and change notification
//! - **StateStore**: Runtime and skipped credential pairs
//! - **Claude settings**: Credential discovery from `~/.claude/settings.json`
//! - **ConfigResolver**: Manual > runtime > discovered precedence
//! - **Persistence**: Owner-only atomic JSON files
//!
//! ## Usage
//!
//! ```ignore
//! use relaymeter_store::{ConfigResolver, SettingsStore, StateStore};
//!
//! let settings = SettingsStore::load_default().await;
//! let state = Arc::new(StateStore::load_default().await);
//! let resolver = ConfigResolver::new(state, default_claude_settings_path());
//!
//! let resolution = resolver.resolve(&settings.manual_config().await).await?;
//! ```

pub mod claude_settings;
pub mod error;
pub mod persistence;
pub mod resolver;
pub mod settings_store;
pub mod state_store;

pub use claude_settings::{default_claude_settings_path, read_claude_settings, DiscoveredSettings};
pub use error::StoreError;
pub use persistence::{
    default_cache_dir, default_config_dir, default_log_path, default_settings_path,
    default_state_path, ensure_dir, load_json, load_json_or_default, save_json,
};
pub use resolver::{ConfigResolver, Resolution};
pub use settings_store::{Settings, SettingsStore, SETTING_KEYS};
pub use state_store::{ExtensionState, StateStore};
