// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Relay Meter App
//!
//! Host-independent orchestration for Relay Meter.
//!
//! A host implements [`Presenter`] and [`HostWindow`], provides a focus
//! signal, and hands everything to [`Meter::new`]:
//!
//! ```ignore
//! let meter = Meter::new(MeterDeps { settings, state, resolver, source, presenter,
//!     window, focus, file_events, retry: RetryStrategy::default(), logging_hook: None }).await;
//! meter.activate().await?;
//! meter.execute(CommandId::RefreshStats, None).await?;
//! meter.deactivate().await;
//! ```
//!
//! ## Modules
//!
//! - [`host`] - Presenter, window, and disposables
//! - [`status`] - Status view rendering
//! - [`watcher`] - Claude settings change watcher
//! - [`file_events`] - File change sources
//! - [`meter`] - Lifecycle, polling timer, focus gating
//! - [`commands`] - Command dispatch

pub mod app_state;
pub mod commands;
pub mod error;
pub mod file_events;
pub mod host;
pub mod meter;
pub mod status;
pub mod watcher;

pub use app_state::AppState;
pub use error::MeterError;
pub use file_events::{ChannelFileSource, FileEvent, FileEventSource, NotifyFileSource};
pub use host::{Disposable, DisposableStore, HostWindow, Presenter, Subscription};
pub use meter::{CycleOutcome, LoggingHook, Meter, MeterDeps};
pub use status::StatusRenderer;
pub use watcher::{
    CompareOutcome, PromptChoice, RefreshCallback, SettingsWatcher, WatcherHandle, WatcherState,
    DEBOUNCE,
};
