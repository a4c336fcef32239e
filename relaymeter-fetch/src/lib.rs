// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Relay Meter Fetch
//!
//! Client for the Claude Relay Service stats API.
//!
//! - [`validation`] - Config validation and endpoint URLs
//! - [`source::UsageSource`] - Single-attempt fetch trait
//! - [`client::RelayClient`] - `reqwest` implementation
//! - [`retry::RetryStrategy`] and [`source::fetch_with_retry`] - Bounded retries
//!
//! ## Example
//!
//! ```ignore
//! use relaymeter_fetch::{fetch_with_retry, RelayClient, RetryStrategy};
//!
//! let client = RelayClient::new()?;
//! let snapshot = fetch_with_retry(&client, url, id, &RetryStrategy::default()).await?;
//! ```

pub mod client;
pub mod error;
pub mod retry;
pub mod source;
pub mod validation;

pub use client::RelayClient;
pub use error::FetchError;
pub use retry::{Backoff, RetryStrategy};
pub use source::{fetch_with_retry, UsageSource};
pub use validation::{dashboard_url, validate_api_config, ConfigValidation};
