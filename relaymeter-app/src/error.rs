//! Error types for the meter.

use relaymeter_fetch::FetchError;
use relaymeter_store::StoreError;
use thiserror::Error;

/// Errors raised by the meter lifecycle and its commands.
#[derive(Debug, Error)]
pub enum MeterError {
    /// Activation could not complete.
    #[error("Activation failed: {0}")]
    Activation(String),

    /// Settings or state could not be persisted.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A fetch failed.
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// A file could not be watched.
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    /// The host refused an operation.
    #[error("Host error: {0}")]
    Host(String),
}
