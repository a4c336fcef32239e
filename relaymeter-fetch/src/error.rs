//! Fetch error types.

use thiserror::Error;

/// Error type for metering API operations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("Unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The body was not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The relay answered `success: false`.
    #[error("API error: {0}")]
    Api(String),

    /// The base URL cannot be used to build a request.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Core error.
    #[error("Core error: {0}")]
    Core(#[from] relaymeter_core::CoreError),

    /// Every attempt failed.
    #[error("Request failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Attempts made.
        attempts: u32,
        /// Error of the final attempt.
        #[source]
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// Returns true if another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, FetchError::InvalidUrl(_) | FetchError::RetriesExhausted { .. })
    }

    /// The innermost error message, without retry wrapping.
    pub fn root_message(&self) -> String {
        match self {
            FetchError::RetriesExhausted { last, .. } => last.root_message(),
            FetchError::Api(message) => message.clone(),
            other => other.to_string(),
        }
    }
}
