//! HTTP client for the Claude Relay Service stats API.

use async_trait::async_trait;
use relaymeter_core::{ApiKeyResponse, RelayApiResponse, UsageSnapshot};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::FetchError;
use crate::source::UsageSource;
use crate::validation::{key_id_url, user_stats_url};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent sent with every request.
const USER_AGENT: &str = concat!("relaymeter/", env!("CARGO_PKG_VERSION"));

/// Longest body excerpt kept in a status error.
const MAX_BODY_EXCERPT: usize = 200;

/// `reqwest`-backed [`UsageSource`].
#[derive(Debug, Clone)]
pub struct RelayClient {
    inner: Client,
}

impl RelayClient {
    /// Creates a client with the default 30 s timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a client with a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { inner: client })
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, FetchError> {
        let status = response.status();
        let body = response.text().await?;
        debug!(status = %status, bytes = body.len(), "Response received");

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_BODY_EXCERPT).collect(),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

/// A request that could not even be built means the base URL is unusable.
fn send_error(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_builder() {
        FetchError::InvalidUrl(url.to_string())
    } else {
        err.into()
    }
}

#[async_trait]
impl UsageSource for RelayClient {
    #[instrument(skip(self), fields(url = %api_url))]
    async fn fetch_user_stats(
        &self,
        api_url: &str,
        api_id: &str,
    ) -> Result<UsageSnapshot, FetchError> {
        let url = user_stats_url(api_url, api_id);
        debug!("GET user stats");

        let response = self
            .inner
            .get(&url)
            .send()
            .await
            .map_err(|e| send_error(&url, e))?;
        let envelope: RelayApiResponse = Self::read_json(response).await?;

        if !envelope.success {
            return Err(FetchError::Api(
                envelope.message.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        Ok(UsageSnapshot::from_response(envelope, api_url, api_id)?)
    }

    #[instrument(skip(self, api_key), fields(url = %api_url))]
    async fn resolve_api_id(&self, api_url: &str, api_key: &str) -> Result<String, FetchError> {
        let url = key_id_url(api_url);
        debug!("POST key id lookup");

        let response = self
            .inner
            .post(&url)
            .json(&serde_json::json!({ "apiKey": api_key }))
            .send()
            .await
            .map_err(|e| send_error(&url, e))?;
        let envelope: ApiKeyResponse = Self::read_json(response).await?;

        if !envelope.success {
            return Err(FetchError::Api(
                envelope.message.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        envelope
            .data
            .map(|d| d.api_id)
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| FetchError::Api("response has no API id".to_string()))
    }
}
