//! Effective config resolution.
//!
//! Precedence is fixed: manual settings, then the persisted runtime pair,
//! then the Claude settings file. A pair discovered from the file while
//! nothing else is configured is snapshotted as the runtime pair.

use relaymeter_core::{
    select_effective, ConfigSource, CredentialPair, EffectiveConfig, ManualConfig, MissingConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use crate::claude_settings::{read_claude_settings, DiscoveredSettings};
use crate::error::StoreError;
use crate::state_store::StateStore;

/// Result of [`ConfigResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Config to poll with, if complete.
    pub effective: Option<EffectiveConfig>,
    /// What is missing when `effective` is `None`.
    pub missing: Option<MissingConfig>,
    /// True if this call adopted credentials from the Claude settings file.
    pub auto_configured: bool,
}

impl Resolution {
    fn found(effective: EffectiveConfig, auto_configured: bool) -> Self {
        Self {
            effective: Some(effective),
            missing: None,
            auto_configured,
        }
    }

    fn missing(missing: MissingConfig) -> Self {
        Self {
            effective: None,
            missing: Some(missing),
            auto_configured: false,
        }
    }
}

/// Resolves the effective config from manual settings, state, and the
/// Claude settings file.
pub struct ConfigResolver {
    state: Arc<StateStore>,
    claude_settings_path: PathBuf,
}

impl ConfigResolver {
    /// Creates a resolver.
    pub fn new(state: Arc<StateStore>, claude_settings_path: PathBuf) -> Self {
        Self {
            state,
            claude_settings_path,
        }
    }

    /// Path of the Claude settings file.
    pub fn claude_settings_path(&self) -> &Path {
        &self.claude_settings_path
    }

    /// The state store this resolver writes runtime snapshots to.
    pub fn state(&self) -> &Arc<StateStore> {
        &self.state
    }

    /// Reads the Claude settings file.
    pub async fn discover(&self) -> DiscoveredSettings {
        read_claude_settings(&self.claude_settings_path).await
    }

    /// Resolves the effective config.
    ///
    /// # Errors
    ///
    /// Returns an error only if snapshotting a discovered pair fails to
    /// persist.
    pub async fn resolve(&self, manual: &ManualConfig) -> Result<Resolution, StoreError> {
        if manual.is_complete() {
            debug!("Using manual config");
            return Ok(match select_effective(manual, None) {
                Some(effective) => Resolution::found(effective, false),
                None => Resolution::missing(MissingConfig::Both),
            });
        }

        let runtime = self.state.runtime_config().await.filter(CredentialPair::is_complete);

        if manual.is_empty() {
            return self.resolve_unconfigured(runtime).await;
        }

        Ok(self.resolve_partial(manual, runtime).await)
    }

    /// The config in effect right now, without touching the state store.
    ///
    /// A pair that only exists in the Claude settings file does not count
    /// while nothing else is configured; [`ConfigResolver::resolve`] would
    /// adopt it.
    pub async fn current(&self, manual: &ManualConfig) -> Option<EffectiveConfig> {
        if manual.is_complete() {
            return select_effective(manual, None);
        }

        let runtime = self.state.runtime_config().await.filter(CredentialPair::is_complete);
        if manual.is_empty() {
            return runtime.map(|pair| EffectiveConfig::from_runtime(&pair));
        }
        self.resolve_partial(manual, runtime).await.effective
    }

    async fn resolve_unconfigured(
        &self,
        runtime: Option<CredentialPair>,
    ) -> Result<Resolution, StoreError> {
        if let Some(pair) = runtime {
            debug!(url = %pair.api_url, "Using runtime config");
            return Ok(Resolution::found(EffectiveConfig::from_runtime(&pair), false));
        }

        match self.discover().await.into_pair() {
            Some(pair) => {
                info!(
                    path = %self.claude_settings_path.display(),
                    url = %pair.api_url,
                    "Auto-configured from Claude settings"
                );
                self.state.set_runtime_config(Some(pair.clone())).await?;
                Ok(Resolution::found(EffectiveConfig::from_runtime(&pair), true))
            }
            None => Ok(Resolution::missing(MissingConfig::Both)),
        }
    }

    async fn resolve_partial(
        &self,
        manual: &ManualConfig,
        runtime: Option<CredentialPair>,
    ) -> Resolution {
        let manual_url = non_empty(&manual.api_url);
        let manual_id = non_empty(&manual.api_id);
        let manual_key = non_empty(&manual.api_key);
        let has_manual_credential = manual_id.is_some() || manual_key.is_some();

        let mut api_url = manual_url.or_else(|| runtime.as_ref().map(|p| p.api_url.clone()));
        let mut api_key = if has_manual_credential {
            manual_key
        } else {
            runtime.as_ref().map(|p| p.api_key.clone())
        };

        if api_url.is_none() || (!has_manual_credential && api_key.is_none()) {
            let discovered = self.discover().await;
            api_url = api_url.or(discovered.api_url);
            if !has_manual_credential {
                api_key = api_key.or(discovered.api_key);
            }
        }

        let has_credential = manual_id.is_some() || api_key.is_some();
        match (api_url, MissingConfig::detect(true, has_credential)) {
            (Some(api_url), None) => {
                debug!(url = %api_url, "Using merged config");
                Resolution::found(
                    EffectiveConfig {
                        api_url,
                        api_id: manual_id,
                        api_key,
                        source: ConfigSource::Merged,
                    },
                    false,
                )
            }
            (api_url, _) => {
                let missing = MissingConfig::detect(api_url.is_some(), has_credential)
                    .unwrap_or(MissingConfig::Both);
                Resolution::missing(missing)
            }
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
