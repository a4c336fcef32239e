//! Durable extension state: the runtime and skipped credential pairs.
//!
//! - **runtime**: the discovered pair currently in use when no manual config
//!   is set
//! - **skipped**: a discovered pair the user declined; it suppresses
//!   repeated prompts for the same change
//!
//! Every mutation is written through to disk before returning.

use relaymeter_core::CredentialPair;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::persistence::{default_state_path, load_json_or_default, save_json};

/// On-disk shape of the state file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtensionState {
    /// Adopted discovered pair.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_config: Option<CredentialPair>,
    /// Declined discovered pair.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped_config: Option<CredentialPair>,
}

/// Write-through store for [`ExtensionState`].
pub struct StateStore {
    state: RwLock<ExtensionState>,
    path: PathBuf,
}

impl StateStore {
    /// Loads state from the default path.
    pub async fn load_default() -> Self {
        Self::load(default_state_path()).await
    }

    /// Loads state from a path; a missing or corrupt file yields empty state.
    pub async fn load(path: PathBuf) -> Self {
        let state: ExtensionState = load_json_or_default(&path).await;
        debug!(
            path = %path.display(),
            has_runtime = state.runtime_config.is_some(),
            has_skipped = state.skipped_config.is_some(),
            "State loaded"
        );
        Self {
            state: RwLock::new(state),
            path,
        }
    }

    /// File backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the whole state.
    pub async fn get(&self) -> ExtensionState {
        self.state.read().await.clone()
    }

    /// The adopted runtime pair.
    pub async fn runtime_config(&self) -> Option<CredentialPair> {
        self.state.read().await.runtime_config.clone()
    }

    /// The declined pair.
    pub async fn skipped_config(&self) -> Option<CredentialPair> {
        self.state.read().await.skipped_config.clone()
    }

    /// Replaces the runtime pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    pub async fn set_runtime_config(&self, pair: Option<CredentialPair>) -> Result<(), StoreError> {
        self.mutate(|s| s.runtime_config = pair).await
    }

    /// Replaces the skipped pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    pub async fn set_skipped_config(&self, pair: Option<CredentialPair>) -> Result<(), StoreError> {
        self.mutate(|s| s.skipped_config = pair).await
    }

    /// Adopts a pair as runtime and clears the skipped pair in one write.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    pub async fn adopt(&self, pair: CredentialPair) -> Result<(), StoreError> {
        info!(url = %pair.api_url, "Adopting discovered credentials");
        self.mutate(|s| {
            s.runtime_config = Some(pair);
            s.skipped_config = None;
        })
        .await
    }

    /// Clears both pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if the state cannot be written.
    pub async fn clear_all(&self) -> Result<(), StoreError> {
        info!("Clearing runtime and skipped credentials");
        self.mutate(|s| *s = ExtensionState::default()).await
    }

    async fn mutate<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut ExtensionState),
    {
        let mut state = self.state.write().await;
        f(&mut state);
        save_json(&self.path, &*state).await
    }
}
