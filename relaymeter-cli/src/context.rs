//! Stores and meter construction shared by the commands.

use std::sync::Arc;

use anyhow::Result;
use relaymeter_app::{
    FileEventSource, HostWindow, LoggingHook, Meter, MeterDeps, NotifyFileSource, Presenter,
};
use relaymeter_fetch::{RelayClient, RetryStrategy, UsageSource};
use relaymeter_store::{
    default_claude_settings_path, default_settings_path, default_state_path, ConfigResolver,
    SettingsStore, StateStore,
};
use tokio::sync::watch;
use tracing::debug;

use crate::Cli;

/// Attempts per polling cycle, including the first.
const FETCH_ATTEMPTS: u32 = 3;

/// Loaded stores, with paths taken from the global flags.
pub struct Context {
    pub settings: Arc<SettingsStore>,
    pub state: Arc<StateStore>,
    pub resolver: Arc<ConfigResolver>,
}

impl Context {
    /// Loads settings and state. Missing files yield defaults.
    pub async fn load(cli: &Cli) -> Self {
        let settings_path = cli.settings.clone().unwrap_or_else(default_settings_path);
        let state_path = cli.state.clone().unwrap_or_else(default_state_path);
        let claude_path = cli
            .claude_settings
            .clone()
            .unwrap_or_else(default_claude_settings_path);

        debug!(
            settings = %settings_path.display(),
            state = %state_path.display(),
            claude = %claude_path.display(),
            "Loading stores"
        );

        let settings = Arc::new(SettingsStore::load(settings_path).await);
        let state = Arc::new(StateStore::load(state_path).await);
        let resolver = Arc::new(ConfigResolver::new(Arc::clone(&state), claude_path));

        Self {
            settings,
            state,
            resolver,
        }
    }

    /// Builds a meter over the relay client and the given host.
    pub async fn meter(
        &self,
        presenter: Arc<dyn Presenter>,
        window: Arc<dyn HostWindow>,
        focus: watch::Receiver<bool>,
        logging_hook: Option<LoggingHook>,
    ) -> Result<Meter> {
        let source: Arc<dyn UsageSource> = Arc::new(RelayClient::new()?);
        let file_events: Arc<dyn FileEventSource> = Arc::new(NotifyFileSource::new());

        Ok(Meter::new(MeterDeps {
            settings: Arc::clone(&self.settings),
            state: Arc::clone(&self.state),
            resolver: Arc::clone(&self.resolver),
            source,
            presenter,
            window,
            focus,
            file_events,
            retry: RetryStrategy::new(FETCH_ATTEMPTS),
            logging_hook,
        })
        .await)
    }
}
