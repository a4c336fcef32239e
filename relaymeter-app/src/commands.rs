//! Command dispatch.

use relaymeter_core::{CommandId, Language, Translator};
use relaymeter_fetch::dashboard_url;
use tracing::{debug, info, warn};

use crate::error::MeterError;
use crate::meter::Meter;

impl Meter {
    /// Runs a host command.
    ///
    /// # Errors
    ///
    /// Returns an error if persisting state or settings fails, or if the
    /// host cannot open a link.
    pub async fn execute(&self, command: CommandId, argument: Option<String>) -> Result<(), MeterError> {
        debug!(command = %command, "Executing command");
        match command {
            CommandId::RefreshStats => {
                self.update_stats().await;
                Ok(())
            }
            CommandId::OpenSettings => {
                self.inner.window.open_settings().await;
                Ok(())
            }
            CommandId::SelectLanguage => self.select_language().await,
            CommandId::OpenWebDashboard => self.open_dashboard(argument).await,
            CommandId::ReloadCredentials => self.reload_credentials().await,
            CommandId::ClearState => self.clear_state().await,
        }
    }

    async fn select_language(&self) -> Result<(), MeterError> {
        let t = self.translator().await;
        let items: Vec<String> = Language::ALL.iter().map(|l| l.label().to_string()).collect();

        let Some(picked) = self
            .inner
            .window
            .quick_pick(&t.t("commands.selectLanguagePrompt"), &items)
            .await
        else {
            return Ok(());
        };
        let Some(language) = Language::ALL.into_iter().find(|l| l.label() == picked) else {
            warn!(picked = %picked, "Unknown language picked");
            return Ok(());
        };

        self.inner.settings.set_language(language).await?;
        info!(language = %language, "Language changed");

        let t = Translator::new(language);
        self.inner
            .window
            .show_info(&t.t_with("commands.languageChanged", &[("language", language.label())]))
            .await;
        Ok(())
    }

    async fn open_dashboard(&self, argument: Option<String>) -> Result<(), MeterError> {
        let url = match argument.filter(|a| !a.trim().is_empty()) {
            Some(url) => Some(url),
            None => self.derive_dashboard_url().await,
        };

        let Some(url) = url else {
            let t = self.translator().await;
            self.inner.window.show_warning(&t.t("notifications.noDashboard"), &[]).await;
            return Ok(());
        };

        info!(url = %url, "Opening web dashboard");
        self.inner
            .window
            .open_external(&url)
            .await
            .map_err(|e| MeterError::Host(e.to_string()))
    }

    async fn derive_dashboard_url(&self) -> Option<String> {
        let manual = self.inner.settings.manual_config().await;
        let config = match self.inner.resolver.resolve(&manual).await {
            Ok(resolution) => resolution.effective?,
            Err(e) => {
                warn!(error = %e, "Failed to resolve config for dashboard");
                return None;
            }
        };

        let api_id = match (config.api_id, config.api_key) {
            (Some(id), _) => id,
            (None, Some(key)) => match self.inner.source.resolve_api_id(&config.api_url, &key).await {
                Ok(id) => id,
                Err(e) => {
                    warn!(error = %e, "Failed to resolve API id for dashboard");
                    return None;
                }
            },
            (None, None) => return None,
        };
        Some(dashboard_url(&config.api_url, &api_id))
    }

    async fn reload_credentials(&self) -> Result<(), MeterError> {
        let t = self.translator().await;
        let path = self.inner.resolver.claude_settings_path().display().to_string();
        let manual = self.inner.settings.manual_config().await;

        let Some(pair) = self.inner.resolver.discover().await.into_pair() else {
            info!(path = %path, "No credentials found in Claude settings");
            self.inner
                .window
                .show_warning(&t.t_with("notifications.noCredentialsFound", &[("path", &path)]), &[])
                .await;
            return Ok(());
        };

        self.inner.state.adopt(pair).await?;
        if !manual.is_empty() {
            warn!("Manual settings are active; reloaded credentials kept as fallback");
            self.inner.window.show_info(&t.t("notifications.manualConfigActive")).await;
            return Ok(());
        }

        self.inner.window.show_info(&t.t("notifications.credentialsReloaded")).await;
        self.update_stats().await;
        Ok(())
    }

    async fn clear_state(&self) -> Result<(), MeterError> {
        self.inner.state.clear_all().await?;
        let t = self.translator().await;
        self.inner.window.show_info(&t.t("notifications.stateCleared")).await;
        self.update_stats().await;
        Ok(())
    }
}
