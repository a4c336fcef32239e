//! Status item rendering.
//!
//! [`StatusRenderer`] turns meter state into a [`StatusView`]. It is pure:
//! the same inputs always give the same view, and nothing here touches the
//! host until [`StatusRenderer::apply`].

use chrono::Local;
use relaymeter_core::color::{band_emoji, band_for, status_color};
use relaymeter_core::format::{
    format_duration, format_expiry, format_large_number, format_with_thousands_separator,
};
use relaymeter_core::{
    ColorThresholds, CommandId, CostStats, CustomColors, MissingConfig, StatusColor, StatusView,
    ThemeColor, Tooltip, TooltipLine, Translator, UsageSnapshot,
};
use relaymeter_fetch::dashboard_url;
use relaymeter_store::Settings;

use crate::host::Presenter;

/// Builds status views in the current language and color settings.
#[derive(Debug, Clone)]
pub struct StatusRenderer {
    translator: Translator,
    colors_enabled: bool,
    thresholds: ColorThresholds,
    colors: CustomColors,
}

impl StatusRenderer {
    /// Creates a renderer with default colors.
    pub fn new(translator: Translator) -> Self {
        Self {
            translator,
            colors_enabled: true,
            thresholds: ColorThresholds::default(),
            colors: CustomColors::default(),
        }
    }

    /// Creates a renderer from user settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            translator: Translator::new(settings.language()),
            colors_enabled: settings.enable_status_bar_colors,
            thresholds: settings.color_thresholds.sanitized(),
            colors: settings.custom_colors.clone().sanitized(),
        }
    }

    /// The translator in use.
    pub fn translator(&self) -> Translator {
        self.translator
    }

    fn t(&self, key: &str) -> String {
        self.translator.t(key)
    }

    // ========================================================================
    // Transient States
    // ========================================================================

    /// Shown once while the meter starts.
    pub fn initializing(&self) -> StatusView {
        StatusView {
            text: format!("⟳ {}", self.t("statusBar.initializing")),
            tooltip: Tooltip::new(self.t("statusBar.title")).footer(self.t("tooltips.initializing")),
            color: StatusColor::Theme(ThemeColor::Foreground),
            command: None,
        }
    }

    /// Shown while a fetch is in flight.
    pub fn loading(&self) -> StatusView {
        StatusView {
            text: format!("⟳ {}", self.t("statusBar.loading")),
            tooltip: Tooltip::new(self.t("statusBar.title")).footer(self.t("tooltips.loading")),
            color: StatusColor::Theme(ThemeColor::Foreground),
            command: Some(CommandId::RefreshStats),
        }
    }

    /// Shown after a failed cycle.
    pub fn error(&self, message: &str) -> StatusView {
        let tooltip = Tooltip::new(self.t("tooltips.errorTitle"))
            .section(
                None,
                vec![TooltipLine::labeled(self.t("tooltips.errorLabel"), message)],
            )
            .footer(self.t("tooltips.errorHint"));

        StatusView {
            text: format!("⚠ {message}"),
            tooltip,
            color: StatusColor::Theme(ThemeColor::Error),
            command: Some(CommandId::RefreshStats),
        }
    }

    /// Shown when no usable config exists.
    pub fn unconfigured(&self, missing: MissingConfig) -> StatusView {
        let (text_key, hint_key) = match missing {
            MissingConfig::ApiUrl => ("statusBar.notConfiguredApiUrl", "tooltips.pleaseConfigureApiUrl"),
            MissingConfig::ApiId => ("statusBar.notConfiguredApiId", "tooltips.pleaseConfigureApiIdOrKey"),
            MissingConfig::Both => ("statusBar.notConfigured", "tooltips.pleaseConfigureFirst"),
        };

        let tooltip = Tooltip::new(self.t("tooltips.needConfiguration"))
            .section(None, vec![TooltipLine::plain(self.t(hint_key))])
            .footer(self.t("tooltips.clickToConfigure"));

        StatusView {
            text: format!("⚙ {}", self.t(text_key)),
            tooltip,
            color: StatusColor::Theme(ThemeColor::Warning),
            command: Some(CommandId::OpenSettings),
        }
    }

    // ========================================================================
    // Usage
    // ========================================================================

    /// Renders a fetched snapshot.
    pub fn snapshot(&self, snapshot: &UsageSnapshot) -> StatusView {
        let daily = snapshot.daily();

        let text = if daily.is_shown() {
            format!(
                "📊 {}/{} {}%",
                daily.formatted_used, daily.formatted_limit, daily.formatted_percentage
            )
        } else {
            format!("📊 {}", daily.formatted_used)
        };

        let color = status_color(
            daily.percentage,
            self.colors_enabled,
            self.thresholds,
            &self.colors,
        );

        StatusView {
            text,
            tooltip: self.snapshot_tooltip(snapshot, &daily),
            color,
            command: Some(CommandId::RefreshStats),
        }
    }

    fn snapshot_tooltip(&self, snapshot: &UsageSnapshot, daily: &CostStats) -> Tooltip {
        let data = &snapshot.data;
        let limits = &data.limits;

        let user = if data.name.is_empty() {
            self.t("common.unknown")
        } else {
            data.name.clone()
        };

        let mut tooltip = Tooltip::new(self.t("tooltips.title"))
            .section(None, vec![TooltipLine::labeled(self.t("tooltips.user"), user)])
            .section(Some(self.t("tooltips.dailyCostLimit")), self.cost_lines(daily));

        let total = snapshot.total();
        if total.is_shown() {
            tooltip = tooltip.section(Some(self.t("tooltips.totalCostLimit")), self.cost_lines(&total));
        }

        let opus = snapshot.weekly_opus();
        if opus.is_shown() {
            tooltip = tooltip.section(Some(self.t("tooltips.opusWeeklyCostLimit")), self.cost_lines(&opus));
        }

        if snapshot.has_rate_limit_window() {
            let minutes = limits.rate_limit_window.to_string();
            let heading = self
                .translator
                .t_with("tooltips.rateLimitWindow", &[("minutes", &minutes)]);
            tooltip = tooltip.section(Some(heading), self.window_lines(snapshot));
        }

        let usage = &data.usage.total;
        let tokens = if usage.all_tokens > 0 {
            usage.all_tokens
        } else {
            usage.tokens
        };
        tooltip = tooltip.section(
            Some(self.t("tooltips.otherStats")),
            vec![
                TooltipLine::labeled(
                    self.t("tooltips.totalRequests"),
                    format_with_thousands_separator(usage.requests),
                ),
                TooltipLine::labeled(
                    self.t("tooltips.totalTokens"),
                    format!(
                        "{} ({})",
                        format_with_thousands_separator(tokens),
                        format_large_number(tokens)
                    ),
                ),
            ],
        );

        if let Some(expiry) = format_expiry(&data.expires_at) {
            tooltip = tooltip.section(
                None,
                vec![TooltipLine::labeled(self.t("tooltips.expiry"), expiry)],
            );
        }

        let dashboard = (!snapshot.api_id.is_empty())
            .then(|| dashboard_url(&snapshot.api_url, &snapshot.api_id));

        tooltip
            .link(self.t("commands.openSettings"), CommandId::OpenSettings, None)
            .link(self.t("commands.openWebDashboard"), CommandId::OpenWebDashboard, dashboard)
            .footer(self.t("tooltips.clickToRefresh"))
            .footer(format!(
                "{}: {}",
                self.t("tooltips.updateTime"),
                snapshot.fetched_at.with_timezone(&Local).format("%H:%M:%S")
            ))
    }

    fn cost_lines(&self, stats: &CostStats) -> Vec<TooltipLine> {
        let limit = if stats.is_shown() {
            stats.formatted_limit.clone()
        } else {
            self.t("common.unlimited")
        };

        let mut lines = vec![TooltipLine::labeled(
            self.t("tooltips.usageStatus"),
            format!("{} / {limit}", stats.formatted_used),
        )];

        if stats.is_shown() {
            let band = band_for(stats.percentage, self.thresholds);
            lines.push(TooltipLine::labeled(
                self.t("tooltips.percentage"),
                format!("{} {}%", band_emoji(band), stats.formatted_percentage),
            ));
        }
        lines
    }

    fn window_lines(&self, snapshot: &UsageSnapshot) -> Vec<TooltipLine> {
        let limits = &snapshot.data.limits;

        let requests = if limits.rate_limit_requests > 0 {
            format!(
                "{} / {}",
                format_with_thousands_separator(limits.current_window_requests),
                format_with_thousands_separator(limits.rate_limit_requests)
            )
        } else {
            format_with_thousands_separator(limits.current_window_requests)
        };

        let mut lines = vec![
            TooltipLine::labeled(self.t("tooltips.windowRequests"), requests),
            TooltipLine::labeled(
                self.t("tooltips.windowTokens"),
                format_with_thousands_separator(limits.current_window_tokens),
            ),
        ];

        let cost = snapshot.window_cost();
        if cost.is_shown() {
            lines.push(TooltipLine::labeled(
                self.t("tooltips.windowCost"),
                format!(
                    "{}/{} ({}%)",
                    cost.formatted_used, cost.formatted_limit, cost.formatted_percentage
                ),
            ));
        }

        if let Some(remaining) = limits.window_remaining_seconds {
            lines.push(TooltipLine::labeled(
                self.t("tooltips.windowRemaining"),
                format_duration(remaining),
            ));
        }
        lines
    }

    // ========================================================================
    // Host
    // ========================================================================

    /// Pushes a view to the presenter.
    pub fn apply(view: &StatusView, presenter: &dyn Presenter) {
        presenter.set_text(&view.text);
        presenter.set_tooltip(&view.tooltip);
        presenter.set_color(&view.color);
        presenter.set_command(view.command);
        presenter.show();
    }
}
