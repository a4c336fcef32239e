//! Text output formatting with ANSI colors.

use std::path::Path;

use relaymeter_core::format::mask_api_key;
use relaymeter_core::{StatusColor, ThemeColor, Tooltip};
use relaymeter_store::Settings;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const BLUE: &str = "\x1b[34m";
const CYAN: &str = "\x1b[36m";

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Informational.
    Info,
    /// Needs attention.
    Warning,
    /// Something failed.
    Error,
}

/// Text formatter with optional colors.
#[derive(Debug, Clone, Copy)]
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn paint(&self, style: &str, text: &str) -> String {
        if self.use_colors {
            format!("{style}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    // ========================================================================
    // Status
    // ========================================================================

    /// Formats the status line. Hex colors use 24-bit ANSI sequences.
    pub fn status_line(&self, text: &str, color: &StatusColor) -> String {
        if !self.use_colors {
            return text.to_string();
        }
        match color {
            StatusColor::Hex(_) => match color.rgb() {
                Some((r, g, b)) => format!("\x1b[38;2;{r};{g};{b}m{text}{RESET}"),
                None => text.to_string(),
            },
            StatusColor::Theme(ThemeColor::Foreground) => text.to_string(),
            StatusColor::Theme(ThemeColor::Warning) => self.paint(YELLOW, text),
            StatusColor::Theme(ThemeColor::Error) => self.paint(RED, text),
        }
    }

    /// Formats a tooltip as indented text.
    pub fn tooltip(&self, tooltip: &Tooltip) -> String {
        if !self.use_colors {
            return tooltip.to_plain_text();
        }

        let mut lines = vec![self.paint(BOLD, &tooltip.title)];

        for section in &tooltip.sections {
            lines.push(String::new());
            if let Some(heading) = &section.heading {
                lines.push(self.paint(CYAN, heading));
            }
            for line in &section.lines {
                match &line.label {
                    Some(label) => lines.push(format!("  {}: {}", self.paint(BOLD, label), line.value)),
                    None => lines.push(format!("  {}", line.value)),
                }
            }
        }

        if !tooltip.links.is_empty() {
            lines.push(String::new());
            for link in &tooltip.links {
                let target = link
                    .argument
                    .clone()
                    .unwrap_or_else(|| link.command.id().to_string());
                lines.push(format!("→ {} {}", link.label, self.paint(BLUE, &target)));
            }
        }

        if !tooltip.footer.is_empty() {
            lines.push(String::new());
            lines.extend(tooltip.footer.iter().map(|l| self.paint(DIM, l)));
        }

        lines.join("\n")
    }

    // ========================================================================
    // Notices
    // ========================================================================

    /// Formats a notification message.
    pub fn notice(&self, level: NoticeLevel, message: &str) -> String {
        let (icon, color) = match level {
            NoticeLevel::Info => ("ℹ", BLUE),
            NoticeLevel::Warning => ("⚠", YELLOW),
            NoticeLevel::Error => ("✗", RED),
        };
        format!("{} {message}", self.paint(color, icon))
    }

    /// Formats numbered prompt actions.
    pub fn actions(&self, actions: &[String]) -> String {
        let mut lines: Vec<String> = actions
            .iter()
            .enumerate()
            .map(|(i, action)| format!("  {} {action}", self.paint(CYAN, &format!("[{}]", i + 1))))
            .collect();
        lines.push(self.paint(DIM, "  Enter a number, or an empty line to dismiss."));
        lines.join("\n")
    }

    /// Formats a success line.
    pub fn success(&self, message: &str) -> String {
        format!("{} {message}", self.paint(GREEN, "✓"))
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Formats the settings file for `config show`. The API key is masked.
    pub fn settings(&self, settings: &Settings, path: &Path) -> String {
        let or_unset = |v: &str| {
            if v.trim().is_empty() {
                self.paint(DIM, "(not set)")
            } else {
                v.to_string()
            }
        };
        let api_key = if settings.api_key.trim().is_empty() {
            or_unset("")
        } else {
            mask_api_key(&settings.api_key)
        };

        let rows = [
            ("apiUrl", or_unset(&settings.api_url)),
            ("apiId", or_unset(&settings.api_id)),
            ("apiKey", api_key),
            ("refreshInterval", format!("{}s", settings.refresh_interval)),
            ("enableLogging", settings.enable_logging.to_string()),
            ("enableStatusBarColors", settings.enable_status_bar_colors.to_string()),
            ("watchClaudeSettings", settings.watch_claude_settings.to_string()),
            ("colorThresholds.low", settings.color_thresholds.low.to_string()),
            ("colorThresholds.medium", settings.color_thresholds.medium.to_string()),
            ("customColors.low", settings.custom_colors.low.clone()),
            ("customColors.medium", settings.custom_colors.medium.clone()),
            ("customColors.high", settings.custom_colors.high.clone()),
            ("language", settings.language.clone()),
        ];

        let mut lines = vec![
            self.paint(BOLD, "Settings"),
            "─".repeat(40),
            format!("{} {}", self.paint(DIM, "File:"), path.display()),
            String::new(),
        ];
        lines.extend(rows.iter().map(|(key, value)| format!("  {key:<24} {value}")));
        lines.join("\n")
    }

    /// Formats labelled file paths for `config path`.
    pub fn paths(&self, paths: &[(&str, &Path)]) -> String {
        let mut lines = vec![self.paint(BOLD, "Paths"), "─".repeat(40)];
        lines.extend(
            paths
                .iter()
                .map(|(label, path)| format!("  {label:<16} {}", path.display())),
        );
        lines.join("\n")
    }
}
