//! Host-neutral display types.
//!
//! The status renderer produces these; a host presenter turns them into
//! whatever its status surface supports (terminal line, tray title, ...).

use serde::{Deserialize, Serialize};

// ============================================================================
// Commands
// ============================================================================

/// Commands the meter exposes to its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandId {
    /// Refresh usage now.
    RefreshStats,
    /// Open the settings.
    OpenSettings,
    /// Pick the display language.
    SelectLanguage,
    /// Open the web dashboard (takes a URL argument).
    OpenWebDashboard,
    /// Re-read credentials from the Claude settings file.
    ReloadCredentials,
    /// Clear persisted runtime/skipped credentials (debug).
    ClearState,
}

impl CommandId {
    /// Returns the stable command id.
    pub fn id(&self) -> &'static str {
        match self {
            CommandId::RefreshStats => "relay-meter.refreshStats",
            CommandId::OpenSettings => "relay-meter.openSettings",
            CommandId::SelectLanguage => "relay-meter.selectLanguage",
            CommandId::OpenWebDashboard => "relay-meter.openWebDashboard",
            CommandId::ReloadCredentials => "relay-meter.reloadCredentials",
            CommandId::ClearState => "relay-meter.clearState",
        }
    }

    /// Looks up a command by its stable id.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::all().iter().copied().find(|c| c.id() == id)
    }

    /// All commands.
    pub fn all() -> &'static [CommandId] {
        &[
            CommandId::RefreshStats,
            CommandId::OpenSettings,
            CommandId::SelectLanguage,
            CommandId::OpenWebDashboard,
            CommandId::ReloadCredentials,
            CommandId::ClearState,
        ]
    }
}

impl std::fmt::Display for CommandId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

// ============================================================================
// Colors
// ============================================================================

/// Host theme colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemeColor {
    /// Default status foreground.
    Foreground,
    /// Warning foreground.
    Warning,
    /// Error foreground.
    Error,
}

/// Color of the status item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusColor {
    /// A theme color chosen by the host.
    Theme(ThemeColor),
    /// An explicit `#RRGGBB` / `#RGB` color.
    Hex(String),
}

impl StatusColor {
    /// Parses the color into RGB components, if it is a hex color.
    pub fn rgb(&self) -> Option<(u8, u8, u8)> {
        match self {
            StatusColor::Hex(hex) => crate::color::parse_hex(hex),
            StatusColor::Theme(_) => None,
        }
    }
}

// ============================================================================
// Tooltip
// ============================================================================

/// One labelled line of a tooltip section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipLine {
    /// Bold label, if any.
    pub label: Option<String>,
    /// Value text.
    pub value: String,
}

impl TooltipLine {
    /// A labelled line.
    pub fn labeled(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            value: value.into(),
        }
    }

    /// A plain line.
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            label: None,
            value: value.into(),
        }
    }
}

/// A titled tooltip section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipSection {
    /// Section heading.
    pub heading: Option<String>,
    /// Section lines.
    pub lines: Vec<TooltipLine>,
}

/// A clickable link in the tooltip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipLink {
    /// Link text.
    pub label: String,
    /// Command run on click.
    pub command: CommandId,
    /// Command argument (e.g. a URL).
    pub argument: Option<String>,
}

/// A structured, multi-section tooltip.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tooltip {
    /// Title line.
    pub title: String,
    /// Sections, separated by rules when rendered.
    pub sections: Vec<TooltipSection>,
    /// Action links.
    pub links: Vec<TooltipLink>,
    /// Trailing lines (hints, update time).
    pub footer: Vec<String>,
}

impl Tooltip {
    /// Creates a tooltip with a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Appends a section.
    pub fn section(mut self, heading: Option<String>, lines: Vec<TooltipLine>) -> Self {
        self.sections.push(TooltipSection { heading, lines });
        self
    }

    /// Appends a link.
    pub fn link(mut self, label: impl Into<String>, command: CommandId, argument: Option<String>) -> Self {
        self.links.push(TooltipLink {
            label: label.into(),
            command,
            argument,
        });
        self
    }

    /// Appends a footer line.
    pub fn footer(mut self, line: impl Into<String>) -> Self {
        self.footer.push(line.into());
        self
    }

    /// Renders as Markdown.
    pub fn to_markdown(&self) -> String {
        let mut out = format!("## {}\n\n", self.title);

        for section in &self.sections {
            out.push_str("---\n\n");
            if let Some(heading) = &section.heading {
                out.push_str(&format!("### {heading}\n\n"));
            }
            for line in &section.lines {
                match &line.label {
                    Some(label) => out.push_str(&format!("**{label}:** {}\n\n", line.value)),
                    None => out.push_str(&format!("{}\n\n", line.value)),
                }
            }
        }

        if !self.links.is_empty() {
            out.push_str("---\n\n");
            let links: Vec<String> = self
                .links
                .iter()
                .map(|link| match &link.argument {
                    Some(url) => format!("[{}]({url})", link.label),
                    None => format!("[{}](command:{})", link.label, link.command.id()),
                })
                .collect();
            out.push_str(&links.join(" | "));
            out.push_str("\n\n");
        }

        for line in &self.footer {
            out.push_str(line);
            out.push_str("\n\n");
        }

        out
    }

    /// Renders as indented plain text.
    pub fn to_plain_text(&self) -> String {
        let mut lines = vec![self.title.clone()];

        for section in &self.sections {
            lines.push(String::new());
            if let Some(heading) = &section.heading {
                lines.push(heading.clone());
            }
            for line in &section.lines {
                match &line.label {
                    Some(label) => lines.push(format!("  {label}: {}", line.value)),
                    None => lines.push(format!("  {}", line.value)),
                }
            }
        }

        if !self.links.is_empty() {
            lines.push(String::new());
            for link in &self.links {
                match &link.argument {
                    Some(arg) => lines.push(format!("→ {}: {arg}", link.label)),
                    None => lines.push(format!("→ {} ({})", link.label, link.command.id())),
                }
            }
        }

        if !self.footer.is_empty() {
            lines.push(String::new());
            lines.extend(self.footer.iter().cloned());
        }

        lines.join("\n")
    }
}

// ============================================================================
// Status View
// ============================================================================

/// Everything a presenter needs to draw the status item.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusView {
    /// Short status text.
    pub text: String,
    /// Rich tooltip.
    pub tooltip: Tooltip,
    /// Text color.
    pub color: StatusColor,
    /// Command run when the item is clicked.
    pub command: Option<CommandId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tooltip {
        Tooltip::new("Relay Meter")
            .section(
                Some("Daily".to_string()),
                vec![TooltipLine::labeled("Usage", "$1 / $10")],
            )
            .link("Open Settings", CommandId::OpenSettings, None)
            .link(
                "Dashboard",
                CommandId::OpenWebDashboard,
                Some("https://relay.example.com/admin-next/api-stats?apiId=x".to_string()),
            )
            .footer("Updated: now")
    }

    #[test]
    fn test_command_ids_roundtrip() {
        for command in CommandId::all() {
            assert_eq!(CommandId::from_id(command.id()), Some(*command));
        }
        assert_eq!(CommandId::from_id("relay-meter.unknown"), None);
    }

    #[test]
    fn test_markdown_rendering() {
        let md = sample().to_markdown();
        assert!(md.starts_with("## Relay Meter\n\n"));
        assert!(md.contains("### Daily"));
        assert!(md.contains("**Usage:** $1 / $10"));
        assert!(md.contains("[Open Settings](command:relay-meter.openSettings)"));
        assert!(md.contains("[Dashboard](https://relay.example.com/admin-next/api-stats?apiId=x)"));
        assert!(md.ends_with("Updated: now\n\n"));
    }

    #[test]
    fn test_plain_text_rendering() {
        let text = sample().to_plain_text();
        assert!(text.starts_with("Relay Meter"));
        assert!(text.contains("  Usage: $1 / $10"));
        assert!(text.contains("→ Dashboard: https://relay.example.com"));
    }

    #[test]
    fn test_status_color_rgb() {
        assert_eq!(StatusColor::Hex("#FF6600".to_string()).rgb(), Some((255, 102, 0)));
        assert_eq!(StatusColor::Theme(ThemeColor::Error).rgb(), None);
    }
}
