//! Language packs and translation lookup.
//!
//! Two packs are embedded at compile time. Lookup falls back from the
//! selected language to Chinese, then to the key itself.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

static ZH_PACK: LazyLock<Value> =
    LazyLock::new(|| serde_json::from_str(include_str!("../locales/zh.json")).unwrap_or(Value::Null));
static EN_PACK: LazyLock<Value> =
    LazyLock::new(|| serde_json::from_str(include_str!("../locales/en.json")).unwrap_or(Value::Null));

// ============================================================================
// Language
// ============================================================================

/// Supported display languages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Simplified Chinese (default and fallback).
    #[default]
    Zh,
    /// English.
    En,
}

impl Language {
    /// All languages, in picker order.
    pub const ALL: [Language; 2] = [Language::Zh, Language::En];

    /// Settings code (`zh`, `en`).
    pub fn code(&self) -> &'static str {
        match self {
            Language::Zh => "zh",
            Language::En => "en",
        }
    }

    /// Native label shown in the picker.
    pub fn label(&self) -> &'static str {
        match self {
            Language::Zh => "中文",
            Language::En => "English",
        }
    }

    /// Parses a settings code. Unknown codes resolve to Chinese.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" => Language::En,
            _ => Language::Zh,
        }
    }

    fn pack(self) -> &'static Value {
        match self {
            Language::Zh => &ZH_PACK,
            Language::En => &EN_PACK,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

// ============================================================================
// Translator
// ============================================================================

/// Resolves dotted keys like `statusBar.loading` in the current pack.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Translator {
    language: Language,
}

impl Translator {
    /// Creates a translator for a language.
    pub fn new(language: Language) -> Self {
        Self { language }
    }

    /// Current language.
    pub fn language(&self) -> Language {
        self.language
    }

    /// Translates a key without parameters.
    pub fn t(&self, key: &str) -> String {
        self.t_with(key, &[])
    }

    /// Translates a key, replacing `{name}` placeholders from `params`.
    pub fn t_with(&self, key: &str, params: &[(&str, &str)]) -> String {
        let Some(template) = lookup(self.language.pack(), key)
            .or_else(|| lookup(Language::Zh.pack(), key))
        else {
            return key.to_string();
        };

        params.iter().fold(template.to_string(), |text, (name, value)| {
            text.replace(&format!("{{{name}}}"), value)
        })
    }
}

fn lookup<'a>(pack: &'a Value, key: &str) -> Option<&'a str> {
    key.split('.')
        .try_fold(pack, |node, part| node.get(part))
        .and_then(Value::as_str)
}
