//! Language command - set the display language.

use anyhow::{bail, Result};
use clap::Args;
use relaymeter_core::{Language, Translator};
use tracing::info;

use crate::context::Context;
use crate::output::{JsonFormatter, NoticeLevel, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the language command.
#[derive(Args)]
pub struct LanguageArgs {
    /// Language code (zh or en). Omit to show the current language.
    pub code: Option<String>,
}

/// Runs the language command.
pub async fn run(args: &LanguageArgs, cli: &Cli, ctx: &Context) -> Result<()> {
    let Some(code) = args.code.as_deref() else {
        let current = ctx.settings.language().await;
        match cli.format {
            OutputFormat::Text => {
                for language in Language::ALL {
                    let marker = if language == current { "*" } else { " " };
                    println!("{marker} {:<3} {}", language.code(), language.label());
                }
            }
            OutputFormat::Json => {
                let output = serde_json::json!({ "language": current.code() });
                println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
            }
        }
        return Ok(());
    };

    let Some(language) = Language::ALL.into_iter().find(|l| l.code() == code) else {
        bail!("Unknown language: {code} (expected zh or en)");
    };

    ctx.settings.set_language(language).await?;
    info!(language = %language, "Language changed");

    let t = Translator::new(language);
    let message = t.t_with("commands.languageChanged", &[("language", language.label())]);
    println!("{}", TextFormatter::new(!cli.no_color).notice(NoticeLevel::Info, &message));
    Ok(())
}
