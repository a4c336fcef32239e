//! Output formatting for CLI.

mod json;
mod text;

pub use json::{JsonFormatter, UnconfiguredOutput};
pub use text::{NoticeLevel, TextFormatter};
