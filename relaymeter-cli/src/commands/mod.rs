//! CLI command implementations.

pub mod config;
pub mod dashboard;
pub mod language;
pub mod run;
pub mod state;
pub mod usage;
