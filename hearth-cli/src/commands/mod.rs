//! CLI command implementations

pub mod plugins;
pub mod run;
