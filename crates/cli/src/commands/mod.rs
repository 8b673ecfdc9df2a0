//! Subcommand implementations.

pub mod migrate;
pub mod ping;
pub mod report;
