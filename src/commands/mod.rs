//! CLI subcommands

pub mod audit;
pub mod docs;
pub mod list;
pub mod stats;
