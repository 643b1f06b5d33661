//! CLI subcommand implementations.

pub mod project;
pub mod report;
pub mod start;
pub mod status;
pub mod util;
