//! Time-Line CLI library.
//!
//! This crate provides the terminal shell for the tracker: argument parsing,
//! configuration and the subcommands that drive [`tl_core::Tracker`].

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, ProjectAction};
pub use config::Config;
