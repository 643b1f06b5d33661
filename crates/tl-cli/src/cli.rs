//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::report::ReportArgs;

/// Project time tracker.
///
/// Pick a project, run a timer against it, and report the recorded time
/// per day or per range.
#[derive(Debug, Parser)]
#[command(name = "tl", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage projects.
    #[command(subcommand)]
    Project(ProjectAction),

    /// Time a session in the foreground until Enter is pressed.
    Start {
        /// Project to time (defaults to the selected project).
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Show recorded time per day and in total.
    Report(ReportArgs),

    /// Show database location and record counts.
    Status,
}

/// Project subcommands.
#[derive(Debug, Subcommand)]
pub enum ProjectAction {
    /// Add a project (or reuse one with the same name) and select it.
    Add {
        /// Project name; matching ignores case.
        name: String,
    },

    /// List projects.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Select the project used by `tl start`.
    Select {
        /// Project name.
        name: String,
    },

    /// Delete a project and all of its records.
    Delete {
        /// Project name.
        name: String,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}
