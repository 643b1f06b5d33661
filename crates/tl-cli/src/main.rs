use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tl_cli::commands::{project, report, start, status};
use tl_cli::{Cli, Commands, Config, ProjectAction};
use tl_core::{Notice, SystemClock, Tracker};
use tl_db::Database;

/// Load config, open the database (creating its directory) and build the tracker.
fn open_tracker(config_path: Option<&Path>) -> Result<(Tracker<Database>, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = Database::open(&config.database_path).context("failed to open database")?;
    let tracker = Tracker::new(db, SystemClock, config.tracker_options())
        .context("failed to load projects")?;
    Ok((tracker, config))
}

/// Run one subcommand against an open tracker.
fn dispatch(command: &Commands, tracker: &mut Tracker<Database>, config: &Config) -> Result<()> {
    let mut stdout = io::stdout().lock();

    match command {
        Commands::Project(action) => match action {
            ProjectAction::Add { name } => project::add(&mut stdout, tracker, name),
            ProjectAction::List { json } => project::list(&mut stdout, tracker, *json),
            ProjectAction::Select { name } => project::select(&mut stdout, tracker, name),
            ProjectAction::Delete { name, yes } => {
                let mut stdin = io::stdin().lock();
                project::delete(&mut stdin, &mut stdout, tracker, name, *yes)
            }
        },
        Commands::Start { project } => {
            let events = start::spawn_stop_listeners()?;
            start::run(
                &mut stdout,
                tracker,
                project.as_deref(),
                &events,
                start::TICK,
            )
        }
        Commands::Report(args) => report::run(&mut stdout, tracker, args, Utc::now()),
        Commands::Status => status::run(&mut stdout, tracker, &config.database_path),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (mut tracker, config) = open_tracker(cli.config.as_deref())?;
    let result = dispatch(command, &mut tracker, &config);

    tracker.close();
    for notice in tracker.take_notices() {
        if let Notice::Error(message) = notice {
            eprintln!("error: {message}");
        }
    }

    result
}
