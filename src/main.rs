//! # source-launcher
//!
//! A launcher plugin that lists the source projects in configured folders and
//! opens them in Finder, iTerm, Sublime Text, IntelliJ IDEA, Source Tree or
//! their hosted repository pages.
//!
//! The launcher host runs the binary once per keystroke with `query` and once
//! per selection with `execute`, reading a JSON item list from stdout.
//!
//! ## Usage
//!
//! ```bash
//! # List projects whose name contains "api"
//! source-launcher --config config.json query api
//!
//! # List the actions of the selected project
//! source-launcher query "my-api ➤ pull"
//!
//! # Create an empty config file
//! source-launcher config init
//! ```
//!
//! Diagnostics go to stderr and are filtered with `RUST_LOG` (default `warn`).

mod cli;

use std::{path::Path, process::exit};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{CacheCommand, Cli, Commands, ConfigCommand};
use colored::Colorize;
use source_launcher::{
    Dispatcher,
    cache::JsonFileStorage,
    config::file::CONFIG_TEMPLATE,
    git::CommandGitResolver,
    runner::{CommandRunner, Launch, SystemRunner},
};
use tracing_subscriber::EnvFilter;

/// Entry point for the source-launcher application.
///
/// This function handles all errors gracefully by calling [`inner_main`] and printing
/// any errors to stderr before exiting with a non-zero status code.
fn main() {
    init_tracing();

    if let Err(err) = inner_main() {
        eprintln!("Error: {err:#}");

        exit(1);
    }
}

/// Install the stderr log subscriber.
///
/// Stdout carries the host's JSON and must stay clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Main application logic that can return errors.
///
/// # Errors
///
/// Returns errors from storage persistence, process launching, malformed
/// `execute` arguments, or JSON serialization.
fn inner_main() -> Result<()> {
    let args = Cli::parse();

    match &args.command {
        Commands::Config { command } => return handle_config_command(*command, &args.config),
        Commands::Cache { command } => return handle_cache_command(*command, &args),
        Commands::Query { .. } | Commands::Execute { .. } => {}
    }

    let mut storage = JsonFileStorage::open(&args.storage_path()?);
    let git = CommandGitResolver;
    let runner = SystemRunner;
    let mut dispatcher = Dispatcher::new(&args.config, &mut storage, &git, &runner);

    match &args.command {
        Commands::Query { query } => {
            let feedback = dispatcher.handle_query(&query.join(" "))?;
            println!("{}", feedback.to_json()?);
        }
        Commands::Execute { arg } => dispatcher.execute(arg)?,
        Commands::Config { .. } | Commands::Cache { .. } => {}
    }

    Ok(())
}

/// Dispatch `config` subcommands.
fn handle_config_command(cmd: ConfigCommand, path: &Path) -> Result<()> {
    match cmd {
        ConfigCommand::Open => SystemRunner
            .run(&Launch::open_path(path))
            .with_context(|| format!("Failed to open {}", path.display())),
        ConfigCommand::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommand::Init => init_config(path),
    }
}

/// Write an empty config template to `path` if it does not exist yet.
fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        println!(
            "{} {}",
            "Config file already exists at:".yellow(),
            path.display()
        );
        println!("Remove it first if you want to regenerate it.");
        return Ok(());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
    }

    std::fs::write(path, CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write config file {}", path.display()))?;

    println!("{} {}", "Config file written to:".green(), path.display());
    Ok(())
}

/// Dispatch `cache` subcommands.
fn handle_cache_command(cmd: CacheCommand, args: &Cli) -> Result<()> {
    let path = args.storage_path()?;

    match cmd {
        CacheCommand::Path => println!("{}", path.display()),
        CacheCommand::Clear => {
            if path.exists() {
                std::fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
                println!("{} {}", "Cleared".green(), path.display());
            } else {
                println!("{}", "Nothing to clear".dimmed());
            }
        }
    }

    Ok(())
}
