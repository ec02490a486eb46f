//! Command-line interface definition and argument parsing.
//!
//! The launcher host invokes the binary with one of two subcommands: `query`
//! on every keystroke, and `execute` when an item is actioned. The `config`
//! and `cache` subcommands are for the user maintaining the plugin.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};

use source_launcher::{cache::JsonFileStorage, config::file::DEFAULT_CONFIG_FILE};

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List projects matching a query, or the actions of a selected project
    ///
    /// A query of the form `<project> ➤ <filter>` lists the actions of the
    /// project selected in the previous listing.
    Query {
        /// The query typed in the launcher
        #[arg(num_args = 0.., trailing_var_arg = true, allow_hyphen_values = true)]
        query: Vec<String>,
    },

    /// Execute an action from the serialized argument of a result item
    Execute {
        /// JSON argument carrying the action name and project
        arg: String,
    },

    /// Inspect or initialise the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Inspect or reset the persisted project info cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },
}

/// Subcommands for `config`.
#[derive(Subcommand, Debug, Clone, Copy)]
pub enum ConfigCommand {
    /// Open the config file with its default application
    Open,
    /// Print the path to the config file
    Path,
    /// Write an empty config.json if none exists yet
    Init,
}

/// Subcommands for `cache`.
#[derive(Subcommand, Debug, Clone, Copy)]
pub enum CacheCommand {
    /// Print the path to the storage file
    Path,
    /// Forget every cached project and the last listing
    Clear,
}

/// Main command-line interface structure.
#[derive(Parser, Debug)]
#[command(name = "source-launcher")]
#[command(
    about = "Launcher plugin that lists local source projects and opens them in editors, terminals and their hosted repositories"
)]
#[command(version)]
#[command(author)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the configuration file
    #[arg(short = 'c', long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Path to the persisted storage file (defaults to the user cache directory)
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,
}

impl Cli {
    /// Resolve the storage file location.
    ///
    /// # Errors
    ///
    /// Returns an error if no override is given and the platform has no
    /// cache directory.
    pub fn storage_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.storage {
            return Ok(path.clone());
        }
        match JsonFileStorage::default_path() {
            Some(path) => Ok(path),
            None => bail!("Could not determine the cache directory on this platform"),
        }
    }
}
