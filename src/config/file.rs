//! Configuration file support.
//!
//! This module loads the launcher configuration from a JSON file, by default
//! `config.json` in the working directory (the workflow folder when run by
//! the launcher host).
//!
//! # Example config
//!
//! ```json
//! {
//!     "source-containers": ["~/work", "~/oss"],
//!     "sources": {
//!         "dotfiles": "~/.dotfiles"
//!     },
//!     "stash-server": "stash.acme.com"
//! }
//! ```
//!
//! A missing file is not an error: it loads as an empty configuration, which
//! the dispatcher turns into a "not configured" hint. A file that exists but
//! cannot be parsed is reported as [`ConfigError::Malformed`].

use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// Default config file name, resolved against the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Template written by `config init`.
pub const CONFIG_TEMPLATE: &str = r#"{
    "source-containers": [],
    "sources": {}
}
"#;

/// Errors raised while loading the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file at {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Launcher configuration.
///
/// Keys use the kebab-case names of the JSON file. Every field is optional
/// in the file and defaults to empty.
#[derive(Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Directories whose immediate subdirectories are projects
    #[serde(default)]
    pub source_containers: Vec<PathBuf>,

    /// Explicitly named projects, keyed by display name
    #[serde(default)]
    pub sources: BTreeMap<String, PathBuf>,

    /// Hostname of a self-hosted Bitbucket Server
    #[serde(default)]
    pub stash_server: Option<String>,
}

/// Expand a leading `~` in a path to the user's home directory.
///
/// Paths that don't start with `~` are returned unchanged.
#[must_use]
pub fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

impl Config {
    /// Load the configuration from `path`.
    ///
    /// A missing file is logged and yields the default (empty) configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file exists but cannot be read
    /// - The file contains invalid JSON or fields of the wrong type
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("config file not found at {}", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        Self::from_json(&content).map_err(|source| ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a configuration from JSON text, expanding `~` in every path.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid configuration document.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let mut config: Self = serde_json::from_str(content)?;

        for container in &mut config.source_containers {
            *container = expand_tilde(container);
        }
        for path in config.sources.values_mut() {
            *path = expand_tilde(path);
        }

        Ok(config)
    }

    /// Whether any project location is configured at all.
    #[must_use]
    pub fn has_project_paths(&self) -> bool {
        !self.source_containers.is_empty() || !self.sources.is_empty()
    }

    /// The configured stash server, ignoring blank values.
    #[must_use]
    pub fn stash_server(&self) -> Option<&str> {
        self.stash_server
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
