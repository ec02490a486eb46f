//! Configuration management.
//!
//! The launcher is configured through a JSON file listing the directories to
//! scan and any explicitly named projects. The file is re-read on every
//! invocation, so edits take effect on the next query.

pub mod file;

pub use file::{Config, ConfigError, expand_tilde};
