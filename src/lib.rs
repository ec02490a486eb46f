//! # source-launcher
//!
//! Library behind the `source-launcher` launcher plugin. It indexes local
//! source directories, classifies them by their build descriptors, derives
//! hosted-repository links from their git remotes, and renders per-project
//! actions as result items for the launcher host.
//!
//! ## Modules
//!
//! - [`config`] - JSON configuration file
//! - [`project`] - Project model and type detection
//! - [`git`] - Git metadata resolution and hosting links
//! - [`cache`] - Persisted storage and the project info cache
//! - [`scanner`] - Project discovery and metadata resolution
//! - [`actions`] - The project actions and their registry
//! - [`dispatcher`] - Entry points for host queries
//! - [`feedback`] - Result items returned to the host
//! - [`runner`] - Process launching

pub mod actions;
pub mod cache;
pub mod config;
pub mod dispatcher;
pub mod feedback;
pub mod filtering;
pub mod git;
pub mod project;
pub mod runner;
pub mod scanner;

pub use dispatcher::Dispatcher;
