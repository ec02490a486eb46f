//! Project model and detection.
//!
//! This module contains the data structures that describe a source directory
//! surfaced to the launcher, along with the marker-file based detection of
//! its ecosystem.
//!
//! ## Main Parts
//!
//! - [`Project`] - A named source directory with its cached metadata
//! - [`ProjectInfo`] - The derived, cacheable metadata for a directory
//! - [`ProjectType`] - Enumeration of recognised ecosystems (Java, Node.js)
//! - [`detect_project_type`] - Marker-file classification

pub mod detect;
#[allow(clippy::module_inception)]
// This is acceptable as it is the main module for project management
pub mod project;

pub use detect::detect_project_type;
pub use project::{Project, ProjectInfo, ProjectType};
