//! Marker-file based project type detection.

use std::path::Path;

use super::ProjectType;

/// Marker files checked in priority order; the first one present wins.
const MARKERS: [(&str, ProjectType); 2] = [
    ("pom.xml", ProjectType::Java),
    ("package.json", ProjectType::NodeJs),
];

/// Classify a directory by the build descriptors it contains.
///
/// A Maven `pom.xml` takes priority over a Node.js `package.json` when both
/// exist. Only existence is checked; file contents are never parsed.
///
/// # Returns
///
/// - `Some(ProjectType)` for the first marker found
/// - `None` if the directory holds neither marker (the project is unknown)
#[must_use]
pub fn detect_project_type(path: &Path) -> Option<ProjectType> {
    MARKERS
        .iter()
        .find(|(marker, _)| path.join(marker).is_file())
        .map(|(_, kind)| *kind)
}
