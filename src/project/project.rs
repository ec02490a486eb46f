//! Core project data structures and types.
//!
//! This module defines the data structures used to represent source
//! directories throughout the application, both in the result items handed
//! to the launcher and in the persisted info cache.

use std::{
    fmt::{Display, Formatter, Result},
    path::PathBuf,
};

use serde::{Deserialize, Serialize};

use crate::git::GitInfo;

/// Enumeration of recognised project ecosystems.
///
/// A directory that matches none of these is treated as unknown, which is
/// represented as `Option::None` wherever a project type is stored.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum ProjectType {
    /// Maven project, identified by a `pom.xml` file
    #[serde(rename = "java")]
    Java,

    /// Node.js project, identified by a `package.json` file
    #[serde(rename = "nodejs")]
    NodeJs,
}

impl ProjectType {
    /// Identifier used in serialized data and icon file names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Java => "java",
            Self::NodeJs => "nodejs",
        }
    }

    /// Relative path of the icon shown next to projects of this type.
    #[must_use]
    pub fn icon_path(self) -> String {
        format!("icons/{}.png", self.as_str())
    }
}

impl Display for ProjectType {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.as_str())
    }
}

/// Derived metadata for a directory.
///
/// This is the value memoized by the project info cache. It is computed once
/// per path and reused until the cache is cleared.
#[derive(Clone, Default, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    /// Detected ecosystem, `None` when unknown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_type: Option<ProjectType>,

    /// Hosting metadata, `None` when the directory is not a recognised git checkout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_info: Option<GitInfo>,
}

/// A source directory surfaced to the user.
///
/// Projects are serialized with camelCase keys into the argument of every
/// action item, so an action can later be executed from that argument alone.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Display name: the directory name, or the key of a named source
    pub name: String,

    /// Location of the project on disk; unique among listed projects
    pub path: PathBuf,

    /// Detected ecosystem, `None` when unknown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_type: Option<ProjectType>,

    /// Hosting metadata captured when the project was listed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_info: Option<GitInfo>,
}

impl Project {
    /// Create a project without any derived metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            project_type: None,
            git_info: None,
        }
    }

    /// Attach the derived metadata from the info cache.
    #[must_use]
    pub fn with_info(mut self, info: ProjectInfo) -> Self {
        self.project_type = info.project_type;
        self.git_info = info.git_info;
        self
    }

    /// Keys used to match the project against a query.
    ///
    /// The name is accompanied by a variant with hyphens replaced by spaces,
    /// so `my-app` is found by both `my-app` and `my app`.
    #[must_use]
    pub fn filter_keys(&self) -> Vec<String> {
        vec![self.name.clone(), self.name.replace('-', " ")]
    }
}

impl Display for Project {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self.project_type {
            Some(kind) => write!(f, "{} [{kind}] ({})", self.name, self.path.display()),
            None => write!(f, "{} ({})", self.name, self.path.display()),
        }
    }
}
