//! Project discovery and metadata resolution.
//!
//! This module turns the configuration into a list of projects: every
//! immediate subdirectory of each source container, followed by the
//! explicitly named sources. It then attaches the derived metadata of each
//! project, consulting the info cache first and deriving misses in parallel.

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
};

use rayon::prelude::*;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::{
    cache::ProjectInfoCache,
    config::Config,
    git::GitResolver,
    project::{Project, ProjectInfo, detect_project_type},
};

/// Discovers projects and resolves their metadata.
pub struct Scanner<'a> {
    /// Source of hosting metadata for cache misses
    git: &'a dyn GitResolver,

    /// Configured Bitbucket Server hostname
    stash_server: Option<&'a str>,
}

impl std::fmt::Debug for Scanner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("stash_server", &self.stash_server)
            .finish_non_exhaustive()
    }
}

impl<'a> Scanner<'a> {
    #[must_use]
    pub const fn new(git: &'a dyn GitResolver, stash_server: Option<&'a str>) -> Self {
        Self { git, stash_server }
    }

    /// List every project the configuration names, without metadata.
    ///
    /// Container subdirectories come first, in container order and then by
    /// name; named sources follow. A path already listed is not listed again.
    /// A container entry whose path is also a named source takes the
    /// configured name.
    #[must_use]
    pub fn discover(config: &Config) -> Vec<Project> {
        let mut named = HashMap::<&Path, &str>::new();
        for (name, path) in &config.sources {
            named.entry(path.as_path()).or_insert(name.as_str());
        }
        let mut seen = HashSet::<PathBuf>::new();

        config
            .source_containers
            .iter()
            .flat_map(|root| Self::list_container(root))
            .map(|mut project| {
                if let Some(name) = named.get(project.path.as_path()) {
                    project.name = (*name).to_string();
                }
                project
            })
            .chain(
                config
                    .sources
                    .iter()
                    .map(|(name, path)| Project::new(name.clone(), path.clone())),
            )
            .filter(|project| {
                let fresh = seen.insert(project.path.clone());
                if !fresh {
                    debug!("skipping duplicate project {project}");
                }
                fresh
            })
            .collect()
    }

    /// List the immediate subdirectories of `root` as projects.
    ///
    /// Symlinks to directories count as directories. An unreadable root is
    /// logged and yields nothing.
    #[must_use]
    pub fn list_container(root: &Path) -> Vec<Project> {
        WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("cannot read source container {}: {e}", root.display());
                    None
                }
            })
            .filter(|entry| entry.file_type().is_dir())
            .map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                Project::new(name, entry.into_path())
            })
            .collect()
    }

    /// Derive the metadata of a directory from scratch.
    #[must_use]
    pub fn derive_info(&self, path: &Path) -> ProjectInfo {
        ProjectInfo {
            project_type: detect_project_type(path),
            git_info: self.git.resolve(path, self.stash_server),
        }
    }

    /// Attach metadata to every project, filling the cache on misses.
    ///
    /// Lookups run in parallel; the method returns only once all of them
    /// have completed, with projects in their original order. New entries
    /// are recorded in `cache` afterwards, from the calling thread.
    pub fn resolve_info(&self, projects: Vec<Project>, cache: &mut ProjectInfoCache) -> Vec<Project> {
        let shared: &ProjectInfoCache = cache;

        let resolved: Vec<(Project, Option<ProjectInfo>)> = projects
            .into_par_iter()
            .map(|project| {
                if let Some(info) = shared.get(&project.path) {
                    return (project.with_info(info.clone()), None);
                }
                let info = self.derive_info(&project.path);
                (project.with_info(info.clone()), Some(info))
            })
            .collect();

        resolved
            .into_iter()
            .map(|(project, fill)| {
                if let Some(info) = fill {
                    cache.put(&project.path, info);
                }
                project
            })
            .collect()
    }
}
