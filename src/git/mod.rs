//! Git metadata resolution.
//!
//! This module answers one question for a directory: is it a git checkout
//! pointing at a known hosting provider, and if so, where are its repository
//! page and pull requests? Answers are derived by running the `git` binary
//! and parsing the `origin` remote.
//!
//! Resolution never fails loudly. Anything from "not a repository" to "no
//! origin remote" to "unknown host" is reported as `None`, and callers skip
//! whatever depended on it.

pub mod hosting;
pub mod remote;

use std::{path::Path, process::Command};

use thiserror::Error;
use tracing::debug;

pub use hosting::{GitInfo, HostingServer};
pub use remote::{ParsedRemote, parse_remote_url};

/// Reasons a directory has no usable git metadata.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository")]
    NotGitRepository,

    #[error("Failed to execute git command: {0}")]
    CommandError(String),

    #[error("Git command output was not valid UTF-8")]
    InvalidUtf8,

    #[error("Remote '{0}' not found")]
    RemoteNotFound(String),

    #[error("Unrecognized remote URL: {0}")]
    UnrecognizedRemote(String),

    #[error("Unknown hosting server: {0}")]
    UnknownServer(String),
}

/// Source of git metadata for a directory.
///
/// The scanner and the git actions only talk to this trait, so the metadata
/// source can be swapped (or counted) without touching either.
pub trait GitResolver: Send + Sync {
    /// Resolve the hosting links for `path`.
    ///
    /// `stash_server` is the configured Bitbucket Server hostname, if any.
    /// Returns `None` whenever the directory has no usable metadata.
    fn resolve(&self, path: &Path, stash_server: Option<&str>) -> Option<GitInfo>;
}

/// [`GitResolver`] backed by the `git` command-line tool.
#[derive(Debug, Default, Clone, Copy)]
pub struct CommandGitResolver;

impl CommandGitResolver {
    /// Resolve git metadata, keeping the reason for a miss.
    ///
    /// # Errors
    ///
    /// Returns a [`GitError`] when `path` is not inside a work tree, has no
    /// `origin` remote, or the remote does not point at a known provider.
    pub fn try_resolve(path: &Path, stash_server: Option<&str>) -> Result<GitInfo, GitError> {
        if !is_git_repository(path) {
            return Err(GitError::NotGitRepository);
        }

        let url = get_remote_origin_url(path)?;
        let remote =
            parse_remote_url(&url).ok_or_else(|| GitError::UnrecognizedRemote(url.clone()))?;
        let server = HostingServer::identify(&remote.host, stash_server)
            .ok_or_else(|| GitError::UnknownServer(remote.host.clone()))?;
        let branch = detect_current_branch(path).ok();

        Ok(GitInfo::new(server, &remote, branch.as_deref()))
    }
}

impl GitResolver for CommandGitResolver {
    fn resolve(&self, path: &Path, stash_server: Option<&str>) -> Option<GitInfo> {
        match Self::try_resolve(path, stash_server) {
            Ok(info) => Some(info),
            Err(e) => {
                debug!(path = %path.display(), "no git info: {e}");
                None
            }
        }
    }
}

/// Run `git` in `dir` with a clean repository environment.
fn git(dir: &Path, args: &[&str]) -> Result<std::process::Output, GitError> {
    Command::new("git")
        .args(args)
        .current_dir(dir)
        // Ignore any repository inherited from a hook environment
        .env_remove("GIT_DIR")
        .env_remove("GIT_WORK_TREE")
        .output()
        .map_err(|e| GitError::CommandError(e.to_string()))
}

/// Check whether `dir` lies inside a git work tree.
#[must_use]
pub fn is_git_repository(dir: &Path) -> bool {
    git(dir, &["rev-parse", "--is-inside-work-tree"])
        .map(|o| o.status.success() && o.stdout.starts_with(b"true"))
        .unwrap_or(false)
}

/// Get the `origin` remote URL of the repository containing `dir`.
///
/// # Errors
///
/// Returns an error if git cannot be run, `dir` is not a repository, or no
/// `origin` remote is configured.
pub fn get_remote_origin_url(dir: &Path) -> Result<String, GitError> {
    let output = git(dir, &["remote", "get-url", "origin"])?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("not a git repository") {
            return Err(GitError::NotGitRepository);
        }
        return Err(GitError::RemoteNotFound("origin".to_string()));
    }

    String::from_utf8(output.stdout)
        .map_err(|_| GitError::InvalidUtf8)
        .map(|s| s.trim().to_string())
}

/// Detect the checked-out branch of the repository containing `dir`.
///
/// # Errors
///
/// Returns an error in detached HEAD state or when git fails.
pub fn detect_current_branch(dir: &Path) -> Result<String, GitError> {
    let output = git(dir, &["rev-parse", "--abbrev-ref", "HEAD"])?;

    if !output.status.success() {
        return Err(GitError::CommandError(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    let branch = String::from_utf8(output.stdout)
        .map_err(|_| GitError::InvalidUtf8)?
        .trim()
        .to_string();

    if branch.is_empty() || branch == "HEAD" {
        return Err(GitError::CommandError("detached HEAD".to_string()));
    }

    Ok(branch)
}
