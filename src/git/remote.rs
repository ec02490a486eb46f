//! Git remote URL parsing.
//!
//! Supports the clone URL shapes hosting providers hand out:
//! - HTTPS: `https://github.com/owner/repo.git`
//! - SCP-like SSH: `git@github.com:owner/repo.git`
//! - SSH with scheme and port: `ssh://git@stash.acme.com:7999/proj/repo.git`
//! - Bitbucket Server HTTPS: `https://stash.acme.com/scm/proj/repo.git`

/// Result of parsing a git remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRemote {
    /// Hostname without user or port (e.g. `github.com`)
    pub host: String,
    /// Everything between the host and the repository name; may contain `/`
    /// for nested groups
    pub owner: String,
    /// Repository name without the `.git` suffix
    pub repo: String,
}

/// Parse a git remote URL into host, owner and repository.
///
/// Returns `None` if the URL format is not recognized or lacks an owner.
#[must_use]
pub fn parse_remote_url(url: &str) -> Option<ParsedRemote> {
    let url = url.trim();

    if let Some(rest) = url.strip_prefix("ssh://") {
        return parse_with_authority(rest);
    }
    if let Some(rest) = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
    {
        return parse_with_authority(rest);
    }
    if !url.contains("://") {
        return parse_scp_like(url);
    }
    None
}

/// `[user@]host[:port]/path`
fn parse_with_authority(rest: &str) -> Option<ParsedRemote> {
    let (authority, path) = rest.split_once('/')?;
    let host = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    let host = host.split_once(':').map_or(host, |(h, _)| h);
    parse_path_segments(host, path)
}

/// `user@host:path`
fn parse_scp_like(url: &str) -> Option<ParsedRemote> {
    let (user_host, path) = url.split_once(':')?;
    let (_, host) = user_host.split_once('@')?;
    parse_path_segments(host, path)
}

fn parse_path_segments(host: &str, path: &str) -> Option<ParsedRemote> {
    if host.is_empty() {
        return None;
    }

    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let mut parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    // Bitbucket Server serves HTTPS clones under /scm/
    if parts.len() > 2 && parts[0] == "scm" {
        parts.remove(0);
    }

    let (repo, owner) = parts.split_last()?;
    if owner.is_empty() {
        return None;
    }

    Some(ParsedRemote {
        host: host.to_string(),
        owner: owner.join("/"),
        repo: (*repo).to_string(),
    })
}
