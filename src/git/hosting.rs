//! Hosting providers and the links derived for them.

use std::fmt::{Display, Formatter, Result};

use serde::{Deserialize, Serialize};

use super::remote::ParsedRemote;

/// Code-hosting provider a remote points at.
///
/// The lowercase identifier doubles as the icon name for git actions.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostingServer {
    GitHub,
    GitLab,
    Bitbucket,
    /// Self-hosted Bitbucket Server, configured through `stash-server`
    Stash,
}

impl HostingServer {
    /// Identify the provider from a remote host.
    ///
    /// An explicitly configured stash server wins over the well-known public
    /// hosts. Unknown hosts yield `None`.
    #[must_use]
    pub fn identify(host: &str, stash_server: Option<&str>) -> Option<Self> {
        let host = host.to_lowercase();

        if stash_server.is_some_and(|stash| stash.eq_ignore_ascii_case(&host)) {
            return Some(Self::Stash);
        }

        match host.as_str() {
            "github.com" => Some(Self::GitHub),
            "bitbucket.org" => Some(Self::Bitbucket),
            h if h.starts_with("gitlab") => Some(Self::GitLab),
            _ => None,
        }
    }

    /// Lowercase identifier used in serialized data and icon names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::GitLab => "gitlab",
            Self::Bitbucket => "bitbucket",
            Self::Stash => "stash",
        }
    }

    /// Relative path of the icon shown on git action items.
    #[must_use]
    pub fn icon_path(self) -> String {
        format!("icons/{}.png", self.as_str())
    }
}

impl Display for HostingServer {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.as_str())
    }
}

/// Links into the hosted repository of a checkout.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitInfo {
    /// Provider the remote points at
    pub server: HostingServer,

    /// Repository browse page
    pub link: String,

    /// Page that opens a new pull request from the current branch
    pub create_pr_link: String,

    /// List of open pull requests
    pub prs_link: String,
}

impl GitInfo {
    /// Format the provider-specific links for a parsed remote.
    ///
    /// `branch` is the checked-out branch; without one the creation link
    /// falls back to the provider's generic "new pull request" page.
    #[must_use]
    pub fn new(server: HostingServer, remote: &ParsedRemote, branch: Option<&str>) -> Self {
        let ParsedRemote { host, owner, repo } = remote;

        match server {
            HostingServer::GitHub => {
                let link = format!("https://{host}/{owner}/{repo}");
                let create_pr_link = branch.map_or_else(
                    || format!("{link}/compare"),
                    |b| format!("{link}/compare/{b}?expand=1"),
                );
                Self {
                    server,
                    prs_link: format!("{link}/pulls"),
                    create_pr_link,
                    link,
                }
            }
            HostingServer::GitLab => {
                let link = format!("https://{host}/{owner}/{repo}");
                let create_pr_link = branch.map_or_else(
                    || format!("{link}/-/merge_requests/new"),
                    |b| format!("{link}/-/merge_requests/new?merge_request[source_branch]={b}"),
                );
                Self {
                    server,
                    prs_link: format!("{link}/-/merge_requests"),
                    create_pr_link,
                    link,
                }
            }
            HostingServer::Bitbucket => {
                let link = format!("https://{host}/{owner}/{repo}");
                let create_pr_link = branch.map_or_else(
                    || format!("{link}/pull-requests/new"),
                    |b| format!("{link}/pull-requests/new?source={b}"),
                );
                Self {
                    server,
                    prs_link: format!("{link}/pull-requests"),
                    create_pr_link,
                    link,
                }
            }
            HostingServer::Stash => {
                let base = format!(
                    "https://{host}/projects/{}/repos/{repo}",
                    owner.to_uppercase()
                );
                let create_pr_link = branch.map_or_else(
                    || format!("{base}/pull-requests?create"),
                    |b| format!("{base}/pull-requests?create&sourceBranch=refs/heads/{b}"),
                );
                Self {
                    server,
                    link: format!("{base}/browse"),
                    prs_link: format!("{base}/pull-requests"),
                    create_pr_link,
                }
            }
        }
    }
}
