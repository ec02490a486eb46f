//! Project actions.
//!
//! Each [`ProjectAction`] knows how to render itself as a result item for a
//! selected project and how to execute itself from the serialized argument of
//! that item. Actions fall into two families:
//!
//! - plain actions, rendered for every project (or, for the IDE action, only
//!   for matching project types)
//! - git actions, which resolve the project's hosting metadata before
//!   rendering and are omitted when the project is not a recognised checkout
//!
//! The [`ActionRegistry`] holds the fixed, ordered set and dispatches
//! execution requests by action name.

use std::{collections::HashMap, ffi::OsStr, io, path::Path};

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::{
    feedback::Item,
    filtering::matches_query,
    git::{GitInfo, GitResolver},
    project::{Project, ProjectType},
    runner::{CommandRunner, Launch},
};

/// Identifier of the standalone action that opens the configuration file.
pub const OPEN_CONFIG_ACTION: &str = "Open Config File";

/// `AppleScript` that opens a new iTerm session and changes into a directory.
const OPEN_IN_ITERM_SCRIPT: &str = r#"tell application "iTerm"
activate
set myterm to (current terminal)
tell myterm
launch session "Default Session"
tell the last session
write text "cd " & quoted form of "%s"
end tell
end tell
end tell
"#;

/// What an action needs to know about its surroundings to render or run.
#[derive(Clone, Copy)]
pub struct ActionContext<'a> {
    /// Source of hosting metadata for git actions
    pub git: &'a dyn GitResolver,

    /// Configured Bitbucket Server hostname
    pub stash_server: Option<&'a str>,
}

impl std::fmt::Debug for ActionContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionContext")
            .field("stash_server", &self.stash_server)
            .finish_non_exhaustive()
    }
}

impl ActionContext<'_> {
    fn git_info(&self, path: &Path) -> Option<GitInfo> {
        self.git.resolve(path, self.stash_server)
    }
}

/// The per-project actions, in display order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ProjectAction {
    OpenInFinder,
    OpenInIterm,
    OpenInSublime,
    OpenInIdea,
    OpenInSourceTree,
    OpenRepoLink,
    CreatePullRequest,
    OpenPullRequests,
}

impl ProjectAction {
    /// Every action, in the order they are offered.
    pub const ALL: [Self; 8] = [
        Self::OpenInFinder,
        Self::OpenInIterm,
        Self::OpenInSublime,
        Self::OpenInIdea,
        Self::OpenInSourceTree,
        Self::OpenRepoLink,
        Self::CreatePullRequest,
        Self::OpenPullRequests,
    ];

    /// Display name, which is also the identifier embedded in item arguments.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::OpenInFinder => "Open in Finder",
            Self::OpenInIterm => "Open in Iterm",
            Self::OpenInSublime => "Open in Sublime",
            Self::OpenInIdea => "Open in IntelliJ IDEA",
            Self::OpenInSourceTree => "Open in Source Tree",
            Self::OpenRepoLink => "Open Repo Link",
            Self::CreatePullRequest => "Create Pull Request",
            Self::OpenPullRequests => "Open Pull Requests",
        }
    }

    /// Short alias the action can also be found by.
    #[must_use]
    pub const fn shortcut(self) -> Option<&'static str> {
        match self {
            Self::OpenInSourceTree => Some("st"),
            Self::OpenRepoLink => Some("repo"),
            Self::CreatePullRequest => Some("cpr"),
            Self::OpenPullRequests => Some("prs"),
            _ => None,
        }
    }

    /// Icon file of plain actions, under `icons/`. Git actions show the
    /// icon of their hosting server instead.
    const fn icon_file(self) -> Option<&'static str> {
        match self {
            Self::OpenInFinder => Some("finder.png"),
            Self::OpenInIterm => Some("iterm.png"),
            Self::OpenInSublime => Some("sublime.png"),
            Self::OpenInIdea => Some("idea.png"),
            _ => None,
        }
    }

    /// Whether the action depends on git hosting metadata.
    #[must_use]
    pub const fn requires_git(self) -> bool {
        matches!(
            self,
            Self::OpenInSourceTree
                | Self::OpenRepoLink
                | Self::CreatePullRequest
                | Self::OpenPullRequests
        )
    }

    /// Whether the action applies to `project` at all.
    ///
    /// Only the IntelliJ action is restricted, to Java projects.
    #[must_use]
    pub fn should_display(self, project: &Project) -> bool {
        match self {
            Self::OpenInIdea => project.project_type == Some(ProjectType::Java),
            _ => true,
        }
    }

    /// Text the action is matched by: its name followed by its shortcut.
    #[must_use]
    pub fn filter_key(self) -> String {
        match self.shortcut() {
            Some(shortcut) => format!("{} {shortcut}", self.name()),
            None => self.name().to_string(),
        }
    }

    /// Render the action as a result item for `project`.
    ///
    /// Returns `None` when the action does not apply, including git actions
    /// on projects without resolvable hosting metadata.
    #[must_use]
    pub fn build(self, project: &Project, ctx: &ActionContext<'_>) -> Option<Item> {
        if !self.should_display(project) {
            return None;
        }

        let (subtitle, icon) = if self.requires_git() {
            let info = ctx.git_info(&project.path)?;
            (self.subtitle(project, Some(&info)), info.server.icon_path())
        } else {
            let icon = self
                .icon_file()
                .map(|file| format!("icons/{file}"))
                .unwrap_or_default();
            (self.subtitle(project, None), icon)
        };

        let arg = match action_arg(self.name(), Some(project)) {
            Ok(arg) => arg,
            Err(e) => {
                debug!("cannot serialize argument for {}: {e}", self.name());
                return None;
            }
        };

        Some(
            Item::new(self.name())
                .uid(self.name())
                .subtitle(subtitle)
                .icon(icon)
                .arg(arg),
        )
    }

    fn subtitle(self, project: &Project, git: Option<&GitInfo>) -> String {
        match (self, git) {
            (Self::OpenRepoLink, Some(info)) => info.link.clone(),
            (Self::CreatePullRequest, Some(info)) => info.create_pr_link.clone(),
            (Self::OpenPullRequests, Some(info)) => info.prs_link.clone(),
            _ => project.path.display().to_string(),
        }
    }

    /// The side effect of running the action on `project`.
    ///
    /// Link actions resolve the hosting metadata afresh and yield `None`
    /// when it cannot be found.
    #[must_use]
    pub fn launch(self, project: &Project, ctx: &ActionContext<'_>) -> Option<Launch> {
        let path = project.path.as_path();
        let launch = match self {
            Self::OpenInFinder => Launch::open_path(path),
            Self::OpenInIterm => Launch::AppleScript(iterm_script(path)),
            Self::OpenInSublime => {
                Launch::command("/usr/local/bin/subl", [OsStr::new("--stay"), path.as_os_str()])
            }
            Self::OpenInIdea => Launch::command("./idea", [path.as_os_str()]),
            Self::OpenInSourceTree => Launch::command(
                "open",
                [OsStr::new("-a"), OsStr::new("SourceTree"), path.as_os_str()],
            ),
            Self::OpenRepoLink => Launch::open_url(&ctx.git_info(path)?.link),
            Self::CreatePullRequest => Launch::open_url(&ctx.git_info(path)?.create_pr_link),
            Self::OpenPullRequests => Launch::open_url(&ctx.git_info(path)?.prs_link),
        };
        Some(launch)
    }

    /// Run the action on `project`.
    ///
    /// # Errors
    ///
    /// Returns an error if the launched process cannot be started.
    pub fn execute(
        self,
        project: &Project,
        ctx: &ActionContext<'_>,
        runner: &dyn CommandRunner,
    ) -> io::Result<()> {
        match self.launch(project, ctx) {
            Some(launch) => runner.run(&launch),
            None => {
                info!(
                    "{} skipped: no git info for {}",
                    self.name(),
                    project.path.display()
                );
                Ok(())
            }
        }
    }
}

fn iterm_script(path: &Path) -> String {
    let escaped = path
        .display()
        .to_string()
        .replace('\\', "\\\\")
        .replace('"', "\\\"");
    OPEN_IN_ITERM_SCRIPT.replace("%s", &escaped)
}

/// Serialize an execution request: the action identifier merged with the
/// project's fields.
///
/// # Errors
///
/// Returns an error if the project cannot be serialized.
pub fn action_arg(action: &str, project: Option<&Project>) -> serde_json::Result<String> {
    let mut fields = match project {
        Some(project) => match serde_json::to_value(project)? {
            Value::Object(map) => map,
            _ => Map::new(),
        },
        None => Map::new(),
    };
    fields.insert("action".to_string(), Value::String(action.to_string()));
    serde_json::to_string(&Value::Object(fields))
}

/// A parsed execution request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    /// Identifier of the action to run
    pub action: String,

    /// Project the action targets; absent for project-less actions
    pub project: Option<Project>,
}

impl ActionRequest {
    /// Parse the argument of an executed item.
    ///
    /// # Errors
    ///
    /// Returns an error if `arg` is not a JSON object with a string `action`.
    pub fn parse(arg: &str) -> serde_json::Result<Self> {
        #[derive(Deserialize)]
        struct Envelope {
            action: String,
        }

        let value: Value = serde_json::from_str(arg)?;
        let Envelope { action } = serde_json::from_value(value.clone())?;
        let project = serde_json::from_value(value).ok();

        Ok(Self { action, project })
    }
}

/// The fixed, ordered set of project actions, indexed by name.
#[derive(Debug)]
pub struct ActionRegistry {
    actions: Vec<ProjectAction>,
    by_name: HashMap<&'static str, ProjectAction>,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new(ProjectAction::ALL.to_vec())
    }
}

impl ActionRegistry {
    /// Build a registry over `actions`, keeping their order.
    #[must_use]
    pub fn new(actions: Vec<ProjectAction>) -> Self {
        let by_name = actions.iter().map(|a| (a.name(), *a)).collect();
        Self { actions, by_name }
    }

    /// Look up an action by its identifier.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<ProjectAction> {
        self.by_name.get(name).copied()
    }

    /// Actions whose name or shortcut matches `query`, in display order.
    #[must_use]
    pub fn filter(&self, query: &str) -> Vec<ProjectAction> {
        self.actions
            .iter()
            .copied()
            .filter(|action| matches_query(query, &[action.filter_key()]))
            .collect()
    }

    /// Execute a parsed request.
    ///
    /// Requests naming no registered action, or carrying no project, do
    /// nothing.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if an action ran, `Ok(false)` if the request was ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the launched process cannot be started.
    pub fn execute(
        &self,
        request: &ActionRequest,
        ctx: &ActionContext<'_>,
        runner: &dyn CommandRunner,
    ) -> io::Result<bool> {
        let Some(action) = self.find(&request.action) else {
            debug!("no action named '{}'", request.action);
            return Ok(false);
        };
        let Some(project) = &request.project else {
            debug!("'{}' requested without a project", request.action);
            return Ok(false);
        };

        action.execute(project, ctx, runner)?;
        Ok(true)
    }
}
