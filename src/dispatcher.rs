//! Query dispatching.
//!
//! The launcher host runs the plugin once per keystroke or selection. Each
//! run lands on one of four entry points:
//!
//! - [`Dispatcher::list_projects`] for a plain query
//! - [`Dispatcher::list_actions`] once a project has been selected
//! - [`Dispatcher::execute`] when an item is actioned
//! - [`Dispatcher::open_config`] to edit the configuration
//!
//! [`Dispatcher::handle_query`] routes a raw host query to the first two.

use std::{
    collections::{BTreeMap, HashMap},
    path::PathBuf,
};

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::{
    actions::{ActionContext, ActionRegistry, ActionRequest, OPEN_CONFIG_ACTION, action_arg},
    cache::{PROJECTS_INFO_KEY, ProjectInfoCache, Storage, get_typed},
    config::{Config, ConfigError},
    feedback::{Feedback, INFO_ICON, Item, MENU_SEPARATOR},
    filtering::filter_by_query,
    git::GitResolver,
    project::Project,
    runner::{CommandRunner, Launch},
    scanner::Scanner,
};

/// Storage key remembering the projects of the last listing by menu key.
pub const MENU_ITEMS_KEY: &str = "menuItems";

/// Title of the hint shown when no project location is configured.
pub const NOT_CONFIGURED_TITLE: &str = "No project path configured. Enter to open config file.";

/// Title of the hint shown when the configuration is not valid JSON.
pub const BAD_CONFIG_TITLE: &str = "Config file is malformed. Enter to open config file.";

/// Title of the hint shown when the configuration exists but cannot be read.
pub const UNREADABLE_CONFIG_TITLE: &str = "Config file cannot be read. Enter to open config file.";

/// Entry points of the launcher, wired to their collaborators.
pub struct Dispatcher<'a> {
    config_path: PathBuf,
    storage: &'a mut dyn Storage,
    git: &'a dyn GitResolver,
    runner: &'a dyn CommandRunner,
    registry: ActionRegistry,
}

impl std::fmt::Debug for Dispatcher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config_path", &self.config_path)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        config_path: impl Into<PathBuf>,
        storage: &'a mut dyn Storage,
        git: &'a dyn GitResolver,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            config_path: config_path.into(),
            storage,
            git,
            runner,
            registry: ActionRegistry::default(),
        }
    }

    /// Route a raw host query.
    ///
    /// `"<project> ➤ <query>"` lists the actions of a project remembered from
    /// the previous listing; anything else lists projects. A selection that
    /// cannot be found falls back to listing projects matching its name.
    ///
    /// # Errors
    ///
    /// Returns an error if the project listing fails to persist its state.
    pub fn handle_query(&mut self, raw: &str) -> Result<Feedback> {
        let Some((selection, query)) = raw.split_once(MENU_SEPARATOR) else {
            return self.list_projects(raw.trim());
        };
        let selection = selection.trim();

        let menu: BTreeMap<String, Project> =
            get_typed(&*self.storage, MENU_ITEMS_KEY).unwrap_or_default();

        match menu.get(selection) {
            Some(project) => Ok(self.list_actions(query.trim(), project)),
            None => {
                debug!("selection '{selection}' not in menu, listing projects");
                self.list_projects(selection)
            }
        }
    }

    /// List the configured projects matching `query`.
    ///
    /// All project metadata is resolved before anything is returned; the
    /// feedback always holds the complete result set.
    ///
    /// # Errors
    ///
    /// Returns an error if the info cache or menu cannot be persisted.
    pub fn list_projects(&mut self, query: &str) -> Result<Feedback> {
        let config = match Config::load(&self.config_path) {
            Ok(config) => config,
            Err(e) => {
                warn!("{e}");
                return Ok(Feedback::new(vec![Self::config_error_item(&e)?]));
            }
        };

        if !config.has_project_paths() {
            return Ok(Feedback::new(vec![Self::not_configured_item()?]));
        }

        let projects = filter_by_query(query, Scanner::discover(&config), Project::filter_keys);
        debug!(count = projects.len(), query, "projects matched");

        let mut cache = ProjectInfoCache::load(&*self.storage);
        let projects = Scanner::new(self.git, config.stash_server())
            .resolve_info(projects, &mut cache);

        let keyed = Self::menu_keys(projects);
        let menu: BTreeMap<&str, &Project> = keyed
            .iter()
            .map(|(key, project)| (key.as_str(), project))
            .collect();

        let mut writes = vec![(
            MENU_ITEMS_KEY,
            serde_json::to_value(&menu).context("Failed to encode menu items")?,
        )];
        if let Some(info) = cache.take_pending().context("Failed to encode project info cache")? {
            writes.push((PROJECTS_INFO_KEY, info));
        }
        self.storage
            .set_many(writes)
            .context("Failed to save launcher state")?;

        Ok(Feedback::new(
            keyed
                .iter()
                .map(|(key, project)| Self::project_item(key, project))
                .collect(),
        ))
    }

    /// List the actions available for `project` matching `query`.
    ///
    /// Actions are rendered in parallel and returned together, in registry
    /// order, once every one of them has finished.
    #[must_use]
    pub fn list_actions(&self, query: &str, project: &Project) -> Feedback {
        let actions = self.registry.filter(query);
        if actions.is_empty() {
            return Feedback::empty();
        }

        let config = self.load_config_lenient();
        let ctx = ActionContext {
            git: self.git,
            stash_server: config.stash_server(),
        };

        let items: Vec<Option<Item>> = actions
            .into_par_iter()
            .map(|action| action.build(project, &ctx))
            .collect();

        Feedback::new(items.into_iter().flatten().collect())
    }

    /// Execute the action named in a serialized request.
    ///
    /// The open-config request is handled here; every other identifier is
    /// looked up in the action registry. Unknown identifiers do nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if `arg` is not a valid request or the launched
    /// process cannot be started.
    pub fn execute(&self, arg: &str) -> Result<()> {
        let request = ActionRequest::parse(arg).context("Invalid action argument")?;

        if request.action == OPEN_CONFIG_ACTION {
            return self.open_config();
        }

        let config = self.load_config_lenient();
        let ctx = ActionContext {
            git: self.git,
            stash_server: config.stash_server(),
        };

        let ran = self
            .registry
            .execute(&request, &ctx, self.runner)
            .with_context(|| format!("Failed to run '{}'", request.action))?;
        if !ran {
            debug!("request for '{}' ignored", request.action);
        }
        Ok(())
    }

    /// Open the configuration file with its default application.
    ///
    /// # Errors
    ///
    /// Returns an error if the opener cannot be started.
    pub fn open_config(&self) -> Result<()> {
        self.runner
            .run(&Launch::open_path(&self.config_path))
            .with_context(|| format!("Failed to open {}", self.config_path.display()))
    }

    /// Load the config for contexts where a broken file should not block.
    fn load_config_lenient(&self) -> Config {
        Config::load(&self.config_path).unwrap_or_else(|e| {
            warn!("{e}");
            Config::default()
        })
    }

    /// Pair each project with the key it is selected by: its name, or its
    /// path when the name is shared with another listed project.
    fn menu_keys(projects: Vec<Project>) -> Vec<(String, Project)> {
        let mut counts = HashMap::<String, usize>::new();
        for project in &projects {
            *counts.entry(project.name.clone()).or_default() += 1;
        }

        projects
            .into_iter()
            .map(|project| {
                let key = if counts.get(&project.name) == Some(&1) {
                    project.name.clone()
                } else {
                    project.path.display().to_string()
                };
                (key, project)
            })
            .collect()
    }

    fn project_item(menu_key: &str, project: &Project) -> Item {
        let path = project.path.display().to_string();
        let mut item = Item::new(&project.name)
            .uid(&path)
            .subtitle(path)
            .sub_items(menu_key);
        if let Some(kind) = project.project_type {
            item = item.icon(kind.icon_path());
        }
        item
    }

    fn not_configured_item() -> Result<Item> {
        Ok(Item::new(NOT_CONFIGURED_TITLE)
            .icon(INFO_ICON)
            .arg(action_arg(OPEN_CONFIG_ACTION, None)?))
    }

    fn config_error_item(error: &ConfigError) -> Result<Item> {
        let title = match error {
            ConfigError::Read { .. } => UNREADABLE_CONFIG_TITLE,
            ConfigError::Malformed { .. } => BAD_CONFIG_TITLE,
        };
        Ok(Item::new(title)
            .subtitle(error.to_string())
            .icon(INFO_ICON)
            .arg(action_arg(OPEN_CONFIG_ACTION, None)?))
    }
}
