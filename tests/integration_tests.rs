//! Integration tests for source-launcher
//!
//! These tests lay out temporary source folders and config files, then drive
//! the dispatcher the way the launcher host does: a query per keystroke and
//! an execute per selection. Git lookups and process launches go through
//! test doubles so they can be counted and inspected.

use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use tempfile::TempDir;

use source_launcher::Dispatcher;
use source_launcher::cache::{JsonFileStorage, MemoryStorage, PROJECTS_INFO_KEY, Storage, StorageError};
use source_launcher::dispatcher::{
    BAD_CONFIG_TITLE, MENU_ITEMS_KEY, NOT_CONFIGURED_TITLE, UNREADABLE_CONFIG_TITLE,
};
use source_launcher::feedback::{Feedback, INFO_ICON};
use source_launcher::git::{GitInfo, GitResolver, HostingServer, parse_remote_url};
use source_launcher::runner::{CommandRunner, Launch};

/// Git resolver that counts lookups and answers with fixed metadata.
#[derive(Default)]
struct CountingGit {
    calls: AtomicUsize,
    info: Option<GitInfo>,
}

impl CountingGit {
    fn github() -> Self {
        let remote = parse_remote_url("git@github.com:acme/api.git").expect("valid remote");
        Self {
            calls: AtomicUsize::new(0),
            info: Some(GitInfo::new(HostingServer::GitHub, &remote, Some("feature"))),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GitResolver for CountingGit {
    fn resolve(&self, _path: &Path, _stash_server: Option<&str>) -> Option<GitInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.info.clone()
    }
}

/// Runner that records launches instead of performing them.
#[derive(Default)]
struct RecordingRunner(RefCell<Vec<Launch>>);

impl RecordingRunner {
    fn launches(&self) -> Vec<Launch> {
        self.0.borrow().clone()
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, launch: &Launch) -> io::Result<()> {
        self.0.borrow_mut().push(launch.clone());
        Ok(())
    }
}

/// Storage that counts how often it is written.
#[derive(Default)]
struct CountingStorage {
    inner: MemoryStorage,
    writes: usize,
}

impl Storage for CountingStorage {
    fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: serde_json::Value) -> Result<(), StorageError> {
        self.writes += 1;
        self.inner.set(key, value)
    }

    fn set_many(&mut self, entries: Vec<(&str, serde_json::Value)>) -> Result<(), StorageError> {
        self.writes += 1;
        for (key, value) in entries {
            self.inner.set(key, value)?;
        }
        Ok(())
    }
}

/// Helper function to create a temporary directory structure for testing
fn create_test_directory() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Helper function to create a file with specified content
fn create_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent directories");
    }
    fs::write(path, content).expect("Failed to write file");
}

/// Helper function to create a directory
fn create_dir(path: &Path) -> PathBuf {
    fs::create_dir_all(path).expect("Failed to create directory");
    path.to_path_buf()
}

/// Write a config file listing `containers` and named `sources`.
fn write_config(dir: &Path, containers: &[&Path], sources: &[(&str, &Path)]) -> PathBuf {
    let sources: serde_json::Map<String, serde_json::Value> = sources
        .iter()
        .map(|(name, path)| ((*name).to_string(), json!(path)))
        .collect();
    let config = json!({
        "source-containers": containers,
        "sources": sources,
    });

    let path = dir.join("config.json");
    create_file(&path, &config.to_string());
    path
}

fn titles(feedback: &Feedback) -> Vec<&str> {
    feedback.items.iter().map(|i| i.title.as_str()).collect()
}

fn query(
    config: &Path,
    storage: &mut dyn Storage,
    git: &CountingGit,
    raw: &str,
) -> Feedback {
    let runner = RecordingRunner::default();
    Dispatcher::new(config, storage, git, &runner)
        .handle_query(raw)
        .expect("query should succeed")
}

#[test]
fn test_empty_config_offers_to_open_config() {
    let temp_dir = create_test_directory();
    let config = temp_dir.path().join("config.json");
    create_file(&config, "{}");

    let mut storage = MemoryStorage::new();
    let git = CountingGit::default();
    let runner = RecordingRunner::default();
    let mut dispatcher = Dispatcher::new(&config, &mut storage, &git, &runner);

    let feedback = dispatcher.handle_query("").unwrap();
    assert_eq!(titles(&feedback), vec![NOT_CONFIGURED_TITLE]);

    let item = &feedback.items[0];
    assert!(item.valid);
    assert_eq!(item.icon.as_ref().unwrap().path, INFO_ICON);

    dispatcher.execute(item.arg.as_deref().unwrap()).unwrap();
    assert_eq!(runner.launches(), vec![Launch::open_path(&config)]);
    assert_eq!(git.calls(), 0);
}

#[test]
fn test_missing_config_is_treated_as_empty() {
    let temp_dir = create_test_directory();
    let config = temp_dir.path().join("absent.json");

    let mut storage = MemoryStorage::new();
    let feedback = query(&config, &mut storage, &CountingGit::default(), "anything");

    assert_eq!(titles(&feedback), vec![NOT_CONFIGURED_TITLE]);
}

#[test]
fn test_malformed_config_is_reported() {
    let temp_dir = create_test_directory();
    let config = temp_dir.path().join("config.json");
    create_file(&config, "{ \"source-containers\": [");

    let mut storage = MemoryStorage::new();
    let feedback = query(&config, &mut storage, &CountingGit::default(), "");

    assert_eq!(titles(&feedback), vec![BAD_CONFIG_TITLE]);
    let item = &feedback.items[0];
    assert!(item.valid);
    assert!(item.subtitle.as_deref().unwrap().contains("config.json"));
    assert!(item.arg.as_deref().unwrap().contains("Open Config File"));
}

#[test]
fn test_lists_every_subdirectory_and_named_source() {
    let temp_dir = create_test_directory();
    let container = create_dir(&temp_dir.path().join("src"));
    for name in ["charlie", "alpha", "bravo"] {
        create_dir(&container.join(name));
    }
    create_file(&container.join("README.md"), "not a project");
    let notes = create_dir(&temp_dir.path().join("elsewhere").join("notes"));
    let config = write_config(temp_dir.path(), &[&container], &[("my-notes", &notes)]);

    let mut storage = MemoryStorage::new();
    let feedback = query(&config, &mut storage, &CountingGit::default(), "");

    assert_eq!(
        titles(&feedback),
        vec!["alpha", "bravo", "charlie", "my-notes"]
    );
    let last = &feedback.items[3];
    assert_eq!(last.subtitle.as_deref(), Some(notes.display().to_string().as_str()));
    assert_eq!(last.autocomplete.as_deref(), Some("my-notes ➤ "));
    assert!(!last.valid);
}

#[test]
fn test_query_matches_case_insensitively_and_with_spaces() {
    let temp_dir = create_test_directory();
    let container = create_dir(&temp_dir.path().join("src"));
    create_dir(&container.join("Payment-Service"));
    create_dir(&container.join("web"));
    let config = write_config(temp_dir.path(), &[&container], &[]);

    let mut storage = MemoryStorage::new();
    let git = CountingGit::default();

    assert_eq!(
        titles(&query(&config, &mut storage, &git, "payment")),
        vec!["Payment-Service"]
    );
    assert_eq!(
        titles(&query(&config, &mut storage, &git, "PAYMENT SERVICE")),
        vec!["Payment-Service"]
    );
    assert!(query(&config, &mut storage, &git, "mobile").items.is_empty());
}

#[test]
fn test_project_type_drives_icon() {
    let temp_dir = create_test_directory();
    let container = create_dir(&temp_dir.path().join("src"));
    create_file(&container.join("both").join("pom.xml"), "<project/>");
    create_file(&container.join("both").join("package.json"), "{}");
    create_file(&container.join("node").join("package.json"), "{}");
    create_dir(&container.join("plain"));
    let config = write_config(temp_dir.path(), &[&container], &[]);

    let mut storage = MemoryStorage::new();
    let feedback = query(&config, &mut storage, &CountingGit::default(), "");

    let icons: Vec<Option<&str>> = feedback
        .items
        .iter()
        .map(|i| i.icon.as_ref().map(|icon| icon.path.as_str()))
        .collect();
    assert_eq!(
        icons,
        vec![Some("icons/java.png"), Some("icons/nodejs.png"), None]
    );
}

#[test]
fn test_plain_project_actions() {
    let temp_dir = create_test_directory();
    let container = create_dir(&temp_dir.path().join("src"));
    let demo = create_dir(&container.join("demo"));
    let config = write_config(temp_dir.path(), &[&container], &[]);

    let mut storage = MemoryStorage::new();
    let git = CountingGit::default();

    let listing = query(&config, &mut storage, &git, "demo");
    assert_eq!(titles(&listing), vec!["demo"]);
    assert!(listing.items[0].icon.is_none());

    let actions = query(&config, &mut storage, &git, "demo ➤ ");
    assert_eq!(
        titles(&actions),
        vec!["Open in Finder", "Open in Iterm", "Open in Sublime"]
    );
    for item in &actions.items {
        assert!(item.valid);
        assert_eq!(item.subtitle.as_deref(), Some(demo.display().to_string().as_str()));
    }
}

#[test]
fn test_java_project_with_remote_shows_every_action() {
    let temp_dir = create_test_directory();
    let container = create_dir(&temp_dir.path().join("src"));
    create_file(&container.join("api").join("pom.xml"), "<project/>");
    let config = write_config(temp_dir.path(), &[&container], &[]);

    let mut storage = MemoryStorage::new();
    let git = CountingGit::github();
    query(&config, &mut storage, &git, "api");

    let actions = query(&config, &mut storage, &git, "api ➤ ");
    assert_eq!(
        titles(&actions),
        vec![
            "Open in Finder",
            "Open in Iterm",
            "Open in Sublime",
            "Open in IntelliJ IDEA",
            "Open in Source Tree",
            "Open Repo Link",
            "Create Pull Request",
            "Open Pull Requests",
        ]
    );

    let create_pr = &actions.items[6];
    assert_eq!(
        create_pr.subtitle.as_deref(),
        Some("https://github.com/acme/api/compare/feature?expand=1")
    );
    assert_eq!(
        create_pr.icon.as_ref().unwrap().path,
        HostingServer::GitHub.icon_path()
    );
}

#[test]
fn test_action_shortcut_and_empty_filter() {
    let temp_dir = create_test_directory();
    let container = create_dir(&temp_dir.path().join("src"));
    create_dir(&container.join("api"));
    let config = write_config(temp_dir.path(), &[&container], &[]);

    let mut storage = MemoryStorage::new();
    let git = CountingGit::github();
    query(&config, &mut storage, &git, "");

    assert_eq!(
        titles(&query(&config, &mut storage, &git, "api ➤ prs")),
        vec!["Open Pull Requests"]
    );
    assert!(query(&config, &mut storage, &git, "api ➤ xyz").items.is_empty());
}

#[test]
fn test_metadata_is_resolved_once_per_project() {
    let temp_dir = create_test_directory();
    let container = create_dir(&temp_dir.path().join("src"));
    create_dir(&container.join("api"));
    create_dir(&container.join("web"));
    let config = write_config(temp_dir.path(), &[&container], &[]);

    let mut storage = MemoryStorage::new();
    let git = CountingGit::github();

    query(&config, &mut storage, &git, "");
    assert_eq!(git.calls(), 2);

    query(&config, &mut storage, &git, "");
    query(&config, &mut storage, &git, "web");
    assert_eq!(git.calls(), 2);
}

#[test]
fn test_cache_survives_across_invocations() {
    let temp_dir = create_test_directory();
    let container = create_dir(&temp_dir.path().join("src"));
    create_dir(&container.join("api"));
    let config = write_config(temp_dir.path(), &[&container], &[]);
    let storage_path = temp_dir.path().join("cache").join("storage.json");
    let git = CountingGit::github();

    for _ in 0..2 {
        let mut storage = JsonFileStorage::open(&storage_path);
        query(&config, &mut storage, &git, "");
    }

    assert!(storage_path.exists());
    assert_eq!(git.calls(), 1);

    let mut storage = JsonFileStorage::open(&storage_path);
    let actions = query(&config, &mut storage, &git, "api ➤ repo");
    assert_eq!(titles(&actions), vec!["Open Repo Link"]);
}

#[test]
fn test_shared_names_are_selected_by_path() {
    let temp_dir = create_test_directory();
    let container = create_dir(&temp_dir.path().join("work"));
    let work_api = create_dir(&container.join("api"));
    let oss_api = create_dir(&temp_dir.path().join("oss").join("api"));
    let config = write_config(temp_dir.path(), &[&container], &[("api", &oss_api)]);

    let mut storage = MemoryStorage::new();
    let git = CountingGit::default();
    let runner = RecordingRunner::default();
    let mut dispatcher = Dispatcher::new(&config, &mut storage, &git, &runner);

    let listing = dispatcher.handle_query("api").unwrap();
    assert_eq!(titles(&listing), vec!["api", "api"]);
    assert_eq!(
        listing.items[0].autocomplete,
        Some(format!("{} ➤ ", work_api.display()))
    );
    assert_eq!(
        listing.items[1].autocomplete,
        Some(format!("{} ➤ ", oss_api.display()))
    );

    let actions = dispatcher
        .handle_query(&format!("{} ➤ finder", oss_api.display()))
        .unwrap();
    assert_eq!(titles(&actions), vec!["Open in Finder"]);

    dispatcher
        .execute(actions.items[0].arg.as_deref().unwrap())
        .unwrap();
    assert_eq!(runner.launches(), vec![Launch::open_path(&oss_api)]);
}

#[test]
fn test_execute_git_action_opens_fresh_link() {
    let temp_dir = create_test_directory();
    let container = create_dir(&temp_dir.path().join("src"));
    create_dir(&container.join("api"));
    let config = write_config(temp_dir.path(), &[&container], &[]);

    let mut storage = MemoryStorage::new();
    let git = CountingGit::github();
    let runner = RecordingRunner::default();
    let mut dispatcher = Dispatcher::new(&config, &mut storage, &git, &runner);

    dispatcher.handle_query("api").unwrap();
    let actions = dispatcher.handle_query("api ➤ cpr").unwrap();
    let calls_before = git.calls();
    dispatcher
        .execute(actions.items[0].arg.as_deref().unwrap())
        .unwrap();

    assert_eq!(git.calls(), calls_before + 1);
    assert_eq!(
        runner.launches(),
        vec![Launch::open_url(
            "https://github.com/acme/api/compare/feature?expand=1"
        )]
    );
}

#[test]
fn test_unknown_action_does_nothing() {
    let temp_dir = create_test_directory();
    let config = write_config(temp_dir.path(), &[], &[]);

    let mut storage = MemoryStorage::new();
    let git = CountingGit::default();
    let runner = RecordingRunner::default();
    let dispatcher = Dispatcher::new(&config, &mut storage, &git, &runner);

    dispatcher
        .execute(r#"{"action":"Launch Rockets","name":"api","path":"/tmp/api"}"#)
        .unwrap();
    assert!(runner.launches().is_empty());

    assert!(dispatcher.execute("not json").is_err());
    assert!(runner.launches().is_empty());
}

#[test]
fn test_unknown_selection_falls_back_to_listing() {
    let temp_dir = create_test_directory();
    let container = create_dir(&temp_dir.path().join("src"));
    create_dir(&container.join("api"));
    let config = write_config(temp_dir.path(), &[&container], &[]);

    let mut storage = MemoryStorage::new();
    let feedback = query(&config, &mut storage, &CountingGit::default(), "api ➤ ");

    assert_eq!(titles(&feedback), vec!["api"]);
}

#[test]
fn test_named_sources_only() {
    let temp_dir = create_test_directory();
    let demo = create_dir(&temp_dir.path().join("demo"));
    let config = write_config(temp_dir.path(), &[], &[("demo", &demo)]);

    let mut storage = MemoryStorage::new();
    let git = CountingGit::default();

    let listing = query(&config, &mut storage, &git, "");
    assert_eq!(titles(&listing), vec!["demo"]);
    let item = &listing.items[0];
    assert!(item.icon.is_none());
    assert_eq!(item.subtitle.as_deref(), Some(demo.display().to_string().as_str()));
    assert_eq!(item.autocomplete.as_deref(), Some("demo ➤ "));

    let actions = query(&config, &mut storage, &git, "demo ➤ ");
    assert_eq!(
        titles(&actions),
        vec!["Open in Finder", "Open in Iterm", "Open in Sublime"]
    );
}

#[test]
fn test_named_source_inside_container_keeps_its_name() {
    let temp_dir = create_test_directory();
    let container = create_dir(&temp_dir.path().join("src"));
    let web = create_dir(&container.join("web"));
    create_dir(&container.join("api"));
    let config = write_config(temp_dir.path(), &[&container], &[("website", &web)]);

    let mut storage = MemoryStorage::new();
    let git = CountingGit::default();

    assert_eq!(
        titles(&query(&config, &mut storage, &git, "")),
        vec!["api", "website"]
    );

    let found = query(&config, &mut storage, &git, "website");
    assert_eq!(titles(&found), vec!["website"]);
    assert_eq!(
        found.items[0].subtitle.as_deref(),
        Some(web.display().to_string().as_str())
    );
}

#[test]
fn test_unreadable_config_is_reported() {
    let temp_dir = create_test_directory();
    let config = create_dir(&temp_dir.path().join("config.json"));

    let mut storage = MemoryStorage::new();
    let feedback = query(&config, &mut storage, &CountingGit::default(), "");

    assert_eq!(titles(&feedback), vec![UNREADABLE_CONFIG_TITLE]);
    assert!(feedback.items[0].valid);
}

#[test]
fn test_listing_writes_storage_once() {
    let temp_dir = create_test_directory();
    let container = create_dir(&temp_dir.path().join("src"));
    create_dir(&container.join("api"));
    create_dir(&container.join("web"));
    let config = write_config(temp_dir.path(), &[&container], &[]);

    let mut storage = CountingStorage::default();
    let git = CountingGit::github();

    query(&config, &mut storage, &git, "");
    assert_eq!(storage.writes, 1);
    assert!(storage.get(PROJECTS_INFO_KEY).is_some());
    assert!(storage.get(MENU_ITEMS_KEY).is_some());

    query(&config, &mut storage, &git, "api");
    assert_eq!(storage.writes, 2);
}
