//! Result items returned to the launcher host.
//!
//! The host reads a single JSON document from stdout, shaped as
//! `{"items": [...]}`. Each item describes one row of the result list: what
//! to show, whether pressing Enter executes it, and the argument passed back
//! to `source-launcher execute` when it does.

use serde::Serialize;

/// Separator between a selected project and the query over its actions.
///
/// Selecting a project autocompletes the query to `"<name> ➤ "`; the host
/// then sends the whole string back and the dispatcher splits it here.
pub const MENU_SEPARATOR: char = '➤';

/// System icon used for informational rows.
pub const INFO_ICON: &str =
    "/System/Library/CoreServices/CoreTypes.bundle/Contents/Resources/ToolbarInfo.icns";

/// Icon reference of an item.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Icon {
    /// Path relative to the workflow folder, or absolute
    pub path: String,
}

/// A single result row.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Item {
    /// Stable identity used by the host to learn ordering preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,

    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,

    /// Whether Enter executes the item with its `arg`
    pub valid: bool,

    /// Serialized action request passed back on execution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arg: Option<String>,

    /// Query text the host fills in when the item is tabbed into
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autocomplete: Option<String>,
}

impl Item {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    #[must_use]
    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    #[must_use]
    pub fn icon(mut self, path: impl Into<String>) -> Self {
        self.icon = Some(Icon { path: path.into() });
        self
    }

    /// Make the item executable with `arg`.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.arg = Some(arg.into());
        self.valid = true;
        self
    }

    /// Make the item open a sub-menu of actions instead of executing.
    #[must_use]
    pub fn sub_items(mut self, name: &str) -> Self {
        self.autocomplete = Some(format!("{name} {MENU_SEPARATOR} "));
        self.valid = false;
        self
    }
}

/// The complete response of one invocation.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Feedback {
    pub items: Vec<Item>,
}

impl Feedback {
    #[must_use]
    pub const fn new(items: Vec<Item>) -> Self {
        Self { items }
    }

    #[must_use]
    pub const fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// Serialize for the host.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
