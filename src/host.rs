//! Seams to the host editor
//!
//! The core never talks to UI or editor internals directly. Everything it
//! needs goes through [`Host`], and everything it produces for display goes
//! through [`Presenter`].

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::commands::flatten::FlatCommands;
use crate::status_bar_items::StatusBarItem;
use crate::tree_view::TreeItem;
use crate::when::ContextValue;

/// Failure reported by the host's command-invocation primitive
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HostError(pub String);

impl From<&str> for HostError {
    fn from(message: &str) -> Self {
        HostError(message.to_string())
    }
}

/// What the editor looks like at one instant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorState {
    pub active_file: Option<PathBuf>,
    pub language_id: Option<String>,
    pub selected_text: Option<String>,
    /// Zero-based line of the primary cursor
    pub line_number: Option<usize>,
    pub current_line_text: Option<String>,
    pub editor_focus: bool,
    pub workspace_folders: Vec<PathBuf>,
    /// Extra context keys set by the host or other extensions
    pub context: HashMap<String, ContextValue>,
}

impl EditorState {
    /// Workspace folder containing the active file, else the first one.
    #[must_use]
    pub fn workspace_folder(&self) -> Option<&PathBuf> {
        self.active_file
            .as_ref()
            .and_then(|file| {
                self.workspace_folders
                    .iter()
                    .find(|folder| file.starts_with(folder))
            })
            .or_else(|| self.workspace_folders.first())
    }
}

#[async_trait]
pub trait Host: Send + Sync {
    /// Run a host command. Resolves with the command's result or rejects
    /// with an implementation-defined error.
    async fn execute(&self, command: &str, args: Option<Value>) -> Result<Value, HostError>;

    /// Snapshot of the editor, taken when a step is about to run.
    fn editor_state(&self) -> EditorState;

    /// Show an error message to the user.
    fn show_error(&self, message: &str);

    fn show_info(&self, _message: &str) {}

    async fn write_clipboard(&self, text: &str) -> Result<(), HostError>;

    /// Set a context key usable in the host's own `when` clauses.
    async fn set_context(&self, key: &str, value: Value) -> Result<(), HostError> {
        self.execute("setContext", Some(Value::Array(vec![key.into(), value])))
            .await
            .map(|_| ())
    }
}

/// UI surfaces re-rendered after every model rebuild. All methods default to
/// doing nothing so a host only implements the surfaces it has.
pub trait Presenter: Send + Sync {
    fn update_tree(&self, _items: &[TreeItem]) {}

    fn update_status_bar(&self, _items: &[StatusBarItem]) {}

    /// Labels to register as command palette entries.
    fn update_command_palette(&self, _labels: &[String]) {}

    fn update_document_links(&self, _enabled: bool, _pattern: &str) {}

    /// Flattened model, for launchers that keep their own copy.
    fn update_commands(&self, _commands: &FlatCommands) {}
}

/// Presenter for hosts without UI surfaces
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPresenter;

impl Presenter for NoPresenter {}
