//! Settings handling and conversion of raw command trees into the typed model

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::commands::command::{Action, CommandObject, Step};
use crate::commands::folder::{Folder, Node, TopLevelCommands};
use crate::commands::status_bar::{Alignment, StatusBar};

/// Errors that can occur while loading settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Settings file not found: {0}")]
    ConfigNotFound(PathBuf),
    #[error("Unable to parse YAML settings file {path}: {source}")]
    Yaml {
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("Unable to parse JSON settings file {path}: {source}")]
    Json {
        source: serde_json::Error,
        path: PathBuf,
    },
    #[error("Unable to parse settings: {0}")]
    Settings(#[source] serde_json::Error),
    #[error("Invalid glob pattern `{pattern}`: {source}")]
    Glob {
        source: glob::PatternError,
        pattern: String,
    },
    #[error("Invalid entry '{label}': {reason}")]
    InvalidEntry { label: String, reason: String },
    #[error("Invalid settings: {0}")]
    Validation(String),
}

impl ConfigError {
    fn invalid(label: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidEntry {
            label: label.to_string(),
            reason: reason.into(),
        }
    }
}

/// Compile a glob pattern, keeping the pattern text in the error.
///
/// # Errors
///
/// Returns `ConfigError::Glob` if the pattern is malformed.
pub fn parse_glob(pattern: &str) -> Result<glob::Pattern, ConfigError> {
    glob::Pattern::new(pattern).map_err(|e| ConfigError::Glob {
        source: e,
        pattern: pattern.to_string(),
    })
}

/// A sequence step as written in settings
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(untagged)]
pub enum ConfigStep {
    Id(String),
    Object(Box<ConfigCommandObject>),
}

/// Union-shaped entry as written in settings: a leaf (`command` or
/// `sequence`) or a folder (`nestedItems`)
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConfigCommandObject {
    pub command: Option<String>,
    pub args: Option<Value>,
    pub delay: Option<u64>,
    pub repeat: Option<u32>,
    pub sequence: Option<Vec<ConfigStep>>,
    pub when: Option<String>,
    pub hidden: Option<bool>,
    pub status_bar: Option<StatusBar>,
    pub icon: Option<String>,
    pub icon_color: Option<String>,
    pub markdown_tooltip: Option<String>,
    pub disable_tooltip: Option<bool>,
    pub workspace: Option<String>,
    pub nested_items: Option<IndexMap<String, Value>>,
}

impl ConfigCommandObject {
    fn into_leaf(self, label: &str) -> Result<CommandObject, ConfigError> {
        if self.nested_items.is_some() {
            return Err(ConfigError::invalid(label, "folders cannot contain folders"));
        }
        let action = match (self.sequence, self.command) {
            (Some(sequence), command) => {
                if command.is_some() {
                    debug!("'{label}' has both `sequence` and `command`, using the sequence");
                }
                let steps = sequence
                    .into_iter()
                    .map(|step| step.into_step(label))
                    .collect::<Result<Vec<Step>, ConfigError>>()?;
                Action::Sequence(steps)
            }
            (None, Some(command)) if !command.trim().is_empty() => Action::Command {
                command,
                args: self.args,
            },
            (None, _) => {
                return Err(ConfigError::invalid(
                    label,
                    "expected `command`, `sequence` or `nestedItems`",
                ));
            }
        };
        if self.repeat == Some(0) {
            return Err(ConfigError::invalid(label, "`repeat` must be at least 1"));
        }
        Ok(CommandObject {
            action,
            delay: self.delay,
            repeat: self.repeat.unwrap_or(1),
            when: self.when,
            hidden: self.hidden.unwrap_or(false),
            status_bar: self.status_bar,
            icon: self.icon,
            icon_color: self.icon_color,
            markdown_tooltip: self.markdown_tooltip,
            disable_tooltip: self.disable_tooltip.unwrap_or(false),
            workspace: self.workspace,
        })
    }
}

impl ConfigStep {
    fn into_step(self, label: &str) -> Result<Step, ConfigError> {
        match self {
            ConfigStep::Id(id) if id.trim().is_empty() => {
                Err(ConfigError::invalid(label, "empty command id in sequence"))
            }
            ConfigStep::Id(id) => Ok(Step::Id(id)),
            ConfigStep::Object(object) => object.into_leaf(label).map(Step::Object),
        }
    }
}

fn parse_leaf(label: &str, value: &Value) -> Result<CommandObject, ConfigError> {
    if let Value::String(command) = value {
        return ConfigCommandObject {
            command: Some(command.clone()),
            ..Default::default()
        }
        .into_leaf(label);
    }
    let raw: ConfigCommandObject = serde_json::from_value(value.clone())
        .map_err(|e| ConfigError::invalid(label, e.to_string()))?;
    raw.into_leaf(label)
}

/// Parse one top-level entry into a folder or a leaf.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEntry` when the entry has no recognizable
/// shape. Broken children of a folder are skipped, not reported.
pub fn parse_node(label: &str, value: &Value) -> Result<Node, ConfigError> {
    if let Value::String(_) = value {
        return parse_leaf(label, value).map(Node::Leaf);
    }
    let raw: ConfigCommandObject = serde_json::from_value(value.clone())
        .map_err(|e| ConfigError::invalid(label, e.to_string()))?;
    let Some(nested) = raw.nested_items else {
        return raw.into_leaf(label).map(Node::Leaf);
    };

    let mut nested_items = IndexMap::new();
    for (child_label, child) in &nested {
        match parse_leaf(child_label, child) {
            Ok(leaf) => {
                nested_items.insert(child_label.clone(), leaf);
            }
            Err(e) => warn!("Skipping '{child_label}' in folder '{label}': {e}"),
        }
    }
    Ok(Node::Folder(Folder {
        nested_items,
        status_bar: raw.status_bar,
        hidden: raw.hidden.unwrap_or(false),
        when: raw.when,
        icon: raw.icon,
        workspace: raw.workspace,
    }))
}

/// Convert a raw tree, skipping (and logging) entries that fail to parse.
#[must_use]
pub fn parse_commands(raw: &IndexMap<String, Value>) -> TopLevelCommands {
    let mut commands = TopLevelCommands::new();
    for (label, value) in raw {
        match parse_node(label, value) {
            Ok(node) => {
                commands.insert(label.clone(), node);
            }
            Err(e) => warn!("Skipping command entry: {e}"),
        }
    }
    commands
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusBarDefaultText {
    Pick,
    #[default]
    Same,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ToggleSettings {
    pub show_notification: bool,
}

fn default_status_bar_symbol() -> String {
    "💠".to_string()
}

fn default_workspace_symbol() -> String {
    "🎯".to_string()
}

fn default_document_links_pattern() -> String {
    "**/*.md".to_string()
}

fn default_true() -> bool {
    true
}

/// Every setting the extension reads from the host configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Global command tree, kept raw until conversion
    #[serde(default)]
    pub commands: IndexMap<String, Value>,
    /// Tree from the workspace scope only
    #[serde(default)]
    pub workspace_commands: IndexMap<String, Value>,
    /// Short command ids mapped to full ones
    #[serde(default)]
    pub alias: HashMap<String, String>,
    #[serde(default)]
    pub show_keybindings: bool,
    #[serde(default)]
    pub tree_view_collapse_folders: bool,
    #[serde(default = "default_status_bar_symbol")]
    pub tree_view_status_bar_visible_symbol: String,
    #[serde(default = "default_workspace_symbol")]
    pub tree_view_workspace_command_symbol: String,
    #[serde(default)]
    pub quick_pick_include_all_commands: bool,
    #[serde(default)]
    pub populate_command_palette: bool,
    #[serde(default = "default_true")]
    pub variable_substitution_enabled: bool,
    #[serde(default)]
    pub document_links_enabled: bool,
    #[serde(default = "default_document_links_pattern")]
    pub document_links_pattern: String,
    #[serde(default)]
    pub status_bar_default_text: StatusBarDefaultText,
    #[serde(default)]
    pub status_bar_default_position: Alignment,
    #[serde(default)]
    pub toggle_settings: ToggleSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            commands: IndexMap::new(),
            workspace_commands: IndexMap::new(),
            alias: HashMap::new(),
            show_keybindings: false,
            tree_view_collapse_folders: false,
            tree_view_status_bar_visible_symbol: default_status_bar_symbol(),
            tree_view_workspace_command_symbol: default_workspace_symbol(),
            quick_pick_include_all_commands: false,
            populate_command_palette: false,
            variable_substitution_enabled: true,
            document_links_enabled: false,
            document_links_pattern: default_document_links_pattern(),
            status_bar_default_text: StatusBarDefaultText::default(),
            status_bar_default_position: Alignment::default(),
            toggle_settings: ToggleSettings::default(),
        }
    }
}

impl Settings {
    /// Loads and parses a settings file, JSON or YAML by extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if the file cannot be read, or
    /// `ConfigError::Yaml`/`ConfigError::Json` if parsing fails.
    pub fn from_file(file: &Path) -> Result<Settings, ConfigError> {
        let contents = std::fs::read_to_string(file)
            .map_err(|_| ConfigError::ConfigNotFound(file.to_path_buf()))?;
        let settings: Settings = if file.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&contents).map_err(|e| ConfigError::Json {
                source: e,
                path: file.to_path_buf(),
            })?
        } else {
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Yaml {
                source: e,
                path: file.to_path_buf(),
            })?
        };
        Ok(settings)
    }

    /// Builds settings from the value the host configuration hands over.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Settings` if the value has the wrong shape.
    pub fn from_value(value: Value) -> Result<Settings, ConfigError> {
        serde_json::from_value(value).map_err(ConfigError::Settings)
    }

    /// Check scalar settings that would otherwise fail later.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Glob` for a malformed `documentLinksPattern`, or
    /// `ConfigError::Validation` for an alias with an empty side.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_glob(&self.document_links_pattern)?;
        for (short, full) in &self.alias {
            if short.trim().is_empty() || full.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Alias '{short}' -> '{full}' has an empty side"
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn global_commands(&self) -> TopLevelCommands {
        parse_commands(&self.commands)
    }

    #[must_use]
    pub fn workspace_commands(&self) -> TopLevelCommands {
        parse_commands(&self.workspace_commands)
    }
}
