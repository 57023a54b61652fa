//! Core of a user-commands editor extension
//!
//! Users define named commands, sequences and folders in settings. This crate
//! merges the global and workspace trees, derives the presentation models
//! (tree view, status bar, launcher, document links) from the merged tree,
//! evaluates `when` conditions, and runs commands through a host editor that
//! is reached only via the [`host::Host`] and [`host::Presenter`] traits.

use std::path::Path;

use log::debug;

use crate::config_file::{ConfigError, Settings};

pub mod commands;
pub mod config_file;
pub mod document_links;
pub mod extension;
pub mod host;
pub mod keybindings;
pub mod log_state;
pub mod logger;
pub mod palette;
pub mod quick_pick;
pub mod runner;
pub mod status_bar_items;
pub mod tree_view;
pub mod variables;
pub mod when;

/// Load and validate settings from a JSON or YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file is not found, cannot be parsed, or
/// contains invalid scalar settings.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
    }
    debug!("Loading settings from {}", path.display());
    let settings = Settings::from_file(path)?;
    settings.validate()?;
    Ok(settings)
}
