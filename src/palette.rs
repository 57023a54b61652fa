//! Titles of every command-palette command, for the launcher's
//! "include all commands" mode
//!
//! Built-in titles come from a bundled JSON asset mapping command ids to
//! titles; extension titles are contributed by the host. The merged list is
//! loaded at most once per process.

use std::path::Path;

use indexmap::IndexMap;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::host::Host;

#[derive(Error, Debug)]
pub enum PaletteError {
    #[error("Unable to read {path}: {source}")]
    Io {
        source: std::io::Error,
        path: String,
    },
    #[error("Unable to parse {path}: {source}")]
    Json {
        source: serde_json::Error,
        path: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteCommand {
    pub command: String,
    pub title: String,
}

/// A command as contributed by an extension manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributedCommand {
    pub command: String,
    pub title: String,
    pub category: Option<String>,
}

impl From<&ContributedCommand> for PaletteCommand {
    fn from(contributed: &ContributedCommand) -> Self {
        let title = match &contributed.category {
            Some(category) => format!("{category}: {}", contributed.title),
            None => contributed.title.clone(),
        };
        PaletteCommand {
            command: contributed.command.clone(),
            title,
        }
    }
}

/// Read the bundled `{commandId: title}` map, keeping file order.
///
/// # Errors
///
/// Returns `PaletteError::Io` if the file cannot be read, or
/// `PaletteError::Json` if it is not a string-to-string object.
pub async fn load_builtin_commands(path: &Path) -> Result<Vec<PaletteCommand>, PaletteError> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PaletteError::Io {
            source: e,
            path: path.display().to_string(),
        })?;
    let titles: IndexMap<String, String> =
        serde_json::from_str(&contents).map_err(|e| PaletteError::Json {
            source: e,
            path: path.display().to_string(),
        })?;
    Ok(titles
        .into_iter()
        .map(|(command, title)| PaletteCommand { command, title })
        .collect())
}

/// Read-through cache, filled on first use and never invalidated
#[derive(Debug, Default)]
pub struct PaletteCache {
    commands: OnceCell<Vec<PaletteCommand>>,
}

impl PaletteCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every palette command: built-ins first, then contributed ones.
    ///
    /// A broken built-in asset is reported through `host` and contributes
    /// nothing; the contributed commands are still returned.
    pub async fn get_or_load(
        &self,
        host: &dyn Host,
        builtin_path: &Path,
        contributed: &[ContributedCommand],
    ) -> &[PaletteCommand] {
        self.commands
            .get_or_init(|| async {
                let mut commands = match load_builtin_commands(builtin_path).await {
                    Ok(commands) => commands,
                    Err(e) => {
                        error!("{e}");
                        host.show_error(&format!("Failed to get builtin commands: {e}"));
                        Vec::new()
                    }
                };
                commands.extend(contributed.iter().map(PaletteCommand::from));
                debug!("Cached {} palette commands", commands.len());
                commands
            })
            .await
    }

    /// Cached commands, if loaded.
    #[must_use]
    pub fn get(&self) -> Option<&[PaletteCommand]> {
        self.commands.get().map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_builtin_commands_keeps_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commandTitleMap.json");
        std::fs::write(
            &path,
            r#"{"workbench.action.files.saveAll": "Save All", "editor.action.formatDocument": "Format Document"}"#,
        )
        .unwrap();
        let commands = load_builtin_commands(&path).await.unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].command, "workbench.action.files.saveAll");
        assert_eq!(commands[1].title, "Format Document");
    }

    #[tokio::test]
    async fn test_load_builtin_commands_rejects_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commandTitleMap.json");
        std::fs::write(&path, "[1, 2").unwrap();
        assert!(matches!(
            load_builtin_commands(&path).await,
            Err(PaletteError::Json { .. })
        ));
    }

    #[test]
    fn test_contributed_title_includes_category() {
        let contributed = ContributedCommand {
            command: "git.commit".to_string(),
            title: "Commit".to_string(),
            category: Some("Git".to_string()),
        };
        assert_eq!(PaletteCommand::from(&contributed).title, "Git: Commit");
    }
}
