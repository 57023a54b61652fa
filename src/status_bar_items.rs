//! Status bar items derived from the visible projection of the tree

use std::path::Path;

use log::warn;

use crate::commands::command::Runnable;
use crate::commands::flatten::{NodeRef, collect_visible};
use crate::commands::folder::TopLevelCommands;
use crate::commands::status_bar::{Alignment, BackgroundColor, StatusBar};
use crate::config_file::{Settings, parse_glob};
use crate::host::EditorState;
use crate::when::{self, EditorContext};

/// What clicking the item does
#[derive(Debug, Clone, PartialEq)]
pub enum StatusBarAction {
    Run(Runnable),
    /// Open the launcher restricted to the folder under this key
    PickFolder(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusBarItem {
    pub key: String,
    pub text: String,
    pub name: Option<String>,
    pub alignment: Alignment,
    pub priority: Option<i32>,
    pub tooltip: Option<String>,
    pub markdown_tooltip: Option<String>,
    pub color: Option<String>,
    pub background_color: Option<BackgroundColor>,
    pub active_editor_glob: Option<glob::Pattern>,
    pub active_editor_language: Option<String>,
    pub action: StatusBarAction,
}

fn item(
    key: &str,
    status_bar: &StatusBar,
    action: StatusBarAction,
    settings: &Settings,
) -> Option<StatusBarItem> {
    let active_editor_glob = match status_bar.active_editor_glob.as_deref() {
        Some(pattern) => match parse_glob(pattern) {
            Ok(glob) => Some(glob),
            Err(e) => {
                warn!("Status bar item '{key}' dropped: {e}");
                return None;
            }
        },
        None => None,
    };
    Some(StatusBarItem {
        key: key.to_string(),
        text: status_bar.text.clone(),
        name: status_bar.name.clone(),
        alignment: status_bar
            .alignment
            .unwrap_or(settings.status_bar_default_position),
        priority: status_bar.priority,
        tooltip: status_bar.tooltip.clone(),
        markdown_tooltip: status_bar.markdown_tooltip.clone(),
        color: status_bar.color.clone(),
        background_color: status_bar.background_color,
        active_editor_glob,
        active_editor_language: status_bar.active_editor_language.clone(),
        action,
    })
}

/// One item per visible node that carries a non-hidden `statusBar`.
#[must_use]
pub fn build(
    commands: &TopLevelCommands,
    settings: &Settings,
    context: &EditorContext,
) -> Vec<StatusBarItem> {
    collect_visible(commands, |condition| when::evaluate(condition, context))
        .into_iter()
        .filter_map(|visible| {
            let (status_bar, action) = match visible.node {
                NodeRef::Leaf(leaf) => (
                    leaf.status_bar.as_ref()?,
                    StatusBarAction::Run(leaf.clone().into()),
                ),
                NodeRef::Folder(folder) => (
                    folder.status_bar.as_ref()?,
                    StatusBarAction::PickFolder(visible.label.to_string()),
                ),
            };
            if status_bar.hidden {
                return None;
            }
            item(visible.label, status_bar, action, settings)
        })
        .collect()
}

/// Whether `item` applies to the active editor described by `state`.
#[must_use]
pub fn is_visible_for_editor(item: &StatusBarItem, state: &EditorState) -> bool {
    if let Some(glob) = &item.active_editor_glob {
        let matches = state
            .active_file
            .as_deref()
            .is_some_and(|file: &Path| glob.matches_path(file));
        if !matches {
            return false;
        }
    }
    if let Some(language) = &item.active_editor_language {
        return state.language_id.as_deref() == Some(language.as_str());
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::command::CommandObject;
    use crate::commands::folder::Folder;
    use indexmap::IndexMap;
    use std::path::PathBuf;

    fn status(text: &str) -> StatusBar {
        StatusBar {
            text: text.to_string(),
            ..Default::default()
        }
    }

    fn tree() -> TopLevelCommands {
        let mut tree = TopLevelCommands::new();
        let mut save = CommandObject::command("workbench.action.files.saveAll");
        save.status_bar = Some(status("$(save)"));
        tree.insert("Save".to_string(), save.into());

        let mut gated = CommandObject::command("x").with_when("editorLangId == rust");
        gated.status_bar = Some(status("rust only"));
        tree.insert("Gated".to_string(), gated.into());

        let mut hidden_bar = CommandObject::command("y");
        hidden_bar.status_bar = Some(StatusBar {
            hidden: true,
            ..status("invisible")
        });
        tree.insert("Hidden bar".to_string(), hidden_bar.into());

        let mut nested = IndexMap::new();
        let mut child = CommandObject::command("git.commit");
        child.status_bar = Some(status("commit"));
        nested.insert("Commit".to_string(), child);
        tree.insert(
            "Git".to_string(),
            Folder {
                nested_items: nested,
                status_bar: Some(StatusBar {
                    alignment: Some(Alignment::Right),
                    ..status("git")
                }),
                ..Default::default()
            }
            .into(),
        );
        tree
    }

    #[test]
    fn test_build_filters_when_and_hidden() {
        let items = build(&tree(), &Settings::default(), &EditorContext::new());
        let texts: Vec<&str> = items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["$(save)", "git", "commit"]);
        assert_eq!(items[1].action, StatusBarAction::PickFolder("Git".to_string()));
        assert_eq!(items[1].alignment, Alignment::Right);
        assert_eq!(items[0].alignment, Alignment::Left);
    }

    #[test]
    fn test_default_position_setting() {
        let settings = Settings {
            status_bar_default_position: Alignment::Right,
            ..Default::default()
        };
        let context = EditorContext::new().with("editorLangId", "rust");
        let items = build(&tree(), &settings, &context);
        assert_eq!(items.len(), 4);
        assert!(items.iter().all(|i| i.alignment == Alignment::Right));
    }

    #[test]
    fn test_editor_filters() {
        let mut tree = TopLevelCommands::new();
        let mut leaf = CommandObject::command("md");
        leaf.status_bar = Some(StatusBar {
            active_editor_glob: Some("**/*.md".to_string()),
            active_editor_language: Some("markdown".to_string()),
            ..status("md")
        });
        tree.insert("Md".to_string(), leaf.into());
        let items = build(&tree, &Settings::default(), &EditorContext::new());
        let item = &items[0];

        let mut state = EditorState {
            active_file: Some(PathBuf::from("/notes/todo.md")),
            language_id: Some("markdown".to_string()),
            ..Default::default()
        };
        assert!(is_visible_for_editor(item, &state));
        state.language_id = Some("plaintext".to_string());
        assert!(!is_visible_for_editor(item, &state));
        state.active_file = Some(PathBuf::from("/src/main.rs"));
        state.language_id = Some("markdown".to_string());
        assert!(!is_visible_for_editor(item, &state));
        assert!(!is_visible_for_editor(item, &EditorState::default()));
    }

    #[test]
    fn test_invalid_glob_drops_item() {
        let mut tree = TopLevelCommands::new();
        let mut leaf = CommandObject::command("x");
        leaf.status_bar = Some(StatusBar {
            active_editor_glob: Some("[".to_string()),
            ..status("x")
        });
        tree.insert("X".to_string(), leaf.into());
        assert!(build(&tree, &Settings::default(), &EditorContext::new()).is_empty());
    }
}
