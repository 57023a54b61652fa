//! Launcher items: every runnable leaf one level deep, optionally followed by
//! every command-palette command

use std::sync::LazyLock;

use regex::Regex;

use crate::commands::command::{CommandObject, Runnable};
use crate::commands::flatten::flatten;
use crate::commands::folder::{Node, TopLevelCommands};
use crate::commands::workspace::display_label;
use crate::palette::PaletteCommand;

/// Appended to ids of commands that accept arguments
pub const ARGS_MARKER: &str = " ($(pass-filled) args)";

static LEADING_CODICON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\$\([a-z-]+\)\s").expect("codicon pattern is valid"));
static ARGS_CODICON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s\(\$\([a-z-]+\)\sargs\)").expect("args codicon pattern is valid")
});

/// Settings scope that owns an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsScope {
    Global,
    Workspace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickPickButton {
    /// Open the owning settings file at the entry's definition
    RevealInSettings(SettingsScope),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuickPickItem {
    pub label: String,
    pub description: Option<String>,
    pub detail: Option<String>,
    /// Key in the merged tree for user commands
    pub key: Option<String>,
    pub runnable: Option<Runnable>,
    pub buttons: Vec<QuickPickButton>,
}

fn user_item(key: &str, leaf: &CommandObject, parent: Option<&str>) -> QuickPickItem {
    let label = display_label(key, leaf.workspace.as_deref());
    let label = match &leaf.icon {
        Some(icon) => format!("$({icon}) {label}"),
        None => label.to_string(),
    };
    let scope = if leaf.workspace.is_some() {
        SettingsScope::Workspace
    } else {
        SettingsScope::Global
    };
    QuickPickItem {
        label,
        description: parent.map(|folder| format!("$(folder) {folder}")),
        detail: None,
        key: Some(key.to_string()),
        runnable: Some(leaf.clone().into()),
        buttons: vec![QuickPickButton::RevealInSettings(scope)],
    }
}

impl From<&PaletteCommand> for QuickPickItem {
    fn from(command: &PaletteCommand) -> Self {
        QuickPickItem {
            label: command.title.clone(),
            detail: Some(command.command.clone()),
            runnable: Some(Runnable::Object(Box::new(CommandObject::command(
                command.command.clone(),
            )))),
            ..Default::default()
        }
    }
}

/// Items for the launcher. `palette` commands, when given, follow the user
/// commands; callers pass them only for the unrestricted launcher.
#[must_use]
pub fn build(commands: &TopLevelCommands, palette: Option<&[PaletteCommand]>) -> Vec<QuickPickItem> {
    let flat = flatten(commands);
    let mut items: Vec<QuickPickItem> = flat
        .iter()
        .map(|(key, entry)| {
            let parent = entry
                .parent_folder
                .as_deref()
                .map(|folder| display_label(folder, entry.command.workspace.as_deref()));
            user_item(key, &entry.command, parent)
        })
        .collect();
    if let Some(palette) = palette {
        items.extend(palette.iter().map(QuickPickItem::from));
    }
    items
}

/// Children of the folder under `key`, as a tree of their own.
#[must_use]
pub fn folder_commands(commands: &TopLevelCommands, key: &str) -> Option<TopLevelCommands> {
    match commands.get(key)? {
        Node::Folder(folder) => Some(
            folder
                .nested_items
                .iter()
                .map(|(label, leaf)| (label.clone(), Node::Leaf(leaf.clone())))
                .collect(),
        ),
        Node::Leaf(_) => None,
    }
}

/// Strip the leading `$(icon) ` added for entries with an icon.
#[must_use]
pub fn remove_codicon_from_label(label: &str) -> String {
    LEADING_CODICON.replace(label, "").into_owned()
}

/// Strip the trailing args marker added by [`commands_to_quick_pick_items`].
#[must_use]
pub fn remove_args_codicon(label: &str) -> String {
    ARGS_CODICON.replace(label, "").into_owned()
}

/// Plain items for a list of command ids, marking those that take arguments.
#[must_use]
pub fn commands_to_quick_pick_items(
    ids: &[String],
    has_args: impl Fn(&str) -> bool,
) -> Vec<QuickPickItem> {
    ids.iter()
        .map(|id| QuickPickItem {
            label: if has_args(id) {
                format!("{id}{ARGS_MARKER}")
            } else {
                id.clone()
            },
            ..Default::default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::folder::Folder;
    use crate::commands::workspace::merge;
    use indexmap::IndexMap;

    fn tree() -> TopLevelCommands {
        let mut global = TopLevelCommands::new();
        let mut save = CommandObject::command("workbench.action.files.saveAll");
        save.icon = Some("save".to_string());
        global.insert("Save All".to_string(), save.into());
        let mut nested = IndexMap::new();
        nested.insert("Commit".to_string(), CommandObject::command("git.commit"));
        global.insert(
            "Git".to_string(),
            Folder {
                nested_items: nested,
                ..Default::default()
            }
            .into(),
        );
        let mut workspace = TopLevelCommands::new();
        workspace.insert("Build".to_string(), CommandObject::command("tasks.build").into());
        merge(&global, &workspace, Some("ws1"))
    }

    #[test]
    fn test_user_items() {
        let items = build(&tree(), None);
        let labels: Vec<&str> = items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["$(save) Save All", "Commit", "Build"]);
        assert_eq!(items[1].description.as_deref(), Some("$(folder) Git"));
        assert_eq!(items[2].key.as_deref(), Some("ws1::Build"));
        assert_eq!(
            items[2].buttons,
            vec![QuickPickButton::RevealInSettings(SettingsScope::Workspace)]
        );
        assert_eq!(
            items[0].buttons,
            vec![QuickPickButton::RevealInSettings(SettingsScope::Global)]
        );
    }

    #[test]
    fn test_palette_items_follow_user_items() {
        let palette = vec![PaletteCommand {
            command: "editor.action.formatDocument".to_string(),
            title: "Format Document".to_string(),
        }];
        let items = build(&tree(), Some(&palette));
        let last = items.last().unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(last.label, "Format Document");
        assert_eq!(last.detail.as_deref(), Some("editor.action.formatDocument"));
        assert!(last.buttons.is_empty());
    }

    #[test]
    fn test_folder_commands() {
        let tree = tree();
        let folder = folder_commands(&tree, "Git").unwrap();
        assert_eq!(folder.keys().collect::<Vec<_>>(), vec!["Commit"]);
        assert!(folder_commands(&tree, "Save All").is_none());
        assert!(folder_commands(&tree, "missing").is_none());
    }

    #[test]
    fn test_codicon_helpers() {
        assert_eq!(remove_codicon_from_label("$(save) Save All"), "Save All");
        assert_eq!(remove_codicon_from_label("Save All"), "Save All");
        let items = commands_to_quick_pick_items(
            &["a.withArgs".to_string(), "b.plain".to_string()],
            |id| id.ends_with("withArgs"),
        );
        assert_eq!(items[0].label, "a.withArgs ($(pass-filled) args)");
        assert_eq!(items[1].label, "b.plain");
        assert_eq!(remove_args_codicon(&items[0].label), "a.withArgs");
    }
}
