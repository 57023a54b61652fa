//! Tree view model: one item per visible top-level entry, folders carrying
//! their children

use crate::commands::command::{Action, CommandObject, Runnable};
use crate::commands::folder::{Node, TopLevelCommands};
use crate::commands::status_bar::StatusBar;
use crate::commands::workspace::display_label;
use crate::config_file::Settings;
use crate::keybindings::{Keybinding, keybinding_for};

#[derive(Debug, Clone, PartialEq)]
pub enum TreeItemKind {
    Folder {
        collapsed: bool,
        children: Vec<TreeItem>,
    },
    Command(Runnable),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeItem {
    /// Key in the merged tree, namespaced for workspace entries
    pub key: String,
    pub label: String,
    pub description: Option<String>,
    pub tooltip: Option<String>,
    pub icon: Option<String>,
    pub icon_color: Option<String>,
    pub workspace: Option<String>,
    pub kind: TreeItemKind,
}

impl TreeItem {
    #[must_use]
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, TreeItemKind::Folder { .. })
    }

    #[must_use]
    pub fn children(&self) -> &[TreeItem] {
        match &self.kind {
            TreeItemKind::Folder { children, .. } => children,
            TreeItemKind::Command(_) => &[],
        }
    }
}

fn decorate(
    key: &str,
    workspace: Option<&str>,
    status_bar: Option<&StatusBar>,
    settings: &Settings,
) -> String {
    let mut label = display_label(key, workspace).to_string();
    if status_bar.is_some_and(|status_bar| !status_bar.hidden) {
        label.push(' ');
        label.push_str(&settings.tree_view_status_bar_visible_symbol);
    }
    if workspace.is_some() {
        label.push(' ');
        label.push_str(&settings.tree_view_workspace_command_symbol);
    }
    label
}

fn tooltip(leaf: &CommandObject) -> Option<String> {
    if leaf.disable_tooltip {
        return None;
    }
    if let Some(markdown) = &leaf.markdown_tooltip {
        return Some(markdown.clone());
    }
    Some(match &leaf.action {
        Action::Command { command, .. } => command.clone(),
        Action::Sequence(steps) => format!("Sequence of {} steps", steps.len()),
    })
}

fn leaf_item(
    key: &str,
    leaf: &CommandObject,
    settings: &Settings,
    keybindings: &[Keybinding],
) -> TreeItem {
    let label = display_label(key, leaf.workspace.as_deref());
    let description = if settings.show_keybindings {
        keybinding_for(label, leaf, keybindings).map(|binding| binding.key.clone())
    } else {
        None
    };
    TreeItem {
        key: key.to_string(),
        label: decorate(
            key,
            leaf.workspace.as_deref(),
            leaf.status_bar.as_ref(),
            settings,
        ),
        description,
        tooltip: tooltip(leaf),
        icon: leaf.icon.clone(),
        icon_color: leaf.icon_color.clone(),
        workspace: leaf.workspace.clone(),
        kind: TreeItemKind::Command(leaf.clone().into()),
    }
}

/// Build the root items in configuration order. Hidden entries are left out.
#[must_use]
pub fn build(
    commands: &TopLevelCommands,
    settings: &Settings,
    keybindings: &[Keybinding],
) -> Vec<TreeItem> {
    commands
        .iter()
        .filter(|(_, node)| !node.hidden())
        .map(|(key, node)| match node {
            Node::Leaf(leaf) => leaf_item(key, leaf, settings, keybindings),
            Node::Folder(folder) => TreeItem {
                key: key.clone(),
                label: decorate(
                    key,
                    folder.workspace.as_deref(),
                    folder.status_bar.as_ref(),
                    settings,
                ),
                description: None,
                tooltip: None,
                icon: folder.icon.clone(),
                icon_color: None,
                workspace: folder.workspace.clone(),
                kind: TreeItemKind::Folder {
                    collapsed: settings.tree_view_collapse_folders,
                    children: folder
                        .nested_items
                        .iter()
                        .filter(|(_, leaf)| !leaf.hidden)
                        .map(|(child_key, leaf)| leaf_item(child_key, leaf, settings, keybindings))
                        .collect(),
                },
            },
        })
        .collect()
}

/// Plain-text outline of the tree, one item per line.
#[must_use]
pub fn render(items: &[TreeItem]) -> String {
    fn walk(items: &[TreeItem], depth: usize, lines: &mut Vec<String>) {
        for item in items {
            let indent = "  ".repeat(depth);
            let marker = match &item.kind {
                TreeItemKind::Folder { collapsed: true, .. } => "▸ ",
                TreeItemKind::Folder {
                    collapsed: false, ..
                } => "▾ ",
                TreeItemKind::Command(_) => "",
            };
            let description = item
                .description
                .as_ref()
                .map(|d| format!(" ({d})"))
                .unwrap_or_default();
            lines.push(format!("{indent}{marker}{}{description}", item.label));
            walk(item.children(), depth + 1, lines);
        }
    }
    let mut lines = Vec::new();
    walk(items, 0, &mut lines);
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::folder::Folder;
    use crate::commands::workspace::merge;
    use indexmap::IndexMap;

    fn sample() -> TopLevelCommands {
        let mut global = TopLevelCommands::new();
        let mut save = CommandObject::command("workbench.action.files.saveAll");
        save.status_bar = Some(StatusBar {
            text: "Save".to_string(),
            ..Default::default()
        });
        global.insert("Save All".to_string(), save.into());
        let mut nested = IndexMap::new();
        nested.insert("Commit".to_string(), CommandObject::command("git.commit"));
        let mut secret = CommandObject::command("git.push");
        secret.hidden = true;
        nested.insert("Push".to_string(), secret);
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
    fn test_render_tree() {
        let keybindings = vec![Keybinding {
            key: "ctrl+k c".to_string(),
            command: "git.commit".to_string(),
            args: None,
            when: None,
        }];
        let settings = Settings {
            show_keybindings: true,
            ..Default::default()
        };
        let items = build(&sample(), &settings, &keybindings);
        insta::assert_snapshot!(render(&items), @r"
        Save All 💠
        ▾ Git
          Commit (ctrl+k c)
        Build 🎯
        ");
    }

    #[test]
    fn test_collapse_setting_and_keys() {
        let settings = Settings {
            tree_view_collapse_folders: true,
            ..Default::default()
        };
        let items = build(&sample(), &settings, &[]);
        assert!(matches!(
            items[1].kind,
            TreeItemKind::Folder {
                collapsed: true,
                ..
            }
        ));
        assert_eq!(items[2].key, "ws1::Build");
        assert_eq!(items[2].workspace.as_deref(), Some("ws1"));
        assert_eq!(items[0].description, None);
    }

    #[test]
    fn test_tooltip() {
        let mut leaf = CommandObject::command("a");
        assert_eq!(tooltip(&leaf).as_deref(), Some("a"));
        leaf.markdown_tooltip = Some("**bold**".to_string());
        assert_eq!(tooltip(&leaf).as_deref(), Some("**bold**"));
        leaf.disable_tooltip = true;
        assert_eq!(tooltip(&leaf), None);
    }
}
