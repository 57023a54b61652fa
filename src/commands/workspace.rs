//! Workspace scoping: identity derivation and merging of workspace commands
//! into the global tree.

use std::path::Path;

use log::debug;
use uuid::Uuid;

use crate::commands::command::CommandObject;
use crate::commands::folder::{Folder, Node, TopLevelCommands};

/// Separates the workspace id from the user label in namespaced keys
pub const WORKSPACE_KEY_SEPARATOR: &str = "::";

/// Stable identity of an open workspace, derived from its root path.
#[must_use]
pub fn workspace_id(root: &Path) -> String {
    let root = root.to_string_lossy();
    Uuid::new_v5(&Uuid::NAMESPACE_URL, root.as_bytes())
        .simple()
        .to_string()
}

/// Key under which a workspace entry lives in the merged tree.
#[must_use]
pub fn workspace_key(workspace_id: &str, label: &str) -> String {
    format!("{workspace_id}{WORKSPACE_KEY_SEPARATOR}{label}")
}

/// The label a user wrote for `key`, with any workspace namespace removed.
#[must_use]
pub fn display_label<'a>(key: &'a str, workspace: Option<&str>) -> &'a str {
    workspace
        .and_then(|id| key.strip_prefix(id))
        .and_then(|rest| rest.strip_prefix(WORKSPACE_KEY_SEPARATOR))
        .unwrap_or(key)
}

fn tag_leaf(mut leaf: CommandObject, workspace_id: &str) -> CommandObject {
    leaf.workspace = Some(workspace_id.to_string());
    leaf
}

fn tag_node(node: &Node, workspace_id: &str) -> Node {
    match node {
        Node::Leaf(leaf) => Node::Leaf(tag_leaf(leaf.clone(), workspace_id)),
        Node::Folder(folder) => Node::Folder(Folder {
            nested_items: folder
                .nested_items
                .iter()
                .map(|(label, leaf)| {
                    (
                        workspace_key(workspace_id, label),
                        tag_leaf(leaf.clone(), workspace_id),
                    )
                })
                .collect(),
            workspace: Some(workspace_id.to_string()),
            ..folder.clone()
        }),
    }
}

/// Overlay `workspace_commands` on top of `global`.
///
/// Workspace keys are namespaced with `workspace_id` and every workspace node
/// is tagged with its scope. With no workspace id, or nothing to merge, the
/// global tree is returned as is. Inputs are never modified.
#[must_use]
pub fn merge(
    global: &TopLevelCommands,
    workspace_commands: &TopLevelCommands,
    workspace_id: Option<&str>,
) -> TopLevelCommands {
    let Some(workspace_id) = workspace_id.filter(|id| !id.is_empty()) else {
        return global.clone();
    };
    if workspace_commands.is_empty() {
        return global.clone();
    }

    let mut merged = global.clone();
    for (label, node) in workspace_commands {
        merged.insert(
            workspace_key(workspace_id, label),
            tag_node(node, workspace_id),
        );
    }
    debug!(
        "Merged {} global + {} workspace commands ({workspace_id})",
        global.len(),
        workspace_commands.len()
    );
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn tree(entries: &[(&str, &str)]) -> TopLevelCommands {
        entries
            .iter()
            .map(|(label, cmd)| ((*label).to_string(), CommandObject::command(*cmd).into()))
            .collect()
    }

    #[test]
    fn test_no_workspace_returns_global() {
        let global = tree(&[("Save All", "workbench.action.files.saveAll")]);
        let ws = tree(&[("Build", "tasks.build")]);
        assert_eq!(merge(&global, &ws, None), global);
        assert_eq!(merge(&global, &ws, Some("")), global);
    }

    #[test]
    fn test_empty_workspace_commands_returns_global() {
        let global = tree(&[("Save All", "workbench.action.files.saveAll")]);
        assert_eq!(merge(&global, &TopLevelCommands::new(), Some("ws1")), global);
    }

    #[test]
    fn test_identical_labels_do_not_collide() {
        let global = tree(&[("Build", "global.build")]);
        let ws = tree(&[("Build", "tasks.build")]);
        let merged = merge(&global, &ws, Some("ws1"));
        assert_eq!(merged.len(), 2);
        assert!(merged.contains_key("Build"));
        let scoped = &merged[&workspace_key("ws1", "Build")];
        assert_eq!(scoped.workspace(), Some("ws1"));
        assert_eq!(merged["Build"].workspace(), None);
    }

    #[test]
    fn test_folder_children_are_tagged_and_namespaced() {
        let mut nested = indexmap::IndexMap::new();
        nested.insert("Test".to_string(), CommandObject::command("tasks.test"));
        let mut ws = TopLevelCommands::new();
        ws.insert(
            "Tasks".to_string(),
            Folder {
                nested_items: nested,
                ..Default::default()
            }
            .into(),
        );
        let merged = merge(&TopLevelCommands::new(), &ws, Some("ws1"));
        let Node::Folder(folder) = &merged[&workspace_key("ws1", "Tasks")] else {
            panic!("expected folder");
        };
        let leaf = &folder.nested_items[&workspace_key("ws1", "Test")];
        assert_eq!(leaf.workspace.as_deref(), Some("ws1"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let global = tree(&[("a", "x"), ("b", "y")]);
        let ws = tree(&[("a", "z")]);
        assert_eq!(
            merge(&global, &ws, Some("ws1")),
            merge(&global, &ws, Some("ws1"))
        );
    }

    #[test]
    fn test_display_label_roundtrip() {
        let key = workspace_key("ws1", "Build");
        assert_eq!(display_label(&key, Some("ws1")), "Build");
        assert_eq!(display_label("Build", None), "Build");
        assert_eq!(display_label("ws2::Build", Some("ws1")), "ws2::Build");
    }

    #[test]
    fn test_workspace_id_is_stable_per_path() {
        let a = workspace_id(&PathBuf::from("/home/user/project"));
        let b = workspace_id(&PathBuf::from("/home/user/project"));
        let c = workspace_id(&PathBuf::from("/home/user/other"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 32);
    }
}
