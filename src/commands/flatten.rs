//! Projections of the command tree used by the presentation layer

use indexmap::IndexMap;
use log::debug;

use crate::commands::command::{CommandObject, Runnable};
use crate::commands::folder::{Folder, Node, TopLevelCommands};

/// A leaf lifted out of the tree, remembering the folder it came from
#[derive(Debug, Clone, PartialEq)]
pub struct FlatCommand {
    pub command: CommandObject,
    pub parent_folder: Option<String>,
}

impl FlatCommand {
    #[must_use]
    pub fn runnable(&self) -> Runnable {
        self.command.clone().into()
    }
}

/// Label-keyed leaves in configuration order
pub type FlatCommands = IndexMap<String, FlatCommand>;

/// Lift every leaf to one level, keeping insertion order.
///
/// Folder children are emitted in place of their folder, tagged with the
/// folder's key.
#[must_use]
pub fn flatten(tree: &TopLevelCommands) -> FlatCommands {
    let mut flat = FlatCommands::new();
    for (label, node) in tree {
        match node {
            Node::Leaf(leaf) => insert(&mut flat, label, leaf, None),
            Node::Folder(folder) => {
                for (nested_label, leaf) in &folder.nested_items {
                    insert(&mut flat, nested_label, leaf, Some(label.as_str()));
                }
            }
        }
    }
    flat
}

fn insert(flat: &mut FlatCommands, label: &str, leaf: &CommandObject, parent: Option<&str>) {
    let previous = flat.insert(
        label.to_string(),
        FlatCommand {
            command: leaf.clone(),
            parent_folder: parent.map(ToString::to_string),
        },
    );
    if previous.is_some() {
        debug!("Label '{label}' appears more than once, keeping the last definition");
    }
}

/// Borrowed view of either kind of tree entry
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Folder(&'a Folder),
    Leaf(&'a CommandObject),
}

impl NodeRef<'_> {
    #[must_use]
    pub fn hidden(&self) -> bool {
        match self {
            NodeRef::Folder(folder) => folder.hidden,
            NodeRef::Leaf(leaf) => leaf.hidden,
        }
    }

    #[must_use]
    pub fn when(&self) -> Option<&str> {
        match self {
            NodeRef::Folder(folder) => folder.when.as_deref(),
            NodeRef::Leaf(leaf) => leaf.when.as_deref(),
        }
    }

    #[must_use]
    pub fn workspace(&self) -> Option<&str> {
        match self {
            NodeRef::Folder(folder) => folder.workspace.as_deref(),
            NodeRef::Leaf(leaf) => leaf.workspace.as_deref(),
        }
    }
}

impl<'a> From<&'a Node> for NodeRef<'a> {
    fn from(node: &'a Node) -> Self {
        match node {
            Node::Folder(folder) => NodeRef::Folder(folder),
            Node::Leaf(leaf) => NodeRef::Leaf(leaf),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Visible<'a> {
    pub label: &'a str,
    pub node: NodeRef<'a>,
    pub parent_folder: Option<&'a str>,
}

/// Entries that are neither `hidden` nor ruled out by `is_eligible` (which
/// receives the node's `when` clause). A hidden or ineligible folder takes
/// its children with it.
pub fn collect_visible<'a>(
    tree: &'a TopLevelCommands,
    is_eligible: impl Fn(Option<&str>) -> bool,
) -> Vec<Visible<'a>> {
    let visible = |node: NodeRef<'_>| !node.hidden() && is_eligible(node.when());
    let mut result = Vec::new();
    for (label, node) in tree {
        let node_ref = NodeRef::from(node);
        if !visible(node_ref) {
            continue;
        }
        result.push(Visible {
            label,
            node: node_ref,
            parent_folder: None,
        });
        if let Node::Folder(folder) = node {
            for (nested_label, leaf) in &folder.nested_items {
                let leaf_ref = NodeRef::Leaf(leaf);
                if visible(leaf_ref) {
                    result.push(Visible {
                        label: nested_label,
                        node: leaf_ref,
                        parent_folder: Some(label.as_str()),
                    });
                }
            }
        }
    }
    result
}
