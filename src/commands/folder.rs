use indexmap::IndexMap;

use crate::commands::command::CommandObject;
use crate::commands::status_bar::StatusBar;

/// Label-keyed command tree in configuration order
pub type TopLevelCommands = IndexMap<String, Node>;

/// Purely organizational grouping of leaves. Folders never nest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Folder {
    pub nested_items: IndexMap<String, CommandObject>,
    pub status_bar: Option<StatusBar>,
    pub hidden: bool,
    pub when: Option<String>,
    pub icon: Option<String>,
    pub workspace: Option<String>,
}

/// Top-level entry, decided once at parse time
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Folder(Folder),
    Leaf(CommandObject),
}

impl Node {
    #[must_use]
    pub fn is_folder(&self) -> bool {
        matches!(self, Node::Folder(_))
    }

    #[must_use]
    pub fn hidden(&self) -> bool {
        match self {
            Node::Folder(folder) => folder.hidden,
            Node::Leaf(leaf) => leaf.hidden,
        }
    }

    #[must_use]
    pub fn when(&self) -> Option<&str> {
        match self {
            Node::Folder(folder) => folder.when.as_deref(),
            Node::Leaf(leaf) => leaf.when.as_deref(),
        }
    }

    #[must_use]
    pub fn status_bar(&self) -> Option<&StatusBar> {
        match self {
            Node::Folder(folder) => folder.status_bar.as_ref(),
            Node::Leaf(leaf) => leaf.status_bar.as_ref(),
        }
    }

    #[must_use]
    pub fn icon(&self) -> Option<&str> {
        match self {
            Node::Folder(folder) => folder.icon.as_deref(),
            Node::Leaf(leaf) => leaf.icon.as_deref(),
        }
    }

    /// Workspace scope tag, `None` for global entries
    #[must_use]
    pub fn workspace(&self) -> Option<&str> {
        match self {
            Node::Folder(folder) => folder.workspace.as_deref(),
            Node::Leaf(leaf) => leaf.workspace.as_deref(),
        }
    }

    /// Number of runnable leaves under this node.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        match self {
            Node::Folder(folder) => folder.nested_items.len(),
            Node::Leaf(_) => 1,
        }
    }
}

impl From<CommandObject> for Node {
    fn from(leaf: CommandObject) -> Self {
        Node::Leaf(leaf)
    }
}

impl From<Folder> for Node {
    fn from(folder: Folder) -> Self {
        Node::Folder(folder)
    }
}
