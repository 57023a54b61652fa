//! The extension context: current model snapshot, runner and caches
//!
//! Every configuration or workspace change goes through [`Extension::update`],
//! which rebuilds the whole model from scratch and swaps it in at once.
//! Readers hold an `Arc<Model>` and keep a consistent view across swaps.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error, info, warn};
use parking_lot::RwLock;
use serde_json::Value;

use crate::commands::command::Runnable;
use crate::commands::flatten::{FlatCommands, NodeRef, collect_visible, flatten};
use crate::commands::folder::TopLevelCommands;
use crate::commands::workspace::{display_label, merge, workspace_id};
use crate::config_file::Settings;
use crate::document_links::{self, DocumentLink};
use crate::host::{Host, Presenter};
use crate::keybindings::load_keybindings;
use crate::palette::{ContributedCommand, PaletteCache};
use crate::quick_pick::{self, QuickPickItem};
use crate::runner::{RunError, Runner, RunnerSettings};
use crate::status_bar_items::{self, StatusBarItem};
use crate::tree_view::{self, TreeItem};
use crate::when::{self, EditorContext};

/// Host context key telling whether the merged tree is empty
pub const EMPTY_COMMANDS_CONTEXT_KEY: &str = "commands:emptyCommands";

/// Files the extension reads besides its settings
#[derive(Debug, Clone, Default)]
pub struct ExtensionPaths {
    /// Bundled `{commandId: title}` map of built-in commands
    pub builtin_commands: PathBuf,
    /// User keybindings file, if the host has one
    pub keybindings: Option<PathBuf>,
}

/// Everything derived from one settings snapshot
#[derive(Debug, Default)]
pub struct Model {
    pub settings: Settings,
    pub workspace_id: Option<String>,
    pub commands: TopLevelCommands,
    pub flat: FlatCommands,
    pub tree: Vec<TreeItem>,
    pub status_bar: Vec<StatusBarItem>,
    /// Labels registered as command palette entries
    pub palette_labels: Vec<String>,
}

pub struct Extension {
    host: Arc<dyn Host>,
    presenter: Arc<dyn Presenter>,
    runner: Runner,
    model: RwLock<Arc<Model>>,
    palette: PaletteCache,
    paths: ExtensionPaths,
    contributed: Vec<ContributedCommand>,
}

impl Extension {
    #[must_use]
    pub fn new(host: Arc<dyn Host>, presenter: Arc<dyn Presenter>, paths: ExtensionPaths) -> Self {
        Self {
            runner: Runner::new(Arc::clone(&host), RunnerSettings::default()),
            host,
            presenter,
            model: RwLock::new(Arc::new(Model::default())),
            palette: PaletteCache::new(),
            paths,
            contributed: Vec::new(),
        }
    }

    /// Commands contributed by installed extensions, offered by the launcher.
    #[must_use]
    pub fn with_contributed_commands(mut self, contributed: Vec<ContributedCommand>) -> Self {
        self.contributed = contributed;
        self
    }

    /// Current model snapshot.
    #[must_use]
    pub fn model(&self) -> Arc<Model> {
        Arc::clone(&self.model.read())
    }

    #[must_use]
    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    /// Rebuild the model from `settings`, scoped to the workspace rooted at
    /// `workspace`, and push it to every surface.
    pub async fn update(&self, settings: Settings, workspace: Option<&Path>) -> Arc<Model> {
        let workspace_id = workspace.map(workspace_id);
        let commands = merge(
            &settings.global_commands(),
            &settings.workspace_commands(),
            workspace_id.as_deref(),
        );
        let flat = flatten(&commands);

        let keybindings = match (&self.paths.keybindings, settings.show_keybindings) {
            (Some(path), true) => load_keybindings(path).await,
            _ => Vec::new(),
        };
        let context = EditorContext::from_state(&self.host.editor_state());
        let tree = tree_view::build(&commands, &settings, &keybindings);
        let status_bar = status_bar_items::build(&commands, &settings, &context);
        let palette_labels = if settings.populate_command_palette {
            palette_labels(&commands, &context)
        } else {
            Vec::new()
        };

        self.runner.update_settings(RunnerSettings::from(&settings));
        let model = Arc::new(Model {
            settings,
            workspace_id,
            commands,
            flat,
            tree,
            status_bar,
            palette_labels,
        });
        *self.model.write() = Arc::clone(&model);
        info!(
            "Loaded {} commands ({} runnable)",
            model.commands.len(),
            model.flat.len()
        );

        self.presenter.update_tree(&model.tree);
        self.presenter.update_status_bar(&model.status_bar);
        self.presenter.update_command_palette(&model.palette_labels);
        self.presenter.update_document_links(
            model.settings.document_links_enabled,
            &model.settings.document_links_pattern,
        );
        self.presenter.update_commands(&model.flat);

        if let Err(e) = self
            .host
            .set_context(
                EMPTY_COMMANDS_CONTEXT_KEY,
                Value::Bool(model.commands.is_empty()),
            )
            .await
        {
            warn!("Unable to set {EMPTY_COMMANDS_CONTEXT_KEY}: {e}");
        }
        model
    }

    /// Run any runnable through the shared runner.
    ///
    /// # Errors
    ///
    /// Returns the `RunError` of the first failing step.
    pub async fn run(&self, runnable: &Runnable, args: Option<Value>) -> Result<(), RunError> {
        self.runner.run(runnable, args).await
    }

    /// Run the user command stored under `label`. Workspace entries may be
    /// addressed by the label the user wrote.
    ///
    /// # Errors
    ///
    /// Returns `RunError::UnknownLabel` if no command matches, otherwise the
    /// error of the first failing step.
    pub async fn run_label(&self, label: &str, args: Option<Value>) -> Result<(), RunError> {
        let model = self.model();
        let entry = model.flat.get(label).or_else(|| {
            model.flat.iter().find_map(|(key, entry)| {
                (display_label(key, entry.command.workspace.as_deref()) == label).then_some(entry)
            })
        });
        let Some(entry) = entry else {
            let e = RunError::UnknownLabel(label.to_string());
            error!("{e}");
            self.host.show_error(&e.to_string());
            return Err(e);
        };
        self.run(&entry.runnable(), args).await
    }

    /// Launcher items: the whole tree, or only the children of `folder`.
    pub async fn quick_pick_items(&self, folder: Option<&str>) -> Vec<QuickPickItem> {
        let model = self.model();
        if let Some(key) = folder {
            return match quick_pick::folder_commands(&model.commands, key) {
                Some(children) => quick_pick::build(&children, None),
                None => {
                    debug!("No folder '{key}' to pick from");
                    Vec::new()
                }
            };
        }
        if !model.settings.quick_pick_include_all_commands {
            return quick_pick::build(&model.commands, None);
        }
        let palette = self
            .palette
            .get_or_load(
                self.host.as_ref(),
                &self.paths.builtin_commands,
                &self.contributed,
            )
            .await;
        quick_pick::build(&model.commands, Some(palette))
    }

    /// Status bar items that apply to the editor as it is now.
    #[must_use]
    pub fn status_bar_items_for_active_editor(&self) -> Vec<StatusBarItem> {
        let state = self.host.editor_state();
        self.model()
            .status_bar
            .iter()
            .filter(|item| status_bar_items::is_visible_for_editor(item, &state))
            .cloned()
            .collect()
    }

    /// Links in the document at `path`, if links are enabled for it.
    #[must_use]
    pub fn document_links(&self, path: &Path, text: &str) -> Vec<DocumentLink> {
        if document_links::links_enabled_for(&self.model().settings, path) {
            document_links::find_document_links(text)
        } else {
            Vec::new()
        }
    }

    /// # Errors
    ///
    /// Returns the `RunError` of the first failing step.
    pub async fn run_document_link(&self, link: &DocumentLink) -> Result<(), RunError> {
        self.run(&link.runnable(), None).await
    }
}

/// Display labels of visible leaves, for command palette registration.
fn palette_labels(commands: &TopLevelCommands, context: &EditorContext) -> Vec<String> {
    collect_visible(commands, |condition| when::evaluate(condition, context))
        .into_iter()
        .filter_map(|visible| match visible.node {
            NodeRef::Leaf(leaf) => {
                Some(display_label(visible.label, leaf.workspace.as_deref()).to_string())
            }
            NodeRef::Folder(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::command::CommandObject;
    use crate::commands::folder::Folder;
    use indexmap::IndexMap;

    #[test]
    fn test_palette_labels_skip_folders_and_hidden() {
        let mut nested = IndexMap::new();
        nested.insert("ws::Child".to_string(), {
            let mut leaf = CommandObject::command("c");
            leaf.workspace = Some("ws".to_string());
            leaf
        });
        let mut commands = TopLevelCommands::new();
        commands.insert("A".to_string(), CommandObject::command("a").into());
        let mut hidden = CommandObject::command("b");
        hidden.hidden = true;
        commands.insert("B".to_string(), hidden.into());
        commands.insert(
            "ws::F".to_string(),
            Folder {
                nested_items: nested,
                workspace: Some("ws".to_string()),
                ..Default::default()
            }
            .into(),
        );
        assert_eq!(
            palette_labels(&commands, &EditorContext::new()),
            vec!["A".to_string(), "Child".to_string()]
        );
    }
}
