//! `${name}` substitution inside command arguments
//!
//! Values come from a registry of named providers, each computing its value
//! from an [`EditorState`] snapshot taken when the step runs. Unknown or
//! unavailable variables expand to an empty string.

use std::collections::HashMap;
use std::path::{MAIN_SEPARATOR_STR, Path};
use std::sync::LazyLock;

use log::debug;
use regex::{Captures, Regex};
use serde_json::Value;

use crate::host::EditorState;

static VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^{}]+)\}").expect("variable pattern is valid"));

type Provider = Box<dyn Fn(&EditorState) -> Option<String> + Send + Sync>;

fn lossy(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

fn relative_file(state: &EditorState) -> Option<String> {
    let file = state.active_file.as_ref()?;
    let root = state.workspace_folder()?;
    file.strip_prefix(root).ok().map(lossy)
}

pub struct VariableRegistry {
    providers: HashMap<String, Provider>,
}

impl std::fmt::Debug for VariableRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.providers.keys().collect();
        names.sort();
        f.debug_struct("VariableRegistry")
            .field("providers", &names)
            .finish()
    }
}

impl Default for VariableRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl VariableRegistry {
    /// Registry without any providers.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Registry with the editor variables: file, selection and workspace.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register("file", |s| s.active_file.as_deref().map(lossy));
        registry.register("fileBasename", |s| s.active_file.as_deref().and_then(file_name));
        registry.register("fileBasenameNoExtension", |s| {
            s.active_file
                .as_deref()
                .and_then(Path::file_stem)
                .map(|stem| stem.to_string_lossy().into_owned())
        });
        registry.register("fileExtname", |s| {
            s.active_file
                .as_deref()
                .and_then(Path::extension)
                .map(|ext| format!(".{}", ext.to_string_lossy()))
        });
        registry.register("fileDirname", |s| {
            s.active_file.as_deref().and_then(Path::parent).map(lossy)
        });
        registry.register("fileDirnameBasename", |s| {
            s.active_file
                .as_deref()
                .and_then(Path::parent)
                .and_then(file_name)
        });
        registry.register("fileWorkspaceFolder", |s| {
            s.active_file.as_ref()?;
            s.workspace_folder().map(|p| lossy(p))
        });
        registry.register("relativeFile", relative_file);
        registry.register("relativeFileDirname", |s| {
            let relative = relative_file(s)?;
            Path::new(&relative).parent().map(lossy)
        });
        registry.register("workspaceFolder", |s| s.workspace_folder().map(|p| lossy(p)));
        registry.register("workspaceFolderBasename", |s| {
            s.workspace_folder().and_then(|p| file_name(p))
        });
        registry.register("selectedText", |s| s.selected_text.clone());
        registry.register("lineNumber", |s| s.line_number.map(|n| (n + 1).to_string()));
        registry.register("currentLineText", |s| s.current_line_text.clone());
        registry.register("pathSeparator", |_| Some(MAIN_SEPARATOR_STR.to_string()));
        registry.register("cwd", |_| std::env::current_dir().ok().map(|p| lossy(&p)));
        registry
    }

    /// Add or replace the provider for `name`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        provider: impl Fn(&EditorState) -> Option<String> + Send + Sync + 'static,
    ) {
        self.providers.insert(name.into(), Box::new(provider));
    }

    /// Value of a single variable; `env:NAME` reads the process environment.
    #[must_use]
    pub fn resolve(&self, name: &str, state: &EditorState) -> String {
        if let Some(var) = name.strip_prefix("env:") {
            return std::env::var(var).unwrap_or_default();
        }
        match self.providers.get(name) {
            Some(provider) => provider(state).unwrap_or_default(),
            None => {
                debug!("Unknown variable '{name}', substituting empty string");
                String::new()
            }
        }
    }

    #[must_use]
    pub fn substitute_str(&self, text: &str, state: &EditorState) -> String {
        VARIABLE
            .replace_all(text, |caps: &Captures<'_>| self.resolve(&caps[1], state))
            .into_owned()
    }

    /// Substitute inside every string of `args`, recursing into arrays and
    /// object values. Object keys are left alone.
    #[must_use]
    pub fn substitute(&self, args: &Value, state: &EditorState) -> Value {
        match args {
            Value::String(text) => Value::String(self.substitute_str(text, state)),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.substitute(item, state))
                    .collect(),
            ),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), self.substitute(value, state)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    fn state() -> EditorState {
        EditorState {
            active_file: Some(PathBuf::from("/work/app/src/main.rs")),
            selected_text: Some("hello".to_string()),
            line_number: Some(9),
            workspace_folders: vec![PathBuf::from("/work/app")],
            ..Default::default()
        }
    }

    #[test]
    fn test_file_variables() {
        let registry = VariableRegistry::with_defaults();
        let s = state();
        assert_eq!(registry.resolve("fileBasename", &s), "main.rs");
        assert_eq!(registry.resolve("fileBasenameNoExtension", &s), "main");
        assert_eq!(registry.resolve("fileExtname", &s), ".rs");
        assert_eq!(registry.resolve("workspaceFolderBasename", &s), "app");
        assert_eq!(
            registry.resolve("relativeFile", &s),
            PathBuf::from("src").join("main.rs").to_string_lossy()
        );
        assert_eq!(registry.resolve("lineNumber", &s), "10");
    }

    #[test]
    fn test_missing_values_expand_to_empty() {
        let registry = VariableRegistry::with_defaults();
        let empty = EditorState::default();
        assert_eq!(registry.substitute_str("[${file}]", &empty), "[]");
        assert_eq!(registry.substitute_str("[${noSuchThing}]", &empty), "[]");
    }

    #[test]
    fn test_substitute_recurses_into_json() {
        let registry = VariableRegistry::with_defaults();
        let args = json!({
            "text": "${selectedText} world",
            "nested": ["${fileBasename}", 3, true],
            "${selectedText}": "key untouched"
        });
        assert_eq!(
            registry.substitute(&args, &state()),
            json!({
                "text": "hello world",
                "nested": ["main.rs", 3, true],
                "${selectedText}": "key untouched"
            })
        );
    }

    #[test]
    fn test_custom_provider() {
        let mut registry = VariableRegistry::empty();
        registry.register("answer", |_| Some("42".to_string()));
        assert_eq!(
            registry.substitute_str("${answer}${answer}", &EditorState::default()),
            "4242"
        );
    }

    #[test]
    fn test_text_without_variables_is_unchanged() {
        let registry = VariableRegistry::with_defaults();
        assert_eq!(registry.substitute_str("$ {file} and $", &state()), "$ {file} and $");
    }
}
