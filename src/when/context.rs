use std::collections::HashMap;

use crate::host::EditorState;

/// A value a `when` clause can look up
#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<String>),
}

impl ContextValue {
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            ContextValue::Bool(value) => *value,
            ContextValue::Number(value) => *value != 0.0,
            ContextValue::String(value) => !value.is_empty(),
            ContextValue::List(values) => !values.is_empty(),
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ContextValue::Number(value) => Some(*value),
            ContextValue::String(value) => value.parse().ok(),
            ContextValue::Bool(_) | ContextValue::List(_) => None,
        }
    }

    /// Textual form used for equality and regex matching
    #[must_use]
    pub fn as_text(&self) -> String {
        match self {
            ContextValue::Bool(value) => value.to_string(),
            ContextValue::Number(value) => value.to_string(),
            ContextValue::String(value) => value.clone(),
            ContextValue::List(values) => values.join(","),
        }
    }
}

impl From<bool> for ContextValue {
    fn from(value: bool) -> Self {
        ContextValue::Bool(value)
    }
}

impl From<&str> for ContextValue {
    fn from(value: &str) -> Self {
        ContextValue::String(value.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(value: String) -> Self {
        ContextValue::String(value)
    }
}

impl From<f64> for ContextValue {
    fn from(value: f64) -> Self {
        ContextValue::Number(value)
    }
}

impl From<Vec<String>> for ContextValue {
    fn from(values: Vec<String>) -> Self {
        ContextValue::List(values)
    }
}

/// Snapshot of the keys a `when` clause may reference
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorContext {
    values: HashMap<String, ContextValue>,
}

impl EditorContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        self.values.insert(key.into(), value.into());
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.set(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    /// Build the well-known keys from an editor snapshot. Host-specific
    /// flags in `state.context` are copied last and win on conflict.
    #[must_use]
    pub fn from_state(state: &EditorState) -> Self {
        let mut context = EditorContext::new();
        context.set("editorFocus", state.editor_focus);
        context.set("editorTextFocus", state.editor_focus);
        context.set(
            "editorHasSelection",
            state.selected_text.as_ref().is_some_and(|s| !s.is_empty()),
        );
        #[expect(
            clippy::cast_precision_loss,
            reason = "folder counts are far below f64 precision"
        )]
        context.set("workspaceFolderCount", state.workspace_folders.len() as f64);
        if let Some(language) = &state.language_id {
            context.set("editorLangId", language.as_str());
            context.set("resourceLangId", language.as_str());
        }
        if let Some(file) = &state.active_file {
            context.set("resourcePath", file.to_string_lossy().into_owned());
            if let Some(name) = file.file_name() {
                context.set("resourceFilename", name.to_string_lossy().into_owned());
            }
            if let Some(ext) = file.extension() {
                context.set("resourceExtname", format!(".{}", ext.to_string_lossy()));
            }
            if let Some(dir) = file.parent() {
                context.set("resourceDirname", dir.to_string_lossy().into_owned());
            }
        }
        for (key, value) in &state.context {
            context.set(key.clone(), value.clone());
        }
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_state_derives_resource_keys() {
        let state = EditorState {
            active_file: Some(PathBuf::from("/repo/src/main.rs")),
            language_id: Some("rust".to_string()),
            editor_focus: true,
            workspace_folders: vec![PathBuf::from("/repo"), PathBuf::from("/other")],
            ..Default::default()
        };
        let context = EditorContext::from_state(&state);
        assert_eq!(context.get("resourceExtname"), Some(&ContextValue::from(".rs")));
        assert_eq!(context.get("resourceFilename"), Some(&ContextValue::from("main.rs")));
        assert_eq!(context.get("editorLangId"), Some(&ContextValue::from("rust")));
        assert_eq!(context.get("editorFocus"), Some(&ContextValue::Bool(true)));
        assert_eq!(
            context.get("workspaceFolderCount"),
            Some(&ContextValue::Number(2.0))
        );
    }

    #[test]
    fn test_truthiness() {
        assert!(!ContextValue::String(String::new()).is_truthy());
        assert!(ContextValue::Number(2.0).is_truthy());
        assert!(!ContextValue::List(vec![]).is_truthy());
    }
}
