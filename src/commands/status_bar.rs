use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundColor {
    Error,
    Warning,
}

/// Display descriptor for putting a command or folder on the status bar.
/// Has no effect on execution.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBar {
    pub alignment: Option<Alignment>,
    pub text: String,
    pub name: Option<String>,
    pub priority: Option<i32>,
    pub tooltip: Option<String>,
    pub markdown_tooltip: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    pub color: Option<String>,
    pub background_color: Option<BackgroundColor>,
    pub active_editor_glob: Option<String>,
    pub active_editor_language: Option<String>,
}
