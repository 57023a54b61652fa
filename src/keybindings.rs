//! Best-effort lookup of user keybindings for tree view annotations

use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::commands::command::CommandObject;

/// Host command a keybinding uses to run a user command by label
pub const RUN_BY_LABEL_COMMAND: &str = "commands.run";

#[derive(Error, Debug)]
pub enum KeybindingsError {
    #[error("Unable to read keybindings: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unable to parse keybindings: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Keybinding {
    pub key: String,
    pub command: String,
    #[serde(default)]
    pub args: Option<Value>,
    #[serde(default)]
    pub when: Option<String>,
}

/// First byte at or after `pos` that is not whitespace or part of a comment.
fn next_significant(bytes: &[u8], mut pos: usize) -> Option<u8> {
    loop {
        match (bytes.get(pos)?, bytes.get(pos + 1)) {
            (b, _) if b.is_ascii_whitespace() => pos += 1,
            (b'/', Some(b'/')) => {
                while bytes.get(pos).is_some_and(|b| *b != b'\n') {
                    pos += 1;
                }
            }
            (b'/', Some(b'*')) => {
                pos += 2;
                while pos < bytes.len() && !bytes[pos..].starts_with(b"*/") {
                    pos += 1;
                }
                pos += 2;
            }
            (b, _) => return Some(*b),
        }
    }
}

/// Drop `//` and `/* */` comments and trailing commas outside strings.
fn strip_jsonc(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    // Start of the source slice not yet copied to `out`
    let mut copied = 0;
    let mut pos = 0;
    let mut in_string = false;
    while pos < bytes.len() {
        let b = bytes[pos];
        if in_string {
            match b {
                b'\\' => pos += 2,
                b'"' => {
                    in_string = false;
                    pos += 1;
                }
                _ => pos += 1,
            }
            continue;
        }
        match (b, bytes.get(pos + 1)) {
            (b'"', _) => {
                in_string = true;
                pos += 1;
            }
            (b'/', Some(b'/')) => {
                out.push_str(&text[copied..pos]);
                while pos < bytes.len() && bytes[pos] != b'\n' {
                    pos += 1;
                }
                copied = pos;
            }
            (b'/', Some(b'*')) => {
                out.push_str(&text[copied..pos]);
                pos += 2;
                while pos < bytes.len() && !bytes[pos..].starts_with(b"*/") {
                    pos += 1;
                }
                pos = (pos + 2).min(bytes.len());
                copied = pos;
            }
            (b',', _) => {
                if matches!(next_significant(bytes, pos + 1), Some(b']' | b'}')) {
                    out.push_str(&text[copied..pos]);
                    copied = pos + 1;
                }
                pos += 1;
            }
            _ => pos += 1,
        }
    }
    out.push_str(&text[copied.min(text.len())..]);
    out
}

/// Parse the contents of a keybindings file.
///
/// # Errors
///
/// Returns `KeybindingsError::Json` if the text is not a keybinding array.
pub fn parse_keybindings(text: &str) -> Result<Vec<Keybinding>, KeybindingsError> {
    Ok(serde_json::from_str(&strip_jsonc(text))?)
}

async fn read_keybindings(path: &Path) -> Result<Vec<Keybinding>, KeybindingsError> {
    let text = tokio::fs::read_to_string(path).await?;
    parse_keybindings(&text)
}

/// Keybindings from `path`, or none when the file is missing or malformed.
pub async fn load_keybindings(path: &Path) -> Vec<Keybinding> {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        debug!("No keybindings file at {}", path.display());
        return Vec::new();
    }
    match read_keybindings(path).await {
        Ok(keybindings) => keybindings,
        Err(e) => {
            warn!("{e} ({})", path.display());
            Vec::new()
        }
    }
}

/// The binding that runs `label`, either through the run-by-label command or
/// by invoking the leaf's own command with the same arguments.
#[must_use]
pub fn keybinding_for<'a>(
    label: &str,
    leaf: &CommandObject,
    keybindings: &'a [Keybinding],
) -> Option<&'a Keybinding> {
    keybindings.iter().find(|binding| {
        if binding.command == RUN_BY_LABEL_COMMAND {
            return binding.args.as_ref().and_then(Value::as_str) == Some(label);
        }
        leaf.command_id() == Some(binding.command.as_str()) && leaf.args() == binding.args.as_ref()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const KEYBINDINGS: &str = r#"
// Place your key bindings in this file
[
    {
        "key": "ctrl+alt+s",
        "command": "commands.run", // run by label
        "args": "Save All",
    },
    /* formatter */
    { "key": "ctrl+k f", "command": "editor.action.formatDocument" },
    { "key": "ctrl+k u", "command": "url.open", "args": "https://example.com//path" },
]
"#;

    #[test]
    fn test_parse_jsonc() {
        let keybindings = parse_keybindings(KEYBINDINGS).unwrap();
        assert_eq!(keybindings.len(), 3);
        assert_eq!(keybindings[2].args, Some(json!("https://example.com//path")));
    }

    #[test]
    fn test_strip_jsonc_keeps_strings_intact() {
        let text = "[{\"key\": \"ctrl+ä\", /* é */ \"args\": \"a,] // \\\" b\",}, // tail\n]";
        let stripped = strip_jsonc(text);
        assert!(serde_json::from_str::<Value>(&stripped).is_ok());
        assert_eq!(
            stripped,
            "[{\"key\": \"ctrl+ä\",  \"args\": \"a,] // \\\" b\"} \n]"
        );
    }

    #[test]
    fn test_keybinding_for_label_and_command() {
        let keybindings = parse_keybindings(KEYBINDINGS).unwrap();
        let save = CommandObject::command("workbench.action.files.saveAll");
        assert_eq!(
            keybinding_for("Save All", &save, &keybindings).map(|k| k.key.as_str()),
            Some("ctrl+alt+s")
        );
        let format = CommandObject::command("editor.action.formatDocument");
        assert_eq!(
            keybinding_for("Format", &format, &keybindings).map(|k| k.key.as_str()),
            Some("ctrl+k f")
        );
        let with_args = CommandObject::command("editor.action.formatDocument").with_args(json!(1));
        assert!(keybinding_for("Other", &with_args, &keybindings).is_none());
    }

    #[tokio::test]
    async fn test_missing_file_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_keybindings(&dir.path().join("keybindings.json")).await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_file_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keybindings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(load_keybindings(&path).await.is_empty());
    }
}
