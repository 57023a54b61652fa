//! `@command?args@` links inside documents

use std::ops::Range;
use std::path::Path;
use std::sync::LazyLock;

use log::warn;
use regex::Regex;
use serde_json::Value;

use crate::commands::command::{CommandObject, Runnable};
use crate::config_file::{Settings, parse_glob};

static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@([^@\s?]+)(?:\?([^@]*))?@").expect("document link pattern is valid")
});

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentLink {
    /// Byte range of the whole match, delimiters included
    pub range: Range<usize>,
    pub command: String,
    pub args: Option<Value>,
}

impl DocumentLink {
    #[must_use]
    pub fn runnable(&self) -> Runnable {
        let object = CommandObject::command(self.command.clone());
        match &self.args {
            Some(args) => object.with_args(args.clone()).into(),
            None => object.into(),
        }
    }
}

/// Arguments are JSON when they parse, the raw text otherwise.
fn parse_args(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Every link in `text`, in document order.
#[must_use]
pub fn find_document_links(text: &str) -> Vec<DocumentLink> {
    LINK.captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(DocumentLink {
                range: whole.range(),
                command: caps[1].to_string(),
                args: caps.get(2).map(|args| parse_args(args.as_str())),
            })
        })
        .collect()
}

/// Whether links should be offered for the document at `path`.
#[must_use]
pub fn links_enabled_for(settings: &Settings, path: &Path) -> bool {
    if !settings.document_links_enabled {
        return false;
    }
    match parse_glob(&settings.document_links_pattern) {
        Ok(pattern) => pattern.matches_path(path),
        Err(e) => {
            warn!("{e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_find_links() {
        let text = "Run @workbench.action.files.saveAll@ then @editor.action.insertSnippet?{\"snippet\":\"x\"}@ or @echo?hello world@.";
        let links = find_document_links(text);
        assert_eq!(links.len(), 3);
        assert_eq!(links[0].command, "workbench.action.files.saveAll");
        assert_eq!(links[0].args, None);
        assert_eq!(&text[links[0].range.clone()], "@workbench.action.files.saveAll@");
        assert_eq!(links[1].args, Some(json!({"snippet": "x"})));
        assert_eq!(links[2].args, Some(json!("hello world")));
    }

    #[test]
    fn test_plain_email_like_text_is_not_a_link() {
        assert!(find_document_links("mail me at someone@example.com").is_empty());
    }

    #[test]
    fn test_link_runnable_carries_args() {
        let link = &find_document_links("@cmd?42@")[0];
        let Runnable::Object(object) = link.runnable() else {
            panic!("expected command object");
        };
        assert_eq!(object.command_id(), Some("cmd"));
        assert_eq!(object.args(), Some(&json!(42)));
    }

    #[test]
    fn test_links_enabled_for() {
        let mut settings = Settings::default();
        assert!(!links_enabled_for(&settings, Path::new("README.md")));
        settings.document_links_enabled = true;
        assert!(links_enabled_for(&settings, Path::new("docs/README.md")));
        assert!(!links_enabled_for(&settings, Path::new("src/main.rs")));
    }
}
