use serde_json::Value;

use crate::commands::status_bar::StatusBar;

/// What a leaf does when run. Exactly one mode is active per object:
/// a `sequence` in the configuration always wins over `command`/`args`.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Command { command: String, args: Option<Value> },
    Sequence(Vec<Step>),
}

/// A single runnable leaf with its execution modifiers and presentation hints
#[derive(Debug, Clone, PartialEq)]
pub struct CommandObject {
    pub action: Action,
    pub delay: Option<u64>,
    pub repeat: u32,
    pub when: Option<String>,
    pub hidden: bool,
    pub status_bar: Option<StatusBar>,
    pub icon: Option<String>,
    pub icon_color: Option<String>,
    pub markdown_tooltip: Option<String>,
    pub disable_tooltip: bool,
    pub workspace: Option<String>,
}

impl CommandObject {
    /// Leaf running a single command id without arguments.
    #[must_use]
    pub fn command(command: impl Into<String>) -> Self {
        Self::from_action(Action::Command {
            command: command.into(),
            args: None,
        })
    }

    #[must_use]
    pub fn sequence(steps: Vec<Step>) -> Self {
        Self::from_action(Action::Sequence(steps))
    }

    #[must_use]
    pub fn from_action(action: Action) -> Self {
        CommandObject {
            action,
            delay: None,
            repeat: 1,
            when: None,
            hidden: false,
            status_bar: None,
            icon: None,
            icon_color: None,
            markdown_tooltip: None,
            disable_tooltip: false,
            workspace: None,
        }
    }

    #[must_use]
    pub fn with_args(mut self, args: Value) -> Self {
        if let Action::Command { args: slot, .. } = &mut self.action {
            *slot = Some(args);
        }
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: u64) -> Self {
        self.delay = Some(delay);
        self
    }

    #[must_use]
    pub fn with_repeat(mut self, repeat: u32) -> Self {
        self.repeat = repeat.max(1);
        self
    }

    #[must_use]
    pub fn with_when(mut self, when: impl Into<String>) -> Self {
        self.when = Some(when.into());
        self
    }

    /// The command id for single-command leaves, `None` for sequences.
    #[must_use]
    pub fn command_id(&self) -> Option<&str> {
        match &self.action {
            Action::Command { command, .. } => Some(command),
            Action::Sequence(_) => None,
        }
    }

    #[must_use]
    pub fn args(&self) -> Option<&Value> {
        match &self.action {
            Action::Command { args, .. } => args.as_ref(),
            Action::Sequence(_) => None,
        }
    }
}

/// One entry of a sequence
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Id(String),
    Object(CommandObject),
}

impl From<&str> for Step {
    fn from(id: &str) -> Self {
        Step::Id(id.to_string())
    }
}

impl From<CommandObject> for Step {
    fn from(object: CommandObject) -> Self {
        Step::Object(object)
    }
}

/// Anything the runner accepts: a bare id, a command object or a sequence
#[derive(Debug, Clone, PartialEq)]
pub enum Runnable {
    Id(String),
    Object(Box<CommandObject>),
    Sequence(Vec<Step>),
}

impl Runnable {
    #[must_use]
    pub fn id(command: impl Into<String>) -> Self {
        Runnable::Id(command.into())
    }

    /// Whether this runnable is a plain reference to `command`.
    #[must_use]
    pub fn is_command(&self, command: &str) -> bool {
        match self {
            Runnable::Id(id) => id == command,
            Runnable::Object(object) => {
                object.command_id() == Some(command) && object.repeat <= 1
            }
            Runnable::Sequence(_) => false,
        }
    }
}

impl From<CommandObject> for Runnable {
    fn from(object: CommandObject) -> Self {
        Runnable::Object(Box::new(object))
    }
}

impl From<Step> for Runnable {
    fn from(step: Step) -> Self {
        match step {
            Step::Id(id) => Runnable::Id(id),
            Step::Object(object) => Runnable::Object(Box::new(object)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_with_args_ignored_for_sequence() {
        let object = CommandObject::sequence(vec!["a".into()]).with_args(json!(1));
        assert_eq!(object.args(), None);
        assert_eq!(object.command_id(), None);
    }

    #[test]
    fn test_repeat_is_at_least_one() {
        assert_eq!(CommandObject::command("x").with_repeat(0).repeat, 1);
    }

    #[test]
    fn test_is_command() {
        assert!(Runnable::id("commands.rerun").is_command("commands.rerun"));
        assert!(Runnable::from(CommandObject::command("commands.rerun")).is_command("commands.rerun"));
        assert!(!Runnable::Sequence(vec!["commands.rerun".into()]).is_command("commands.rerun"));
    }
}
