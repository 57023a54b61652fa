//! Execution engine for runnables
//!
//! A runnable is normalized into a [`Plan`] and executed step by step: the
//! `when` gate is checked, `delay` suspends before each run of a step,
//! `repeat` re-runs the whole unit, and every leaf is dispatched to the host
//! with its arguments substituted at that moment. The first failing step
//! aborts the rest of the invocation, including later repeats.
//!
//! The runner holds no lock across suspension points: overlapping and
//! re-entrant invocations interleave freely, while the steps of any single
//! invocation always run in order.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use log::{debug, error, info};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use thiserror::Error;

use crate::commands::command::{Action, CommandObject, Runnable, Step};
use crate::config_file::Settings;
use crate::host::{Host, HostError};
use crate::variables::VariableRegistry;
use crate::when::{self, EditorContext};

/// Intercepted locally, never dispatched
pub const NOOP_COMMAND: &str = "noop";
/// Replays the last executed runnable
pub const RERUN_COMMAND: &str = "commands.rerun";
/// Writes its string argument to the clipboard
pub const CLIPBOARD_WRITE_COMMAND: &str = "commands.clipboardWrite";

/// Bound on re-entrant replays through `commands.rerun`
const MAX_NESTING: usize = 16;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunError {
    #[error("Command '{command}' failed: {source}")]
    Command { command: String, source: HostError },
    #[error("Command '{command}': {message}")]
    InvalidArgument { command: String, message: String },
    #[error("Commands nested deeper than {0} levels")]
    NestingTooDeep(usize),
    #[error("No command labeled '{0}'")]
    UnknownLabel(String),
}

/// Settings the runner reads at the start of every invocation
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerSettings {
    pub alias: HashMap<String, String>,
    pub variable_substitution_enabled: bool,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            alias: HashMap::new(),
            variable_substitution_enabled: true,
        }
    }
}

impl From<&Settings> for RunnerSettings {
    fn from(settings: &Settings) -> Self {
        Self {
            alias: settings.alias.clone(),
            variable_substitution_enabled: settings.variable_substitution_enabled,
        }
    }
}

/// Normalized form of a runnable
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
    Command { command: String, args: Option<Value> },
    Sequence(Vec<PlannedStep>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannedStep {
    pub plan: Plan,
    pub delay: Option<Duration>,
    pub repeat: u32,
    pub when: Option<String>,
}

impl PlannedStep {
    fn command(command: &str) -> Self {
        PlannedStep {
            plan: Plan::Command {
                command: command.to_string(),
                args: None,
            },
            delay: None,
            repeat: 1,
            when: None,
        }
    }

    fn from_object(object: &CommandObject) -> Self {
        let plan = match &object.action {
            Action::Command { command, args } => Plan::Command {
                command: command.clone(),
                args: args.clone(),
            },
            Action::Sequence(steps) => {
                Plan::Sequence(steps.iter().map(PlannedStep::from).collect())
            }
        };
        PlannedStep {
            plan,
            delay: object.delay.map(Duration::from_millis),
            repeat: object.repeat.max(1),
            when: object.when.clone(),
        }
    }
}

impl From<&Step> for PlannedStep {
    fn from(step: &Step) -> Self {
        match step {
            Step::Id(id) => PlannedStep::command(id),
            Step::Object(object) => PlannedStep::from_object(object),
        }
    }
}

/// Normalize a runnable: a bare id becomes a single command, a sequence
/// becomes an ordered list of normalized steps.
#[must_use]
pub fn normalize(runnable: &Runnable) -> PlannedStep {
    match runnable {
        Runnable::Id(id) => PlannedStep::command(id),
        Runnable::Object(object) => PlannedStep::from_object(object),
        Runnable::Sequence(steps) => PlannedStep {
            plan: Plan::Sequence(steps.iter().map(PlannedStep::from).collect()),
            delay: None,
            repeat: 1,
            when: None,
        },
    }
}

/// Per-invocation view of the runner's configuration
struct Invocation {
    settings: Arc<RunnerSettings>,
}

pub struct Runner {
    host: Arc<dyn Host>,
    settings: RwLock<Arc<RunnerSettings>>,
    variables: VariableRegistry,
    last_executed: Mutex<Runnable>,
}

impl Runner {
    #[must_use]
    pub fn new(host: Arc<dyn Host>, settings: RunnerSettings) -> Self {
        Self::with_variables(host, settings, VariableRegistry::with_defaults())
    }

    #[must_use]
    pub fn with_variables(
        host: Arc<dyn Host>,
        settings: RunnerSettings,
        variables: VariableRegistry,
    ) -> Self {
        Self {
            host,
            settings: RwLock::new(Arc::new(settings)),
            variables,
            last_executed: Mutex::new(Runnable::id(NOOP_COMMAND)),
        }
    }

    /// Replace the settings; invocations already running keep the old ones.
    pub fn update_settings(&self, settings: RunnerSettings) {
        *self.settings.write() = Arc::new(settings);
    }

    /// The runnable `commands.rerun` would replay.
    #[must_use]
    pub fn last_executed(&self) -> Runnable {
        self.last_executed.lock().clone()
    }

    /// Run a runnable to completion.
    ///
    /// `args_override` replaces the arguments of a single-command runnable.
    /// A failure is shown to the user and returned; steps that already ran
    /// are not rolled back. On success the runnable, as given, becomes the
    /// last executed one.
    ///
    /// # Errors
    ///
    /// Returns the `RunError` of the first step that failed.
    pub async fn run(
        &self,
        runnable: &Runnable,
        args_override: Option<Value>,
    ) -> Result<(), RunError> {
        let invocation = Invocation {
            settings: Arc::clone(&self.settings.read()),
        };
        let mut plan = normalize(runnable);
        if let Some(override_args) = args_override {
            match &mut plan.plan {
                Plan::Command { args, .. } => *args = Some(override_args),
                Plan::Sequence(_) => debug!("Ignoring argument override for a sequence"),
            }
        }

        match self.execute(&invocation, &plan, 0).await {
            Ok(()) => {
                if !runnable.is_command(RERUN_COMMAND) {
                    *self.last_executed.lock() = runnable.clone();
                }
                Ok(())
            }
            Err(e) => {
                error!("{e}");
                self.host.show_error(&e.to_string());
                Err(e)
            }
        }
    }

    fn execute<'a>(
        &'a self,
        invocation: &'a Invocation,
        step: &'a PlannedStep,
        depth: usize,
    ) -> BoxFuture<'a, Result<(), RunError>> {
        Box::pin(async move {
            if depth > MAX_NESTING {
                return Err(RunError::NestingTooDeep(MAX_NESTING));
            }
            if step.when.is_some() {
                let context = EditorContext::from_state(&self.host.editor_state());
                if !when::evaluate(step.when.as_deref(), &context) {
                    debug!("Skipping step, `when` is false: {:?}", step.when);
                    return Ok(());
                }
            }
            for iteration in 0..step.repeat {
                if let Some(delay) = step.delay {
                    tokio::time::sleep(delay).await;
                }
                if step.repeat > 1 {
                    debug!("Iteration {}/{}", iteration + 1, step.repeat);
                }
                match &step.plan {
                    Plan::Command { command, args } => {
                        self.dispatch(invocation, command, args.as_ref(), depth)
                            .await?;
                    }
                    Plan::Sequence(steps) => {
                        for nested in steps {
                            self.execute(invocation, nested, depth + 1).await?;
                        }
                    }
                }
            }
            Ok(())
        })
    }

    async fn dispatch(
        &self,
        invocation: &Invocation,
        command: &str,
        args: Option<&Value>,
        depth: usize,
    ) -> Result<(), RunError> {
        let command = invocation
            .settings
            .alias
            .get(command)
            .map_or(command, String::as_str);
        let args = match args {
            Some(args) if invocation.settings.variable_substitution_enabled => {
                Some(self.variables.substitute(args, &self.host.editor_state()))
            }
            Some(args) => Some(args.clone()),
            None => None,
        };

        match command {
            NOOP_COMMAND => Ok(()),
            RERUN_COMMAND => {
                let last = self.last_executed();
                info!("Replaying last command");
                let plan = normalize(&last);
                self.execute(invocation, &plan, depth + 1).await
            }
            CLIPBOARD_WRITE_COMMAND => {
                let Some(Value::String(text)) = args else {
                    return Err(RunError::InvalidArgument {
                        command: command.to_string(),
                        message: "Argument is not a string.".to_string(),
                    });
                };
                self.host
                    .write_clipboard(&text)
                    .await
                    .map_err(|source| RunError::Command {
                        command: command.to_string(),
                        source,
                    })
            }
            _ => {
                debug!("Executing '{command}'");
                self.host
                    .execute(command, args)
                    .await
                    .map(|_| ())
                    .map_err(|source| RunError::Command {
                        command: command.to_string(),
                        source,
                    })
            }
        }
    }
}
