//! Stage → pre-action registry

use crate::action::{Action, ActionContext, FnAction};
use crate::command::CommandAction;
use stagehook_config::Config;
use stagehook_errors::Error;
use stagehook_events::{EventEmitter, FailureContext, HookEvent};
use stagehook_types::Stage;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Ordered pre-actions per stage
///
/// Populated while the build configuration is loaded and only read
/// afterwards: the pipeline borrows it immutably for the whole run.
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: BTreeMap<Stage, Vec<Arc<dyn Action>>>,
}

impl HookRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `action` to the pre-actions of `stage`
    ///
    /// Registering the same action twice makes it run twice.
    pub fn register(&mut self, stage: Stage, action: Arc<dyn Action>) {
        debug!(%stage, action = action.name(), "registered pre-action");
        self.hooks.entry(stage).or_default().push(action);
    }

    /// Register a closure as a pre-action
    pub fn register_fn<F>(&mut self, stage: Stage, name: impl Into<String>, f: F)
    where
        F: Fn() -> Result<(), Error> + Send + Sync + 'static,
    {
        self.register(stage, Arc::new(FnAction::new(name, f)));
    }

    /// Build a registry from the `[[hooks]]` entries of a configuration
    ///
    /// A hook listing several stages registers one shared action on each.
    ///
    /// # Errors
    ///
    /// Returns an error if a hook has no command.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let root = config.project_root();
        let mut registry = Self::new();

        for (index, hook) in config.hooks.iter().enumerate() {
            let working_dir = hook
                .working_dir
                .as_ref()
                .map_or_else(|| root.clone(), |dir| root.join(dir));
            let mut action =
                CommandAction::from_argv(hook.display_name(index), &hook.command, working_dir)?;
            if let Some(message) = &hook.message {
                action = action.with_message(message);
            }

            let action: Arc<dyn Action> = Arc::new(action);
            for stage in &hook.stages {
                registry.register(*stage, Arc::clone(&action));
            }
        }

        Ok(registry)
    }

    /// Pre-actions for `stage` in registration order
    #[must_use]
    pub fn actions(&self, stage: Stage) -> &[Arc<dyn Action>] {
        self.hooks.get(&stage).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Stages with at least one pre-action, in pipeline order
    pub fn stages(&self) -> impl Iterator<Item = Stage> + '_ {
        self.hooks
            .iter()
            .filter(|(_, actions)| !actions.is_empty())
            .map(|(stage, _)| *stage)
    }

    /// Total number of registrations
    #[must_use]
    pub fn len(&self) -> usize {
        self.hooks.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run the pre-actions of `ctx.stage` in order, stopping at the first failure
    ///
    /// Returns the number of actions run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StageAborted`] naming the failing action and its
    /// 1-based position; later actions are not run.
    pub fn run_pre_actions(&self, ctx: &ActionContext) -> Result<usize, Error> {
        let stage = ctx.stage;
        let actions = self.actions(stage);

        for (index, action) in actions.iter().enumerate() {
            let position = index + 1;
            let action_ctx = ctx.at_position(position);

            action_ctx.emit_hook(HookEvent::PreActionStarted {
                stage,
                position,
                action: action.name().to_string(),
            });

            let started = Instant::now();
            if let Err(error) = action.execute(&action_ctx) {
                action_ctx.emit_hook(HookEvent::PreActionFailed {
                    stage,
                    position,
                    action: action.name().to_string(),
                    failure: FailureContext::from_error(&error),
                });
                return Err(Error::StageAborted {
                    stage: stage.to_string(),
                    position,
                    action: action.name().to_string(),
                    error: Box::new(error),
                });
            }

            action_ctx.emit_hook(HookEvent::PreActionCompleted {
                stage,
                position,
                action: action.name().to_string(),
                duration: started.elapsed(),
            });
        }

        Ok(actions.len())
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (stage, actions) in &self.hooks {
            let names: Vec<&str> = actions.iter().map(|a| a.name()).collect();
            map.entry(stage, &names);
        }
        map.finish()
    }
}
