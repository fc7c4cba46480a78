//! Linear stage driver
//!
//! Runs each requested stage as `pre-actions → main action`, stopping the
//! whole pipeline at the first failure. Per invocation the driver moves
//! through `Idle → RunningPreActions → StageMain → Completed`, or ends in
//! `Aborted`; an aborted pipeline must be [`reset`](Pipeline::reset) (that
//! is, restarted from the beginning) before it will run again.

use crate::action::{Action, ActionContext};
use crate::command::CommandAction;
use crate::registry::HookRegistry;
use stagehook_config::Config;
use stagehook_errors::Error;
use stagehook_events::{EventEmitter, EventSender, FailureContext, HookEvent};
use stagehook_types::Stage;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, info_span};
use uuid::Uuid;

/// Where the driver is in the current invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Idle,
    RunningPreActions(Stage),
    StageMain(Stage),
    Completed(Stage),
    Aborted(Stage),
}

/// Outcome of one successfully completed stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: Stage,
    pub pre_actions: usize,
    pub ran_main: bool,
    pub duration: Duration,
}

/// Outcome of a full pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub stages: Vec<StageReport>,
    pub duration: Duration,
}

/// Drives stages against a frozen [`HookRegistry`]
pub struct Pipeline<'a> {
    registry: &'a HookRegistry,
    mains: BTreeMap<Stage, Arc<dyn Action>>,
    event_sender: Option<EventSender>,
    correlation_id: Option<String>,
    state: StageState,
}

impl<'a> Pipeline<'a> {
    #[must_use]
    pub fn new(registry: &'a HookRegistry) -> Self {
        Self {
            registry,
            mains: BTreeMap::new(),
            event_sender: None,
            correlation_id: None,
            state: StageState::Idle,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.event_sender = Some(sender);
        self
    }

    /// Set the main action of `stage`; stages without one only run their
    /// pre-actions and leave the work to the surrounding build tool
    #[must_use]
    pub fn with_main(mut self, stage: Stage, action: Arc<dyn Action>) -> Self {
        self.mains.insert(stage, action);
        self
    }

    /// Use the `[stages.*]` commands of a configuration as main actions
    ///
    /// # Errors
    ///
    /// Returns an error if a configured command is empty.
    pub fn with_config_mains(mut self, config: &Config) -> Result<Self, Error> {
        let root = config.project_root();
        for stage in Stage::ALL {
            if let Some(command) = config.stage_command(stage) {
                let action = CommandAction::from_argv(stage.as_str(), command, root.clone())?;
                self.mains.insert(stage, Arc::new(action));
            }
        }
        Ok(self)
    }

    #[must_use]
    pub fn state(&self) -> StageState {
        self.state
    }

    #[must_use]
    pub fn has_main(&self, stage: Stage) -> bool {
        self.mains.contains_key(&stage)
    }

    /// Return to `Idle`, starting a fresh invocation
    pub fn reset(&mut self) {
        self.state = StageState::Idle;
    }

    /// Run the given stages in order, halting at the first failure
    ///
    /// # Errors
    ///
    /// Returns the error of the first stage that failed; later stages are
    /// not attempted.
    pub fn run(&mut self, stages: &[Stage]) -> Result<PipelineReport, Error> {
        let started = Instant::now();
        let mut report = PipelineReport::default();

        for stage in stages {
            report.stages.push(self.run_stage(*stage)?);
        }

        report.duration = started.elapsed();
        Ok(report)
    }

    /// Run one stage: all pre-actions, then the main action
    ///
    /// Every call re-executes the pre-actions; nothing is cached between runs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StageAborted`] when a pre-action fails,
    /// [`Error::StageFailed`] when the main action fails, and
    /// [`Error::PipelineAborted`] when called after an earlier abort.
    pub fn run_stage(&mut self, stage: Stage) -> Result<StageReport, Error> {
        if let StageState::Aborted(previous) = self.state {
            return Err(Error::PipelineAborted {
                stage: previous.to_string(),
            });
        }

        let run_id = format!("{stage}-{}", Uuid::new_v4());
        self.correlation_id = Some(run_id.clone());
        let span = info_span!("stage", %stage, run_id = %run_id);
        let _guard = span.enter();

        let ctx = ActionContext::new(stage).with_correlation_id(&run_id);
        let ctx = match &self.event_sender {
            Some(sender) => ctx.with_event_sender(sender.clone()),
            None => ctx,
        };

        let started = Instant::now();
        let pre_actions = self.registry.actions(stage).len();
        self.state = StageState::RunningPreActions(stage);
        self.emit_hook(HookEvent::StageStarted { stage, pre_actions });
        info!(pre_actions, "running pre-actions");

        if let Err(error) = self.registry.run_pre_actions(&ctx) {
            return Err(self.abort(stage, error));
        }

        self.state = StageState::StageMain(stage);
        self.emit_hook(HookEvent::StageMainStarted { stage });

        let ran_main = match self.mains.get(&stage).cloned() {
            Some(main) => {
                if let Err(error) = main.execute(&ctx) {
                    let error = Error::StageFailed {
                        stage: stage.to_string(),
                        error: Box::new(error),
                    };
                    return Err(self.abort(stage, error));
                }
                true
            }
            None => false,
        };

        let duration = started.elapsed();
        self.state = StageState::Completed(stage);
        self.emit_hook(HookEvent::StageCompleted {
            stage,
            pre_actions,
            duration,
        });
        info!(?duration, ran_main, "stage completed");

        Ok(StageReport {
            stage,
            pre_actions,
            ran_main,
            duration,
        })
    }

    fn abort(&mut self, stage: Stage, error: Error) -> Error {
        self.state = StageState::Aborted(stage);
        self.emit_hook(HookEvent::StageAborted {
            stage,
            failure: FailureContext::from_error(&error),
        });
        info!(error = %error, "stage aborted");
        error
    }
}

impl EventEmitter for Pipeline<'_> {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }

    fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }
}

impl fmt::Debug for Pipeline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("registry", self.registry)
            .field("mains", &self.mains.keys().collect::<Vec<_>>())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
