use serde::{Deserialize, Serialize};
use stagehook_types::Stage;
use std::path::PathBuf;
use std::time::Duration;

use super::FailureContext;

/// Pipeline and pre-action events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HookEvent {
    /// Stage about to run its pre-actions
    StageStarted { stage: Stage, pre_actions: usize },

    /// A pre-action is about to execute
    PreActionStarted {
        stage: Stage,
        position: usize,
        action: String,
    },

    /// Announcement printed by an action before it does its work
    ActionMessage { action: String, message: String },

    /// External command about to be spawned
    CommandStarted {
        action: String,
        command: String,
        working_dir: PathBuf,
    },

    /// Captured command output, one line per event
    CommandOutput {
        action: String,
        line: String,
        is_stderr: bool,
    },

    /// External command exited
    CommandCompleted {
        action: String,
        exit_code: Option<i32>,
        duration: Duration,
    },

    PreActionCompleted {
        stage: Stage,
        position: usize,
        action: String,
        duration: Duration,
    },

    PreActionFailed {
        stage: Stage,
        position: usize,
        action: String,
        failure: FailureContext,
    },

    /// All pre-actions passed; the stage's main action is starting
    StageMainStarted { stage: Stage },

    StageCompleted {
        stage: Stage,
        pre_actions: usize,
        duration: Duration,
    },

    /// Stage stopped before (or during) its main action
    StageAborted {
        stage: Stage,
        failure: FailureContext,
    },
}
