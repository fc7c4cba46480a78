//! Pre-action error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum HookError {
    /// The external command could not be started at all.
    #[error("failed to launch {program} for {action}: {message}")]
    ActionLaunch {
        action: String,
        program: String,
        message: String,
    },

    /// The external command ran and exited unsuccessfully. `code` is `None`
    /// when the process was terminated by a signal.
    #[error("{action}: {program} exited with {}", exit_label(.code))]
    ActionExit {
        action: String,
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{action} failed: {message}")]
    ActionFailed { action: String, message: String },
}

#[allow(clippy::ref_option)]
fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

impl UserFacingError for HookError {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Self::ActionExit { stderr, .. } if !stderr.is_empty() => {
                Cow::Owned(format!("{self}\n{stderr}"))
            }
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ActionLaunch { .. } => Some(
                "Check that the hook command exists in the project root and is executable.",
            ),
            Self::ActionExit { .. } => {
                Some("Fix the failing hook command (e.g. a missing frontend build dependency) and re-run the pipeline.")
            }
            Self::ActionFailed { .. } => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::ActionLaunch { .. } => "hook.action_launch",
            Self::ActionExit { .. } => "hook.action_exit",
            Self::ActionFailed { .. } => "hook.action_failed",
        };
        Some(code)
    }
}
