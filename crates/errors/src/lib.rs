#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for stagehook
//!
//! Errors are grouped by domain (configuration, hook execution) and folded
//! into a single [`Error`] at crate boundaries. All error types are `Clone`
//! so they can travel inside events as well as `Result`s.

use std::borrow::Cow;

use thiserror::Error;

pub mod config;
pub mod hook;

pub use config::ConfigError;
pub use hook::HookError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("hook error: {0}")]
    Hook(#[from] HookError),

    /// A pre-action failed; the stage's main action did not run.
    #[error("stage {stage} aborted at pre-action #{position} ({action}): {error}")]
    StageAborted {
        stage: String,
        position: usize,
        action: String,
        #[source]
        error: Box<Error>,
    },

    /// The stage's own main action failed after all pre-actions succeeded.
    #[error("stage {stage} failed: {error}")]
    StageFailed {
        stage: String,
        #[source]
        error: Box<Error>,
    },

    /// The pipeline already aborted in this invocation and must be restarted.
    #[error("pipeline aborted at stage {stage}; restart the build from the beginning")]
    PipelineAborted { stage: String },

    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {message}")]
    Io { message: String },
}

impl Error {
    /// Create an internal error with a message
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Innermost error, unwrapping stage wrappers
    #[must_use]
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::StageAborted { error, .. } | Self::StageFailed { error, .. } => {
                error.root_cause()
            }
            other => other,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }
}

/// Minimal interface for rendering user-facing error information without
/// requiring heavyweight envelopes.
pub trait UserFacingError {
    /// Short message suitable for CLI output.
    fn user_message(&self) -> Cow<'_, str>;

    /// Optional remediation hint.
    fn user_hint(&self) -> Option<&'static str> {
        None
    }

    /// Whether retrying the same operation is likely to succeed.
    fn is_retryable(&self) -> bool {
        false
    }

    /// Stable error code for analytics / structured reporting.
    fn user_code(&self) -> Option<&'static str> {
        None
    }
}

impl UserFacingError for Error {
    fn user_message(&self) -> Cow<'_, str> {
        match self {
            Error::Config(err) => err.user_message(),
            Error::Hook(err) => err.user_message(),
            Error::StageAborted {
                stage,
                position,
                action,
                error,
            } => Cow::Owned(format!(
                "stage {stage} aborted at pre-action #{position} ({action}): {}",
                error.user_message()
            )),
            Error::StageFailed { stage, error } => {
                Cow::Owned(format!("stage {stage} failed: {}", error.user_message()))
            }
            Error::Io { message, .. } => Cow::Owned(message.clone()),
            _ => Cow::Owned(self.to_string()),
        }
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Error::Config(err) => err.user_hint(),
            Error::Hook(err) => err.user_hint(),
            Error::StageAborted { .. } | Error::StageFailed { .. } => {
                self.root_cause().user_hint()
            }
            Error::PipelineAborted { .. } => Some("Start a new build invocation."),
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            Error::Config(err) => err.user_code(),
            Error::Hook(err) => err.user_code(),
            Error::StageAborted { .. } | Error::StageFailed { .. } => {
                self.root_cause().user_code()
            }
            Error::PipelineAborted { .. } => Some("pipeline.aborted"),
            Error::Internal(_) => Some("error.internal"),
            Error::Io { .. } => Some("error.io"),
        }
    }
}
