use serde::{Deserialize, Serialize};

use crate::{EventLevel, EventMeta, EventSource};
use stagehook_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailureContext {
    /// Stable error code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod general;
pub mod hook;

pub use general::*;
pub use hook::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// Warnings and debug output
    General(GeneralEvent),

    /// Stage and pre-action lifecycle events
    Hook(HookEvent),
}

impl AppEvent {
    /// Identify the source domain for this event (used for metadata/logging).
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::General,
            Self::Hook(
                HookEvent::StageStarted { .. }
                | HookEvent::StageMainStarted { .. }
                | HookEvent::StageCompleted { .. }
                | HookEvent::StageAborted { .. },
            ) => EventSource::Pipeline,
            Self::Hook(_) => EventSource::Hook,
        }
    }

    /// Severity this event is recorded with
    #[must_use]
    pub fn log_level(&self) -> EventLevel {
        match self {
            Self::Hook(HookEvent::PreActionFailed { .. } | HookEvent::StageAborted { .. }) => {
                EventLevel::Error
            }

            Self::General(GeneralEvent::Warning { .. }) => EventLevel::Warn,

            Self::General(GeneralEvent::DebugLog { .. })
            | Self::Hook(
                HookEvent::CommandStarted { .. }
                | HookEvent::CommandOutput { .. }
                | HookEvent::CommandCompleted { .. },
            ) => EventLevel::Debug,

            _ => EventLevel::Info,
        }
    }
}

/// An event together with its emission metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub meta: EventMeta,
    pub event: AppEvent,
}

impl EventMessage {
    /// Wrap an event, deriving level and source from its content
    #[must_use]
    pub fn new(event: AppEvent) -> Self {
        let meta = EventMeta::new(event.log_level(), event.event_source());
        Self { meta, event }
    }

    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.meta = self.meta.with_correlation_id(correlation_id);
        self
    }
}
