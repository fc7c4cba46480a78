//! Structured logging integration for events
//!
//! Converts domain events into tracing records with structured fields so
//! debug log files carry the full stage history.

use stagehook_events::{AppEvent, EventMessage, GeneralEvent, HookEvent};
use tracing::{debug, error, info, warn};

/// Log an event using the tracing infrastructure with structured fields
pub fn log_event_with_tracing(message: &EventMessage) {
    let meta = &message.meta;
    let source = meta.source.as_str();
    let correlation = meta.correlation_id.as_deref().unwrap_or("-");

    match &message.event {
        AppEvent::General(general) => match general {
            GeneralEvent::Warning { message } => {
                warn!(source, correlation, "{message}");
            }
            GeneralEvent::DebugLog { message } => {
                debug!(source, correlation, "{message}");
            }
        },

        AppEvent::Hook(hook) => match hook {
            HookEvent::StageStarted { stage, pre_actions } => {
                info!(source, correlation, %stage, pre_actions, "Stage started");
            }
            HookEvent::PreActionStarted {
                stage,
                position,
                action,
            } => {
                info!(source, correlation, %stage, position, action = %action, "Pre-action started");
            }
            HookEvent::ActionMessage { action, message } => {
                info!(source, correlation, action = %action, "{message}");
            }
            HookEvent::CommandStarted {
                action,
                command,
                working_dir,
            } => {
                debug!(
                    source,
                    correlation,
                    action = %action,
                    command = %command,
                    working_dir = %working_dir.display(),
                    "Command started"
                );
            }
            HookEvent::CommandOutput {
                action,
                line,
                is_stderr,
            } => {
                debug!(source, correlation, action = %action, is_stderr, "{line}");
            }
            HookEvent::CommandCompleted {
                action,
                exit_code,
                duration,
            } => {
                debug!(
                    source,
                    correlation,
                    action = %action,
                    exit_code = ?exit_code,
                    duration = ?duration,
                    "Command completed"
                );
            }
            HookEvent::PreActionCompleted {
                stage,
                position,
                action,
                duration,
            } => {
                info!(
                    source,
                    correlation,
                    %stage,
                    position,
                    action = %action,
                    duration = ?duration,
                    "Pre-action completed"
                );
            }
            HookEvent::PreActionFailed {
                stage,
                position,
                action,
                failure,
            } => {
                error!(
                    source,
                    correlation,
                    %stage,
                    position,
                    action = %action,
                    code = ?failure.code,
                    message = %failure.message,
                    hint = ?failure.hint,
                    "Pre-action failed"
                );
            }
            HookEvent::StageMainStarted { stage } => {
                info!(source, correlation, %stage, "Stage main action started");
            }
            HookEvent::StageCompleted {
                stage,
                pre_actions,
                duration,
            } => {
                info!(
                    source,
                    correlation,
                    %stage,
                    pre_actions,
                    duration = ?duration,
                    "Stage completed"
                );
            }
            HookEvent::StageAborted { stage, failure } => {
                error!(
                    source,
                    correlation,
                    %stage,
                    code = ?failure.code,
                    message = %failure.message,
                    "Stage aborted"
                );
            }
        },
    }
}
