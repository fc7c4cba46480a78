//! The runnable action abstraction

use stagehook_errors::Error;
use stagehook_events::{EventEmitter, EventSender};
use stagehook_types::Stage;
use std::fmt;

/// Execution context handed to every action
///
/// Carries the stage being prepared and the event channel, if any.
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub stage: Stage,
    /// 1-based position of the action within the stage's pre-actions
    pub position: usize,
    pub event_sender: Option<EventSender>,
    pub correlation_id: Option<String>,
}

impl ActionContext {
    /// Context without event reporting
    #[must_use]
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            position: 0,
            event_sender: None,
            correlation_id: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, sender: EventSender) -> Self {
        self.event_sender = Some(sender);
        self
    }

    #[must_use]
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub(crate) fn at_position(&self, position: usize) -> Self {
        Self {
            position,
            ..self.clone()
        }
    }
}

impl EventEmitter for ActionContext {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }

    fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }
}

/// Something that runs before (or as) a stage and reports success or failure
pub trait Action: Send + Sync {
    /// Name used in reports and errors
    fn name(&self) -> &str;

    /// Run the action to completion on the caller's thread
    ///
    /// # Errors
    ///
    /// Any error aborts the owning stage.
    fn execute(&self, ctx: &ActionContext) -> Result<(), Error>;
}

/// In-process action backed by a closure
pub struct FnAction<F> {
    name: String,
    f: F,
}

impl<F> FnAction<F>
where
    F: Fn() -> Result<(), Error> + Send + Sync,
{
    #[must_use]
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Action for FnAction<F>
where
    F: Fn() -> Result<(), Error> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn execute(&self, _ctx: &ActionContext) -> Result<(), Error> {
        (self.f)()
    }
}

impl<F> fmt::Debug for FnAction<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAction").field("name", &self.name).finish()
    }
}
