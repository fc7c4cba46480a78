#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for stagehook
//!
//! Library crates never print. Everything a user might want to see (stage
//! progress, captured command output, failures) is emitted as an event and
//! rendered or logged by the CLI.
//!
//! Stages run on a single thread; the channel is unbounded so emitting never
//! blocks, and the CLI renders events from another thread as they arrive.

pub mod meta;
pub use meta::{EventLevel, EventMeta, EventSource};

pub mod events;
pub use events::{AppEvent, EventMessage, FailureContext, GeneralEvent, HookEvent};

use crossbeam::channel::{Receiver, Sender};

/// Type alias for event sender
pub type EventSender = Sender<EventMessage>;

/// Type alias for event receiver
pub type EventReceiver = Receiver<EventMessage>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    crossbeam::channel::unbounded()
}

/// The unified trait for emitting events
///
/// Implemented by raw senders as well as by structs that carry one.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Correlation id attached to every emitted event
    fn correlation_id(&self) -> Option<&str> {
        None
    }

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            let mut message = EventMessage::new(event);
            if let Some(id) = self.correlation_id() {
                message = message.with_correlation_id(id);
            }
            // Ignore send errors - if receiver is dropped, we just continue
            let _ = sender.send(message);
        }
    }

    /// Emit a hook/pipeline event
    fn emit_hook(&self, event: HookEvent) {
        self.emit(AppEvent::Hook(event));
    }

    /// Emit a debug log event
    fn emit_debug(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::debug(message)));
    }

    /// Emit a warning event
    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning(message)));
    }
}

impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}
