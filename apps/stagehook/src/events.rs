//! Event handling and terminal feedback

use crate::logging::log_event_with_tracing;
use console::{Style, Term};
use stagehook_events::{AppEvent, EventMessage, EventReceiver, GeneralEvent, HookEvent};
use std::panic;
use std::thread;

/// Renders pipeline events for humans (or as JSON lines)
pub struct EventHandler {
    term: Term,
    colors_enabled: bool,
    json_output: bool,
    debug_enabled: bool,
}

impl EventHandler {
    pub fn new(colors_enabled: bool, json_output: bool, debug_enabled: bool) -> Self {
        Self {
            term: Term::stderr(),
            colors_enabled,
            json_output,
            debug_enabled,
        }
    }

    /// Run `work` on a worker thread, rendering its events as they arrive
    ///
    /// `work` must own every sender of `receiver`; rendering stops once they
    /// are all dropped.
    pub fn render_while<T, W>(&mut self, receiver: &EventReceiver, work: W) -> T
    where
        W: FnOnce() -> T + Send,
        T: Send,
    {
        pump_events(receiver, |message| self.handle_event(message), work)
    }

    /// Handle incoming event
    pub fn handle_event(&mut self, message: &EventMessage) {
        if self.debug_enabled {
            log_event_with_tracing(message);
        }

        if self.json_output {
            if let Ok(line) = serde_json::to_string(message) {
                println!("{line}");
            }
            return;
        }

        match &message.event {
            AppEvent::General(general) => self.handle_general(general),
            AppEvent::Hook(hook) => self.handle_hook(hook),
        }
    }

    fn handle_general(&self, event: &GeneralEvent) {
        match event {
            GeneralEvent::Warning { message } => {
                self.show_line(&self.style(Style::new().yellow()), "warning:", message);
            }
            GeneralEvent::DebugLog { message } => {
                if self.debug_enabled {
                    self.show_line(&self.style(Style::new().dim()), "debug:", message);
                }
            }
        }
    }

    fn handle_hook(&self, event: &HookEvent) {
        let accent = self.style(Style::new().cyan().bold());
        let ok = self.style(Style::new().green());
        let bad = self.style(Style::new().red().bold());
        let dim = self.style(Style::new().dim());

        match event {
            HookEvent::StageStarted { stage, pre_actions } => {
                let suffix = match pre_actions {
                    0 => "no pre-actions".to_string(),
                    1 => "1 pre-action".to_string(),
                    n => format!("{n} pre-actions"),
                };
                self.show_line(&accent, "==>", &format!("{stage} ({suffix})"));
            }
            HookEvent::PreActionStarted {
                position, action, ..
            } => {
                self.show_line(&dim, "  ->", &format!("[{position}] {action}"));
            }
            HookEvent::ActionMessage { message, .. } => {
                self.show_raw(message);
            }
            HookEvent::CommandStarted { command, .. } => {
                if self.debug_enabled {
                    self.show_line(&dim, "  $", command);
                }
            }
            HookEvent::CommandOutput {
                line, is_stderr, ..
            } => {
                if *is_stderr {
                    self.show_raw(&dim.apply_to(line).to_string());
                } else {
                    self.show_raw(line);
                }
            }
            HookEvent::CommandCompleted { .. } | HookEvent::StageMainStarted { .. } => {}
            HookEvent::PreActionCompleted {
                action, duration, ..
            } => {
                self.show_line(&ok, "  ok", &format!("{action} ({:.1}s)", duration.as_secs_f64()));
            }
            HookEvent::PreActionFailed {
                action, failure, ..
            } => {
                self.show_line(&bad, "  failed", &format!("{action}: {}", failure.message));
            }
            HookEvent::StageCompleted {
                stage, duration, ..
            } => {
                self.show_line(
                    &ok,
                    "==>",
                    &format!("{stage} done ({:.1}s)", duration.as_secs_f64()),
                );
            }
            HookEvent::StageAborted { stage, .. } => {
                self.show_line(&bad, "==>", &format!("{stage} aborted"));
            }
        }
    }

    fn style(&self, style: Style) -> Style {
        if self.colors_enabled {
            style.force_styling(true)
        } else {
            Style::new().force_styling(false)
        }
    }

    fn show_line(&self, style: &Style, tag: &str, text: &str) {
        let _ = self.term.write_line(&format!("{} {text}", style.apply_to(tag)));
    }

    fn show_raw(&self, text: &str) {
        let _ = self.term.write_line(text);
    }
}

/// Feed events to `on_event` on this thread while `work` runs on another
fn pump_events<T, W>(
    receiver: &EventReceiver,
    mut on_event: impl FnMut(&EventMessage),
    work: W,
) -> T
where
    W: FnOnce() -> T + Send,
    T: Send,
{
    thread::scope(|scope| {
        let worker = scope.spawn(work);
        for message in receiver.iter() {
            on_event(&message);
        }
        match worker.join() {
            Ok(value) => value,
            Err(payload) => panic::resume_unwind(payload),
        }
    })
}
