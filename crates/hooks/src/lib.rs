#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Pre-action hooks for build pipeline stages
//!
//! Build configuration attaches actions to named stages through a
//! [`HookRegistry`]; the [`Pipeline`] runs them in registration order right
//! before each stage's main action and aborts the stage (and the rest of
//! the pipeline) on the first failure.
//!
//! Everything runs synchronously on the caller's thread. Actions are
//! injected through the [`Action`] trait, so tests can substitute in-process
//! fakes for the external commands used in real builds.

mod action;
mod command;
mod pipeline;
mod registry;

pub use action::{Action, ActionContext, FnAction};
pub use command::CommandAction;
pub use pipeline::{Pipeline, PipelineReport, StageReport, StageState};
pub use registry::HookRegistry;
