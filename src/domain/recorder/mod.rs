//! Recorder domain module

mod event;
mod state;

pub use event::{EventKind, RecorderEvent};
pub use state::{transition, Effect, FlushKind, Operation, RecorderState, Transition};
