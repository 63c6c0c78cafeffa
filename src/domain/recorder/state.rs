//! Recorder lifecycle state machine
//!
//! State machine:
//!   INACTIVE  -> RECORDING (start)
//!   RECORDING -> PAUSED    (pause)
//!   PAUSED    -> RECORDING (resume)
//!   RECORDING | PAUSED -> INACTIVE (stop)
//!
//! Operations that do not apply to the current state are ignored. They
//! produce no effects and leave the state unchanged.

use std::fmt;

use crate::domain::recording::Duration;

use super::event::EventKind;

/// Recorder states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RecorderState {
    #[default]
    Inactive,
    Recording,
    Paused,
}

impl RecorderState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Recording => "recording",
            Self::Paused => "paused",
        }
    }

    /// True while a session is open (recording or paused)
    pub const fn is_active(&self) -> bool {
        !matches!(self, Self::Inactive)
    }
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything that can drive the recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Start { timeslice: Option<Duration> },
    Pause,
    Resume,
    Stop,
    RequestData,
    ChunkArrived,
    TimesliceElapsed,
}

/// Why a flush was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushKind {
    /// Periodic or caller-requested slice; the session continues
    Slice,
    /// Last flush of a session; `stop` follows its delivery
    Final,
}

/// Side effects the recorder must carry out, in order.
///
/// `dataavailable` and `stop` are not listed here: they are emitted when the
/// encoder answers a flush, not when the transition happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    OpenCapture,
    CloseCapture,
    ForwardChunk,
    Flush(FlushKind),
    ScheduleTimeslice(Duration),
    CancelTimeslice,
    Emit(EventKind),
}

/// Result of applying one operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: RecorderState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(next: RecorderState, effects: Vec<Effect>) -> Self {
        Self { next, effects }
    }

    fn stay(state: RecorderState) -> Self {
        Self {
            next: state,
            effects: Vec::new(),
        }
    }

    /// True when the operation was ignored
    pub fn is_noop(&self) -> bool {
        self.effects.is_empty()
    }
}

/// Apply `op` to `state`.
pub fn transition(state: RecorderState, op: Operation) -> Transition {
    use RecorderState::*;

    match (state, op) {
        (Inactive, Operation::Start { timeslice }) => {
            let mut effects = vec![Effect::OpenCapture, Effect::Emit(EventKind::Start)];
            // A zero-length slice means "one blob at the end"
            if let Some(slice) = timeslice.filter(|t| !t.is_zero()) {
                effects.push(Effect::ScheduleTimeslice(slice));
            }
            Transition::to(Recording, effects)
        }

        (Recording, Operation::ChunkArrived) => Transition::to(Recording, vec![Effect::ForwardChunk]),

        (Recording, Operation::Pause) => {
            Transition::to(Paused, vec![Effect::Emit(EventKind::Pause)])
        }

        (Paused, Operation::Resume) => {
            Transition::to(Recording, vec![Effect::Emit(EventKind::Resume)])
        }

        (Recording | Paused, Operation::RequestData) => {
            Transition::to(state, vec![Effect::Flush(FlushKind::Slice)])
        }

        (Recording, Operation::TimesliceElapsed) => {
            Transition::to(Recording, vec![Effect::Flush(FlushKind::Slice)])
        }

        (Recording | Paused, Operation::Stop) => Transition::to(
            Inactive,
            vec![
                Effect::Flush(FlushKind::Final),
                Effect::CancelTimeslice,
                Effect::CloseCapture,
            ],
        ),

        _ => Transition::stay(state),
    }
}
