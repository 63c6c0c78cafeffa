//! Recorder lifecycle events

use std::fmt;

use crate::domain::encoding::AudioData;
use crate::domain::error::EncodeError;

/// Event names listeners subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Start,
    Stop,
    Pause,
    Resume,
    DataAvailable,
    Error,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        Self::Start,
        Self::Stop,
        Self::Pause,
        Self::Resume,
        Self::DataAvailable,
        Self::Error,
    ];

    /// Get the event name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::DataAvailable => "dataavailable",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A notification published by the recorder
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderEvent {
    Start,
    Stop,
    Pause,
    Resume,
    DataAvailable(AudioData),
    Error(EncodeError),
}

impl RecorderEvent {
    /// The name this event is dispatched under
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Start => EventKind::Start,
            Self::Stop => EventKind::Stop,
            Self::Pause => EventKind::Pause,
            Self::Resume => EventKind::Resume,
            Self::DataAvailable(_) => EventKind::DataAvailable,
            Self::Error(_) => EventKind::Error,
        }
    }

    /// Build the payload-less event for a lifecycle kind.
    ///
    /// Returns `None` for kinds that carry a payload.
    pub fn lifecycle(kind: EventKind) -> Option<Self> {
        match kind {
            EventKind::Start => Some(Self::Start),
            EventKind::Stop => Some(Self::Stop),
            EventKind::Pause => Some(Self::Pause),
            EventKind::Resume => Some(Self::Resume),
            EventKind::DataAvailable | EventKind::Error => None,
        }
    }

    /// The container carried by a `dataavailable` event
    pub fn data(&self) -> Option<&AudioData> {
        match self {
            Self::DataAvailable(data) => Some(data),
            _ => None,
        }
    }
}
