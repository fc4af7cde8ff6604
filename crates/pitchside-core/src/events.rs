use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{MessageRole, Timestamp, Visibility};

/// Events emitted by a chat session after each completed state mutation.
///
/// Host surfaces subscribe to these to know when to re-render. Operations
/// that turn out to be no-ops (repeated `open()`, a rejected submit) emit
/// nothing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ChatEvent {
    /// A message was appended to the transcript.
    MessageAppended {
        session_id: Uuid,
        message_id: u64,
        role: MessageRole,
        timestamp: Timestamp,
    },

    /// The session entered or left `AwaitingResponse`.
    PhaseChanged {
        session_id: Uuid,
        awaiting: bool,
        timestamp: Timestamp,
    },

    /// The widget was opened, closed, minimized, or expanded.
    VisibilityChanged {
        session_id: Uuid,
        visibility: Visibility,
        timestamp: Timestamp,
    },

    /// An in-flight response was cancelled before it was appended.
    ResponseCancelled {
        session_id: Uuid,
        timestamp: Timestamp,
    },
}

impl ChatEvent {
    /// Returns the session the event belongs to.
    pub fn session_id(&self) -> Uuid {
        match self {
            ChatEvent::MessageAppended { session_id, .. }
            | ChatEvent::PhaseChanged { session_id, .. }
            | ChatEvent::VisibilityChanged { session_id, .. }
            | ChatEvent::ResponseCancelled { session_id, .. } => *session_id,
        }
    }

    /// Returns the timestamp of the event.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            ChatEvent::MessageAppended { timestamp, .. }
            | ChatEvent::PhaseChanged { timestamp, .. }
            | ChatEvent::VisibilityChanged { timestamp, .. }
            | ChatEvent::ResponseCancelled { timestamp, .. } => *timestamp,
        }
    }

    /// Returns a human-readable event name for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            ChatEvent::MessageAppended { .. } => "message_appended",
            ChatEvent::PhaseChanged { .. } => "phase_changed",
            ChatEvent::VisibilityChanged { .. } => "visibility_changed",
            ChatEvent::ResponseCancelled { .. } => "response_cancelled",
        }
    }
}
