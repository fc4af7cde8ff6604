//! Turn-taking state machine for a chat session.
//!
//! - Idle -> AwaitingResponse (a non-empty submission was accepted)
//! - AwaitingResponse -> Idle (the reply was appended, or the pending reply was cancelled)

use std::fmt;

use serde::{Deserialize, Serialize};

/// Conversational phase of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Ready to accept a submission.
    #[default]
    Idle,
    /// A user message was appended and its reply has not arrived yet.
    AwaitingResponse,
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "Idle"),
            SessionPhase::AwaitingResponse => write!(f, "AwaitingResponse"),
        }
    }
}

impl SessionPhase {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &SessionPhase) -> bool {
        matches!(
            (self, target),
            (SessionPhase::Idle, SessionPhase::AwaitingResponse)
                | (SessionPhase::AwaitingResponse, SessionPhase::Idle)
        )
    }

    pub fn is_awaiting(&self) -> bool {
        matches!(self, SessionPhase::AwaitingResponse)
    }
}
