//! Rule-based conversational responder for the Pitchside prediction widget.
//!
//! Provides keyword rule tables, first-match response selection, the
//! append-only transcript, and the chat session controller that drives
//! turn-taking and widget visibility.

pub mod error;
mod listeners;
pub mod matcher;
pub mod responder;
pub mod rules;
pub mod session;
pub mod state;
pub mod transcript;

pub use error::{ChatError, RuleError};
pub use listeners::{Listener, Subscription};
pub use matcher::{first_match, normalize, Matcher, Selection};
pub use responder::{Responder, RuleResponder};
pub use rules::{Rule, RuleTable, DEFAULT_FALLBACK_RESPONSE, FALLBACK_RULE_NAME};
pub use session::{ChatSession, ConversationState};
pub use state::SessionPhase;
pub use transcript::{Message, Transcript};
