//! Error types for the chat widget engine.

use pitchside_core::error::PitchsideError;

/// Errors from the chat session controller.
///
/// `EmptySubmission` and `SubmissionWhileBusy` are local rejections: the
/// session is left exactly as it was, so a caller that ignores them sees a
/// no-op.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("chat is disabled")]
    Disabled,
    #[error("message cannot be empty")]
    EmptySubmission,
    #[error("a response is still pending")]
    SubmissionWhileBusy,
    #[error("no async runtime available to produce the response")]
    NoRuntime,
    #[error("no quick question at index {0}")]
    QuickQuestionOutOfRange(usize),
    #[error("rule table error: {0}")]
    Rules(#[from] RuleError),
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<PitchsideError> for ChatError {
    fn from(err: PitchsideError) -> Self {
        ChatError::Config(err.to_string())
    }
}

/// Errors raised while building a rule table.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    #[error("rule '{0}' has no keywords")]
    EmptyKeywords(String),
    #[error("rule '{0}' has a blank keyword")]
    BlankKeyword(String),
    #[error("rule '{0}' has an empty response")]
    EmptyTemplate(String),
    #[error("fallback response cannot be empty")]
    EmptyFallback,
}
