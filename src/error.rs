use crate::model::SessionStatus;
use crate::speech::SpeechErrorKind;
use thiserror::Error;

/// How the UI boundary should route an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Transient collaborator failure; offer a retry action, session unchanged
    Retryable,
    /// Speech permission/device failure; degrade to manual text entry
    Fallback,
    /// Session unusable; navigate away, mark Abandoned where applicable
    FatalSession,
    /// Rejected client-side before any network call
    Validation,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to fetch next question: {message}")]
    QuestionFetch { status: Option<u16>, message: String },

    #[error("failed to save interaction: {message}")]
    SaveFailed { message: String },

    #[error("session store update failed: {message}")]
    StoreFailed { message: String },

    #[error("speech recognition unavailable: {0:?}")]
    SpeechUnavailable(SpeechErrorKind),

    #[error("speech recognition is not supported in this context")]
    SpeechUnsupported,

    #[error("speech adapter cannot {action} while {state}")]
    InvalidSpeechState {
        state: &'static str,
        action: &'static str,
    },

    #[error("session {0} not found")]
    SessionNotFound(String),

    #[error("illegal session transition {from:?} -> {to:?}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },

    #[error("another answer submission is already in flight")]
    SubmitInFlight,

    #[error("no question is currently displayed")]
    NoCurrentQuestion,

    #[error("answer is empty")]
    EmptyAnswer,

    #[error("answer is {len} characters, limit is {max}")]
    AnswerTooLong { len: usize, max: usize },
}

impl EngineError {
    pub fn class(&self) -> ErrorClass {
        use EngineError::*;
        match self {
            QuestionFetch { .. } | SaveFailed { .. } | StoreFailed { .. } => ErrorClass::Retryable,
            SpeechUnavailable(_) | SpeechUnsupported | InvalidSpeechState { .. } => {
                ErrorClass::Fallback
            }
            SessionNotFound(_) | InvalidTransition { .. } => ErrorClass::FatalSession,
            SubmitInFlight | NoCurrentQuestion | EmptyAnswer | AnswerTooLong { .. } => {
                ErrorClass::Validation
            }
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Retryable
    }
}
