//! External collaborator contracts
//!
//! The engine owns no transport; questions, committed interactions and
//! session records live behind these async traits. In-memory implementations
//! back the demo binary and tests.

mod memory;

pub use memory::{MemoryInteractionRecorder, MemoryQuestionProvider, MemorySessionStore};

use crate::error::EngineError;
use crate::model::{InputMethod, Interaction, QaPair, Session, SessionStatus};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Context sent with every question fetch
#[derive(Debug, Clone)]
pub struct QuestionRequest {
    pub role: String,
    pub session_type: String,
    pub experience_level: String,
    pub industry: String,

    /// Prior Q/A pairs, oldest first
    pub history: Vec<QaPair>,
}

/// A question returned by the provider
#[derive(Debug, Clone)]
pub struct Question {
    pub text: String,
}

/// Answer submission, as handed to the recorder
///
/// The client never sends an order; the recorder assigns it from the
/// authoritative committed count. `attempt_id` identifies one logical submit
/// across retries so a resubmit after a lost response cannot double-commit.
#[derive(Debug, Clone)]
pub struct SaveInteraction {
    pub session_id: String,
    pub attempt_id: Uuid,
    pub question_text: String,
    pub answer_text: String,
    pub input_method: InputMethod,
    pub timestamp: DateTime<Utc>,
    pub time_spent_secs: u64,
}

/// Partial session update applied in one atomic store operation
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub status: Option<SessionStatus>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub final_score: Option<u8>,
}

/// Async question-fetch contract
#[async_trait::async_trait]
pub trait QuestionProvider: Send + Sync {
    async fn fetch_next(&self, request: QuestionRequest) -> Result<Question, EngineError>;
}

/// Durable persistence of finalized Q/A pairs
#[async_trait::async_trait]
pub trait InteractionRecorder: Send + Sync {
    /// Commit one interaction, assigning the next order slot
    ///
    /// Retry-safe: if `attempt_id` was already committed the existing record
    /// is returned instead of appending a duplicate.
    async fn save(&self, interaction: SaveInteraction) -> Result<Interaction, EngineError>;

    /// Authoritative count of committed interactions for a session
    async fn count(&self, session_id: &str) -> Result<u32, EngineError>;

    /// Committed interactions in order
    async fn list(&self, session_id: &str) -> Result<Vec<Interaction>, EngineError>;
}

/// Session record persistence
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &str) -> Result<Session, EngineError>;

    async fn update(&self, session_id: &str, patch: SessionPatch) -> Result<Session, EngineError>;
}
