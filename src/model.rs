use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a practice session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    NotStarted,
    Active,
    Paused,
    Completed,
    Abandoned,
}

impl SessionStatus {
    /// Whether a transition to `next` is legal.
    ///
    /// Transitions are monotone except Active <-> Paused. Completed and
    /// Abandoned are terminal.
    pub fn can_transition_to(self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, next),
            (NotStarted, Active)
                | (Active, Paused)
                | (Paused, Active)
                | (Active, Completed)
                | (Paused, Completed)
                | (NotStarted, Abandoned)
                | (Active, Abandoned)
                | (Paused, Abandoned)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Abandoned)
    }
}

/// How an answer was entered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMethod {
    Voice,
    Text,
    Skip,
}

/// One practice-interview run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier
    pub id: String,

    /// Owning user
    pub user_id: String,

    /// Target role (e.g. "Software Engineer")
    pub role: String,

    /// Session type (e.g. "Technical", "Behavioral")
    pub session_type: String,

    /// Candidate experience level (e.g. "Mid-level")
    pub experience_level: String,

    /// Target industry
    pub industry: String,

    /// Current lifecycle state
    pub status: SessionStatus,

    /// Maximum number of questions before the session auto-completes
    pub max_questions: u32,

    /// When the session was started (set on the NotStarted -> Active transition)
    pub started_at: Option<DateTime<Utc>>,

    /// When the session was completed
    pub completed_at: Option<DateTime<Utc>>,

    /// Final score, set exactly once when status becomes Completed
    pub final_score: Option<u8>,
}

/// One finalized question/answer pair, immutable once recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub session_id: String,

    /// 1-based position, strictly increasing and gapless per session
    pub order: u32,

    pub question_text: String,
    pub answer_text: String,
    pub input_method: InputMethod,
    pub timestamp: DateTime<Utc>,

    /// Seconds spent on this question while capture was running
    pub time_spent_secs: u64,
}

/// Ephemeral local backup of an unsubmitted answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    pub session_id: String,
    pub question_text: String,
    pub answer_text: String,
    pub timestamp: DateTime<Utc>,
}

/// Frozen answer snapshot handed from capture to the controller on submit
#[derive(Debug, Clone)]
pub struct AnswerPayload {
    pub text: String,
    pub input_method: InputMethod,
    pub time_spent_secs: u64,
    pub timestamp: DateTime<Utc>,
}

/// Prior question/answer pair, sent to the question provider as context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

/// Summary returned when a session finishes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    pub session_id: String,
    pub questions_answered: u32,
    pub questions_skipped: u32,
    pub final_score: u8,
    pub duration_secs: u64,
}
