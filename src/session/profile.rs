use crate::model::{Session, SessionStatus};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Setup parameters for one practice session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionProfile {
    /// Target role (e.g. "Software Engineer")
    pub role: String,

    /// Session type (e.g. "Technical", "Behavioral")
    pub session_type: String,

    /// Candidate experience level
    pub experience_level: String,

    /// Target industry
    pub industry: String,

    /// Questions before the session auto-completes
    pub max_questions: u32,
}

impl Default for SessionProfile {
    fn default() -> Self {
        Self {
            role: "Software Engineer".to_string(),
            session_type: "Technical".to_string(),
            experience_level: "Mid-level".to_string(),
            industry: "Technology".to_string(),
            max_questions: 10,
        }
    }
}

impl SessionProfile {
    /// Create a fresh NotStarted session for this profile
    pub fn into_session(self, user_id: impl Into<String>) -> Session {
        Session {
            id: format!("session-{}", Uuid::new_v4()),
            user_id: user_id.into(),
            role: self.role,
            session_type: self.session_type,
            experience_level: self.experience_level,
            industry: self.industry,
            status: SessionStatus::NotStarted,
            max_questions: self.max_questions,
            started_at: None,
            completed_at: None,
            final_score: None,
        }
    }
}
