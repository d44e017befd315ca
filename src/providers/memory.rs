use super::{Question, QuestionProvider, QuestionRequest, SaveInteraction, SessionPatch};
use super::{InteractionRecorder, SessionStore};
use crate::error::EngineError;
use crate::model::{Interaction, Session};
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

/// Scripted question provider for demos and tests
///
/// Serves the scripted questions in order, then falls back to numbered
/// follow-ups so a session can always reach its question limit.
pub struct MemoryQuestionProvider {
    questions: Vec<String>,
    cursor: Mutex<usize>,
}

impl MemoryQuestionProvider {
    pub fn new(questions: Vec<String>) -> Self {
        Self {
            questions,
            cursor: Mutex::new(0),
        }
    }
}

#[async_trait::async_trait]
impl QuestionProvider for MemoryQuestionProvider {
    async fn fetch_next(&self, request: QuestionRequest) -> Result<Question, EngineError> {
        let mut cursor = self.cursor.lock().await;
        let text = match self.questions.get(*cursor) {
            Some(q) => q.clone(),
            None => format!(
                "Tell me more about your {} experience (question {}).",
                request.role,
                *cursor + 1
            ),
        };
        *cursor += 1;

        Ok(Question { text })
    }
}

/// In-memory interaction recorder
///
/// Assigns order slots from the committed count and deduplicates retried
/// submits by attempt id.
#[derive(Default)]
pub struct MemoryInteractionRecorder {
    inner: Mutex<RecorderState>,
}

#[derive(Default)]
struct RecorderState {
    by_session: HashMap<String, Vec<Interaction>>,
    committed_attempts: HashMap<Uuid, (String, u32)>,
}

impl MemoryInteractionRecorder {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl InteractionRecorder for MemoryInteractionRecorder {
    async fn save(&self, interaction: SaveInteraction) -> Result<Interaction, EngineError> {
        let mut state = self.inner.lock().await;

        // Retried submit: return the record committed by the first attempt
        if let Some((session_id, order)) = state.committed_attempts.get(&interaction.attempt_id) {
            let session_id = session_id.clone();
            let order = *order;
            let existing = state
                .by_session
                .get(&session_id)
                .and_then(|list| list.iter().find(|i| i.order == order))
                .cloned();
            if let Some(existing) = existing {
                info!(
                    "Duplicate submit for attempt {}, returning committed order {}",
                    interaction.attempt_id, order
                );
                return Ok(existing);
            }
        }

        let list = state
            .by_session
            .entry(interaction.session_id.clone())
            .or_default();
        let order = list.len() as u32 + 1;

        let record = Interaction {
            session_id: interaction.session_id.clone(),
            order,
            question_text: interaction.question_text,
            answer_text: interaction.answer_text,
            input_method: interaction.input_method,
            timestamp: interaction.timestamp,
            time_spent_secs: interaction.time_spent_secs,
        };
        list.push(record.clone());
        state
            .committed_attempts
            .insert(interaction.attempt_id, (interaction.session_id, order));

        Ok(record)
    }

    async fn count(&self, session_id: &str) -> Result<u32, EngineError> {
        let state = self.inner.lock().await;
        Ok(state
            .by_session
            .get(session_id)
            .map(|list| list.len() as u32)
            .unwrap_or(0))
    }

    async fn list(&self, session_id: &str) -> Result<Vec<Interaction>, EngineError> {
        let state = self.inner.lock().await;
        Ok(state.by_session.get(session_id).cloned().unwrap_or_default())
    }
}

/// In-memory session store
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, session: Session) {
        self.sessions.lock().await.insert(session.id.clone(), session);
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, session_id: &str) -> Result<Session, EngineError> {
        self.sessions
            .lock()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))
    }

    async fn update(&self, session_id: &str, patch: SessionPatch) -> Result<Session, EngineError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| EngineError::SessionNotFound(session_id.to_string()))?;

        if let Some(status) = patch.status {
            session.status = status;
        }
        if let Some(started_at) = patch.started_at {
            session.started_at = Some(started_at);
        }
        if let Some(completed_at) = patch.completed_at {
            session.completed_at = Some(completed_at);
        }
        if let Some(final_score) = patch.final_score {
            session.final_score = Some(final_score);
        }

        Ok(session.clone())
    }
}
