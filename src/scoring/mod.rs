//! Session finalization
//!
//! Computes the final score and applies the one atomic update that closes a
//! session. The score is coverage-based only (answered / max); it does not
//! look at answer content. See DESIGN.md before treating it as product truth.

use crate::error::EngineError;
use crate::model::{Session, SessionStatus};
use crate::providers::{SessionPatch, SessionStore};
use chrono::Utc;
use tracing::info;

pub struct ScoringFinalizer;

impl ScoringFinalizer {
    /// Completion-ratio score, clamped to 0..=100
    pub fn score(answered: u32, max_questions: u32) -> u8 {
        if max_questions == 0 {
            return 0;
        }
        let ratio = answered as f64 / max_questions as f64;
        (ratio * 100.0).round().clamp(0.0, 100.0) as u8
    }

    /// Close the session: one atomic update setting status, score and
    /// completion time
    ///
    /// The caller (SessionController) guarantees this runs at most once per
    /// session via its terminal-state check.
    pub async fn finalize(
        store: &dyn SessionStore,
        session: &Session,
        answered: u32,
    ) -> Result<Session, EngineError> {
        let score = Self::score(answered, session.max_questions);

        info!(
            "Finalizing session {}: {}/{} answered, score {}",
            session.id, answered, session.max_questions, score
        );

        store
            .update(
                &session.id,
                SessionPatch {
                    status: Some(SessionStatus::Completed),
                    completed_at: Some(Utc::now()),
                    final_score: Some(score),
                    ..Default::default()
                },
            )
            .await
    }
}
