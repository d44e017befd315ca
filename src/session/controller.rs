use crate::capture::{AnswerCapture, TranscriptBuffer};
use crate::config::EngineConfig;
use crate::draft::{self, DraftAutosave, DraftStore};
use crate::error::EngineError;
use crate::guard::{GuardAction, InterruptionGuard, PageEvent};
use crate::model::{
    AnswerPayload, InputMethod, Interaction, QaPair, Session, SessionReport, SessionStatus,
};
use crate::providers::{
    InteractionRecorder, QuestionProvider, QuestionRequest, SaveInteraction, SessionPatch,
    SessionStore,
};
use crate::scoring::ScoringFinalizer;
use crate::speech::{SpeechBackend, SpeechErrorKind, SpeechRecognitionAdapter};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

/// The question currently on screen
#[derive(Debug, Clone)]
struct CurrentQuestion {
    text: String,
    /// 1-based display position
    number: u32,
}

/// Drives one practice session end-to-end
///
/// The controller is the sole mutator of session status and progression. It
/// owns the capture buffer, the speech adapter, the per-question autosave
/// task and the submit gate that keeps interaction commits strictly
/// sequential.
pub struct SessionController {
    /// Explicit session object; nothing in the crate holds global session state
    session: Mutex<Session>,

    store: Arc<dyn SessionStore>,
    questions: Arc<dyn QuestionProvider>,
    recorder: Arc<dyn InteractionRecorder>,
    drafts: Arc<dyn DraftStore>,

    capture: Arc<Mutex<AnswerCapture>>,
    transcript: Arc<Mutex<TranscriptBuffer>>,
    speech: Mutex<SpeechRecognitionAdapter>,
    guard: Mutex<InterruptionGuard>,

    current_question: Mutex<Option<CurrentQuestion>>,
    history: Mutex<Vec<QaPair>>,

    /// Held for the full duration of one commit; a second submit while one
    /// is in flight fails rather than queueing
    submit_gate: Mutex<()>,

    /// Attempt id reused across retries of the same logical answer so the
    /// recorder can deduplicate
    pending_attempt: Mutex<Option<Uuid>>,

    /// Bumped per fetch; a resolution from an older epoch is discarded
    fetch_epoch: AtomicU64,

    /// Autosave task for the current question, torn down on question change
    autosave: Mutex<Option<DraftAutosave>>,
    autosave_interval: Duration,

    finalized: AtomicBool,

    /// Set after a NotAllowed speech error; blocks speech starts until an
    /// explicit retry
    speech_suspended: AtomicBool,
}

impl SessionController {
    pub fn new(
        session: Session,
        store: Arc<dyn SessionStore>,
        questions: Arc<dyn QuestionProvider>,
        recorder: Arc<dyn InteractionRecorder>,
        drafts: Arc<dyn DraftStore>,
        speech_backend: Box<dyn SpeechBackend>,
        config: &EngineConfig,
    ) -> Self {
        let transcript = Arc::new(Mutex::new(TranscriptBuffer::new()));
        let speech = SpeechRecognitionAdapter::new(speech_backend, Arc::clone(&transcript));

        info!("Session controller created for {}", session.id);

        Self {
            session: Mutex::new(session),
            store,
            questions,
            recorder,
            drafts,
            capture: Arc::new(Mutex::new(AnswerCapture::new(config.capture.answer_max_chars))),
            transcript,
            speech: Mutex::new(speech),
            guard: Mutex::new(InterruptionGuard::new()),
            current_question: Mutex::new(None),
            history: Mutex::new(Vec::new()),
            submit_gate: Mutex::new(()),
            pending_attempt: Mutex::new(None),
            fetch_epoch: AtomicU64::new(0),
            autosave: Mutex::new(None),
            autosave_interval: config.autosave_interval(),
            finalized: AtomicBool::new(false),
            speech_suspended: AtomicBool::new(false),
        }
    }

    // ---- lifecycle ----------------------------------------------------

    /// Begin the session and fetch the first question
    pub async fn start(&self) -> Result<(), EngineError> {
        self.transition(SessionStatus::Active, |patch| {
            patch.started_at = Some(Utc::now());
        })
        .await?;

        info!("Session started");
        self.fetch_question().await
    }

    /// Pause: stop capture without touching interactions or question state
    pub async fn pause(&self) -> Result<(), EngineError> {
        self.transition(SessionStatus::Paused, |_| {}).await?;

        self.stop_capture().await?;
        self.capture.lock().await.pause_timer();
        info!("Session paused");
        Ok(())
    }

    pub async fn resume(&self) -> Result<(), EngineError> {
        self.transition(SessionStatus::Active, |_| {}).await?;

        self.capture.lock().await.resume_timer();
        info!("Session resumed");
        Ok(())
    }

    /// Mark the session abandoned; used after an interruption confirmation
    pub async fn abandon(&self) -> Result<(), EngineError> {
        self.transition(SessionStatus::Abandoned, |_| {}).await?;

        self.teardown().await;
        info!("Session abandoned");
        Ok(())
    }

    /// Finish the session early
    ///
    /// Flushes any unsaved answer (one best-effort attempt) and finalizes.
    /// Idempotent: a second call returns the existing report.
    pub async fn end_interview(&self) -> Result<SessionReport, EngineError> {
        {
            let session = self.session.lock().await;
            if session.status == SessionStatus::Completed {
                drop(session);
                return self.report().await;
            }
            if session.status == SessionStatus::Abandoned {
                return Err(EngineError::InvalidTransition {
                    from: SessionStatus::Abandoned,
                    to: SessionStatus::Completed,
                });
            }
        }

        self.stop_capture().await.ok();

        // Flush the pending answer, if any; a failure here loses the flush,
        // not the session
        let flush_payload = {
            let capture = self.capture.lock().await;
            if capture.is_empty() {
                None
            } else {
                capture.snapshot().ok()
            }
        };
        if let Some(payload) = flush_payload {
            if let Err(e) = self.commit(payload).await {
                warn!("Best-effort flush on end failed: {}", e);
            }
        }

        let answered = self.recorder.count(&self.session_id().await).await?;
        self.finalize(answered).await?;
        self.report().await
    }

    // ---- questions ----------------------------------------------------

    /// Fetch the next question from the provider
    ///
    /// The resolution is checked against the fetch epoch and session status:
    /// a response landing after a newer fetch, a pause or an end is discarded
    /// (the underlying fetch is not abortable, so this is the cancellation
    /// mechanism).
    pub async fn fetch_question(&self) -> Result<(), EngineError> {
        let epoch = self.fetch_epoch.fetch_add(1, Ordering::SeqCst) + 1;

        let request = {
            let session = self.session.lock().await;
            if session.status != SessionStatus::Active {
                return Err(EngineError::InvalidTransition {
                    from: session.status,
                    to: SessionStatus::Active,
                });
            }
            QuestionRequest {
                role: session.role.clone(),
                session_type: session.session_type.clone(),
                experience_level: session.experience_level.clone(),
                industry: session.industry.clone(),
                history: self.history.lock().await.clone(),
            }
        };

        let question = self.questions.fetch_next(request).await?;

        // Stale resolution: a newer fetch started, or the session moved on
        if self.fetch_epoch.load(Ordering::SeqCst) != epoch
            || self.session.lock().await.status != SessionStatus::Active
        {
            info!("Discarding stale question fetch (epoch {})", epoch);
            return Ok(());
        }

        let number = self.history.lock().await.len() as u32 + 1;
        info!("Question {} ready", number);

        {
            let mut current = self.current_question.lock().await;
            *current = Some(CurrentQuestion {
                text: question.text.clone(),
                number,
            });
        }

        let session_id = self.session_id().await;
        {
            let mut capture = self.capture.lock().await;
            capture.begin_question();
            self.transcript.lock().await.clear();
            draft::restore_draft(self.drafts.as_ref(), &session_id, &question.text, &mut capture);
        }
        *self.pending_attempt.lock().await = None;

        // Replace the previous question's autosave task
        let mut autosave = self.autosave.lock().await;
        if let Some(mut old) = autosave.take() {
            old.stop();
        }
        *autosave = Some(DraftAutosave::start(
            Arc::clone(&self.drafts),
            session_id,
            question.text,
            Arc::clone(&self.capture),
            self.autosave_interval,
        ));

        Ok(())
    }

    /// Manual retry after a failed fetch
    pub async fn retry_fetch(&self) -> Result<(), EngineError> {
        self.fetch_question().await
    }

    // ---- capture ------------------------------------------------------

    /// Start voice capture for the current question
    pub async fn start_capture(&self) -> Result<(), EngineError> {
        self.require_active().await?;
        self.require_question().await?;

        if self.speech_suspended.load(Ordering::SeqCst) {
            return Err(EngineError::SpeechUnavailable(SpeechErrorKind::NotAllowed));
        }

        let result = self.speech.lock().await.start().await;
        if let Err(EngineError::SpeechUnavailable(SpeechErrorKind::NotAllowed)) = &result {
            self.speech_suspended.store(true, Ordering::SeqCst);
        }
        result?;

        self.capture.lock().await.resume_timer();
        Ok(())
    }

    /// Stop voice capture and fold committed speech into the answer buffer
    pub async fn stop_capture(&self) -> Result<(), EngineError> {
        {
            let mut speech = self.speech.lock().await;
            speech.stop().await?;
            if speech.last_error().await == Some(SpeechErrorKind::NotAllowed) {
                self.speech_suspended.store(true, Ordering::SeqCst);
            }
        }
        self.sync_transcript().await
    }

    /// Re-arm speech after a permission error; nothing starts until the
    /// next explicit `start_capture`
    pub async fn retry_speech(&self) {
        self.speech_suspended.store(false, Ordering::SeqCst);
        self.speech.lock().await.clear_error().await;
    }

    /// Replace the answer buffer with typed text
    pub async fn set_answer_text(&self, text: &str) -> Result<(), EngineError> {
        self.require_question().await?;
        self.capture.lock().await.set_text(text)
    }

    /// Committed answer text plus any live interim fragment, for display
    pub async fn display_text(&self) -> String {
        let answer = self.capture.lock().await.text().to_string();
        let transcript = self.transcript.lock().await.display_text();
        if transcript.is_empty() {
            answer
        } else if answer.is_empty() {
            transcript
        } else {
            format!("{} {}", answer, transcript)
        }
    }

    async fn sync_transcript(&self) -> Result<(), EngineError> {
        let committed = self.transcript.lock().await.take_committed();
        if committed.is_empty() {
            return Ok(());
        }
        self.capture.lock().await.append_voice(&committed)
    }

    // ---- submission ---------------------------------------------------

    /// Submit the buffered answer for the current question
    ///
    /// Strictly sequential: a second submit while one is in flight fails
    /// with `SubmitInFlight`. On success the next question is fetched, or
    /// the session finalizes when the question limit is reached. On failure
    /// the buffer is retained unchanged and progression is blocked.
    pub async fn submit_answer(&self) -> Result<Interaction, EngineError> {
        let _gate = self
            .submit_gate
            .try_lock()
            .map_err(|_| EngineError::SubmitInFlight)?;

        self.require_active().await?;
        self.require_question().await?;

        self.stop_capture().await?;
        let payload = self.capture.lock().await.snapshot()?;
        self.advance(payload).await
    }

    /// Record an explicit skip for the current question and advance
    pub async fn skip_question(&self) -> Result<Interaction, EngineError> {
        let _gate = self
            .submit_gate
            .try_lock()
            .map_err(|_| EngineError::SubmitInFlight)?;

        self.require_active().await?;
        self.require_question().await?;

        self.stop_capture().await.ok();
        let payload = self.capture.lock().await.skip_snapshot();
        self.advance(payload).await
    }

    /// Drop the buffered answer after a failed save, staying on the current
    /// question
    pub async fn discard_pending(&self) -> Result<(), EngineError> {
        self.require_question().await?;

        {
            let mut capture = self.capture.lock().await;
            capture.clear();
            capture.resume_timer();
        }
        self.transcript.lock().await.clear();
        *self.pending_attempt.lock().await = None;

        let key = draft::draft_key(&self.session_id().await);
        if let Err(e) = self.drafts.remove(&key) {
            warn!("Failed to clear draft on discard: {:#}", e);
        }
        Ok(())
    }

    /// Commit a payload and progress: next question or finalize
    async fn advance(&self, payload: AnswerPayload) -> Result<Interaction, EngineError> {
        let interaction = self.commit(payload).await?;

        let session_id = self.session_id().await;
        {
            let mut capture = self.capture.lock().await;
            capture.clear();
        }
        self.transcript.lock().await.clear();
        *self.current_question.lock().await = None;

        let key = draft::draft_key(&session_id);
        if let Err(e) = self.drafts.remove(&key) {
            warn!("Failed to clear committed draft: {:#}", e);
        }

        self.history.lock().await.push(QaPair {
            question: interaction.question_text.clone(),
            answer: interaction.answer_text.clone(),
        });

        // Progression decision from the authoritative count, not a local counter
        let committed = self.recorder.count(&session_id).await?;
        let max_questions = self.session.lock().await.max_questions;

        if committed >= max_questions {
            info!("Question limit reached ({}/{})", committed, max_questions);
            self.finalize(committed).await?;
        } else if let Err(e) = self.fetch_question().await {
            // The commit stands; surface the fetch failure for a manual retry
            warn!("Next question fetch failed: {}", e);
            return Err(e);
        }

        Ok(interaction)
    }

    /// One recorder save attempt for the current question
    ///
    /// The attempt id is created on the first try and reused on retries so
    /// the recorder can return the already-committed record instead of
    /// writing a duplicate.
    async fn commit(&self, payload: AnswerPayload) -> Result<Interaction, EngineError> {
        let question_text = self
            .current_question
            .lock()
            .await
            .as_ref()
            .map(|q| q.text.clone())
            .ok_or(EngineError::NoCurrentQuestion)?;

        let attempt_id = {
            let mut pending = self.pending_attempt.lock().await;
            *pending.get_or_insert_with(Uuid::new_v4)
        };

        let save = SaveInteraction {
            session_id: self.session_id().await,
            attempt_id,
            question_text,
            answer_text: payload.text,
            input_method: payload.input_method,
            timestamp: payload.timestamp,
            time_spent_secs: payload.time_spent_secs,
        };

        let interaction = self.recorder.save(save).await?;
        *self.pending_attempt.lock().await = None;

        info!(
            "Interaction {} committed ({:?}, {}s)",
            interaction.order, interaction.input_method, interaction.time_spent_secs
        );
        Ok(interaction)
    }

    // ---- interruption -------------------------------------------------

    /// Feed a platform page/connectivity event through the guard and apply
    /// the resulting action
    pub async fn handle_page_event(&self, event: PageEvent) -> Result<GuardAction, EngineError> {
        let capturing = self.speech.lock().await.is_listening().await;
        let dirty = !self.capture.lock().await.is_empty();

        let action = self.guard.lock().await.on_event(event, capturing, dirty);

        match action {
            GuardAction::PauseCapture => {
                self.stop_capture().await?;
                self.capture.lock().await.pause_timer();
            }
            GuardAction::WarnUnsavedAnswer
            | GuardAction::MarkOffline
            | GuardAction::ClearOffline
            | GuardAction::None => {}
        }

        Ok(action)
    }

    pub async fn is_offline(&self) -> bool {
        self.guard.lock().await.is_offline()
    }

    // ---- accessors ----------------------------------------------------

    pub async fn session(&self) -> Session {
        self.session.lock().await.clone()
    }

    pub async fn status(&self) -> SessionStatus {
        self.session.lock().await.status
    }

    pub async fn current_question_text(&self) -> Option<String> {
        self.current_question
            .lock()
            .await
            .as_ref()
            .map(|q| q.text.clone())
    }

    pub async fn current_question_number(&self) -> Option<u32> {
        self.current_question.lock().await.as_ref().map(|q| q.number)
    }

    pub async fn answer_text(&self) -> String {
        self.capture.lock().await.text().to_string()
    }

    /// Session summary from the authoritative stores
    pub async fn report(&self) -> Result<SessionReport, EngineError> {
        let session = self.session().await;
        let interactions = self.recorder.list(&session.id).await?;

        let skipped = interactions
            .iter()
            .filter(|i| i.input_method == InputMethod::Skip)
            .count() as u32;
        let answered = interactions.len() as u32 - skipped;

        let duration_secs = match (session.started_at, session.completed_at) {
            (Some(start), Some(end)) => (end - start).num_seconds().max(0) as u64,
            _ => 0,
        };

        Ok(SessionReport {
            session_id: session.id,
            questions_answered: answered,
            questions_skipped: skipped,
            final_score: session.final_score.unwrap_or(0),
            duration_secs,
        })
    }

    // ---- internals ----------------------------------------------------

    async fn session_id(&self) -> String {
        self.session.lock().await.id.clone()
    }

    async fn require_active(&self) -> Result<(), EngineError> {
        let session = self.session.lock().await;
        if session.status != SessionStatus::Active {
            return Err(EngineError::InvalidTransition {
                from: session.status,
                to: SessionStatus::Active,
            });
        }
        Ok(())
    }

    async fn require_question(&self) -> Result<(), EngineError> {
        if self.current_question.lock().await.is_none() {
            return Err(EngineError::NoCurrentQuestion);
        }
        Ok(())
    }

    /// Validate and apply a status transition through the store, then mirror
    /// it locally
    async fn transition(
        &self,
        to: SessionStatus,
        fill: impl FnOnce(&mut SessionPatch),
    ) -> Result<(), EngineError> {
        let (id, from) = {
            let session = self.session.lock().await;
            (session.id.clone(), session.status)
        };

        if !from.can_transition_to(to) {
            return Err(EngineError::InvalidTransition { from, to });
        }

        let mut patch = SessionPatch {
            status: Some(to),
            ..Default::default()
        };
        fill(&mut patch);

        let updated = self.store.update(&id, patch).await?;
        *self.session.lock().await = updated;
        Ok(())
    }

    /// Close the session exactly once
    async fn finalize(&self, answered: u32) -> Result<(), EngineError> {
        if self.finalized.swap(true, Ordering::SeqCst) {
            info!("Finalize already ran, ignoring");
            return Ok(());
        }

        let session = self.session().await;
        if session.status.is_terminal() {
            return Ok(());
        }
        if !session.status.can_transition_to(SessionStatus::Completed) {
            self.finalized.store(false, Ordering::SeqCst);
            return Err(EngineError::InvalidTransition {
                from: session.status,
                to: SessionStatus::Completed,
            });
        }

        self.teardown().await;

        match ScoringFinalizer::finalize(self.store.as_ref(), &session, answered).await {
            Ok(updated) => {
                *self.session.lock().await = updated;
                Ok(())
            }
            Err(e) => {
                // Allow a retry of the closing update
                self.finalized.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    /// Stop capture and the autosave task
    async fn teardown(&self) {
        if let Err(e) = self.stop_capture().await {
            warn!("Capture stop during teardown failed: {}", e);
        }
        if let Some(mut autosave) = self.autosave.lock().await.take() {
            autosave.stop();
        }
        *self.current_question.lock().await = None;
    }
}
