// Integration tests for the session controller
//
// These drive full sessions through in-memory collaborators and a scripted
// speech backend, checking ordering, progression and failure recovery.

use interview_engine::{
    EngineConfig, EngineError, InputMethod, Interaction, InteractionRecorder,
    MemoryDraftStore, MemoryInteractionRecorder, MemoryQuestionProvider, MemorySessionStore,
    Question, QuestionProvider, QuestionRequest, SaveInteraction, ScriptedSpeechBackend, Session,
    SessionController, SessionPatch, SessionProfile, SessionStatus, SessionStore, SpeechEvent,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn profile(max_questions: u32) -> SessionProfile {
    SessionProfile {
        role: "Software Engineer".to_string(),
        session_type: "Technical".to_string(),
        max_questions,
        ..Default::default()
    }
}

struct Harness {
    controller: Arc<SessionController>,
    recorder: Arc<MemoryInteractionRecorder>,
    store: Arc<MemorySessionStore>,
    session_id: String,
}

async fn build_harness(max_questions: u32, backend: ScriptedSpeechBackend) -> Harness {
    let session = profile(max_questions).into_session("test-user");
    let session_id = session.id.clone();

    let store = Arc::new(MemorySessionStore::new());
    store.insert(session.clone()).await;

    let questions = Arc::new(MemoryQuestionProvider::new(vec![
        "Tell me about yourself.".to_string(),
        "Describe a recent project.".to_string(),
        "What are your strengths?".to_string(),
    ]));
    let recorder = Arc::new(MemoryInteractionRecorder::new());
    let drafts = Arc::new(MemoryDraftStore::new());

    let controller = Arc::new(SessionController::new(
        session,
        store.clone(),
        questions,
        recorder.clone(),
        drafts,
        Box::new(backend),
        &EngineConfig::default(),
    ));

    Harness {
        controller,
        recorder,
        store,
        session_id,
    }
}

fn assert_gapless(interactions: &[Interaction]) {
    for (i, interaction) in interactions.iter().enumerate() {
        assert_eq!(
            interaction.order,
            i as u32 + 1,
            "orders must be 1..N with no gaps or duplicates"
        );
    }
}

// Scenario A: voice answer end-to-end, then the next question is fetched.
#[tokio::test]
async fn voice_answer_persists_and_fetches_next_question() {
    let mut backend = ScriptedSpeechBackend::supported();
    backend.push_script(vec![
        SpeechEvent::Interim("I have".to_string()),
        SpeechEvent::Final("I have 5 years experience".to_string()),
        SpeechEvent::End,
    ]);

    let h = build_harness(10, backend).await;
    h.controller.start().await.unwrap();
    assert_eq!(
        h.controller.current_question_text().await.as_deref(),
        Some("Tell me about yourself.")
    );

    h.controller.start_capture().await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    h.controller.stop_capture().await.unwrap();

    let interaction = h.controller.submit_answer().await.unwrap();
    assert_eq!(interaction.order, 1);
    assert_eq!(interaction.answer_text, "I have 5 years experience");
    assert_eq!(interaction.input_method, InputMethod::Voice);

    // Progressed to question 2
    assert_eq!(
        h.controller.current_question_text().await.as_deref(),
        Some("Describe a recent project.")
    );

    let committed = h.recorder.list(&h.session_id).await.unwrap();
    assert_eq!(committed.len(), 1);
    assert_gapless(&committed);
}

#[tokio::test]
async fn start_requires_not_started() {
    let h = build_harness(10, ScriptedSpeechBackend::supported()).await;
    h.controller.start().await.unwrap();

    match h.controller.start().await {
        Err(EngineError::InvalidTransition { from, to }) => {
            assert_eq!(from, SessionStatus::Active);
            assert_eq!(to, SessionStatus::Active);
        }
        other => panic!("expected InvalidTransition, got {:?}", other.map(|_| ())),
    }
}

/// Session store that counts how many updates set status Completed
struct CountingStore {
    inner: Arc<MemorySessionStore>,
    completions: AtomicUsize,
}

#[async_trait::async_trait]
impl SessionStore for CountingStore {
    async fn get(&self, session_id: &str) -> Result<Session, EngineError> {
        self.inner.get(session_id).await
    }

    async fn update(&self, session_id: &str, patch: SessionPatch) -> Result<Session, EngineError> {
        if patch.status == Some(SessionStatus::Completed) {
            self.completions.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.update(session_id, patch).await
    }
}

#[tokio::test]
async fn session_auto_completes_at_question_limit_with_one_finalize() {
    let max = 3;
    let session = profile(max).into_session("test-user");
    let session_id = session.id.clone();

    let inner = Arc::new(MemorySessionStore::new());
    inner.insert(session.clone()).await;
    let store = Arc::new(CountingStore {
        inner,
        completions: AtomicUsize::new(0),
    });

    let controller = SessionController::new(
        session,
        store.clone(),
        Arc::new(MemoryQuestionProvider::new(vec![])),
        Arc::new(MemoryInteractionRecorder::new()),
        Arc::new(MemoryDraftStore::new()),
        Box::new(ScriptedSpeechBackend::supported()),
        &EngineConfig::default(),
    );

    controller.start().await.unwrap();

    for i in 0..max {
        controller
            .set_answer_text(&format!("answer {}", i + 1))
            .await
            .unwrap();
        controller.submit_answer().await.unwrap();
    }

    let session = controller.session().await;
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.final_score, Some(100));
    assert!(session.completed_at.is_some());
    assert_eq!(store.completions.load(Ordering::SeqCst), 1);

    // Ending an already-completed session has no additional effect
    let report = controller.end_interview().await.unwrap();
    assert_eq!(report.session_id, session_id);
    assert_eq!(report.questions_answered, max);
    assert_eq!(store.completions.load(Ordering::SeqCst), 1);
}

/// Recorder that sleeps before committing, to hold a submit in flight
struct SlowRecorder {
    inner: MemoryInteractionRecorder,
    delay: Duration,
}

#[async_trait::async_trait]
impl InteractionRecorder for SlowRecorder {
    async fn save(&self, interaction: SaveInteraction) -> Result<Interaction, EngineError> {
        tokio::time::sleep(self.delay).await;
        self.inner.save(interaction).await
    }

    async fn count(&self, session_id: &str) -> Result<u32, EngineError> {
        self.inner.count(session_id).await
    }

    async fn list(&self, session_id: &str) -> Result<Vec<Interaction>, EngineError> {
        self.inner.list(session_id).await
    }
}

#[tokio::test]
async fn second_submit_while_one_in_flight_is_rejected() {
    let session = profile(10).into_session("test-user");
    let session_id = session.id.clone();

    let store = Arc::new(MemorySessionStore::new());
    store.insert(session.clone()).await;
    let recorder = Arc::new(SlowRecorder {
        inner: MemoryInteractionRecorder::new(),
        delay: Duration::from_millis(80),
    });

    let controller = Arc::new(SessionController::new(
        session,
        store,
        Arc::new(MemoryQuestionProvider::new(vec![])),
        recorder.clone(),
        Arc::new(MemoryDraftStore::new()),
        Box::new(ScriptedSpeechBackend::supported()),
        &EngineConfig::default(),
    ));

    controller.start().await.unwrap();
    controller.set_answer_text("first answer").await.unwrap();

    let racing = Arc::clone(&controller);
    let first = tokio::spawn(async move { racing.submit_answer().await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    match controller.submit_answer().await {
        Err(EngineError::SubmitInFlight) => {}
        other => panic!("expected SubmitInFlight, got {:?}", other.map(|_| ())),
    }

    let interaction = first.await.unwrap().unwrap();
    assert_eq!(interaction.order, 1);

    let committed = recorder.list(&session_id).await.unwrap();
    assert_eq!(committed.len(), 1, "only one submit may win the slot");
    assert_gapless(&committed);
}

/// Recorder that fails a configurable number of saves before succeeding
struct FlakyRecorder {
    inner: MemoryInteractionRecorder,
    failures_left: AtomicUsize,
}

#[async_trait::async_trait]
impl InteractionRecorder for FlakyRecorder {
    async fn save(&self, interaction: SaveInteraction) -> Result<Interaction, EngineError> {
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(EngineError::SaveFailed {
                message: "network unreachable".to_string(),
            });
        }
        self.inner.save(interaction).await
    }

    async fn count(&self, session_id: &str) -> Result<u32, EngineError> {
        self.inner.count(session_id).await
    }

    async fn list(&self, session_id: &str) -> Result<Vec<Interaction>, EngineError> {
        self.inner.list(session_id).await
    }
}

// Scenario B: offline submit fails, buffer retained, retry commits exactly once.
#[tokio::test]
async fn failed_save_retains_buffer_and_retry_commits_once() {
    use interview_engine::{GuardAction, PageEvent};

    let session = profile(10).into_session("test-user");
    let session_id = session.id.clone();

    let store = Arc::new(MemorySessionStore::new());
    store.insert(session.clone()).await;
    let recorder = Arc::new(FlakyRecorder {
        inner: MemoryInteractionRecorder::new(),
        failures_left: AtomicUsize::new(1),
    });

    let controller = SessionController::new(
        session,
        store,
        Arc::new(MemoryQuestionProvider::new(vec![])),
        recorder.clone(),
        Arc::new(MemoryDraftStore::new()),
        Box::new(ScriptedSpeechBackend::supported()),
        &EngineConfig::default(),
    );

    controller.start().await.unwrap();
    controller.set_answer_text("my answer").await.unwrap();

    let offline = controller.handle_page_event(PageEvent::Offline).await.unwrap();
    assert_eq!(offline, GuardAction::MarkOffline);
    assert!(controller.is_offline().await);

    let err = controller.submit_answer().await.unwrap_err();
    assert!(err.is_retryable(), "save failure must be retryable: {}", err);

    // Progression blocked, answer retained, session still Active
    assert_eq!(controller.answer_text().await, "my answer");
    assert_eq!(controller.status().await, SessionStatus::Active);
    assert_eq!(recorder.count(&session_id).await.unwrap(), 0);

    let online = controller.handle_page_event(PageEvent::Online).await.unwrap();
    assert_eq!(online, GuardAction::ClearOffline);

    let interaction = controller.submit_answer().await.unwrap();
    assert_eq!(interaction.order, 1);
    assert_eq!(interaction.answer_text, "my answer");

    let committed = recorder.list(&session_id).await.unwrap();
    assert_eq!(committed.len(), 1, "retry must not duplicate the interaction");
    assert_gapless(&committed);
}

#[tokio::test]
async fn discard_after_failed_save_allows_moving_on() {
    let session = profile(10).into_session("test-user");

    let store = Arc::new(MemorySessionStore::new());
    store.insert(session.clone()).await;
    let recorder = Arc::new(FlakyRecorder {
        inner: MemoryInteractionRecorder::new(),
        failures_left: AtomicUsize::new(1),
    });

    let controller = SessionController::new(
        session,
        store,
        Arc::new(MemoryQuestionProvider::new(vec![])),
        recorder,
        Arc::new(MemoryDraftStore::new()),
        Box::new(ScriptedSpeechBackend::supported()),
        &EngineConfig::default(),
    );

    controller.start().await.unwrap();
    controller.set_answer_text("doomed answer").await.unwrap();
    controller.submit_answer().await.unwrap_err();

    controller.discard_pending().await.unwrap();
    assert_eq!(controller.answer_text().await, "");

    // Empty submits are rejected client-side
    match controller.submit_answer().await {
        Err(EngineError::EmptyAnswer) => {}
        other => panic!("expected EmptyAnswer, got {:?}", other.map(|_| ())),
    }
}

/// Provider that fails its first fetch
struct FlakyProvider {
    inner: MemoryQuestionProvider,
    fail_first: AtomicBool,
}

#[async_trait::async_trait]
impl QuestionProvider for FlakyProvider {
    async fn fetch_next(&self, request: QuestionRequest) -> Result<Question, EngineError> {
        if self.fail_first.swap(false, Ordering::SeqCst) {
            return Err(EngineError::QuestionFetch {
                status: Some(503),
                message: "provider unavailable".to_string(),
            });
        }
        self.inner.fetch_next(request).await
    }
}

#[tokio::test]
async fn fetch_failure_is_recoverable_with_manual_retry() {
    let session = profile(10).into_session("test-user");

    let store = Arc::new(MemorySessionStore::new());
    store.insert(session.clone()).await;

    let controller = SessionController::new(
        session,
        store,
        Arc::new(FlakyProvider {
            inner: MemoryQuestionProvider::new(vec!["Q1".to_string()]),
            fail_first: AtomicBool::new(true),
        }),
        Arc::new(MemoryInteractionRecorder::new()),
        Arc::new(MemoryDraftStore::new()),
        Box::new(ScriptedSpeechBackend::supported()),
        &EngineConfig::default(),
    );

    let err = controller.start().await.unwrap_err();
    assert!(err.is_retryable());

    // Session stays Active with no question on screen
    assert_eq!(controller.status().await, SessionStatus::Active);
    assert_eq!(controller.current_question_text().await, None);

    controller.retry_fetch().await.unwrap();
    assert_eq!(controller.current_question_text().await.as_deref(), Some("Q1"));
}

#[tokio::test]
async fn skip_records_an_ordered_skip_interaction() {
    let h = build_harness(10, ScriptedSpeechBackend::supported()).await;
    h.controller.start().await.unwrap();

    let skipped = h.controller.skip_question().await.unwrap();
    assert_eq!(skipped.order, 1);
    assert_eq!(skipped.input_method, InputMethod::Skip);
    assert_eq!(skipped.answer_text, "");

    h.controller.set_answer_text("real answer").await.unwrap();
    let answered = h.controller.submit_answer().await.unwrap();
    assert_eq!(answered.order, 2);

    let committed = h.recorder.list(&h.session_id).await.unwrap();
    assert_gapless(&committed);
}

#[tokio::test]
async fn end_interview_flushes_pending_answer_and_is_idempotent() {
    let h = build_harness(10, ScriptedSpeechBackend::supported()).await;
    h.controller.start().await.unwrap();

    h.controller.set_answer_text("only answer").await.unwrap();
    let report = h.controller.end_interview().await.unwrap();

    assert_eq!(report.questions_answered, 1);
    assert_eq!(report.final_score, 10); // 1 of 10
    assert_eq!(h.controller.status().await, SessionStatus::Completed);

    let again = h.controller.end_interview().await.unwrap();
    assert_eq!(again.questions_answered, 1);
    assert_eq!(again.final_score, 10);

    let stored = h.store.get(&h.session_id).await.unwrap();
    assert_eq!(stored.final_score, Some(10));
}

#[tokio::test]
async fn pause_and_resume_keep_question_and_interactions() {
    let h = build_harness(10, ScriptedSpeechBackend::supported()).await;
    h.controller.start().await.unwrap();

    let question = h.controller.current_question_text().await;

    h.controller.pause().await.unwrap();
    assert_eq!(h.controller.status().await, SessionStatus::Paused);

    // Submitting while paused is rejected
    h.controller.set_answer_text("answer").await.unwrap();
    assert!(h.controller.submit_answer().await.is_err());

    h.controller.resume().await.unwrap();
    assert_eq!(h.controller.status().await, SessionStatus::Active);
    assert_eq!(h.controller.current_question_text().await, question);

    let interaction = h.controller.submit_answer().await.unwrap();
    assert_eq!(interaction.order, 1);
}

#[tokio::test]
async fn abandon_is_terminal() {
    let h = build_harness(10, ScriptedSpeechBackend::supported()).await;
    h.controller.start().await.unwrap();

    h.controller.abandon().await.unwrap();
    assert_eq!(h.controller.status().await, SessionStatus::Abandoned);

    assert!(h.controller.start().await.is_err());
    assert!(h.controller.end_interview().await.is_err());
    let stored = h.store.get(&h.session_id).await.unwrap();
    assert_eq!(stored.status, SessionStatus::Abandoned);
    assert_eq!(stored.final_score, None);
}

#[tokio::test]
async fn hidden_tab_while_capturing_pauses_capture() {
    use interview_engine::{GuardAction, PageEvent};

    let mut backend = ScriptedSpeechBackend::supported();
    backend.push_script(vec![SpeechEvent::Final("partial thought".to_string())]);

    let h = build_harness(10, backend).await;
    h.controller.start().await.unwrap();
    h.controller.start_capture().await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let action = h.controller.handle_page_event(PageEvent::Hidden).await.unwrap();
    assert_eq!(action, GuardAction::PauseCapture);

    // Committed speech survived the interruption
    assert_eq!(h.controller.answer_text().await, "partial thought");

    // Unload with unsaved work warns; the draft is the real safety net
    let warn = h
        .controller
        .handle_page_event(PageEvent::BeforeUnload)
        .await
        .unwrap();
    assert_eq!(warn, GuardAction::WarnUnsavedAnswer);
}
