pub mod capture;
pub mod config;
pub mod draft;
pub mod error;
pub mod guard;
pub mod model;
pub mod providers;
pub mod scoring;
pub mod session;
pub mod speech;

pub use capture::{AnswerCapture, TranscriptBuffer};
pub use config::EngineConfig;
pub use draft::{draft_key, restore_draft, DraftAutosave, DraftStore, FileDraftStore, MemoryDraftStore};
pub use error::{EngineError, ErrorClass};
pub use guard::{GuardAction, InterruptionGuard, PageEvent};
pub use model::{
    AnswerPayload, Draft, InputMethod, Interaction, QaPair, Session, SessionReport, SessionStatus,
};
pub use providers::{
    InteractionRecorder, MemoryInteractionRecorder, MemoryQuestionProvider, MemorySessionStore,
    Question, QuestionProvider, QuestionRequest, SaveInteraction, SessionPatch, SessionStore,
};
pub use scoring::ScoringFinalizer;
pub use session::{SessionController, SessionProfile};
pub use speech::{
    AdapterState, ScriptedSpeechBackend, SpeechBackend, SpeechCapability, SpeechErrorKind,
    SpeechEvent, SpeechRecognitionAdapter,
};
