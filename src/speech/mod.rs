//! Speech-to-text capture
//!
//! This module wraps the platform recognition stream behind a typed
//! backend trait and drives it through an explicit adapter state machine:
//! - `SpeechBackend`: start/stop plus a channel of interim/final events
//! - `SpeechRecognitionAdapter`: the only component allowed to mutate the
//!   transcript buffer from recognition events

mod adapter;
mod backend;
mod scripted;

pub use adapter::{AdapterState, SpeechRecognitionAdapter};
pub use backend::{SpeechBackend, SpeechCapability, SpeechErrorKind, SpeechEvent};
pub use scripted::ScriptedSpeechBackend;
