use super::backend::{SpeechBackend, SpeechCapability, SpeechErrorKind, SpeechEvent};
use crate::capture::TranscriptBuffer;
use crate::error::EngineError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Adapter lifecycle state
///
/// Recognition callbacks may only mutate the transcript through this state
/// machine; events that arrive outside `Listening` are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterState {
    Idle,
    Listening,
    Stopping,
    Errored(SpeechErrorKind),
}

/// Wraps exactly one recognition stream and routes its events into the
/// transcript buffer
pub struct SpeechRecognitionAdapter {
    backend: Box<dyn SpeechBackend>,

    /// Resolved once at construction, never re-checked per interaction
    capability: SpeechCapability,

    state: Arc<Mutex<AdapterState>>,

    /// Transcript the event pump writes into
    buffer: Arc<Mutex<TranscriptBuffer>>,

    /// Bumped on every stop/restart; the pump drops events from a stale
    /// generation so a disposed stream can never mutate the buffer
    generation: Arc<AtomicU64>,

    pump_handle: Option<JoinHandle<()>>,
}

impl SpeechRecognitionAdapter {
    pub fn new(backend: Box<dyn SpeechBackend>, buffer: Arc<Mutex<TranscriptBuffer>>) -> Self {
        let capability = backend.capability();
        info!(
            "Speech adapter created: backend={}, capability={:?}",
            backend.name(),
            capability
        );

        Self {
            backend,
            capability,
            state: Arc::new(Mutex::new(AdapterState::Idle)),
            buffer,
            generation: Arc::new(AtomicU64::new(0)),
            pump_handle: None,
        }
    }

    pub fn capability(&self) -> SpeechCapability {
        self.capability
    }

    pub async fn state(&self) -> AdapterState {
        *self.state.lock().await
    }

    pub async fn is_listening(&self) -> bool {
        *self.state.lock().await == AdapterState::Listening
    }

    /// Last stream error, if the adapter is in an errored state
    pub async fn last_error(&self) -> Option<SpeechErrorKind> {
        match *self.state.lock().await {
            AdapterState::Errored(kind) => Some(kind),
            _ => None,
        }
    }

    /// Acknowledge an errored state, returning the adapter to Idle
    pub async fn clear_error(&self) {
        let mut state = self.state.lock().await;
        if let AdapterState::Errored(_) = *state {
            *state = AdapterState::Idle;
        }
    }

    /// Start a recognition stream
    ///
    /// Any previous stream is fully stopped and disposed first; only one
    /// stream may be live per adapter.
    pub async fn start(&mut self) -> Result<(), EngineError> {
        match self.capability {
            SpeechCapability::Supported => {}
            SpeechCapability::Unsupported => return Err(EngineError::SpeechUnsupported),
            SpeechCapability::PermissionDenied => {
                return Err(EngineError::SpeechUnavailable(SpeechErrorKind::NotAllowed))
            }
        }

        {
            let state = *self.state.lock().await;
            match state {
                AdapterState::Listening => {
                    // Dispose the previous stream before starting the next
                    self.stop().await?;
                }
                AdapterState::Stopping => {
                    return Err(EngineError::InvalidSpeechState {
                        state: "stopping",
                        action: "start",
                    });
                }
                AdapterState::Idle | AdapterState::Errored(_) => {}
            }
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let mut rx = self.backend.start().await.map_err(|e| {
            warn!("Speech backend failed to start: {:#}", e);
            EngineError::SpeechUnavailable(SpeechErrorKind::Network)
        })?;

        *self.state.lock().await = AdapterState::Listening;
        info!("Recognition stream started (generation {})", generation);

        let state = Arc::clone(&self.state);
        let buffer = Arc::clone(&self.buffer);
        let live_generation = Arc::clone(&self.generation);

        let pump = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if live_generation.load(Ordering::SeqCst) != generation {
                    // Stream was disposed; late events must not mutate anything
                    break;
                }

                match event {
                    SpeechEvent::Interim(text) => {
                        if *state.lock().await == AdapterState::Listening {
                            buffer.lock().await.set_interim(text);
                        }
                    }
                    SpeechEvent::Final(text) => {
                        if *state.lock().await == AdapterState::Listening {
                            buffer.lock().await.push_final(&text);
                        }
                    }
                    SpeechEvent::Error(SpeechErrorKind::Aborted) => {
                        // User-initiated stop; not surfaced
                        *state.lock().await = AdapterState::Idle;
                        break;
                    }
                    SpeechEvent::Error(kind) => {
                        warn!("Recognition stream error: {:?}", kind);
                        *state.lock().await = AdapterState::Errored(kind);
                        break;
                    }
                    SpeechEvent::End => {
                        *state.lock().await = AdapterState::Idle;
                        break;
                    }
                }
            }
        });

        self.pump_handle = Some(pump);

        Ok(())
    }

    /// Stop the live stream and wait for its event pump to drain
    ///
    /// Idempotent: stopping an idle adapter is a no-op.
    pub async fn stop(&mut self) -> Result<(), EngineError> {
        {
            let mut state = self.state.lock().await;
            match *state {
                AdapterState::Listening => *state = AdapterState::Stopping,
                _ => return Ok(()),
            }
        }

        // Invalidate the generation first so in-flight events are dropped
        self.generation.fetch_add(1, Ordering::SeqCst);

        if let Err(e) = self.backend.stop().await {
            warn!("Backend stop failed: {}", e);
        }

        if let Some(pump) = self.pump_handle.take() {
            if let Err(e) = pump.await {
                warn!("Recognition pump panicked: {}", e);
            }
        }

        *self.state.lock().await = AdapterState::Idle;
        info!("Recognition stream stopped");

        Ok(())
    }
}
