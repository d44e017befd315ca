use anyhow::Result;
use tokio::sync::mpsc;

/// Recognition availability, resolved once when the adapter is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechCapability {
    /// Recognition is available and permitted
    Supported,
    /// No recognition engine on this platform/browser context
    Unsupported,
    /// Engine exists but microphone permission was denied
    PermissionDenied,
}

/// Recognition failure taxonomy; each kind has a distinct recovery path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechErrorKind {
    /// Stream ran but heard nothing; prompt to try again
    NoSpeech,
    /// Permission denied mid-stream; fall back to manual text
    NotAllowed,
    /// Transport failure; fall back to manual text, session stays alive
    Network,
    /// User-initiated stop; never surfaced as an error
    Aborted,
}

/// Event emitted by a live recognition stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// Uncommitted fragment; overwrites the previous interim text
    Interim(String),
    /// Finalized segment; appended to the committed transcript
    Final(String),
    Error(SpeechErrorKind),
    /// Stream closed by the engine
    End,
}

/// Speech recognition backend trait
///
/// Implementations wrap whatever engine the platform provides. Exactly one
/// stream may be live per backend; `start` on a live backend must stop the
/// previous stream first.
#[async_trait::async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Runtime feature detection, queried once at adapter construction
    fn capability(&self) -> SpeechCapability;

    /// Start recognizing
    ///
    /// Returns a channel receiver that will receive recognition events
    async fn start(&mut self) -> Result<mpsc::Receiver<SpeechEvent>>;

    /// Stop the live stream, if any
    async fn stop(&mut self) -> Result<()>;

    /// Check if a stream is currently live
    fn is_listening(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}
