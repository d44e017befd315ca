use super::backend::{SpeechBackend, SpeechCapability, SpeechEvent};
use anyhow::Result;
use std::collections::VecDeque;
use tokio::sync::mpsc;

/// Replays canned recognition events, one script per `start` call
///
/// Fills the role a real platform engine would: the demo binary and tests
/// drive full sessions through it without a microphone.
pub struct ScriptedSpeechBackend {
    capability: SpeechCapability,
    scripts: VecDeque<Vec<SpeechEvent>>,
    listening: bool,
}

impl ScriptedSpeechBackend {
    pub fn new(capability: SpeechCapability) -> Self {
        Self {
            capability,
            scripts: VecDeque::new(),
            listening: false,
        }
    }

    /// Queue the events the next `start` will emit
    pub fn push_script(&mut self, events: Vec<SpeechEvent>) -> &mut Self {
        self.scripts.push_back(events);
        self
    }

    pub fn supported() -> Self {
        Self::new(SpeechCapability::Supported)
    }
}

#[async_trait::async_trait]
impl SpeechBackend for ScriptedSpeechBackend {
    fn capability(&self) -> SpeechCapability {
        self.capability
    }

    async fn start(&mut self) -> Result<mpsc::Receiver<SpeechEvent>> {
        let script = self.scripts.pop_front().unwrap_or_default();
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            for event in script {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });

        self.listening = true;
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.listening = false;
        Ok(())
    }

    fn is_listening(&self) -> bool {
        self.listening
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
