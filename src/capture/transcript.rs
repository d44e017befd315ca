/// In-memory accumulation of speech-to-text output for the current question
///
/// Final segments are space-joined into `committed`; the interim fragment is
/// overwritten on every update and never persisted.
#[derive(Debug, Default, Clone)]
pub struct TranscriptBuffer {
    committed: String,
    interim: String,
}

impl TranscriptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finalized segment, separated by a single space
    pub fn push_final(&mut self, segment: &str) {
        let segment = segment.trim();
        if segment.is_empty() {
            return;
        }
        if !self.committed.is_empty() {
            self.committed.push(' ');
        }
        self.committed.push_str(segment);
        self.interim.clear();
    }

    /// Overwrite the uncommitted fragment
    pub fn set_interim(&mut self, fragment: String) {
        self.interim = fragment;
    }

    /// Finalized text only; this is what submission persists
    pub fn committed(&self) -> &str {
        &self.committed
    }

    /// Committed text plus the live interim fragment, for display
    pub fn display_text(&self) -> String {
        if self.interim.is_empty() {
            self.committed.clone()
        } else if self.committed.is_empty() {
            self.interim.clone()
        } else {
            format!("{} {}", self.committed, self.interim)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty() && self.interim.is_empty()
    }

    pub fn clear(&mut self) {
        self.committed.clear();
        self.interim.clear();
    }

    /// Take the committed text, leaving the buffer empty
    pub fn take_committed(&mut self) -> String {
        self.interim.clear();
        std::mem::take(&mut self.committed)
    }
}
