use crate::error::EngineError;
use crate::model::{AnswerPayload, InputMethod};
use chrono::Utc;
use std::time::{Duration, Instant};

/// The answer buffer for the current question
///
/// Voice commits and typed edits land in the same bounded buffer. The elapsed
/// clock is monotonic (`Instant`-based) and pauses whenever capture pauses or
/// the tab is hidden; paused spans never count toward time spent.
#[derive(Debug)]
pub struct AnswerCapture {
    text: String,
    max_chars: usize,

    /// Set once any committed speech lands; decides the input method
    voice_used: bool,

    accumulated: Duration,
    running_since: Option<Instant>,
}

impl AnswerCapture {
    pub fn new(max_chars: usize) -> Self {
        Self {
            text: String::new(),
            max_chars,
            voice_used: false,
            accumulated: Duration::ZERO,
            running_since: None,
        }
    }

    /// Reset the buffer and start the clock for a newly displayed question
    pub fn begin_question(&mut self) {
        self.text.clear();
        self.voice_used = false;
        self.accumulated = Duration::ZERO;
        self.running_since = Some(Instant::now());
    }

    /// Fold the running span into the accumulator and stop the clock
    pub fn pause_timer(&mut self) {
        if let Some(started) = self.running_since.take() {
            self.accumulated += started.elapsed();
        }
    }

    pub fn resume_timer(&mut self) {
        if self.running_since.is_none() {
            self.running_since = Some(Instant::now());
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self.running_since {
            Some(started) => self.accumulated + started.elapsed(),
            None => self.accumulated,
        }
    }

    /// Append a committed speech segment, space-separated
    pub fn append_voice(&mut self, segment: &str) -> Result<(), EngineError> {
        let segment = segment.trim();
        if segment.is_empty() {
            return Ok(());
        }

        let added = if self.text.is_empty() {
            segment.chars().count()
        } else {
            segment.chars().count() + 1
        };
        let len = self.text.chars().count() + added;
        if len > self.max_chars {
            return Err(EngineError::AnswerTooLong {
                len,
                max: self.max_chars,
            });
        }

        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(segment);
        self.voice_used = true;
        Ok(())
    }

    /// Replace the buffer with typed text
    pub fn set_text(&mut self, text: &str) -> Result<(), EngineError> {
        let len = text.chars().count();
        if len > self.max_chars {
            return Err(EngineError::AnswerTooLong {
                len,
                max: self.max_chars,
            });
        }
        self.text = text.to_string();
        Ok(())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Freeze the answer for submission
    ///
    /// The buffer itself is untouched; it is cleared only after the commit
    /// succeeds, so a failed save retains the answer unchanged.
    pub fn snapshot(&self) -> Result<AnswerPayload, EngineError> {
        if self.is_empty() {
            return Err(EngineError::EmptyAnswer);
        }

        Ok(AnswerPayload {
            text: self.text.trim().to_string(),
            input_method: if self.voice_used {
                InputMethod::Voice
            } else {
                InputMethod::Text
            },
            time_spent_secs: self.elapsed().as_secs(),
            timestamp: Utc::now(),
        })
    }

    /// Empty payload recording an explicit skip
    pub fn skip_snapshot(&self) -> AnswerPayload {
        AnswerPayload {
            text: String::new(),
            input_method: InputMethod::Skip,
            time_spent_secs: self.elapsed().as_secs(),
            timestamp: Utc::now(),
        }
    }

    /// Clear buffer and clock after a successful commit
    pub fn clear(&mut self) {
        self.text.clear();
        self.voice_used = false;
        self.accumulated = Duration::ZERO;
        self.running_since = None;
    }

    /// Restore buffer content from a draft; only valid while the buffer is empty
    pub fn restore(&mut self, text: &str) -> Result<(), EngineError> {
        if !self.is_empty() {
            return Ok(());
        }
        self.set_text(text)
    }
}
