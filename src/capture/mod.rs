//! Answer capture
//!
//! Unifies voice and typed input into one bounded answer buffer with a
//! pausable elapsed-time clock. The transcript buffer accumulates committed
//! speech segments; the answer capture freezes submission snapshots.

mod answer;
mod transcript;

pub use answer::AnswerCapture;
pub use transcript::TranscriptBuffer;
