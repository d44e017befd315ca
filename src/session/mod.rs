//! Session orchestration
//!
//! This module provides the `SessionController` state machine that drives a
//! practice interview end-to-end:
//! - Question fetching with stale-result discard
//! - Dual-mode (voice/text) answer capture and submission
//! - Strictly sequential interaction commits (gapless 1..N ordering)
//! - Draft autosave ownership per question
//! - Interruption handling and finalization

mod controller;
mod profile;

pub use controller::SessionController;
pub use profile::SessionProfile;
