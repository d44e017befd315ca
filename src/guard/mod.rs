//! Interruption handling
//!
//! Maps tab-hide / unload / connectivity events to the actions the
//! controller must take. The guard itself holds only the offline flag; the
//! controller applies the returned action.

use tracing::info;

/// Platform page/connectivity event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    Hidden,
    Visible,
    BeforeUnload,
    Offline,
    Online,
}

/// What the controller should do in response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardAction {
    None,
    /// Tab hidden while capturing: stop the recognition stream so it does
    /// not run orphaned off-screen
    PauseCapture,
    /// Unload attempted with unsaved work: advisory only, the autosaved
    /// draft is the real safety net
    WarnUnsavedAnswer,
    /// Surface an offline error state without closing the session
    MarkOffline,
    ClearOffline,
}

#[derive(Debug, Default)]
pub struct InterruptionGuard {
    offline: bool,
}

impl InterruptionGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    /// Decide the action for an event given current capture state
    pub fn on_event(&mut self, event: PageEvent, capturing: bool, buffer_dirty: bool) -> GuardAction {
        match event {
            PageEvent::Hidden if capturing => {
                info!("Tab hidden while capturing, pausing");
                GuardAction::PauseCapture
            }
            PageEvent::Hidden | PageEvent::Visible => GuardAction::None,
            PageEvent::BeforeUnload if capturing || buffer_dirty => GuardAction::WarnUnsavedAnswer,
            PageEvent::BeforeUnload => GuardAction::None,
            PageEvent::Offline => {
                self.offline = true;
                info!("Network offline, session continues locally");
                GuardAction::MarkOffline
            }
            PageEvent::Online => {
                if self.offline {
                    self.offline = false;
                    GuardAction::ClearOffline
                } else {
                    GuardAction::None
                }
            }
        }
    }
}
