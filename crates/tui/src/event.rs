//! Event handling types for the TUI.

/// Status of a key event after a widget has seen it.
///
/// Widgets return this from `handle_key_event` so the caller knows whether
/// to fall through to the global shortcuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    /// The widget handled the key; stop here.
    Consumed,
    /// The widget ignored the key; pass it on.
    NotConsumed,
}

impl EventStatus {
    pub fn is_consumed(self) -> bool {
        self == EventStatus::Consumed
    }
}
