//! Event bus for decoupled communication with the presentation layer

use crate::domain::AccuracyTier;
use crate::viewport::CameraState;
use tokio::sync::broadcast;

/// Severity of a user-facing notice (rendered as a toast by the shell).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

/// Events the core broadcasts to subscribers.
#[derive(Debug, Clone)]
pub enum Event {
    /// Core finished initializing
    CoreStarted,

    /// Core is shutting down
    CoreShutdown,

    /// A user report was added to the store
    ReportAdded { id: u32 },

    /// A user report was removed from the store
    ReportRemoved { id: u32 },

    /// All user reports were cleared
    ReportsCleared,

    /// The camera directive changed
    CameraMoved { camera: CameraState },

    /// The presentation layer should open the detail view for this marker
    MarkerDetailRequested { id: u32 },

    /// A location cascade resolved and its result was applied
    LocationResolved { tier: AccuracyTier, stale: bool },

    /// A user-facing message (toast)
    Notice { severity: Severity, message: String },
}

impl Event {
    pub fn notice(severity: Severity, message: impl Into<String>) -> Self {
        Event::Notice {
            severity,
            message: message.into(),
        }
    }
}

/// Event bus for broadcasting events.
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus with specified capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Emit an event
    pub fn emit(&self, event: Event) {
        // Ignore send errors (no receivers)
        let _ = self.sender.send(event);
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}
