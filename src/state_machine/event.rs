//! Events that can occur in a conversation

use crate::intake::IntakeSnapshot;
use crate::transport::{Reply, StartOutcome, TransportError};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    StartRequested { snapshot: IntakeSnapshot },
    UserAnswered { text: String },
    /// Abandon the current conversation
    Reset,

    // Transport events
    StartCompleted { outcome: StartOutcome },
    StartFailed { error: TransportError },
    ContinueCompleted { reply: Reply },
    ContinueFailed { error: TransportError },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::StartRequested { .. } => "start_requested",
            Event::UserAnswered { .. } => "user_answered",
            Event::Reset => "reset",
            Event::StartCompleted { .. } => "start_completed",
            Event::StartFailed { .. } => "start_failed",
            Event::ContinueCompleted { .. } => "continue_completed",
            Event::ContinueFailed { .. } => "continue_failed",
        }
    }
}
