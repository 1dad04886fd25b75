//! Effects produced by state transitions

use crate::intake::IntakeSnapshot;
use crate::transport::{ConversationHandle, TransportError};
use std::fmt;

/// Effects to be executed after state transition
#[derive(Debug, Clone)]
pub enum Effect {
    /// Call the service's start operation
    RequestStart { snapshot: IntakeSnapshot },

    /// Call the service's continue operation
    RequestContinue {
        handle: ConversationHandle,
        answer: String,
    },

    /// Show the floating dialogue surface
    OpenDialogue,

    /// Hide the dialogue surface
    CloseDialogue,

    /// Switch the shell to the results view
    ShowResults,

    /// A remote call failed and was absorbed into a rollback
    LogFailure {
        operation: Operation,
        error: TransportError,
    },
}

impl Effect {
    pub fn request_continue(handle: &ConversationHandle, answer: impl Into<String>) -> Self {
        Effect::RequestContinue {
            handle: handle.clone(),
            answer: answer.into(),
        }
    }

    pub fn log_failure(operation: Operation, error: TransportError) -> Self {
        Effect::LogFailure { operation, error }
    }
}

/// Which remote operation an effect refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Start,
    Continue,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Start => f.write_str("start"),
            Operation::Continue => f.write_str("continue"),
        }
    }
}
