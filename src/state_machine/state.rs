//! Conversation state types

use crate::transport::{ConversationHandle, TerminalReport};
use serde::{Deserialize, Serialize};

// ============================================================================
// Transcript
// ============================================================================

/// Who authored a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    Assistant,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
}

impl Message {
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::Assistant,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }
}

/// Messages exchanged in one conversation, oldest first. Append-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript(Vec<Message>);

impl Transcript {
    pub(crate) fn push(&mut self, message: Message) {
        self.0.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.0.last()
    }
}

// ============================================================================
// Conversation State
// ============================================================================

/// Where the conversation is in its lifecycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Phase {
    /// No conversation started
    #[default]
    Idle,

    /// Start request in flight
    Starting,

    /// Service asked a question, waiting on the user
    AwaitingAnswer { handle: ConversationHandle },

    /// Answer sent, continue request in flight
    Continuing { handle: ConversationHandle },

    /// Terminal report received. The handle is kept but never used again.
    Resolved {
        handle: ConversationHandle,
        report: TerminalReport,
    },
}

/// Payload-free mirror of [`Phase`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Idle,
    Starting,
    AwaitingAnswer,
    Continuing,
    Resolved,
}

impl PhaseKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PhaseKind::Idle => "idle",
            PhaseKind::Starting => "starting",
            PhaseKind::AwaitingAnswer => "awaiting_answer",
            PhaseKind::Continuing => "continuing",
            PhaseKind::Resolved => "resolved",
        }
    }
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::Idle => PhaseKind::Idle,
            Phase::Starting => PhaseKind::Starting,
            Phase::AwaitingAnswer { .. } => PhaseKind::AwaitingAnswer,
            Phase::Continuing { .. } => PhaseKind::Continuing,
            Phase::Resolved { .. } => PhaseKind::Resolved,
        }
    }

    /// A network round-trip is outstanding
    pub fn is_busy(&self) -> bool {
        matches!(self, Phase::Starting | Phase::Continuing { .. })
    }

    pub fn handle(&self) -> Option<&ConversationHandle> {
        match self {
            Phase::AwaitingAnswer { handle }
            | Phase::Continuing { handle }
            | Phase::Resolved { handle, .. } => Some(handle),
            Phase::Idle | Phase::Starting => None,
        }
    }
}

/// The machine value handed to `transition`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub phase: Phase,
    pub transcript: Transcript,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.phase.is_busy()
    }

    pub fn handle(&self) -> Option<&ConversationHandle> {
        self.phase.handle()
    }

    pub fn report(&self) -> Option<&TerminalReport> {
        match &self.phase {
            Phase::Resolved { report, .. } => Some(report),
            _ => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.phase, Phase::Resolved { .. })
    }

    /// The dialogue surface is shown while a handle is held and the
    /// conversation is not yet resolved
    pub fn dialogue_open(&self) -> bool {
        matches!(
            self.phase,
            Phase::AwaitingAnswer { .. } | Phase::Continuing { .. }
        )
    }
}
