//! Pure state transition function
//!
//! Given the same conversation and event it always produces the same
//! result, with no I/O. Rejections leave the conversation untouched.

use super::{Conversation, Effect, Event, Message, Operation, Phase, Transcript};
use crate::transport::Reply;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: Conversation,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: Conversation) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Still waiting on the diagnostic service, try again once it answers")]
    Busy,
    #[error("No conversation is open")]
    NoConversation,
    #[error("Conversation is already resolved")]
    ConversationClosed,
    #[error("Answer is empty")]
    EmptyAnswer,
    #[error("Invalid transition: no transition from {phase} on {event}")]
    InvalidTransition {
        phase: &'static str,
        event: &'static str,
    },
}

/// Pure transition function
#[allow(clippy::too_many_lines)]
pub fn transition(state: &Conversation, event: Event) -> Result<TransitionResult, TransitionError> {
    match (&state.phase, event) {
        // ============================================================
        // Starting a conversation
        // ============================================================

        // At most one outstanding call
        (phase, Event::StartRequested { .. } | Event::Reset) if phase.is_busy() => {
            Err(TransitionError::Busy)
        }

        // Any non-busy phase -> Starting. A held conversation is abandoned
        // along with its transcript.
        (_, Event::StartRequested { snapshot }) => {
            let result = TransitionResult::new(Conversation {
                phase: Phase::Starting,
                transcript: Transcript::default(),
            });
            Ok(close_dialogue_if_open(state, result).with_effect(Effect::RequestStart { snapshot }))
        }

        // Starting + question -> AwaitingAnswer, dialogue opens
        (Phase::Starting, Event::StartCompleted { outcome }) => match outcome.reply {
            Reply::Question(question) => {
                let mut transcript = Transcript::default();
                transcript.push(Message::assistant(question));
                Ok(TransitionResult::new(Conversation {
                    phase: Phase::AwaitingAnswer {
                        handle: outcome.handle,
                    },
                    transcript,
                })
                .with_effect(Effect::OpenDialogue))
            }
            // Resolved immediately, the dialogue never opens
            Reply::Report(report) => Ok(TransitionResult::new(Conversation {
                phase: Phase::Resolved {
                    handle: outcome.handle,
                    report,
                },
                transcript: state.transcript.clone(),
            })
            .with_effect(Effect::ShowResults)),
        },

        // Starting + failure -> Idle, nothing kept
        (Phase::Starting, Event::StartFailed { error }) => {
            Ok(TransitionResult::new(Conversation::default())
                .with_effect(Effect::log_failure(Operation::Start, error)))
        }

        // ============================================================
        // Answering
        // ============================================================

        (Phase::AwaitingAnswer { .. }, Event::UserAnswered { text }) if text.trim().is_empty() => {
            Err(TransitionError::EmptyAnswer)
        }

        // AwaitingAnswer + answer -> Continuing. The user message is
        // appended before the call and never rolled back.
        (Phase::AwaitingAnswer { handle }, Event::UserAnswered { text }) => {
            let mut transcript = state.transcript.clone();
            transcript.push(Message::user(text.clone()));
            Ok(TransitionResult::new(Conversation {
                phase: Phase::Continuing {
                    handle: handle.clone(),
                },
                transcript,
            })
            .with_effect(Effect::request_continue(handle, text)))
        }

        // Rejected, not queued
        (Phase::Starting | Phase::Continuing { .. }, Event::UserAnswered { .. }) => {
            Err(TransitionError::Busy)
        }

        (Phase::Idle, Event::UserAnswered { .. }) => Err(TransitionError::NoConversation),

        (Phase::Resolved { .. }, Event::UserAnswered { .. }) => {
            Err(TransitionError::ConversationClosed)
        }

        // Continuing + question -> AwaitingAnswer
        (Phase::Continuing { handle }, Event::ContinueCompleted { reply: Reply::Question(q) }) => {
            let mut transcript = state.transcript.clone();
            transcript.push(Message::assistant(q));
            Ok(TransitionResult::new(Conversation {
                phase: Phase::AwaitingAnswer {
                    handle: handle.clone(),
                },
                transcript,
            }))
        }

        // Continuing + report -> Resolved, dialogue closes
        (Phase::Continuing { handle }, Event::ContinueCompleted { reply: Reply::Report(report) }) => {
            Ok(TransitionResult::new(Conversation {
                phase: Phase::Resolved {
                    handle: handle.clone(),
                    report,
                },
                transcript: state.transcript.clone(),
            })
            .with_effects([Effect::CloseDialogue, Effect::ShowResults]))
        }

        // Continuing + failure -> AwaitingAnswer. The user's last message
        // stays unanswered and no retry is scheduled.
        (Phase::Continuing { handle }, Event::ContinueFailed { error }) => {
            Ok(TransitionResult::new(Conversation {
                phase: Phase::AwaitingAnswer {
                    handle: handle.clone(),
                },
                transcript: state.transcript.clone(),
            })
            .with_effect(Effect::log_failure(Operation::Continue, error)))
        }

        // ============================================================
        // Abandoning
        // ============================================================

        (_, Event::Reset) => Ok(close_dialogue_if_open(
            state,
            TransitionResult::new(Conversation::default()),
        )),

        // ============================================================
        // Invalid Transitions
        // ============================================================

        // Includes responses that do not match the call in flight
        (phase, event) => Err(TransitionError::InvalidTransition {
            phase: phase.kind().as_str(),
            event: event.name(),
        }),
    }
}

fn close_dialogue_if_open(state: &Conversation, result: TransitionResult) -> TransitionResult {
    if state.dialogue_open() {
        result.with_effect(Effect::CloseDialogue)
    } else {
        result
    }
}
