//! Core conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! the shell and the transport feed events in, `transition` hands back the
//! next state plus the effects the runtime must carry out.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Effect, Operation};
pub use event::Event;
pub use state::{Conversation, Message, Phase, PhaseKind, Sender, Transcript};
pub use transition::{transition, TransitionError, TransitionResult};
