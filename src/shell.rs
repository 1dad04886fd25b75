//! Presentation shell
//!
//! Selects between the intake and results views from machine state and
//! renders the dialogue while a conversation is open.

mod terminal;
mod view;

pub use terminal::{ShellError, TerminalShell};
pub use view::{DialogueView, ShellModel, View};
