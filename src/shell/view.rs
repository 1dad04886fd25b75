//! View model derived from conversation state

use crate::report::ReportView;
use crate::state_machine::{Conversation, Message, PhaseKind};
use crate::transport::TerminalReport;

/// Top-level view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Intake,
    Results,
}

/// The floating dialogue surface
#[derive(Debug, Clone, PartialEq)]
pub struct DialogueView {
    pub messages: Vec<Message>,
    /// Input is disabled while true
    pub busy: bool,
}

/// Everything the shell reads from the machine, as one snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct ShellModel {
    pub phase: PhaseKind,
    pub view: View,
    pub dialogue: Option<DialogueView>,
    pub busy: bool,
    pub report: Option<TerminalReport>,
}

impl ShellModel {
    pub fn report_view(&self) -> ReportView {
        ReportView::from_report(self.report.as_ref())
    }
}

impl From<&Conversation> for ShellModel {
    fn from(conversation: &Conversation) -> Self {
        let view = if conversation.is_resolved() {
            View::Results
        } else {
            View::Intake
        };

        let dialogue = conversation.dialogue_open().then(|| DialogueView {
            messages: conversation.transcript.messages().to_vec(),
            busy: conversation.is_busy(),
        });

        Self {
            phase: conversation.phase.kind(),
            view,
            dialogue,
            busy: conversation.is_busy(),
            report: conversation.report().cloned(),
        }
    }
}
