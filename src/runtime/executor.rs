//! Conversation runtime executor

use super::{Command, ShellEvent};
use crate::shell::ShellModel;
use crate::state_machine::{transition, Conversation, Effect, Event, Operation};
use crate::transport::DiagnosisService;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// Drives one conversation against any diagnostic service implementation
pub struct ConversationRuntime<S>
where
    S: DiagnosisService + 'static,
{
    state: Conversation,
    service: Arc<S>,
    command_rx: mpsc::Receiver<Command>,
    /// Remote call outcomes re-enter the loop through this channel
    outcome_tx: mpsc::Sender<Event>,
    outcome_rx: mpsc::Receiver<Event>,
    broadcast_tx: broadcast::Sender<ShellEvent>,
    shutdown: CancellationToken,
}

impl<S> ConversationRuntime<S>
where
    S: DiagnosisService + 'static,
{
    pub fn new(
        service: S,
        command_rx: mpsc::Receiver<Command>,
        broadcast_tx: broadcast::Sender<ShellEvent>,
        shutdown: CancellationToken,
    ) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::channel(8);
        Self {
            state: Conversation::new(),
            service: Arc::new(service),
            command_rx,
            outcome_tx,
            outcome_rx,
            broadcast_tx,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("Starting conversation runtime");

        // One event at a time, no recursion
        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => {
                    tracing::debug!("Shutdown requested");
                    break;
                }
                command = self.command_rx.recv() => match command {
                    Some(command) => self.process_event(command.into_event()),
                    // Every handle dropped: the shell is gone
                    None => break,
                },
                Some(event) = self.outcome_rx.recv() => self.process_event(event),
            }
        }

        tracing::info!(
            phase = self.state.phase.kind().as_str(),
            "Conversation runtime stopped"
        );
    }

    fn process_event(&mut self, event: Event) {
        let event_name = event.name();

        // Pure state transition
        let result = match transition(&self.state, event) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(
                    event = event_name,
                    phase = self.state.phase.kind().as_str(),
                    error = %e,
                    "Event rejected"
                );
                let _ = self.broadcast_tx.send(ShellEvent::Rejected {
                    message: e.to_string(),
                });
                return;
            }
        };

        let old_phase = self.state.phase.kind();
        self.state = result.new_state;
        tracing::debug!(
            event = event_name,
            from = old_phase.as_str(),
            to = self.state.phase.kind().as_str(),
            "Transition applied"
        );

        for effect in result.effects {
            self.execute_effect(effect);
        }

        let _ = self.broadcast_tx.send(ShellEvent::StateChanged {
            model: ShellModel::from(&self.state),
        });
    }

    fn execute_effect(&self, effect: Effect) {
        match effect {
            Effect::RequestStart { snapshot } => {
                let service = self.service.clone();
                let tx = self.outcome_tx.clone();
                tokio::spawn(async move {
                    let event = match service.start(&snapshot).await {
                        Ok(outcome) => Event::StartCompleted { outcome },
                        Err(error) => Event::StartFailed { error },
                    };
                    if tx.send(event).await.is_err() {
                        tracing::debug!("Runtime gone, discarding start response");
                    }
                });
            }

            Effect::RequestContinue { handle, answer } => {
                let service = self.service.clone();
                let tx = self.outcome_tx.clone();
                tokio::spawn(async move {
                    let event = match service.continue_conversation(&handle, &answer).await {
                        Ok(reply) => Event::ContinueCompleted { reply },
                        Err(error) => Event::ContinueFailed { error },
                    };
                    if tx.send(event).await.is_err() {
                        tracing::debug!(
                            conversation_id = %handle,
                            "Runtime gone, discarding continue response"
                        );
                    }
                });
            }

            Effect::OpenDialogue => {
                let _ = self.broadcast_tx.send(ShellEvent::DialogueOpened);
            }

            Effect::CloseDialogue => {
                let _ = self.broadcast_tx.send(ShellEvent::DialogueClosed);
            }

            Effect::ShowResults => {
                let _ = self.broadcast_tx.send(ShellEvent::ResultsReady);
            }

            Effect::LogFailure { operation, error } => {
                match operation {
                    Operation::Start => tracing::error!(
                        kind = ?error.kind,
                        error = %error.message,
                        "Start error, conversation not opened"
                    ),
                    Operation::Continue => tracing::error!(
                        conversation_id = ?self.state.handle().map(ToString::to_string),
                        kind = ?error.kind,
                        error = %error.message,
                        "Continue error, answer left unanswered"
                    ),
                }
                let _ = self.broadcast_tx.send(ShellEvent::RequestFailed {
                    operation,
                    message: error.message,
                });
            }
        }
    }
}
