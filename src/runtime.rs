//! Runtime for executing a conversation
//!
//! Owns the one `Conversation` of a session, feeds it events, and carries
//! out the effects the state machine asks for.

mod executor;

#[cfg(test)]
pub mod testing;

use crate::intake::IntakeSnapshot;
use crate::shell::ShellModel;
use crate::state_machine::{Event, Operation};
use crate::transport::DiagnosisService;
use executor::ConversationRuntime;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Requests the shell can make of the runtime
#[derive(Debug, Clone)]
pub enum Command {
    Start(IntakeSnapshot),
    Answer(String),
    Reset,
}

impl Command {
    fn into_event(self) -> Event {
        match self {
            Command::Start(snapshot) => Event::StartRequested { snapshot },
            Command::Answer(text) => Event::UserAnswered { text },
            Command::Reset => Event::Reset,
        }
    }
}

/// Events sent to the shell
#[derive(Debug, Clone)]
pub enum ShellEvent {
    /// Sent after every applied transition
    StateChanged { model: ShellModel },
    DialogueOpened,
    DialogueClosed,
    ResultsReady,
    /// A remote call failed; the state machine has already rolled back
    RequestFailed { operation: Operation, message: String },
    /// A command was refused (busy, closed, empty answer, ...)
    Rejected { message: String },
}

/// Handle to interact with a running conversation
#[derive(Clone)]
pub struct RuntimeHandle {
    command_tx: mpsc::Sender<Command>,
    broadcast_tx: broadcast::Sender<ShellEvent>,
    shutdown: CancellationToken,
}

impl RuntimeHandle {
    pub async fn send(&self, command: Command) -> Result<(), String> {
        self.command_tx
            .send(command)
            .await
            .map_err(|e| format!("Failed to send command: {e}"))
    }

    pub async fn start(&self, snapshot: IntakeSnapshot) -> Result<(), String> {
        self.send(Command::Start(snapshot)).await
    }

    pub async fn answer(&self, text: impl Into<String>) -> Result<(), String> {
        self.send(Command::Answer(text.into())).await
    }

    pub async fn reset(&self) -> Result<(), String> {
        self.send(Command::Reset).await
    }

    /// Subscribe to shell events
    pub fn subscribe(&self) -> broadcast::Receiver<ShellEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Tear the runtime down. Responses still in flight are discarded.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

/// Spawn a runtime for one conversation session
pub fn launch<S>(service: S) -> (RuntimeHandle, JoinHandle<()>)
where
    S: DiagnosisService + 'static,
{
    let (command_tx, command_rx) = mpsc::channel(32);
    let (broadcast_tx, _) = broadcast::channel(128);
    let shutdown = CancellationToken::new();

    let runtime = ConversationRuntime::new(
        service,
        command_rx,
        broadcast_tx.clone(),
        shutdown.clone(),
    );

    let join = tokio::spawn(async move {
        runtime.run().await;
        tracing::debug!("Conversation runtime finished");
    });

    (
        RuntimeHandle {
            command_tx,
            broadcast_tx,
            shutdown,
        },
        join,
    )
}
