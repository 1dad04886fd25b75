//! Mock implementations for testing
//!
//! These mocks enable runtime tests without a diagnostic service.

use super::{launch, RuntimeHandle, ShellEvent};
use crate::intake::IntakeSnapshot;
use crate::shell::ShellModel;
use crate::state_machine::PhaseKind;
use crate::transport::{
    ConversationHandle, DiagnosisService, Reply, StartOutcome, TransportError,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;

// ============================================================================
// Mock Diagnosis Service
// ============================================================================

/// Mock service that returns queued outcomes
#[allow(dead_code)]
pub struct MockService {
    starts: Mutex<VecDeque<Result<StartOutcome, TransportError>>>,
    continues: Mutex<VecDeque<Result<Reply, TransportError>>>,
    /// Snapshots sent to start
    pub start_requests: Mutex<Vec<IntakeSnapshot>>,
    /// (conversation id, answer) pairs sent to continue
    pub continue_requests: Mutex<Vec<(String, String)>>,
}

#[allow(dead_code)]
impl MockService {
    pub fn new() -> Self {
        Self {
            starts: Mutex::new(VecDeque::new()),
            continues: Mutex::new(VecDeque::new()),
            start_requests: Mutex::new(Vec::new()),
            continue_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_start(&self, outcome: Result<StartOutcome, TransportError>) {
        self.starts.lock().unwrap().push_back(outcome);
    }

    pub fn queue_continue(&self, reply: Result<Reply, TransportError>) {
        self.continues.lock().unwrap().push_back(reply);
    }

    pub fn recorded_starts(&self) -> Vec<IntakeSnapshot> {
        self.start_requests.lock().unwrap().clone()
    }

    pub fn recorded_continues(&self) -> Vec<(String, String)> {
        self.continue_requests.lock().unwrap().clone()
    }

    fn next_start(&self) -> Result<StartOutcome, TransportError> {
        self.starts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::network("No mock start outcome queued")))
    }

    fn next_continue(&self) -> Result<Reply, TransportError> {
        self.continues
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::network("No mock continue reply queued")))
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DiagnosisService for MockService {
    async fn start(&self, snapshot: &IntakeSnapshot) -> Result<StartOutcome, TransportError> {
        self.start_requests.lock().unwrap().push(snapshot.clone());
        self.next_start()
    }

    async fn continue_conversation(
        &self,
        handle: &ConversationHandle,
        answer: &str,
    ) -> Result<Reply, TransportError> {
        self.continue_requests
            .lock()
            .unwrap()
            .push((handle.as_str().to_string(), answer.to_string()));
        self.next_continue()
    }
}

// ============================================================================
// Delayed Mock Diagnosis Service (for busy and unmount testing)
// ============================================================================

/// Mock service that holds every response for a fixed delay
pub struct DelayedMockService {
    pub inner: MockService,
    delay: Duration,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl DelayedMockService {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockService::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl DiagnosisService for DelayedMockService {
    async fn start(&self, snapshot: &IntakeSnapshot) -> Result<StartOutcome, TransportError> {
        self.inner.start_requests.lock().unwrap().push(snapshot.clone());
        self.request_started.notify_waiters();
        tokio::time::sleep(self.delay).await;
        self.inner.next_start()
    }

    async fn continue_conversation(
        &self,
        handle: &ConversationHandle,
        answer: &str,
    ) -> Result<Reply, TransportError> {
        self.inner
            .continue_requests
            .lock()
            .unwrap()
            .push((handle.as_str().to_string(), answer.to_string()));
        self.request_started.notify_waiters();
        tokio::time::sleep(self.delay).await;
        self.inner.next_continue()
    }
}

// ============================================================================
// Test Runtime
// ============================================================================

/// A launched runtime plus a subscription taken before any command is sent
pub struct TestRuntime<S: DiagnosisService + 'static> {
    pub handle: RuntimeHandle,
    pub events: broadcast::Receiver<ShellEvent>,
    pub service: Arc<S>,
    pub join: JoinHandle<()>,
}

impl<S: DiagnosisService + 'static> TestRuntime<S> {
    pub fn new(service: S) -> Self {
        let service = Arc::new(service);
        let (handle, join) = launch(service.clone());
        let events = handle.subscribe();
        Self {
            handle,
            events,
            service,
            join,
        }
    }

    /// Receive events until one matches, or the timeout elapses
    pub async fn wait_for(
        &mut self,
        timeout: Duration,
        mut predicate: impl FnMut(&ShellEvent) -> bool,
    ) -> Option<ShellEvent> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            match tokio::time::timeout(remaining, self.events.recv()).await {
                Ok(Ok(event)) => {
                    if predicate(&event) {
                        return Some(event);
                    }
                }
                Ok(Err(broadcast::error::RecvError::Lagged(_))) => {}
                Ok(Err(broadcast::error::RecvError::Closed)) | Err(_) => return None,
            }
        }
    }

    /// Wait for a state change into the given phase
    pub async fn wait_for_phase(
        &mut self,
        phase: PhaseKind,
        timeout: Duration,
    ) -> Option<ShellModel> {
        let event = self
            .wait_for(timeout, |e| {
                matches!(e, ShellEvent::StateChanged { model } if model.phase == phase)
            })
            .await?;
        match event {
            ShellEvent::StateChanged { model } => Some(model),
            _ => None,
        }
    }
}
