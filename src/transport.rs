//! Diagnostic service transport
//!
//! Issues the two remote operations (start, continue) and normalizes their
//! results into a typed reply. Owns no conversation state.

mod error;
mod http;
mod types;

pub use error::{TransportError, TransportErrorKind};
pub use http::HttpDiagnosisService;
pub use types::{ConversationHandle, Reply, StartOutcome, TerminalReport};

use crate::intake::IntakeSnapshot;
use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for the remote diagnostic service.
///
/// Each call issues exactly one request. No retries, caching or
/// deduplication, and no bounded latency unless the implementation was
/// configured with a timeout.
#[async_trait]
pub trait DiagnosisService: Send + Sync {
    /// Open a conversation from an intake snapshot
    async fn start(&self, snapshot: &IntakeSnapshot) -> Result<StartOutcome, TransportError>;

    /// Answer the pending question of an open conversation
    async fn continue_conversation(
        &self,
        handle: &ConversationHandle,
        answer: &str,
    ) -> Result<Reply, TransportError>;
}

#[async_trait]
impl<T: DiagnosisService + ?Sized> DiagnosisService for Arc<T> {
    async fn start(&self, snapshot: &IntakeSnapshot) -> Result<StartOutcome, TransportError> {
        (**self).start(snapshot).await
    }

    async fn continue_conversation(
        &self,
        handle: &ConversationHandle,
        answer: &str,
    ) -> Result<Reply, TransportError> {
        (**self).continue_conversation(handle, answer).await
    }
}

/// Logging wrapper for diagnostic services
pub struct LoggingService {
    inner: Arc<dyn DiagnosisService>,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn DiagnosisService>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl DiagnosisService for LoggingService {
    async fn start(&self, snapshot: &IntakeSnapshot) -> Result<StartOutcome, TransportError> {
        let start = std::time::Instant::now();
        let result = self.inner.start(snapshot).await;
        let duration = start.elapsed();

        match &result {
            Ok(outcome) => {
                tracing::info!(
                    conversation_id = %outcome.handle,
                    duration_ms = %duration.as_millis(),
                    reply = outcome.reply.kind(),
                    "Conversation started"
                );
            }
            Err(e) => {
                tracing::error!(
                    duration_ms = %duration.as_millis(),
                    kind = ?e.kind,
                    error = %e.message,
                    "Start request failed"
                );
            }
        }

        result
    }

    async fn continue_conversation(
        &self,
        handle: &ConversationHandle,
        answer: &str,
    ) -> Result<Reply, TransportError> {
        let start = std::time::Instant::now();
        let result = self.inner.continue_conversation(handle, answer).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    conversation_id = %handle,
                    duration_ms = %duration.as_millis(),
                    reply = reply.kind(),
                    "Conversation continued"
                );
            }
            Err(e) => {
                tracing::error!(
                    conversation_id = %handle,
                    duration_ms = %duration.as_millis(),
                    kind = ?e.kind,
                    error = %e.message,
                    "Continue request failed"
                );
            }
        }

        result
    }
}
