//! JSON-over-HTTP diagnostic service client

use super::types::{ContinueRequest, ServiceResponse};
use super::{ConversationHandle, DiagnosisService, Reply, StartOutcome, TransportError};
use crate::intake::IntakeSnapshot;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use std::time::Duration;

/// Talks to `POST /diagnose/start` and `POST /diagnose/continue`
pub struct HttpDiagnosisService {
    client: Client,
    base_url: String,
}

impl HttpDiagnosisService {
    /// Without a timeout a call may wait indefinitely; that is the
    /// documented default.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn start_url(&self) -> String {
        format!("{}/diagnose/start", self.base_url)
    }

    fn continue_url(&self) -> String {
        format!("{}/diagnose/continue", self.base_url)
    }

    /// Send a request and parse its body. The status code is only logged:
    /// the service reports its own errors in the body.
    async fn send(&self, request: RequestBuilder) -> Result<ServiceResponse, TransportError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::network(format!("Request timeout: {e}"))
            } else if e.is_connect() {
                TransportError::network(format!("Connection failed: {e}"))
            } else {
                TransportError::network(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            tracing::debug!(status = %status, "Diagnostic service returned non-success status");
        }

        serde_json::from_str(&body).map_err(|e| {
            TransportError::decode(format!("Failed to parse response: {e} - body: {body}"))
        })
    }
}

#[async_trait]
impl DiagnosisService for HttpDiagnosisService {
    async fn start(&self, snapshot: &IntakeSnapshot) -> Result<StartOutcome, TransportError> {
        let request = self.client.post(self.start_url()).json(snapshot);
        self.send(request).await?.into_start_outcome()
    }

    async fn continue_conversation(
        &self,
        handle: &ConversationHandle,
        answer: &str,
    ) -> Result<Reply, TransportError> {
        let request = self
            .client
            .post(self.continue_url())
            .query(&[("conversation_id", handle.as_str())])
            .json(&ContinueRequest { answer });
        self.send(request).await?.into_reply()
    }
}
