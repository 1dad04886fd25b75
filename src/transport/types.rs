//! Types exchanged with the diagnostic service

use super::{TransportError, TransportErrorKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Opaque conversation identifier issued by the service on start
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHandle(String);

impl ConversationHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Final diagnostic payload. Service-defined and passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerminalReport(Value);

impl TerminalReport {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// What the service said after start or continue
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Another round is needed
    Question(String),
    /// The conversation is resolved
    Report(TerminalReport),
}

impl Reply {
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Question(_) => "question",
            Reply::Report(_) => "report",
        }
    }
}

/// Successful start: a handle plus the first reply
#[derive(Debug, Clone, PartialEq)]
pub struct StartOutcome {
    pub handle: ConversationHandle,
    pub reply: Reply,
}

// Wire types

#[derive(Debug, Serialize)]
pub(super) struct ContinueRequest<'a> {
    pub answer: &'a str,
}

/// Response body of both endpoints. Every field is optional on the wire;
/// `into_reply` decides what the body means.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ServiceResponse {
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub pending_question: Option<String>,
    #[serde(default)]
    pub final_analysis: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
    #[serde(default)]
    pub detail: Option<Value>,
}

impl ServiceResponse {
    /// A non-empty `pending_question` wins over `final_analysis`.
    pub fn into_reply(self) -> Result<Reply, TransportError> {
        if let Some(question) = self.pending_question.filter(|q| !q.is_empty()) {
            return Ok(Reply::Question(question));
        }
        if let Some(analysis) = self.final_analysis {
            return Ok(Reply::Report(TerminalReport::new(analysis)));
        }
        if let Some(error) = self.error.or(self.detail) {
            let message = match error {
                Value::String(s) => s,
                other => other.to_string(),
            };
            return Err(TransportError::service(message));
        }
        Err(TransportError::decode(
            "Response carried neither pending_question nor final_analysis",
        ))
    }

    pub fn into_start_outcome(mut self) -> Result<StartOutcome, TransportError> {
        let Some(id) = self.conversation_id.take() else {
            // Surface an in-band service error before complaining about the id
            return match self.into_reply() {
                Err(e) => Err(e),
                Ok(_) => Err(TransportError::decode("Start response missing conversation_id")),
            };
        };
        let reply = match self.into_reply() {
            Ok(reply) => reply,
            // An opened conversation with nothing left to ask resolves at
            // once; the results view shows its placeholder for the null report
            Err(e) if e.kind == TransportErrorKind::Decode => {
                Reply::Report(TerminalReport::new(Value::Null))
            }
            Err(e) => return Err(e),
        };
        Ok(StartOutcome {
            handle: ConversationHandle::new(id),
            reply,
        })
    }
}
