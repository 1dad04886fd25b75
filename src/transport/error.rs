//! Transport error types

use thiserror::Error;

/// The only error the conversation core recognizes.
///
/// Carries no retry guidance; the caller decides what to do.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Network, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Decode, message)
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Service, message)
    }
}

/// Where the failure was observed. Deliberately coarse: the service's own
/// error semantics are opaque here, so there is no timeout/4xx/5xx split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// The request could not be sent or the body could not be read
    Network,
    /// The body was not JSON, or JSON of an unexpected shape
    Decode,
    /// The service answered with its own error, passed through verbatim
    Service,
}
