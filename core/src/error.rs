//! Error types for the DatabunkerPro client.
//!
//! # Design
//! Every gateway failure lands in one of three kinds: the transport could
//! not complete the exchange (`Connection`), the service answered with an
//! error (`Api`, either through the HTTP status or the `"status": "error"`
//! envelope), or the answer was not a JSON object (`Parse`). The remaining
//! variants cover local problems detected before anything is sent.

use thiserror::Error;

/// Errors returned by the gateway and every endpoint method.
#[derive(Debug, Error)]
pub enum ApiError {
    /// DNS, TCP, TLS or body-read failure while talking to the base URL.
    #[error("connection error: {0}")]
    Connection(String),

    /// The service reported an error. `status` is the HTTP status of the
    /// response, which is 2xx when the error came from the body envelope.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The response body was not a JSON object.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// The request payload could not be serialized to a JSON object.
    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status carried by an `Api` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
