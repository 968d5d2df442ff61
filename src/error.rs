//! Error types for the sidecar injector

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Main error type for webhook operations
///
/// The injection policy and patch builder are total, so every error here
/// comes from the transport or the admission envelope.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Listener bind or TLS material failure (fatal at startup)
    #[error("transport error: {0}")]
    Transport(String),

    /// HTTP method not accepted by the endpoint
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Request body could not be read
    #[error("error reading request body: {0}")]
    Request(String),

    /// Admission review or embedded pod could not be decoded
    #[error("error decoding admission review: {0}")]
    Decode(String),

    /// Admission response could not be encoded
    #[error("error encoding admission response: {0}")]
    Encode(String),
}

impl Error {
    /// Create a transport error with the given message
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a request error with the given message
    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }

    /// Create a decode error with the given message
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create an encode error with the given message
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// HTTP status reported for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Error::Request(_) | Error::Decode(_) => StatusCode::BAD_REQUEST,
            Error::Encode(_) | Error::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
