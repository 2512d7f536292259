//! Error types for the Corral client
//!
//! Every SDK operation returns [`Error`]. Argument problems are caught
//! before any request is sent; server-side failures are mapped from the
//! HTTP status of the response.

use thiserror::Error;

/// Client error kinds
#[derive(Debug, Error)]
pub enum Error {
    /// Caller asked for unknown fields or an illegal flag combination.
    /// Raised before any network call.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// The server reported no resource with the given identifier
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The server rejected the request body (malformed patch, missing
    /// required create field, ...). Carries the server-provided message.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The server violated the pagination contract (e.g. a marker that
    /// does not advance)
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Authentication failed or no usable credentials were found
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Connection, timeout, or other transport-level failure. Not retried
    /// by the client; retry policy belongs to the caller.
    #[error("transport error: {0}")]
    Transport(String),
}

impl Error {
    /// Map an error response status + body to the matching kind.
    ///
    /// `kind` and `id` are used for 404s so the message names the
    /// resource the caller asked for.
    pub fn from_status(status: reqwest::StatusCode, body: &str, kind: &'static str, id: &str) -> Self {
        match status.as_u16() {
            404 => Error::NotFound {
                kind,
                id: id.to_string(),
            },
            400 | 409 | 422 => Error::Validation(server_message(body, status)),
            401 | 403 => Error::Auth(server_message(body, status)),
            _ => Error::Transport(format!("unexpected status {}: {}", status, server_message(body, status))),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

/// Pull the human-readable message out of an error body.
///
/// The service wraps errors as `{"error": {"message": "..."}}`; fall back
/// to the raw body, then to the status line.
fn server_message(body: &str, status: reqwest::StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return msg.to_string();
        }
    }
    if body.trim().is_empty() {
        status.to_string()
    } else {
        body.trim().to_string()
    }
}

/// Result alias used across the SDK
pub type Result<T> = std::result::Result<T, Error>;
