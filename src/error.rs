//! Central error types for the launcher
//!
//! Uses `thiserror` for ergonomic, type-safe error handling with
//! automatic `Display` and `Error` trait implementations. Every error
//! knows the HTTP status it maps to, so handlers can bubble errors with
//! `?` and rely on the `IntoResponse` impl.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::error;

/// Central error type for the launcher
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error from kube-rs
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Malformed request body or parameter; message is the full response text
    #[error("{0}")]
    BadRequest(String),

    /// EIP-2335 schema violation; message names the offending field
    #[error("Invalid keystore format: {0}")]
    MalformedKeystore(String),

    /// A required flag is absent from the child argument vector
    #[error("missing required child flag: {0}")]
    MissingFlag(&'static str),

    /// Keystore file or validator directory does not exist
    #[error("{0}")]
    NotFound(String),

    /// Create attempted on an existing keystore
    #[error("{0}")]
    AlreadyExists(String),

    /// Launch attempted while a validator child is alive
    #[error("Validator is already running")]
    AlreadyRunning,

    /// The child exited inside the early-exit observation window
    #[error("Lighthouse validator exited early: {0}")]
    ChildExited(String),

    /// Readiness watch ended without observing readiness
    #[error("{0}")]
    WatchFailed(String),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for launcher operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// The HTTP status this error surfaces as
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest(_)
            | Error::MalformedKeystore(_)
            | Error::MissingFlag(_)
            | Error::AlreadyRunning => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::AlreadyExists(_) => StatusCode::CONFLICT,
            Error::KubeError(_)
            | Error::SerializationError(_)
            | Error::ChildExited(_)
            | Error::WatchFailed(_)
            | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, self.to_string()).into_response()
    }
}
