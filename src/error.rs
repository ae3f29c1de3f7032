//! Error types for the chat relay
//!
//! Defines application-level errors and the directory storage error surface.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Directory storage errors
///
/// The backing store behind [`crate::directory::ConnectionDirectory`] may
/// be a remote key-value service; its failures are propagated, never
/// swallowed.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// The backing store rejected or failed an operation
    #[error("connection store failure: {0}")]
    Store(String),
}

/// Application-level errors
///
/// Covers both fatal errors (connection termination) and internal
/// failures surfaced to the event shell as an internal-error outcome.
#[derive(Debug, Error)]
pub enum RelayError {
    /// WebSocket protocol error (fatal)
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error (fatal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory storage failure
    #[error("directory error: {0}")]
    Directory(#[from] DirectoryError),
}
