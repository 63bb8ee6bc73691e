//! Inference error types.
//!
//! All errors implement `std::error::Error` via `thiserror`. The streaming
//! path renders these into the synthesized error fragments it yields, so the
//! wording stays consistent between `Result`-returning and stream-folding
//! call sites.

use thiserror::Error;

/// Errors that can occur while talking to the inference server.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// TCP/HTTP connection to the server failed.
    #[error("connection failed to {endpoint}: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },

    /// The server did not respond within the configured timeout.
    #[error("inference timeout after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// Non-2xx HTTP response from the chat endpoint.
    #[error("inference server returned HTTP {status}")]
    HttpStatus { status: u16 },

    /// Read failure after the response stream started.
    #[error("stream error: {reason}")]
    Stream { reason: String },

    /// Configuration loading or validation error.
    #[error("config error: {reason}")]
    Config { reason: String },
}

impl InferenceError {
    /// Classify a reqwest transport error into the matching variant.
    pub(crate) fn from_transport(endpoint: &str, err: &reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            InferenceError::Timeout {
                duration_secs: timeout_secs,
            }
        } else {
            InferenceError::ConnectionFailed {
                endpoint: endpoint.to_string(),
                reason: err.to_string(),
            }
        }
    }
}
