//! Error types for the merleau library.
//!
//! Two error types mirror the two layers a failure can come from:
//!
//! * [`MerleauError`]: returned by the top-level `analyze*` functions. The
//!   first variants are user-actionable (no API key, no such file, the
//!   service could not process the video) and are raised before or instead
//!   of any further remote work.
//!
//! * [`ServiceError`]: whatever the remote media service layer produced
//!   (network failure, quota, HTTP status, a body we could not decode). It is
//!   carried inside [`MerleauError::Service`] unchanged; the orchestration
//!   layer never re-classifies it.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the merleau library.
#[derive(Debug, Error)]
pub enum MerleauError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No API key was supplied and none was found in the environment.
    #[error("{var} not found in environment or .env file\nGet a key from https://aistudio.google.com/apikey")]
    MissingApiKey { var: String },

    /// The local video path does not exist.
    #[error("Video file not found: '{path}'")]
    FileNotFound { path: PathBuf },

    // ── Processing errors ─────────────────────────────────────────────────
    /// The service reported that it could not process the uploaded video.
    #[error("File processing failed for '{name}'")]
    ProcessingFailed { name: String },

    /// The configured poll budget ran out while the video was still processing.
    #[error("File '{name}' still processing after {polls} status checks")]
    ProcessingTimeout { name: String, polls: u32 },

    // ── Remote service errors ─────────────────────────────────────────────
    /// Anything the remote service layer raised, passed through untouched.
    #[error(transparent)]
    Service(#[from] ServiceError),

    // ── Local I/O ─────────────────────────────────────────────────────────
    /// Could not stage in-memory video bytes to a temporary file.
    #[error("Failed to stage upload '{file_name}': {source}")]
    Staging {
        file_name: String,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors raised by a [`crate::service::MediaService`] implementation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Transport-level failure (DNS, TLS, connection reset, timeout).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("Gemini API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The service answered 2xx but the body was not what we expected.
    #[error("Malformed response from Gemini API: {0}")]
    MalformedResponse(String),

    /// Reading the local file for upload failed.
    #[error("Failed to read '{path}' for upload: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MerleauError {
    /// True for the errors a user can fix by changing their input
    /// (key, path) rather than retrying.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            MerleauError::MissingApiKey { .. }
                | MerleauError::FileNotFound { .. }
                | MerleauError::InvalidConfig(_)
        )
    }
}
