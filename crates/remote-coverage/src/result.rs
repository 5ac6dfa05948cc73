//! Result and error types for remote coverage collection.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for remote coverage operations
pub type CoverageResult<T> = Result<T, CoverageError>;

/// Errors that can occur while correlating, fetching or storing coverage
#[derive(Debug, Error)]
pub enum CoverageError {
    /// Configuration rejected at load time
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// A coverage flush was requested while no suite group is active
    #[error("No coverage group is active; before_suite must run with coverage enabled first")]
    NoActiveGroup,

    /// A suite asked for a session name nobody registered
    #[error("Unknown session \"{name}\" (registered: {registered})")]
    UnknownSession {
        /// Requested session name
        name: String,
        /// Comma separated registered names
        registered: String,
    },

    /// Setting a cookie or starting the session failed
    #[error("Session \"{name}\" failed: {message}")]
    Session {
        /// Session name
        name: String,
        /// Error message
        message: String,
    },

    /// Transport failure while talking to the export endpoint
    #[error("Request to \"{url}\" failed: {message}")]
    Transport {
        /// Request URL
        url: String,
        /// Error message
        message: String,
    },

    /// Export endpoint did not answer within the configured timeout
    #[error("Request to \"{url}\" timed out after {secs}s")]
    Timeout {
        /// Request URL
        url: String,
        /// Timeout in seconds
        secs: u64,
    },

    /// Export endpoint answered with something that is not coverage data
    #[error("The response for \"{url}\" did not contain serialized coverage data ({reason}): {body}")]
    MalformedPayload {
        /// Request URL
        url: String,
        /// Why decoding failed
        reason: String,
        /// Raw response body
        body: String,
    },

    /// An existing output file could not be decoded for merging
    #[error("Stored coverage at {} is corrupt: {message}", path.display())]
    CorruptStore {
        /// File path
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Lifecycle hook delivered out of order
    #[error("Lifecycle event {event} is not allowed while {phase}")]
    OutOfOrder {
        /// Offending event
        event: &'static str,
        /// Dispatcher phase at the time
        phase: &'static str,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CoverageError {
    /// Create a configuration error
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a session error
    #[must_use]
    pub fn session(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Session {
            name: name.into(),
            message: message.into(),
        }
    }
}
