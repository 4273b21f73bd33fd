//! Error types and result aliases for Garner operations.
//!
//! Provides a unified error type that covers all failure conditions across
//! the Garner crates with actionable error messages.

use thiserror::Error;

use crate::types::VersionError;

/// Unified error type for all Garner operations
#[derive(Error, Debug)]
pub enum GarnerError {
    // Coordinate & version errors
    #[error("Invalid coordinate '{input}': {reason}")]
    CoordinateParse { input: String, reason: String },

    #[error("Invalid version spec '{input}': {message}")]
    VersionParse { input: String, message: String },

    #[error("Coordinate '{coordinate}' has no pinned version")]
    UnpinnedVersion { coordinate: String },

    // Registry errors
    #[error("No repository could supply '{coordinate}' (attempted: {})", .attempted.join(", "))]
    NotFound {
        coordinate: String,
        attempted: Vec<String>,
    },

    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Malformed descriptor for '{coordinate}': {message}")]
    DescriptorParse {
        coordinate: String,
        message: String,
    },

    // Resolution errors
    #[error("Dependency cycle detected: {path}")]
    Cycle { path: String },

    #[error("No version of '{coordinate}' satisfies the requested range (available: [{}])", .available.join(", "))]
    UnsatisfiedRange {
        coordinate: String,
        available: Vec<String>,
    },

    #[error("Resolution cancelled")]
    Cancelled,

    // Cache errors
    #[error("Checksum mismatch for {subject}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        subject: String,
        expected: String,
        actual: String,
    },

    // Configuration errors
    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for Garner operations
pub type GarnerResult<T> = Result<T, GarnerError>;

impl GarnerError {
    /// Create a transport error from any error type
    pub fn transport<E>(message: String, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport {
            message,
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: String, source: std::io::Error) -> Self {
        Self::Io { message, source }
    }

    /// Check if this error is a transport-level failure eligible for retry
    /// and repository fallthrough
    pub fn is_transient(&self) -> bool {
        matches!(self, GarnerError::Transport { .. } | GarnerError::Io { .. })
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            GarnerError::NotFound { .. } => {
                Some("Check the coordinate spelling or add a repository that hosts it")
            }
            GarnerError::Transport { .. } => Some("Check your network connection and try again"),
            GarnerError::Cycle { .. } => {
                Some("Break the cycle by excluding one of the participating artifacts")
            }
            GarnerError::UnsatisfiedRange { .. } => {
                Some("Widen the version range or add a repository offering a matching version")
            }
            GarnerError::ChecksumMismatch { .. } => {
                Some("Clear the local store and re-materialize; the cached bytes are corrupt")
            }
            _ => None,
        }
    }
}

impl From<VersionError> for GarnerError {
    fn from(err: VersionError) -> Self {
        GarnerError::VersionParse {
            input: err.input().to_string(),
            message: err.to_string(),
        }
    }
}
