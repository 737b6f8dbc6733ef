//! Error types for cornfield
//!
//! This module defines the various error types that can occur
//! while building, validating and dispatching queries.

use thiserror::Error;
use crate::core::path::PathError;

/// Errors that can occur during site operations
#[derive(Error, Debug)]
pub enum SiteError {
    #[error("Site already has an access point named {0:?}")]
    DuplicateRegistration(String),

    #[error("Unknown access point: {0:?}")]
    UnknownAccessPoint(String),

    #[error("Schema error at {path:?}: {reason}")]
    Schema {
        path: String,
        reason: String,
    },

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Path error: {0}")]
    PathError(#[from] PathError),

    #[error("No item matches request: {0}")]
    NotFound(String),

    #[error("Request {request} matched {count} items, expected exactly one")]
    MultipleMatches {
        request: String,
        count: usize,
    },

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SiteError {
    /// Shorthand for a schema error on `path`
    pub fn schema<P: ToString, R: Into<String>>(path: P, reason: R) -> Self {
        SiteError::Schema {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for site operations
pub type Result<T> = std::result::Result<T, SiteError>;
