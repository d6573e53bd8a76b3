//! Domain errors for the xporter reporting pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a whole execution.
///
/// Only report discovery and parsing are allowed to terminate a run; every
/// remote failure is converted into a logged warning by the caller.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("No report files matching '{pattern}' found under {}", root.display())]
    NoReportFiles { root: PathBuf, pattern: String },

    #[error("Invalid report discovery pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Failed to scan report directory {}: {reason}", root.display())]
    Discovery { root: PathBuf, reason: String },

    #[error("Failed to read report {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse report {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write merged report {}: {reason}", path.display())]
    Write { path: PathBuf, reason: String },
}

/// Result of pipeline operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// Errors returned by the remote test catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Authentication failed")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Resource not found")]
    NotFound,

    #[error("Rate limit exceeded - too many requests")]
    RateLimitExceeded,

    #[error("Server error ({status}): {body}")]
    ServerError { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("Unexpected status ({status}): {body}")]
    Unexpected { status: u16, body: String },
}

impl CatalogError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            400 => Self::InvalidRequest(body),
            401 => Self::Unauthorized,
            403 => Self::Forbidden(body),
            404 => Self::NotFound,
            429 => Self::RateLimitExceeded,
            500 | 502 | 503 | 504 => Self::ServerError { status, body },
            _ => Self::Unexpected { status, body },
        }
    }

    /// Returns true if this error is transient and should be retried
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded | Self::ServerError { .. } | Self::Timeout | Self::Network(_)
        )
    }
}

/// Result of catalog calls.
pub type CatalogResult<T> = Result<T, CatalogError>;

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
