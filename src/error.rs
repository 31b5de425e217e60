//! Error types for screens-dl
//!
//! One error enum covers the whole export pipeline:
//! - configuration problems detected before any request is made
//! - transport failures (network errors and non-success HTTP statuses)
//! - response bodies that do not match the expected schema
//! - filesystem failures while resetting the output root or writing images, always tagged with the path
//! - a failed screen download when the run is configured to abort on failure

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for screens-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for screens-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "api.workspace_id")
        key: Option<String>,
    },

    /// Network error raised by the HTTP client
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("request to {url} failed with HTTP status {status}")]
    Status {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// A response body did not match the expected schema
    #[error("unexpected response from {endpoint}: {source}")]
    Schema {
        /// Path of the endpoint that produced the body
        endpoint: String,
        /// Decoding failure
        #[source]
        source: serde_json::Error,
    },

    /// Writing an image or creating its directory failed
    #[error("failed to write {path}: {source}")]
    Write {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A screen's primary image could not be saved
    #[error("screen '{screen}' in project '{project}' failed: {source}")]
    ScreenDownload {
        /// Display name of the owning project
        project: String,
        /// Display name of the screen
        screen: String,
        /// What went wrong
        #[source]
        source: Box<Error>,
    },

    /// A spawned download task panicked or was cancelled
    #[error("download task failed: {0}")]
    TaskFailed(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Build a [`Error::Config`] for the given key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Status { status, .. } => Some(*status),
            Error::Network(e) => e.status().map(|s| s.as_u16()),
            Error::ScreenDownload { source, .. } => source.status(),
            _ => None,
        }
    }
}
