//! Domain error types
//!
//! This module defines the error hierarchy for the exporter.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Dataverse-related errors
    #[error("Dataverse error: {0}")]
    Dataverse(#[from] DataverseError),

    /// CSV export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

/// Dataverse-specific errors
///
/// Errors that occur while connecting to or querying a Dataverse environment.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum DataverseError {
    /// Connection string or service URL could not be parsed
    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    /// Failed to reach the Dataverse environment
    #[error("Failed to connect to Dataverse: {0}")]
    ConnectionFailed(String),

    /// Sign-in failed or no access token could be acquired
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Session was used before it became ready
    #[error("Session is not ready: {0}")]
    NotReady(String),

    /// Invalid response from the Web API
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },
}

impl DataverseError {
    /// Build the error matching a non-success HTTP status
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status >= 500 {
            DataverseError::ServerError { status, message }
        } else {
            DataverseError::ClientError { status, message }
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        ReportError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for ReportError {
    fn from(err: serde_json::Error) -> Self {
        ReportError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ReportError {
    fn from(err: toml::de::Error) -> Self {
        ReportError::Configuration(format!("TOML parse error: {err}"))
    }
}

// Conversion from CSV writer errors
impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        ReportError::Export(err.to_string())
    }
}
