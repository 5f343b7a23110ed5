//! Error types used throughout the connector

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the Alyante connector
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum AlyanteError {
    /// Missing or invalid configuration (webservice URL, resource, method,
    /// params). Always raised before any network call.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Login, refresh or validate failed, or the token response was
    /// incomplete.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Network or HTTP failure while a call was in flight.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Download error: {0}")]
    Download(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AlyanteError {
    /// Stable label suitable for structured log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Auth(_) => "auth",
            Self::Transport(_) => "transport",
            Self::Download(_) => "download",
            Self::Upload(_) => "upload",
            Self::Database(_) => "database",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::Internal(_) => "internal",
        }
    }

    /// Inner message without the variant prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Config(m)
            | Self::Auth(m)
            | Self::Transport(m)
            | Self::Download(m)
            | Self::Upload(m)
            | Self::Database(m)
            | Self::NotFound(m)
            | Self::InvalidInput(m)
            | Self::Internal(m) => m,
        }
    }

    /// Rewrite the message, keeping the variant.
    pub fn map_message(self, f: impl FnOnce(&str) -> String) -> Self {
        match self {
            Self::Config(m) => Self::Config(f(&m)),
            Self::Auth(m) => Self::Auth(f(&m)),
            Self::Transport(m) => Self::Transport(f(&m)),
            Self::Download(m) => Self::Download(f(&m)),
            Self::Upload(m) => Self::Upload(f(&m)),
            Self::Database(m) => Self::Database(f(&m)),
            Self::NotFound(m) => Self::NotFound(f(&m)),
            Self::InvalidInput(m) => Self::InvalidInput(f(&m)),
            Self::Internal(m) => Self::Internal(f(&m)),
        }
    }
}

/// Result type alias for connector operations
pub type Result<T> = std::result::Result<T, AlyanteError>;
