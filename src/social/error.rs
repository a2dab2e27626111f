//! Error types for accounts, messaging, groups and alerts.
//!
//! This module defines errors that can occur during social operations,
//! including storage errors, validation errors, and access errors.

use thiserror::Error;

use crate::discovery::DiscoveryError;
use crate::location::LocationError;

/// Error type for social operations.
#[derive(Error, Debug)]
pub enum SocialError {
    /// Storage operation failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Database error from `SQLite`.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Referenced user, group or record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data provided.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Record already exists.
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Wrong group password.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The actors are not allowed to interact.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The credential collaborator failed.
    #[error("Credential error: {0}")]
    Credential(String),
}

/// Result type alias for social operations.
pub type Result<T> = std::result::Result<T, SocialError>;

impl From<DiscoveryError> for SocialError {
    fn from(err: DiscoveryError) -> Self {
        match err {
            DiscoveryError::NotFound(msg) => Self::NotFound(msg),
            DiscoveryError::InvalidInput(msg) => Self::InvalidData(msg),
            DiscoveryError::PermissionDenied(msg) => Self::PermissionDenied(msg),
            DiscoveryError::Storage(inner) => inner,
        }
    }
}

impl From<LocationError> for SocialError {
    fn from(err: LocationError) -> Self {
        Self::InvalidData(err.to_string())
    }
}
