//! Error types for discovery and ranking.
//!
//! The rankers are pure computations; every error here either describes bad
//! input or is a storage failure passed through unchanged.

use thiserror::Error;

use crate::location::LocationError;
use crate::social::SocialError;

/// Error type for discovery operations.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// Actor or referenced user does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed input, such as a non-finite coordinate.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The two actors are blocked from interacting.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The persistence collaborator failed.
    #[error("Storage error: {0}")]
    Storage(#[from] SocialError),
}

/// Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;

impl From<LocationError> for DiscoveryError {
    fn from(err: LocationError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}
