//! Error types for coordinate validation.

use thiserror::Error;

/// Error type for location operations.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum LocationError {
    /// Latitude is NaN, infinite, or outside -90..=90.
    #[error("Invalid latitude: {0}")]
    InvalidLatitude(f64),

    /// Longitude is NaN, infinite, or outside -180..=180.
    #[error("Invalid longitude: {0}")]
    InvalidLongitude(f64),
}

/// Result type alias for location operations.
pub type Result<T> = std::result::Result<T, LocationError>;
