//! Location data types.

use serde::{Deserialize, Serialize};

use super::error::{LocationError, Result};

/// Placeholder latitude assigned to users who never set a location.
pub const PLACEHOLDER_LATITUDE: f64 = 55.0;

/// Placeholder longitude assigned to users who never set a location.
pub const PLACEHOLDER_LONGITUDE: f64 = 55.0;

/// A geographic coordinate in degrees.
///
/// Values built through [`Coordinate::new`] are always finite and within
/// range. The [`Default`] value is the (55, 55) placeholder stored for users
/// who never shared a location; it is not geographically meaningful, see
/// [`Coordinate::is_placeholder`].
///
/// # Example
///
/// ```
/// use nearby_core::location::Coordinate;
///
/// let warsaw = Coordinate::new(52.2297, 21.0122).unwrap();
/// assert_eq!(warsaw.latitude, 52.2297);
/// assert!(Coordinate::new(f64::NAN, 0.0).is_err());
/// assert!(Coordinate::default().is_placeholder());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
}

impl Coordinate {
    /// The placeholder coordinate for users without a location.
    pub const PLACEHOLDER: Self = Self {
        latitude: PLACEHOLDER_LATITUDE,
        longitude: PLACEHOLDER_LONGITUDE,
    };

    /// Creates a validated coordinate.
    ///
    /// # Errors
    ///
    /// Returns an error if either value is NaN, infinite, or out of range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(LocationError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(LocationError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Re-checks the range invariant.
    ///
    /// Useful for values that arrived through deserialization, which does
    /// not go through [`Coordinate::new`].
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Coordinate::new`].
    pub fn validate(&self) -> Result<()> {
        Self::new(self.latitude, self.longitude).map(|_| ())
    }

    /// Whether this is the (55, 55) "never set" placeholder.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_placeholder(&self) -> bool {
        self.latitude == PLACEHOLDER_LATITUDE && self.longitude == PLACEHOLDER_LONGITUDE
    }

    /// Latitude and longitude in radians.
    #[must_use]
    pub fn to_radians(&self) -> (f64, f64) {
        (self.latitude.to_radians(), self.longitude.to_radians())
    }
}

impl Default for Coordinate {
    fn default() -> Self {
        Self::PLACEHOLDER
    }
}

impl TryFrom<(f64, f64)> for Coordinate {
    type Error = LocationError;

    fn try_from((latitude, longitude): (f64, f64)) -> Result<Self> {
        Self::new(latitude, longitude)
    }
}
