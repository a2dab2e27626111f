//! Location module for Nearby.
//!
//! Provides validated coordinates and great-circle distance:
//! - [`Coordinate`] rejects NaN, infinite and out-of-range values
//! - [`distance_km`] is the haversine formula on a 6371 km sphere
//! - [`distance_meters`] serves point-to-point queries (meters, unrounded)
//! - [`distance_km_floor`] serves ranked lists (kilometers, floored)
//!
//! # Example Usage
//!
//! ```
//! use nearby_core::location::{distance_km_floor, distance_meters, Coordinate};
//!
//! let origin = Coordinate::new(0.0, 0.0).unwrap();
//! let east = Coordinate::new(0.0, 1.0).unwrap();
//!
//! assert_eq!(distance_km_floor(&origin, &east), 111);
//! assert!(distance_meters(&origin, &east) > 111_000.0);
//! ```

pub mod distance;
mod error;
pub mod types;

pub use distance::{distance_km, distance_km_floor, distance_meters, EARTH_RADIUS_KM};
pub use error::{LocationError, Result};
pub use types::Coordinate;
