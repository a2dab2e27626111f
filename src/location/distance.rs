//! Great-circle distance between coordinates.
//!
//! Two public entry points exist on purpose and must stay separate:
//!
//! | Function              | Unit       | Rounding        | Used by                  |
//! |-----------------------|------------|-----------------|--------------------------|
//! | [`distance_meters`]   | meters     | none            | point-to-point queries   |
//! | [`distance_km_floor`] | kilometers | floored integer | ranked candidate lists   |
//!
//! Both are built on [`distance_km`], the haversine formula on a sphere of
//! radius [`EARTH_RADIUS_KM`].

use super::types::Coordinate;

/// Mean Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometers, unrounded.
///
/// Identical coordinates give exactly `0.0`. The haversine term is clamped
/// to `[0, 1]` so rounding noise can never produce NaN.
///
/// # Examples
///
/// ```
/// use nearby_core::location::{distance_km, Coordinate};
///
/// let berlin = Coordinate::new(52.5200, 13.4050).unwrap();
/// let paris = Coordinate::new(48.8566, 2.3522).unwrap();
/// assert!((distance_km(&berlin, &paris) - 878.0).abs() < 10.0);
/// ```
#[must_use]
pub fn distance_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let (lat1, lon1) = a.to_radians();
    let (lat2, lon2) = b.to_radians();

    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);
    let central_angle = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * central_angle
}

/// Point-to-point distance in meters, unrounded.
///
/// # Examples
///
/// ```
/// use nearby_core::location::{distance_meters, Coordinate};
///
/// let a = Coordinate::new(0.0, 0.0).unwrap();
/// let b = Coordinate::new(0.0, 1.0).unwrap();
/// let meters = distance_meters(&a, &b);
/// assert!((meters - 111_194.9).abs() < 1.0);
/// ```
#[must_use]
pub fn distance_meters(a: &Coordinate, b: &Coordinate) -> f64 {
    distance_km(a, b) * 1000.0
}

/// Distance in whole kilometers, floored.
///
/// This is the value carried by ranked lists. Floors, never rounds:
/// 111.9 km becomes 111.
///
/// # Examples
///
/// ```
/// use nearby_core::location::{distance_km_floor, Coordinate};
///
/// let a = Coordinate::new(0.0, 0.0).unwrap();
/// let b = Coordinate::new(1.0, 0.0).unwrap();
/// assert_eq!(distance_km_floor(&a, &b), 111);
/// ```
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn distance_km_floor(a: &Coordinate, b: &Coordinate) -> i64 {
    // Bounded by half the circumference (~20_015 km), so the cast is exact.
    distance_km(a, b).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn identical_coordinates_are_zero() {
        let points = [
            coord(0.0, 0.0),
            coord(52.2297, 21.0122),
            coord(90.0, 0.0),
            coord(-90.0, 180.0),
            Coordinate::PLACEHOLDER,
        ];
        for p in &points {
            assert_eq!(distance_km(p, p), 0.0);
            assert_eq!(distance_meters(p, p), 0.0);
            assert_eq!(distance_km_floor(p, p), 0);
        }
    }

    #[test]
    fn one_degree_on_equator() {
        let km = distance_km(&coord(0.0, 0.0), &coord(0.0, 1.0));
        assert!((km - 111.195).abs() < 0.01);
    }

    #[test]
    fn meters_are_unrounded_kilometers_times_thousand() {
        let a = coord(52.2297, 21.0122);
        let b = coord(50.0647, 19.9450);
        let km = distance_km(&a, &b);
        let meters = distance_meters(&a, &b);

        assert!((meters - km * 1000.0).abs() < 1e-6);
        assert!(meters.fract() != 0.0);
    }

    #[test]
    fn floor_truncates_instead_of_rounding() {
        // 111.195 km would round to 111 either way, so pick a pair whose
        // fractional part is above one half.
        let a = coord(0.0, 0.0);
        let b = coord(0.0, 1.005);
        let km = distance_km(&a, &b);
        assert!(km.fract() > 0.5, "fixture must have fract > 0.5, got {km}");
        assert_eq!(distance_km_floor(&a, &b), km.floor() as i64);
        assert_ne!(distance_km_floor(&a, &b), km.round() as i64);
    }

    #[test]
    fn warsaw_to_krakow() {
        let warsaw = coord(52.2297, 21.0122);
        let krakow = coord(50.0647, 19.9450);
        let km = distance_km(&warsaw, &krakow);
        assert!((km - 252.0).abs() < 2.0, "got {km}");
        assert_eq!(distance_km_floor(&warsaw, &krakow), km.floor() as i64);
    }

    #[test]
    fn antipodal_points_do_not_produce_nan() {
        let km = distance_km(&coord(0.0, 0.0), &coord(0.0, 180.0));
        assert!(km.is_finite());
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_KM;
        assert!((km - half_circumference).abs() < 1e-6);
    }

    #[test]
    fn pole_to_pole() {
        let km = distance_km(&coord(90.0, 0.0), &coord(-90.0, 0.0));
        assert!((km - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = coord(37.7749, -122.4194);
        let b = coord(-33.8688, 151.2093);
        assert!((distance_km(&a, &b) - distance_km(&b, &a)).abs() < 1e-9);
    }
}
