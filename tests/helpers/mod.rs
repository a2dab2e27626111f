//! Reusable test helpers for integration tests.
//!
//! Every core built here runs on an in-memory database and a fixed clock, so
//! presence and alert windows are deterministic.

#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use nearby_core::config::CoreSettings;
use nearby_core::discovery::{FixedClock, UserSnapshot};
use nearby_core::location::Coordinate;
use nearby_core::social::{NewUser, SaltedSha256Verifier, UserProfile};
use nearby_core::NearbyCore;

/// The instant every test clock is stopped at.
pub fn now() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

/// `secs` seconds after [`now`].
pub fn at(secs: i64) -> DateTime<Utc> {
    now() + Duration::seconds(secs)
}

/// A core over a fresh in-memory database, stopped at `clock_at`.
pub fn core_at(clock_at: DateTime<Utc>) -> NearbyCore<FixedClock, SaltedSha256Verifier> {
    NearbyCore::in_memory(
        FixedClock(clock_at),
        SaltedSha256Verifier,
        &CoreSettings::default(),
    )
    .unwrap()
}

/// A core over a fresh in-memory database, stopped at [`now`].
pub fn core() -> NearbyCore<FixedClock, SaltedSha256Verifier> {
    core_at(now())
}

/// Registration data for `name` at the given location.
pub fn new_user(name: &str, lat: f64, lon: f64) -> NewUser {
    NewUser::new(
        name,
        format!("{name}@example.com"),
        NaiveDate::from_ymd_opt(1994, 4, 4).unwrap(),
    )
    .with_coordinate(Coordinate::new(lat, lon).unwrap())
}

/// Registers `name` at the given location.
pub fn register(
    core: &NearbyCore<FixedClock, SaltedSha256Verifier>,
    name: &str,
    lat: f64,
    lon: f64,
) -> UserProfile {
    core.register_user(&new_user(name, lat, lon)).unwrap()
}

/// A snapshot for pure ranking tests.
pub fn snapshot(id: i64, lat: f64, lon: f64, last_activity: DateTime<Utc>) -> UserSnapshot {
    UserSnapshot {
        id,
        username: format!("user{id}"),
        coordinate: Coordinate::new(lat, lon).unwrap(),
        last_activity,
    }
}
