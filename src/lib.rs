//! Nearby Core Library
//!
//! Core functionality for Nearby - find people close to you and keep in
//! touch. This crate ranks users by distance and by conversation recency,
//! tracks who is online, and stores the accounts, messages, groups and alerts
//! those rankings are built from.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![deny(unsafe_code)]

mod api;
pub mod config;
pub mod discovery;
pub mod location;
pub mod logging;
pub mod social;

pub use api::NearbyCore;
