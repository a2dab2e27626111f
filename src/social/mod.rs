//! Accounts, relationships, messaging, groups and alerts.
//!
//! This module owns the persistent side of the crate. [`SocialStorage`] keeps
//! everything in `SQLite` and doubles as the
//! [`SocialRepository`](crate::discovery::SocialRepository) the discovery
//! engine reads from. [`SocialManager`] layers validation and access rules on
//! top.
//!
//! # Architecture
//!
//! ```text
//! SocialManager (validation, logging)
//!     ├── SocialStorage       SQLite tables
//!     ├── CredentialVerifier  group password hashing
//!     └── BlockFilter         messaging permission
//! ```

mod credentials;
mod error;
mod manager;
mod storage;
pub mod types;

pub use credentials::{CredentialVerifier, SaltedSha256Verifier};
pub use error::{Result, SocialError};
pub use manager::{SocialManager, DEFAULT_ALERT_PAGE_SIZE, DEFAULT_MAX_ALERT_PAGE_SIZE};
pub use storage::SocialStorage;
pub use types::{
    Alert, AlertPage, Gender, Group, GroupDetail, Message, NewAlert, NewGroup, NewUser,
    ProfileUpdate, ProfileView, UserProfile,
};
