//! Collaborator interfaces: persistence and time.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::error::Result;
use super::types::{BlockRelation, GroupId, MessageEdge, UserId, UserSnapshot};

/// Read access to the snapshots ranking needs.
///
/// Implementations return plain data fetched for one request; the rankers
/// never hold a live handle into storage.
pub trait SocialRepository {
    /// Looks up a single user. `None` if the id is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    fn get_user(&self, id: UserId) -> Result<Option<UserSnapshot>>;

    /// All users except `excluding`, in storage order.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    fn list_users(&self, excluding: UserId) -> Result<Vec<UserSnapshot>>;

    /// Every block relation where `user` is blocker or blocked.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    fn list_block_relations(&self, user: UserId) -> Result<Vec<BlockRelation>>;

    /// Every message sent or received by `user`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    fn list_messages(&self, involving: UserId) -> Result<Vec<MessageEdge>>;

    /// Members of a group. `None` if the group is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store fails.
    fn list_group_members(&self, group: GroupId) -> Result<Option<Vec<UserSnapshot>>>;
}

impl<T: SocialRepository + ?Sized> SocialRepository for Arc<T> {
    fn get_user(&self, id: UserId) -> Result<Option<UserSnapshot>> {
        (**self).get_user(id)
    }

    fn list_users(&self, excluding: UserId) -> Result<Vec<UserSnapshot>> {
        (**self).list_users(excluding)
    }

    fn list_block_relations(&self, user: UserId) -> Result<Vec<BlockRelation>> {
        (**self).list_block_relations(user)
    }

    fn list_messages(&self, involving: UserId) -> Result<Vec<MessageEdge>> {
        (**self).list_messages(involving)
    }

    fn list_group_members(&self, group: GroupId) -> Result<Option<Vec<UserSnapshot>>> {
        (**self).list_group_members(group)
    }
}

/// Source of the current time.
pub trait Clock {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stuck at one instant, for tests and replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
