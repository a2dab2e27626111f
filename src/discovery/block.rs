//! Block relation lookups.
//!
//! A [`BlockRelation`] is directed, but its effects are not uniform:
//!
//! - **Messaging** is gated on a *mutual* block: if either party blocked the
//!   other, neither can message.
//! - **Discovery** only hides the users who blocked the actor. Users the actor
//!   blocked stay visible unless symmetric exclusion is switched on.

use std::collections::HashSet;

use super::error::{DiscoveryError, Result};
use super::types::{BlockRelation, UserId};

/// Set of block relations with the queries the rankers need.
#[derive(Debug, Clone, Default)]
pub struct BlockFilter {
    relations: HashSet<BlockRelation>,
    symmetric_exclusion: bool,
}

impl BlockFilter {
    /// Builds a filter from block relations.
    #[must_use]
    pub fn new(relations: impl IntoIterator<Item = BlockRelation>) -> Self {
        Self {
            relations: relations.into_iter().collect(),
            symmetric_exclusion: false,
        }
    }

    /// Also exclude users the actor blocked from the actor's discovery lists.
    #[must_use]
    pub const fn with_symmetric_exclusion(mut self, symmetric: bool) -> Self {
        self.symmetric_exclusion = symmetric;
        self
    }

    /// True iff `by` has blocked `subject`.
    #[must_use]
    pub fn is_blocked(&self, subject: UserId, by: UserId) -> bool {
        self.relations.contains(&BlockRelation::new(by, subject))
    }

    /// True iff either user has blocked the other.
    #[must_use]
    pub fn is_mutually_blocked(&self, a: UserId, b: UserId) -> bool {
        self.is_blocked(a, b) || self.is_blocked(b, a)
    }

    /// Users to hide from `actor`'s discovery lists.
    ///
    /// Always the users who blocked the actor; with symmetric exclusion also
    /// the users the actor blocked.
    #[must_use]
    pub fn excluded_ids_for(&self, actor: UserId) -> HashSet<UserId> {
        self.relations
            .iter()
            .filter_map(|r| {
                if r.blocked == actor {
                    Some(r.blocker)
                } else if self.symmetric_exclusion && r.blocker == actor {
                    Some(r.blocked)
                } else {
                    None
                }
            })
            .collect()
    }

    /// Users `actor` has blocked.
    #[must_use]
    pub fn blocked_by(&self, actor: UserId) -> HashSet<UserId> {
        self.relations
            .iter()
            .filter(|r| r.blocker == actor)
            .map(|r| r.blocked)
            .collect()
    }

    /// Fails with [`DiscoveryError::PermissionDenied`] if the pair is
    /// mutually blocked.
    ///
    /// # Errors
    ///
    /// Returns `PermissionDenied` when either user blocked the other.
    pub fn ensure_can_message(&self, sender: UserId, receiver: UserId) -> Result<()> {
        if self.is_mutually_blocked(sender, receiver) {
            return Err(DiscoveryError::PermissionDenied(format!(
                "Users {sender} and {receiver} are blocked from messaging each other"
            )));
        }
        Ok(())
    }
}
