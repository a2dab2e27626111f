//! Data types consumed and produced by the ranking engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::location::Coordinate;

/// Numeric user identifier.
pub type UserId = i64;

/// Numeric group identifier.
pub type GroupId = i64;

/// Read-only projection of a user, as needed for ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSnapshot {
    /// User ID.
    pub id: UserId,
    /// Public username.
    pub username: String,
    /// Last known location (placeholder if never set).
    #[serde(flatten)]
    pub coordinate: Coordinate,
    /// Last time the user made an authenticated request.
    pub last_activity: DateTime<Utc>,
}

/// A directed block: `blocker` has blocked `blocked`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockRelation {
    /// The user who created the block.
    pub blocker: UserId,
    /// The user who was blocked.
    pub blocked: UserId,
}

impl BlockRelation {
    /// Creates a relation.
    #[must_use]
    pub const fn new(blocker: UserId, blocked: UserId) -> Self {
        Self { blocker, blocked }
    }
}

/// A sent message, reduced to who, to whom, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEdge {
    /// Sender user ID.
    pub sender: UserId,
    /// Receiver user ID.
    pub receiver: UserId,
    /// When the message was created.
    pub sent_at: DateTime<Utc>,
}

impl MessageEdge {
    /// The party on the other side of this edge from `actor`.
    ///
    /// Returns `None` if the actor is not involved or the edge is
    /// self-addressed.
    #[must_use]
    pub fn other_party(&self, actor: UserId) -> Option<UserId> {
        match (self.sender == actor, self.receiver == actor) {
            (true, false) => Some(self.receiver),
            (false, true) => Some(self.sender),
            _ => None,
        }
    }
}

/// A user placed in a ranked list, with distance and presence attached.
///
/// Assembled once per request and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    /// The ranked user.
    #[serde(flatten)]
    pub user: UserSnapshot,
    /// Distance from the requesting actor in whole kilometers (floored).
    #[serde(rename = "distance")]
    pub distance_km: i64,
    /// Whether the user was active within the presence threshold.
    pub online: bool,
    /// Latest message exchanged with the actor (recency lists only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_interaction: Option<DateTime<Utc>>,
}

/// Point-to-point distance response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceReport {
    /// Distance in meters, unrounded.
    pub distance: f64,
}

/// Coarse activity state of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    /// Seen within the presence threshold.
    Active,
    /// Not seen within the presence threshold.
    Inactive,
}

impl ActivityStatus {
    /// String representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }
}

/// Presence answer for a single user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityReport {
    /// User ID.
    pub id: UserId,
    /// Whether the user is online.
    pub online: bool,
    /// Same information as a status word.
    pub status: ActivityStatus,
}
