//! Proximity discovery and activity ranking.
//!
//! Turns a request's snapshot of users, blocks and messages into ordered
//! lists of [`RankedCandidate`]s.
//!
//! # Architecture
//!
//! ```text
//! DiscoveryService (reads repository + clock)
//!     ├── BlockFilter        who is hidden / who may message
//!     ├── PresenceEvaluator  online within the threshold
//!     ├── rank_by_proximity  floored km, ascending, stable
//!     └── rank_by_recency    latest message either way, descending
//! ```
//!
//! # Block Policy
//!
//! Discovery hides users who blocked the actor. Users the actor blocked stay
//! visible unless symmetric exclusion is enabled. Messaging is refused when
//! either side blocked the other.

mod block;
mod error;
mod presence;
mod proximity;
mod recency;
mod repository;
mod service;
pub mod types;

pub use block::BlockFilter;
pub use error::{DiscoveryError, Result};
pub use presence::{PresenceEvaluator, DEFAULT_ONLINE_THRESHOLD_SECS};
pub use proximity::{rank_by_proximity, rank_candidate};
pub use recency::{correspondents, rank_by_recency, Correspondent};
pub use repository::{Clock, FixedClock, SocialRepository, SystemClock};
pub use service::DiscoveryService;
pub use types::{
    ActivityReport, ActivityStatus, BlockRelation, DistanceReport, GroupId, MessageEdge,
    RankedCandidate, UserId, UserSnapshot,
};
