//! Discovery read operations over a repository and a clock.

use tracing::debug;

use super::block::BlockFilter;
use super::error::{DiscoveryError, Result};
use super::presence::PresenceEvaluator;
use super::proximity::rank_by_proximity;
use super::recency::rank_by_recency;
use super::repository::{Clock, SocialRepository, SystemClock};
use super::types::{
    ActivityReport, DistanceReport, GroupId, RankedCandidate, UserId, UserSnapshot,
};
use crate::config::CoreSettings;
use crate::location::distance_meters;

/// Runs the ranking engine against one request's worth of snapshots.
///
/// Every call reads fresh data from the repository; the service holds no
/// per-request state and can be shared between threads when `R` and `C` can.
///
/// # Example
///
/// ```ignore
/// use nearby_core::discovery::{DiscoveryService, SystemClock};
///
/// let service = DiscoveryService::new(storage, SystemClock);
/// let nearby = service.nearby_users(actor_id)?;
/// ```
#[derive(Debug, Clone)]
pub struct DiscoveryService<R, C = SystemClock> {
    repository: R,
    clock: C,
    presence: PresenceEvaluator,
    symmetric_exclusion: bool,
}

impl<R: SocialRepository, C: Clock> DiscoveryService<R, C> {
    /// Creates a service with the default presence threshold and asymmetric
    /// block exclusion.
    #[must_use]
    pub fn new(repository: R, clock: C) -> Self {
        Self {
            repository,
            clock,
            presence: PresenceEvaluator::default(),
            symmetric_exclusion: false,
        }
    }

    /// Creates a service configured from settings.
    #[must_use]
    pub fn from_settings(repository: R, clock: C, settings: &CoreSettings) -> Self {
        Self::new(repository, clock)
            .with_presence(PresenceEvaluator::from_secs(settings.online_threshold_secs))
            .with_symmetric_exclusion(settings.symmetric_block_exclusion)
    }

    /// Overrides the presence evaluator.
    #[must_use]
    pub fn with_presence(mut self, presence: PresenceEvaluator) -> Self {
        self.presence = presence;
        self
    }

    /// Also hide users the actor blocked from the actor's lists.
    #[must_use]
    pub fn with_symmetric_exclusion(mut self, symmetric: bool) -> Self {
        self.symmetric_exclusion = symmetric;
        self
    }

    /// The presence evaluator in use.
    pub const fn presence(&self) -> &PresenceEvaluator {
        &self.presence
    }

    /// Users ordered by distance from `actor`, closest first.
    ///
    /// Users who blocked the actor are left out.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the actor is unknown, `InvalidInput` if a stored
    /// coordinate is malformed, or the repository's error.
    pub fn nearby_users(&self, actor: UserId) -> Result<Vec<RankedCandidate>> {
        let actor = self.require_user(actor)?;
        let excluded = self.block_filter(actor.id)?.excluded_ids_for(actor.id);
        let pool = self.repository.list_users(actor.id)?;
        ensure_valid_coordinates(&pool)?;

        let ranked = rank_by_proximity(&actor, pool, &excluded, &self.presence, self.clock.now());
        debug!(
            actor = actor.id,
            excluded = excluded.len(),
            results = ranked.len(),
            "Ranked nearby users"
        );
        Ok(ranked)
    }

    /// Users `actor` has exchanged messages with, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the actor or a correspondent is unknown, or the
    /// repository's error.
    pub fn recent_correspondents(&self, actor: UserId) -> Result<Vec<RankedCandidate>> {
        let actor = self.require_user(actor)?;
        let history = self.repository.list_messages(actor.id)?;

        let ranked = rank_by_recency(
            &actor,
            &history,
            |id| self.require_user(id),
            &self.presence,
            self.clock.now(),
        )?;
        debug!(
            actor = actor.id,
            messages = history.len(),
            results = ranked.len(),
            "Ranked recent correspondents"
        );
        Ok(ranked)
    }

    /// Members of `group` ordered by distance from `actor`.
    ///
    /// Applies the same block exclusion as [`nearby_users`](Self::nearby_users).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the actor or group is unknown, or the
    /// repository's error.
    pub fn group_members(&self, actor: UserId, group: GroupId) -> Result<Vec<RankedCandidate>> {
        let actor = self.require_user(actor)?;
        let members = self
            .repository
            .list_group_members(group)?
            .ok_or_else(|| DiscoveryError::NotFound(format!("Group {group}")))?;
        ensure_valid_coordinates(&members)?;
        let excluded = self.block_filter(actor.id)?.excluded_ids_for(actor.id);

        Ok(rank_by_proximity(
            &actor,
            members,
            &excluded,
            &self.presence,
            self.clock.now(),
        ))
    }

    /// Distance between two users in meters, unrounded.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if either user is unknown.
    pub fn distance_between(&self, a: UserId, b: UserId) -> Result<DistanceReport> {
        let a = self.require_user(a)?;
        let b = self.require_user(b)?;
        Ok(DistanceReport {
            distance: distance_meters(&a.coordinate, &b.coordinate),
        })
    }

    /// Whether `user` is currently online.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user is unknown.
    pub fn activity(&self, user: UserId) -> Result<ActivityReport> {
        let user = self.require_user(user)?;
        let now = self.clock.now();
        let status = self.presence.status(user.last_activity, now);
        Ok(ActivityReport {
            id: user.id,
            online: self.presence.is_online(user.last_activity, now),
            status,
        })
    }

    /// Block relations touching `actor`, as a filter.
    ///
    /// # Errors
    ///
    /// Returns the repository's error.
    pub fn block_filter(&self, actor: UserId) -> Result<BlockFilter> {
        let relations = self.repository.list_block_relations(actor)?;
        Ok(BlockFilter::new(relations).with_symmetric_exclusion(self.symmetric_exclusion))
    }

    fn require_user(&self, id: UserId) -> Result<UserSnapshot> {
        let user = self
            .repository
            .get_user(id)?
            .ok_or_else(|| DiscoveryError::NotFound(format!("User {id}")))?;
        user.coordinate.validate()?;
        Ok(user)
    }
}

fn ensure_valid_coordinates(users: &[UserSnapshot]) -> Result<()> {
    for user in users {
        user.coordinate.validate().map_err(|e| {
            DiscoveryError::InvalidInput(format!("User {} has a malformed location: {e}", user.id))
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::*;
    use crate::discovery::repository::FixedClock;
    use crate::discovery::types::{BlockRelation, MessageEdge};
    use crate::location::Coordinate;

    #[derive(Default)]
    struct MemoryRepository {
        users: Vec<UserSnapshot>,
        blocks: Vec<BlockRelation>,
        messages: Vec<MessageEdge>,
        groups: HashMap<GroupId, Vec<UserId>>,
    }

    impl SocialRepository for MemoryRepository {
        fn get_user(&self, id: UserId) -> Result<Option<UserSnapshot>> {
            Ok(self.users.iter().find(|u| u.id == id).cloned())
        }

        fn list_users(&self, excluding: UserId) -> Result<Vec<UserSnapshot>> {
            Ok(self
                .users
                .iter()
                .filter(|u| u.id != excluding)
                .cloned()
                .collect())
        }

        fn list_block_relations(&self, user: UserId) -> Result<Vec<BlockRelation>> {
            Ok(self
                .blocks
                .iter()
                .filter(|r| r.blocker == user || r.blocked == user)
                .copied()
                .collect())
        }

        fn list_messages(&self, involving: UserId) -> Result<Vec<MessageEdge>> {
            Ok(self
                .messages
                .iter()
                .filter(|m| m.sender == involving || m.receiver == involving)
                .copied()
                .collect())
        }

        fn list_group_members(&self, group: GroupId) -> Result<Option<Vec<UserSnapshot>>> {
            Ok(self.groups.get(&group).map(|ids| {
                self.users
                    .iter()
                    .filter(|u| ids.contains(&u.id))
                    .cloned()
                    .collect()
            }))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn user(id: UserId, lat: f64, lon: f64) -> UserSnapshot {
        UserSnapshot {
            id,
            username: format!("user{id}"),
            coordinate: Coordinate::new(lat, lon).unwrap(),
            last_activity: now(),
        }
    }

    fn service(repo: MemoryRepository) -> DiscoveryService<MemoryRepository, FixedClock> {
        DiscoveryService::new(repo, FixedClock(now()))
    }

    fn ids(ranked: &[RankedCandidate]) -> Vec<UserId> {
        ranked.iter().map(|c| c.user.id).collect()
    }

    #[test]
    fn nearby_users_orders_by_distance() {
        let repo = MemoryRepository {
            users: vec![
                user(1, 0.0, 0.0),
                user(2, 0.0, 1.0),
                user(3, 1.0, 0.0),
                user(4, 0.0, 0.0),
            ],
            ..MemoryRepository::default()
        };

        let ranked = service(repo).nearby_users(1).unwrap();
        assert_eq!(ids(&ranked), vec![4, 2, 3]);
    }

    #[test]
    fn nearby_users_hides_only_users_who_blocked_actor() {
        let repo = MemoryRepository {
            users: vec![user(1, 0.0, 0.0), user(2, 0.0, 1.0), user(3, 0.0, 2.0)],
            // 2 blocked 1; 1 blocked 3.
            blocks: vec![BlockRelation::new(2, 1), BlockRelation::new(1, 3)],
            ..MemoryRepository::default()
        };

        let svc = service(repo);
        assert_eq!(ids(&svc.nearby_users(1).unwrap()), vec![3]);
        // 2's list still shows 1, the user 2 blocked.
        assert_eq!(ids(&svc.nearby_users(2).unwrap()), vec![1, 3]);
    }

    #[test]
    fn symmetric_exclusion_hides_both_directions() {
        let repo = MemoryRepository {
            users: vec![user(1, 0.0, 0.0), user(2, 0.0, 1.0), user(3, 0.0, 2.0)],
            blocks: vec![BlockRelation::new(2, 1)],
            ..MemoryRepository::default()
        };

        let svc = service(repo).with_symmetric_exclusion(true);
        assert_eq!(ids(&svc.nearby_users(2).unwrap()), vec![3]);
    }

    #[test]
    fn unknown_actor_is_not_found() {
        let svc = service(MemoryRepository::default());
        assert!(matches!(
            svc.nearby_users(42),
            Err(DiscoveryError::NotFound(_))
        ));
        assert!(matches!(
            svc.recent_correspondents(42),
            Err(DiscoveryError::NotFound(_))
        ));
    }

    #[test]
    fn malformed_stored_coordinate_is_invalid_input() {
        let mut broken = user(2, 0.0, 0.0);
        broken.coordinate.latitude = f64::NAN;
        let repo = MemoryRepository {
            users: vec![user(1, 0.0, 0.0), broken],
            ..MemoryRepository::default()
        };

        assert!(matches!(
            service(repo).nearby_users(1),
            Err(DiscoveryError::InvalidInput(_))
        ));
    }

    #[test]
    fn recent_correspondents_by_latest_message() {
        let repo = MemoryRepository {
            users: vec![user(1, 0.0, 0.0), user(10, 0.0, 1.0), user(20, 0.0, 5.0)],
            messages: vec![
                MessageEdge {
                    sender: 1,
                    receiver: 10,
                    sent_at: now() + Duration::seconds(10),
                },
                MessageEdge {
                    sender: 20,
                    receiver: 1,
                    sent_at: now() + Duration::seconds(20),
                },
            ],
            ..MemoryRepository::default()
        };

        let ranked = service(repo).recent_correspondents(1).unwrap();
        assert_eq!(ids(&ranked), vec![20, 10]);
        assert_eq!(ranked[0].distance_km, 555);
    }

    #[test]
    fn group_members_ranked_and_filtered() {
        let repo = MemoryRepository {
            users: vec![
                user(1, 0.0, 0.0),
                user(2, 0.0, 3.0),
                user(3, 0.0, 1.0),
                user(4, 0.0, 2.0),
            ],
            blocks: vec![BlockRelation::new(4, 1)],
            groups: HashMap::from([(7, vec![1, 2, 3, 4])]),
            ..MemoryRepository::default()
        };

        let svc = service(repo);
        assert_eq!(ids(&svc.group_members(1, 7).unwrap()), vec![3, 2]);
        assert!(matches!(
            svc.group_members(1, 8),
            Err(DiscoveryError::NotFound(_))
        ));
    }

    #[test]
    fn distance_between_is_in_meters() {
        let repo = MemoryRepository {
            users: vec![user(1, 0.0, 0.0), user(2, 0.0, 1.0)],
            ..MemoryRepository::default()
        };

        let svc = service(repo);
        let report = svc.distance_between(1, 2).unwrap();
        assert!((report.distance - 111_194.93).abs() < 1.0);
        assert!(matches!(
            svc.distance_between(1, 3),
            Err(DiscoveryError::NotFound(_))
        ));
    }

    #[test]
    fn activity_reports_presence() {
        let mut stale = user(2, 0.0, 0.0);
        stale.last_activity = now() - Duration::seconds(90);
        let repo = MemoryRepository {
            users: vec![user(1, 0.0, 0.0), stale],
            ..MemoryRepository::default()
        };

        let svc = service(repo);
        let fresh = svc.activity(1).unwrap();
        assert!(fresh.online);
        assert_eq!(fresh.status, crate::discovery::ActivityStatus::Active);

        let stale = svc.activity(2).unwrap();
        assert!(!stale.online);
        assert_eq!(stale.status, crate::discovery::ActivityStatus::Inactive);
    }

    #[test]
    fn settings_drive_threshold() {
        let settings = CoreSettings {
            online_threshold_secs: 120,
            ..CoreSettings::default()
        };
        let svc = DiscoveryService::from_settings(
            MemoryRepository::default(),
            FixedClock(now()),
            &settings,
        );
        assert_eq!(svc.presence().threshold(), Duration::seconds(120));
    }
}
