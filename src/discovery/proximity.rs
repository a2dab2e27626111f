//! Nearby-users ranking.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use super::presence::PresenceEvaluator;
use super::types::{RankedCandidate, UserId, UserSnapshot};
use crate::location::distance_km_floor;

/// Attaches distance from `actor` and presence to `user`.
#[must_use]
pub fn rank_candidate(
    actor: &UserSnapshot,
    user: UserSnapshot,
    presence: &PresenceEvaluator,
    now: DateTime<Utc>,
) -> RankedCandidate {
    RankedCandidate {
        distance_km: distance_km_floor(&actor.coordinate, &user.coordinate),
        online: presence.is_online(user.last_activity, now),
        user,
        last_interaction: None,
    }
}

/// Orders `pool` by distance from `actor`, closest first.
///
/// The actor and every id in `excluded` are dropped. The sort is stable, so
/// users at the same floored distance keep their order from `pool`.
#[must_use]
pub fn rank_by_proximity(
    actor: &UserSnapshot,
    pool: impl IntoIterator<Item = UserSnapshot>,
    excluded: &HashSet<UserId>,
    presence: &PresenceEvaluator,
    now: DateTime<Utc>,
) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = pool
        .into_iter()
        .filter(|user| user.id != actor.id && !excluded.contains(&user.id))
        .map(|user| rank_candidate(actor, user, presence, now))
        .collect();

    ranked.sort_by_key(|c| c.distance_km);
    ranked
}
