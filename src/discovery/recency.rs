//! Recent-correspondents ranking.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::error::Result;
use super::presence::PresenceEvaluator;
use super::proximity::rank_candidate;
use super::types::{MessageEdge, RankedCandidate, UserId, UserSnapshot};

/// A correspondent and the latest message exchanged with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correspondent {
    /// The other party.
    pub id: UserId,
    /// Latest message in either direction.
    pub latest_interaction: DateTime<Utc>,
}

/// Distinct correspondents of `actor`, most recent interaction first.
///
/// Messages in both directions count. Several messages with one user
/// collapse into one entry. Ties keep the order in which the correspondent
/// first appears in `history`.
#[must_use]
pub fn correspondents(actor: UserId, history: &[MessageEdge]) -> Vec<Correspondent> {
    let mut ordered: Vec<Correspondent> = Vec::new();
    let mut index: HashMap<UserId, usize> = HashMap::new();

    for edge in history {
        let Some(other) = edge.other_party(actor) else {
            continue;
        };
        match index.get(&other) {
            Some(&i) => {
                let entry = &mut ordered[i];
                entry.latest_interaction = entry.latest_interaction.max(edge.sent_at);
            }
            None => {
                index.insert(other, ordered.len());
                ordered.push(Correspondent {
                    id: other,
                    latest_interaction: edge.sent_at,
                });
            }
        }
    }

    ordered.sort_by(|a, b| b.latest_interaction.cmp(&a.latest_interaction));
    ordered
}

/// Orders `actor`'s correspondents by most recent interaction.
///
/// `resolve` looks up each correspondent's snapshot; its errors propagate.
/// Distance and presence are attached to each entry but never reorder it.
///
/// # Errors
///
/// Returns whatever `resolve` fails with.
pub fn rank_by_recency<F>(
    actor: &UserSnapshot,
    history: &[MessageEdge],
    mut resolve: F,
    presence: &PresenceEvaluator,
    now: DateTime<Utc>,
) -> Result<Vec<RankedCandidate>>
where
    F: FnMut(UserId) -> Result<UserSnapshot>,
{
    correspondents(actor.id, history)
        .into_iter()
        .map(|c| {
            let user = resolve(c.id)?;
            let mut ranked = rank_candidate(actor, user, presence, now);
            ranked.last_interaction = Some(c.latest_interaction);
            Ok(ranked)
        })
        .collect()
}
