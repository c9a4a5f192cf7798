//! Faction selection: how many cultists a round gets and who they are.
//!
//! The draw is preference-weighted: players who opted in to the cult are drawn from first.
//! When too few opted in, the whole eligible pool is used instead. Nothing here touches
//! game state; the caller grants the faction marker to each chosen player.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::rule::host::{EntityId, SessionHandle, SessionId};
use crate::rule::rng::Rng;

/// Antagonist id players opt in to through their stored preferences.
pub const CULTIST_ANTAG_ID: &str = "Cultist";

/// A player offered to the selector at round start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub session: SessionHandle,
    pub entity: Option<EntityId>,
    /// False when any of the player's roles forbids antagonist assignment.
    pub can_be_antag: bool,
}

/// Stored antagonist preferences of one player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntagPreferences {
    pub antags: BTreeSet<String>,
}

impl AntagPreferences {
    pub fn opted_in(antag: &str) -> Self {
        Self {
            antags: BTreeSet::from([antag.to_string()]),
        }
    }

    pub fn wants(&self, antag: &str) -> bool {
        self.antags.contains(antag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub players_per_member: usize,
    pub min_members: usize,
    pub max_members: usize,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            players_per_member: 10,
            min_members: 2,
            max_members: 10,
        }
    }
}

impl SelectionPolicy {
    /// `clamp(players / ratio, min, max)`. The cap wins if the bounds are inverted.
    pub fn target_count(&self, players: usize) -> usize {
        let ratio = self.players_per_member.max(1);
        (players / ratio).max(self.min_members).min(self.max_members)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactionSelection {
    pub chosen: Vec<Candidate>,
    pub target_count: usize,
    pub pool_size: usize,
    /// Too few players opted in; the draw used every eligible player.
    pub used_fallback: bool,
}

impl FactionSelection {
    pub fn is_short(&self) -> bool {
        self.chosen.len() < self.target_count
    }
}

/// Pick the round's cultists from `eligible`.
pub fn select_faction(
    eligible: &[Candidate],
    preferences: &HashMap<SessionId, AntagPreferences>,
    policy: &SelectionPolicy,
    rng: &mut Rng,
) -> FactionSelection {
    let target_count = policy.target_count(eligible.len());
    let (mut pool, used_fallback) = candidate_pool(eligible, preferences, target_count);
    let pool_size = pool.len();

    if pool.len() < target_count {
        if !pool.is_empty() {
            info!(
                pool = pool.len(),
                wanted = target_count,
                "insufficient ready players to fill the cult, taking everyone eligible"
            );
        }
        return FactionSelection {
            chosen: pool,
            target_count,
            pool_size,
            used_fallback,
        };
    }

    let mut chosen = Vec::with_capacity(target_count);
    while chosen.len() < target_count {
        let Some(candidate) = rng.pick_and_take(&mut pool) else {
            break;
        };
        chosen.push(candidate);
    }
    info!(count = chosen.len(), fallback = used_fallback, "selected cultists");

    FactionSelection {
        chosen,
        target_count,
        pool_size,
        used_fallback,
    }
}

fn candidate_pool(
    eligible: &[Candidate],
    preferences: &HashMap<SessionId, AntagPreferences>,
    target_count: usize,
) -> (Vec<Candidate>, bool) {
    let mut seen = BTreeSet::new();
    let allowed: Vec<Candidate> = eligible
        .iter()
        .filter(|candidate| candidate.can_be_antag)
        .filter(|candidate| seen.insert(candidate.session.id))
        .cloned()
        .collect();

    let preferred: Vec<Candidate> = allowed
        .iter()
        .filter(|candidate| {
            preferences
                .get(&candidate.session.id)
                .is_some_and(|prefs| prefs.wants(CULTIST_ANTAG_ID))
        })
        .cloned()
        .collect();

    if preferred.len() < target_count {
        info!(
            preferred = preferred.len(),
            wanted = target_count,
            "insufficient preferred cultists, picking at random"
        );
        return (allowed, true);
    }
    (preferred, false)
}

/// Whether a late-joining player may still be drafted: the active faction is below
/// `clamp(players / ratio, 0, max)`.
pub fn late_join_has_quota(
    total_players: usize,
    current_members: usize,
    policy: &SelectionPolicy,
) -> bool {
    let quota = SelectionPolicy {
        min_members: 0,
        ..*policy
    }
    .target_count(total_players);
    current_members < quota
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(count: u64) -> Vec<Candidate> {
        (0..count)
            .map(|id| Candidate {
                session: SessionHandle {
                    id: SessionId(id),
                    user_name: format!("player{id}"),
                },
                entity: Some(EntityId(id + 1000)),
                can_be_antag: true,
            })
            .collect()
    }

    #[test]
    fn target_count_clamps() {
        let policy = SelectionPolicy::default();
        assert_eq!(policy.target_count(0), 2);
        assert_eq!(policy.target_count(35), 3);
        assert_eq!(policy.target_count(500), 10);
    }

    #[test]
    fn zero_ratio_does_not_divide_by_zero() {
        let policy = SelectionPolicy {
            players_per_member: 0,
            min_members: 0,
            max_members: 4,
        };
        assert_eq!(policy.target_count(3), 3);
    }

    #[test]
    fn preferred_players_are_drawn_when_enough_opted_in() {
        let pool = candidates(30);
        let preferences: HashMap<_, _> = (0..5)
            .map(|id| (SessionId(id), AntagPreferences::opted_in(CULTIST_ANTAG_ID)))
            .collect();
        let selection = select_faction(
            &pool,
            &preferences,
            &SelectionPolicy::default(),
            &mut Rng::new(9),
        );
        assert!(!selection.used_fallback);
        assert_eq!(selection.chosen.len(), 3);
        assert!(selection.chosen.iter().all(|c| c.session.id.0 < 5));
    }

    #[test]
    fn nobody_opted_in_falls_back_to_everyone() {
        let pool = candidates(12);
        let selection = select_faction(
            &pool,
            &HashMap::new(),
            &SelectionPolicy::default(),
            &mut Rng::new(4),
        );
        assert!(selection.used_fallback);
        assert_eq!(selection.pool_size, 12);
        assert_eq!(selection.chosen.len(), 2);
    }

    #[test]
    fn zero_target_draws_nobody_without_fallback() {
        let policy = SelectionPolicy {
            players_per_member: 10,
            min_members: 0,
            max_members: 0,
        };
        let selection = select_faction(&candidates(6), &HashMap::new(), &policy, &mut Rng::new(4));
        assert!(!selection.used_fallback);
        assert!(selection.chosen.is_empty());
    }

    #[test]
    fn forbidden_roles_are_never_chosen() {
        let mut pool = candidates(4);
        pool[0].can_be_antag = false;
        pool[1].can_be_antag = false;
        let policy = SelectionPolicy {
            players_per_member: 1,
            min_members: 0,
            max_members: 10,
        };
        let selection = select_faction(&pool, &HashMap::new(), &policy, &mut Rng::new(1));
        assert_eq!(selection.target_count, 4);
        assert_eq!(selection.chosen.len(), 2);
        assert!(selection.is_short());
        assert!(selection.chosen.iter().all(|c| c.can_be_antag));
    }

    #[test]
    fn empty_pool_selects_nobody() {
        let selection = select_faction(
            &[],
            &HashMap::new(),
            &SelectionPolicy::default(),
            &mut Rng::new(1),
        );
        assert!(selection.chosen.is_empty());
        assert_eq!(selection.target_count, 2);
    }

    #[test]
    fn late_join_quota_ignores_minimum() {
        let policy = SelectionPolicy::default();
        assert!(!late_join_has_quota(9, 0, &policy));
        assert!(late_join_has_quota(20, 1, &policy));
        assert!(!late_join_has_quota(20, 2, &policy));
    }
}
