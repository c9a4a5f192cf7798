use std::collections::{BTreeSet, HashMap};

use cultists::rule::{
    select_faction, AntagPreferences, Candidate, Rng, SelectionPolicy, SessionHandle, SessionId,
    CULTIST_ANTAG_ID,
};
use proptest::prelude::*;

fn roster(players: usize, opted_in: usize) -> (Vec<Candidate>, HashMap<SessionId, AntagPreferences>) {
    let mut preferences = HashMap::new();
    let candidates = (0..players)
        .map(|index| {
            let session = SessionHandle {
                id: SessionId(index as u64),
                user_name: format!("player{index}"),
            };
            if index < opted_in {
                preferences.insert(session.id, AntagPreferences::opted_in(CULTIST_ANTAG_ID));
            }
            Candidate {
                session,
                entity: None,
                can_be_antag: true,
            }
        })
        .collect();
    (candidates, preferences)
}

fn chosen_ids(candidates: &[Candidate]) -> Vec<SessionId> {
    candidates.iter().map(|candidate| candidate.session.id).collect()
}

#[test]
fn two_opted_in_out_of_thirty_falls_back_to_everyone() {
    let (candidates, preferences) = roster(30, 2);
    let policy = SelectionPolicy {
        players_per_member: 10,
        min_members: 1,
        max_members: 10,
    };
    let selection = select_faction(&candidates, &preferences, &policy, &mut Rng::new(3));

    assert_eq!(selection.target_count, 3);
    assert_eq!(selection.chosen.len(), 3);
    assert!(selection.used_fallback);
    assert_eq!(selection.pool_size, 30);
}

#[test]
fn enough_opted_in_draws_only_from_them() {
    let (candidates, preferences) = roster(40, 6);
    let selection = select_faction(
        &candidates,
        &preferences,
        &SelectionPolicy::default(),
        &mut Rng::new(11),
    );

    assert!(!selection.used_fallback);
    assert_eq!(selection.chosen.len(), 4);
    assert!(selection
        .chosen
        .iter()
        .all(|candidate| preferences.contains_key(&candidate.session.id)));
}

#[test]
fn small_pool_is_returned_whole() {
    let (mut candidates, preferences) = roster(5, 0);
    for candidate in candidates.iter_mut().skip(1) {
        candidate.can_be_antag = false;
    }
    let selection = select_faction(
        &candidates,
        &preferences,
        &SelectionPolicy::default(),
        &mut Rng::new(5),
    );
    assert_eq!(selection.target_count, 2);
    assert_eq!(chosen_ids(&selection.chosen), vec![SessionId(0)]);
    assert!(selection.is_short());
}

#[test]
fn duplicate_sessions_are_drawn_once() {
    let (mut candidates, preferences) = roster(3, 0);
    candidates.extend(candidates.clone());
    let selection = select_faction(
        &candidates,
        &preferences,
        &SelectionPolicy::default(),
        &mut Rng::new(9),
    );
    let unique: BTreeSet<SessionId> = chosen_ids(&selection.chosen).into_iter().collect();
    assert_eq!(unique.len(), selection.chosen.len());
    assert_eq!(selection.pool_size, 3);
}

proptest! {
    #[test]
    fn selection_respects_bounds_and_never_repeats(
        players in 0usize..120,
        opted_in in 0usize..120,
        ratio in 1usize..20,
        min in 0usize..6,
        extra in 0usize..10,
        seed in any::<u64>(),
    ) {
        let opted_in = opted_in.min(players);
        let policy = SelectionPolicy {
            players_per_member: ratio,
            min_members: min,
            max_members: min + extra,
        };
        let (candidates, preferences) = roster(players, opted_in);
        let selection = select_faction(&candidates, &preferences, &policy, &mut Rng::new(seed));

        prop_assert!(selection.chosen.len() <= selection.target_count);
        prop_assert!(selection.target_count <= policy.max_members);
        prop_assert_eq!(selection.chosen.len(), selection.target_count.min(players));

        let ids = chosen_ids(&selection.chosen);
        let unique: BTreeSet<SessionId> = ids.iter().copied().collect();
        prop_assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn same_seed_same_draw(players in 1usize..80, opted_in in 0usize..80, seed in any::<u64>()) {
        let (candidates, preferences) = roster(players, opted_in.min(players));
        let policy = SelectionPolicy::default();
        let first = select_faction(&candidates, &preferences, &policy, &mut Rng::new(seed));
        let second = select_faction(&candidates, &preferences, &policy, &mut Rng::new(seed));
        prop_assert_eq!(chosen_ids(&first.chosen), chosen_ids(&second.chosen));
    }
}
