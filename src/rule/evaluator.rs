//! Win evaluation as an ordered rule table. Rules run top to bottom and the first match
//! decides; each invocation records at most one condition tag. Evaluation is pure: the
//! controller gathers [Evidence] from the host and decides when to ask.

use serde::Serialize;

use crate::rule::host::MapId;
use crate::rule::outcome::{ConditionTag, Outcome, Verdict};

/// Survivors needed before the round is flagged as unresolvable.
pub const DEFAULT_RITUAL_QUORUM: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trigger {
    /// A ritual avatar just appeared.
    RitualSummoned,
    /// Scheduled end of round.
    RoundEnd,
    /// A member died or left; may end the round early.
    MembershipLoss,
}

/// Liveness of one entity currently carrying the faction marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemberStatus {
    pub alive: bool,
    pub on_target_map: bool,
    /// False while the marker is being removed from this entity.
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evidence {
    pub trigger: Trigger,
    pub target_map: Option<MapId>,
    /// Placement of each ritual avatar; `None` for an avatar not on any map.
    pub avatar_maps: Vec<Option<MapId>>,
    pub members: Vec<MemberStatus>,
    /// Registered faction size, which may exceed `members` once bodies are gone.
    pub faction_size: usize,
    pub ritual_quorum: usize,
}

impl Evidence {
    fn living(&self) -> usize {
        self.members.iter().filter(|member| member.alive).count()
    }
}

pub struct WinRule {
    pub name: &'static str,
    pub triggers: &'static [Trigger],
    pub check: fn(&Evidence) -> Option<Verdict>,
}

impl WinRule {
    pub fn applies_to(&self, trigger: Trigger) -> bool {
        self.triggers.contains(&trigger)
    }
}

const AVATAR_TRIGGERS: &[Trigger] = &[Trigger::RitualSummoned, Trigger::RoundEnd];
const ROUND_END: &[Trigger] = &[Trigger::RoundEnd];
const EARLY: &[Trigger] = &[Trigger::MembershipLoss];

pub const WIN_RULES: [WinRule; 6] = [
    WinRule {
        name: "ritual_on_target_map",
        triggers: AVATAR_TRIGGERS,
        check: ritual_on_target_map,
    },
    WinRule {
        name: "ritual_elsewhere",
        triggers: AVATAR_TRIGGERS,
        check: ritual_elsewhere,
    },
    WinRule {
        name: "all_faction_alive",
        triggers: ROUND_END,
        check: all_faction_alive,
    },
    WinRule {
        name: "faction_above_threshold",
        triggers: ROUND_END,
        check: faction_above_threshold,
    },
    WinRule {
        name: "some_faction_alive",
        triggers: ROUND_END,
        check: some_faction_alive,
    },
    WinRule {
        name: "all_faction_dead",
        triggers: EARLY,
        check: all_faction_dead,
    },
];

/// First matching verdict for `evidence.trigger`, or `None` when no rule fires.
pub fn evaluate(evidence: &Evidence) -> Option<Verdict> {
    evaluate_with(&WIN_RULES, evidence)
}

pub fn evaluate_with(rules: &[WinRule], evidence: &Evidence) -> Option<Verdict> {
    rules
        .iter()
        .filter(|rule| rule.applies_to(evidence.trigger))
        .find_map(|rule| (rule.check)(evidence))
}

fn ritual_on_target_map(evidence: &Evidence) -> Option<Verdict> {
    let target = evidence.target_map?;
    evidence
        .avatar_maps
        .iter()
        .any(|map| *map == Some(target))
        .then_some(Verdict::decisive(
            Outcome::CultMajor,
            ConditionTag::RitualSummonedOnTargetMap,
        ))
}

fn ritual_elsewhere(evidence: &Evidence) -> Option<Verdict> {
    (!evidence.avatar_maps.is_empty()).then_some(Verdict::decisive(
        Outcome::CultMajor,
        ConditionTag::RitualSummonedElsewhere,
    ))
}

// Stops the crew from stalling out the clock instead of confronting the cult.
fn all_faction_alive(evidence: &Evidence) -> Option<Verdict> {
    let everyone_alive = evidence.members.iter().all(|member| member.alive);
    everyone_alive.then_some(Verdict::decisive(
        Outcome::CultMajor,
        ConditionTag::AllFactionAlive,
    ))
}

fn faction_above_threshold(evidence: &Evidence) -> Option<Verdict> {
    let quorum = evidence.ritual_quorum;
    (evidence.faction_size >= quorum && evidence.living() >= quorum)
        .then_some(Verdict::note(ConditionTag::FactionAboveThreshold))
}

fn some_faction_alive(_evidence: &Evidence) -> Option<Verdict> {
    Some(Verdict::note(ConditionTag::SomeFactionAlive))
}

// Without a target map every living member counts as reachable.
fn all_faction_dead(evidence: &Evidence) -> Option<Verdict> {
    if !evidence.avatar_maps.is_empty() {
        return None;
    }
    let location_matters = evidence.target_map.is_some();
    let reachable = evidence.members.iter().any(|member| {
        member.active && member.alive && (member.on_target_map || !location_matters)
    });
    (!reachable).then_some(Verdict::decisive(
        Outcome::CrewMajor,
        ConditionTag::AllFactionDead,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alive(on_target_map: bool) -> MemberStatus {
        MemberStatus {
            alive: true,
            on_target_map,
            active: true,
        }
    }

    fn dead() -> MemberStatus {
        MemberStatus {
            alive: false,
            on_target_map: true,
            active: true,
        }
    }

    fn evidence(trigger: Trigger, members: Vec<MemberStatus>) -> Evidence {
        Evidence {
            trigger,
            target_map: Some(MapId(1)),
            avatar_maps: Vec::new(),
            faction_size: members.len(),
            members,
            ritual_quorum: DEFAULT_RITUAL_QUORUM,
        }
    }

    #[test]
    fn rule_names_are_unique() {
        let mut names: Vec<&str> = WIN_RULES.iter().map(|rule| rule.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), WIN_RULES.len());
    }

    #[test]
    fn summon_on_target_beats_every_other_rule() {
        let mut ev = evidence(Trigger::RoundEnd, vec![alive(true)]);
        ev.avatar_maps = vec![Some(MapId(7)), Some(MapId(1))];
        let verdict = evaluate(&ev);
        assert_eq!(
            verdict,
            Some(Verdict::decisive(
                Outcome::CultMajor,
                ConditionTag::RitualSummonedOnTargetMap
            ))
        );
    }

    #[test]
    fn unplaced_avatar_counts_as_elsewhere() {
        let mut ev = evidence(Trigger::RitualSummoned, Vec::new());
        ev.avatar_maps = vec![None];
        assert_eq!(
            evaluate(&ev).map(|v| v.tag),
            Some(ConditionTag::RitualSummonedElsewhere)
        );
    }

    #[test]
    fn summon_trigger_never_reaches_round_end_rules() {
        let ev = evidence(Trigger::RitualSummoned, vec![alive(true)]);
        assert_eq!(evaluate(&ev), None);
    }

    #[test]
    fn quorum_counts_every_survivor() {
        let mut members = vec![dead()];
        members.extend(std::iter::repeat(alive(true)).take(9));
        let ev = evidence(Trigger::RoundEnd, members);
        assert_eq!(
            evaluate(&ev),
            Some(Verdict::note(ConditionTag::FactionAboveThreshold))
        );
    }

    #[test]
    fn empty_faction_at_round_end_counts_as_all_alive() {
        let ev = evidence(Trigger::RoundEnd, Vec::new());
        assert_eq!(
            evaluate(&ev),
            Some(Verdict::decisive(
                Outcome::CultMajor,
                ConditionTag::AllFactionAlive
            ))
        );
    }

    #[test]
    fn member_off_target_map_does_not_hold_the_round() {
        let ev = evidence(Trigger::MembershipLoss, vec![alive(false), dead()]);
        assert_eq!(
            evaluate(&ev),
            Some(Verdict::decisive(Outcome::CrewMajor, ConditionTag::AllFactionDead))
        );
    }

    #[test]
    fn departing_member_does_not_hold_the_round() {
        let leaving = MemberStatus {
            active: false,
            ..alive(true)
        };
        let ev = evidence(Trigger::MembershipLoss, vec![leaving]);
        assert_eq!(evaluate(&ev).map(|v| v.tag), Some(ConditionTag::AllFactionDead));
    }

    #[test]
    fn living_avatar_blocks_early_termination() {
        let mut ev = evidence(Trigger::MembershipLoss, vec![dead()]);
        ev.avatar_maps = vec![Some(MapId(3))];
        assert_eq!(evaluate(&ev), None);
    }

    #[test]
    fn without_target_map_any_survivor_holds_the_round() {
        let mut ev = evidence(Trigger::MembershipLoss, vec![alive(false)]);
        ev.target_map = None;
        assert_eq!(evaluate(&ev), None);
    }
}
