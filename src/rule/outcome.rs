use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum RoundPhase {
    #[default]
    NotStarted,
    Started,
    Ended,
}

/// Round verdict, ordered by terminality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    #[default]
    Neutral,
    CultMinor,
    CrewMinor,
    CultMajor,
    CrewMajor,
}

impl Outcome {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::CultMajor | Self::CrewMajor)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::CultMinor => "cult_minor",
            Self::CrewMinor => "crew_minor",
            Self::CultMajor => "cult_major",
            Self::CrewMajor => "crew_major",
        }
    }

    pub const fn headline(self) -> &'static str {
        match self {
            Self::Neutral => "Neutral outcome: neither side prevailed.",
            Self::CultMinor => "Cult minor victory: the ritual is within reach.",
            Self::CrewMinor => "Crew minor victory: the cult was crippled.",
            Self::CultMajor => "Cult major victory: the ritual was completed.",
            Self::CrewMajor => "Crew major victory: the cult was wiped out.",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit trail entry explaining a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionTag {
    RitualSummonedOnTargetMap,
    RitualSummonedElsewhere,
    AllFactionDead,
    AllFactionAlive,
    FactionAboveThreshold,
    SomeFactionAlive,
}

impl ConditionTag {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RitualSummonedOnTargetMap => "ritual_summoned_on_target_map",
            Self::RitualSummonedElsewhere => "ritual_summoned_elsewhere",
            Self::AllFactionDead => "all_faction_dead",
            Self::AllFactionAlive => "all_faction_alive",
            Self::FactionAboveThreshold => "faction_above_threshold",
            Self::SomeFactionAlive => "some_faction_alive",
        }
    }

    pub const fn describe(self) -> &'static str {
        match self {
            Self::RitualSummonedOnTargetMap => "The avatar was summoned on the target station.",
            Self::RitualSummonedElsewhere => "The avatar was summoned away from the target station.",
            Self::AllFactionDead => "No living cultist remained on the target station.",
            Self::AllFactionAlive => "Every cultist survived until the end of the round.",
            Self::FactionAboveThreshold => "More cultists survived than the ritual requires.",
            Self::SomeFactionAlive => "Some cultists survived the round.",
        }
    }
}

impl fmt::Display for ConditionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one evaluator pass. `outcome: None` records the tag without moving the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub outcome: Option<Outcome>,
    pub tag: ConditionTag,
}

impl Verdict {
    pub const fn decisive(outcome: Outcome, tag: ConditionTag) -> Self {
        Self {
            outcome: Some(outcome),
            tag,
        }
    }

    pub const fn note(tag: ConditionTag) -> Self {
        Self { outcome: None, tag }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitResult {
    /// Outcome was already terminal; nothing recorded.
    Frozen,
    Recorded,
    /// Verdict was terminal and termination has not been requested before.
    TerminationRequested,
}

/// Outcome plus its condition log. `commit` is the only mutation path once a round runs.
#[derive(Debug, Clone, Default)]
pub struct OutcomeLedger {
    outcome: Outcome,
    conditions: Vec<ConditionTag>,
    termination_requested: bool,
}

impl OutcomeLedger {
    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn conditions(&self) -> &[ConditionTag] {
        &self.conditions
    }

    pub fn is_frozen(&self) -> bool {
        self.outcome.is_terminal()
    }

    pub fn termination_requested(&self) -> bool {
        self.termination_requested
    }

    pub fn commit(&mut self, verdict: Verdict) -> CommitResult {
        if self.is_frozen() {
            return CommitResult::Frozen;
        }
        self.conditions.push(verdict.tag);
        let Some(outcome) = verdict.outcome else {
            return CommitResult::Recorded;
        };
        self.outcome = outcome;
        if outcome.is_terminal() && !self.termination_requested {
            self.termination_requested = true;
            return CommitResult::TerminationRequested;
        }
        CommitResult::Recorded
    }

    /// Back to `Neutral` with an empty log. Round start only.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_outcomes() {
        assert!(Outcome::CultMajor.is_terminal());
        assert!(Outcome::CrewMajor.is_terminal());
        assert!(!Outcome::Neutral.is_terminal());
        assert!(!Outcome::CultMinor.is_terminal());
        assert!(!Outcome::CrewMinor.is_terminal());
    }

    #[test]
    fn terminal_commit_requests_termination_once_and_freezes() {
        let mut ledger = OutcomeLedger::default();
        let first = ledger.commit(Verdict::decisive(
            Outcome::CrewMajor,
            ConditionTag::AllFactionDead,
        ));
        assert_eq!(first, CommitResult::TerminationRequested);

        let second = ledger.commit(Verdict::decisive(
            Outcome::CultMajor,
            ConditionTag::RitualSummonedOnTargetMap,
        ));
        assert_eq!(second, CommitResult::Frozen);
        assert_eq!(ledger.outcome(), Outcome::CrewMajor);
        assert_eq!(ledger.conditions(), &[ConditionTag::AllFactionDead]);
    }

    #[test]
    fn non_terminal_values_can_be_overwritten() {
        let mut ledger = OutcomeLedger::default();
        ledger.commit(Verdict::decisive(Outcome::CultMinor, ConditionTag::SomeFactionAlive));
        ledger.commit(Verdict::decisive(Outcome::CrewMinor, ConditionTag::SomeFactionAlive));
        assert_eq!(ledger.outcome(), Outcome::CrewMinor);
        assert_eq!(ledger.conditions().len(), 2);
        assert!(!ledger.termination_requested());
    }

    #[test]
    fn note_keeps_outcome() {
        let mut ledger = OutcomeLedger::default();
        assert_eq!(
            ledger.commit(Verdict::note(ConditionTag::FactionAboveThreshold)),
            CommitResult::Recorded
        );
        assert_eq!(ledger.outcome(), Outcome::Neutral);
    }
}
