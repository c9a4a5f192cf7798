use crate::rule::outcome::{ConditionTag, Outcome};
use crate::rule::registry::FactionRegistry;

pub const ROSTER_HEADER: &str = "The cultists were:";

/// Round-end summary: outcome, every recorded condition in order, then the roster.
pub fn render_round_end(
    outcome: Outcome,
    conditions: &[ConditionTag],
    registry: &FactionRegistry,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(conditions.len() + registry.len() + 2);
    lines.push(outcome.headline().to_string());
    lines.extend(conditions.iter().map(|tag| tag.describe().to_string()));
    lines.push(ROSTER_HEADER.to_string());
    lines.extend(
        registry
            .roster()
            .map(|member| format!("- {} (played by {})", member.name, member.session.user_name)),
    );
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::host::{EntityId, SessionHandle, SessionId};
    use crate::rule::registry::FactionMember;

    #[test]
    fn lines_follow_outcome_conditions_roster_order() {
        let mut registry = FactionRegistry::new();
        registry.add(
            SessionId(1),
            FactionMember {
                name: "Urist".to_string(),
                session: SessionHandle {
                    id: SessionId(1),
                    user_name: "urist_mc".to_string(),
                },
                entity: EntityId(10),
            },
        );
        let lines = render_round_end(
            Outcome::CrewMajor,
            &[ConditionTag::AllFactionDead],
            &registry,
        );
        assert_eq!(
            lines,
            vec![
                Outcome::CrewMajor.headline().to_string(),
                ConditionTag::AllFactionDead.describe().to_string(),
                ROSTER_HEADER.to_string(),
                "- Urist (played by urist_mc)".to_string(),
            ]
        );
    }
}
