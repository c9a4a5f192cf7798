//! Round-scoped state owner for the cult rule.
//!
//! One [RoundController] exists per activated rule instance. Every handler takes the
//! controller by `&mut` together with the host, so each event reads and commits outcome
//! state in a single step. The outcome only ever moves through [OutcomeLedger::commit].

use std::collections::HashMap;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::data::config::{CultistsConfig, RuleConfiguration, CULTISTS_RULE_ID};
use crate::error::RuleError;
use crate::rule::evaluator::{evaluate, Evidence, MemberStatus, Trigger};
use crate::rule::host::{
    Audience, EntityId, MapId, Marker, MobState, RoundHost, SessionHandle, SessionId,
};
use crate::rule::outcome::{CommitResult, ConditionTag, Outcome, OutcomeLedger, RoundPhase, Verdict};
use crate::rule::registry::{FactionMember, FactionRegistry};
use crate::rule::report::render_round_end;
use crate::rule::rng::Rng;
use crate::rule::selector::{
    late_join_has_quota, select_faction, AntagPreferences, Candidate, FactionSelection,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartDecision {
    Continue,
    Cancel { reason: String },
}

/// A player entering the round after it started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSpawn {
    pub entity: EntityId,
    pub late_join: bool,
    pub job_can_be_antag: bool,
    /// Connected players at spawn time, used for the ratio quota.
    pub total_players: usize,
}

#[derive(Debug, Clone)]
pub struct RoundController {
    round_id: Uuid,
    config: CultistsConfig,
    phase: RoundPhase,
    ledger: OutcomeLedger,
    registry: FactionRegistry,
    target_map: Option<MapId>,
    rng: Rng,
}

impl RoundController {
    /// Accepts only a cult configuration. Any other rule's configuration aborts activation.
    pub fn activate(configuration: RuleConfiguration, rng: Rng) -> Result<Self, RuleError> {
        let config = match configuration {
            RuleConfiguration::Cultists(config) => config,
            RuleConfiguration::Other { id } => {
                warn!(found = %id, "refusing to run cult rule with foreign configuration");
                return Err(RuleError::ConfigMismatch {
                    expected: CULTISTS_RULE_ID,
                    found: id,
                });
            }
        };
        config.validate()?;
        let round_id = Uuid::new_v4();
        info!(%round_id, "cult rule activated");
        Ok(Self {
            round_id,
            config,
            phase: RoundPhase::NotStarted,
            ledger: OutcomeLedger::default(),
            registry: FactionRegistry::new(),
            target_map: None,
            rng,
        })
    }

    pub fn round_id(&self) -> Uuid {
        self.round_id
    }

    pub fn config(&self) -> &CultistsConfig {
        &self.config
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn outcome(&self) -> Outcome {
        self.ledger.outcome()
    }

    pub fn conditions(&self) -> &[ConditionTag] {
        self.ledger.conditions()
    }

    pub fn termination_requested(&self) -> bool {
        self.ledger.termination_requested()
    }

    pub fn registry(&self) -> &FactionRegistry {
        &self.registry
    }

    pub fn target_map(&self) -> Option<MapId> {
        self.target_map
    }

    pub fn on_start_attempt(
        &mut self,
        host: &mut dyn RoundHost,
        player_count: usize,
        forced: bool,
    ) -> StartDecision {
        let min_players = self.config.min_players;
        if !forced && player_count < min_players {
            let reason = format!(
                "Not enough players are ready for the cult: {player_count} ready, {min_players} needed."
            );
            host.announce(&reason);
            return StartDecision::Cancel { reason };
        }
        if player_count == 0 {
            let reason = "No players are ready; the cult round cannot start.".to_string();
            host.announce(&reason);
            return StartDecision::Cancel { reason };
        }
        StartDecision::Continue
    }

    pub fn on_round_started(&mut self, host: &mut dyn RoundHost) {
        if self.phase != RoundPhase::NotStarted {
            debug!(phase = ?self.phase, "round already started, ignoring");
            return;
        }
        self.phase = RoundPhase::Started;
        self.ledger.reset();
        self.registry.clear();
        // TODO: prefer a map flagged as a primary station once the directory exposes map roles.
        self.target_map = host.maps().first().copied();

        for entity in host.entities_with(Marker::Cultist) {
            if !host.has_marker(entity, Marker::Actor) {
                continue;
            }
            self.register(host, entity, false);
        }
        info!(
            round_id = %self.round_id,
            target_map = ?self.target_map,
            members = self.registry.len(),
            "cult round started"
        );
    }

    /// Run the selector over the assigned players and convert everyone chosen.
    pub fn on_players_assigned(
        &mut self,
        host: &mut dyn RoundHost,
        players: &[Candidate],
        preferences: &HashMap<SessionId, AntagPreferences>,
    ) -> FactionSelection {
        let policy = self.config.selection_policy();
        let selection = select_faction(players, preferences, &policy, &mut self.rng);
        for candidate in &selection.chosen {
            let entity = candidate
                .entity
                .or_else(|| host.attached_entity(candidate.session.id));
            let Some(entity) = entity else {
                debug!(session = %candidate.session.id, "selected player has no body, skipping");
                continue;
            };
            self.register(host, entity, true);
        }
        selection
    }

    /// Marker appeared on `entity`. Returns whether a new member was registered.
    pub fn on_faction_member_added(&mut self, host: &mut dyn RoundHost, entity: EntityId) -> bool {
        self.register(host, entity, true)
    }

    /// Only the body a member registered with can take them out of the faction.
    pub fn on_faction_member_removed(&mut self, host: &mut dyn RoundHost, entity: EntityId) {
        match self.registry.key_for_entity(entity) {
            Some(key) => {
                if let Some(member) = self.registry.remove(key) {
                    info!(name = %member.name, "cultist left the faction");
                }
            }
            None => debug!(%entity, "marker removed from unregistered body"),
        }
        self.check_round_should_end(host, Some(entity));
    }

    pub fn on_death_state_changed(
        &mut self,
        host: &mut dyn RoundHost,
        entity: EntityId,
        state: MobState,
    ) {
        if state != MobState::Dead || !host.has_marker(entity, Marker::Cultist) {
            return;
        }
        self.check_round_should_end(host, None);
    }

    /// The ritual completed. Only the first summon of a running round counts.
    pub fn on_ritual_summoned(&mut self, host: &mut dyn RoundHost, avatar: EntityId) -> bool {
        if self.phase != RoundPhase::Started {
            debug!(phase = ?self.phase, "ritual summon outside a running round, ignoring");
            return false;
        }
        self.phase = RoundPhase::Ended;

        for cue in [&self.config.narsi_rises_sound, &self.config.i_am_here_sound]
            .into_iter()
            .flatten()
        {
            host.play_sound(cue, Audience::Everyone);
        }

        let evidence = Evidence {
            trigger: Trigger::RitualSummoned,
            target_map: self.target_map,
            avatar_maps: vec![host.owning_map(avatar)],
            members: Vec::new(),
            faction_size: self.registry.len(),
            ritual_quorum: self.config.ritual_quorum,
        };
        if let Some(verdict) = evaluate(&evidence) {
            self.commit(host, verdict);
        }
        true
    }

    /// Run level moved to post-round.
    pub fn on_round_ended(&mut self, host: &mut dyn RoundHost) {
        if self.phase == RoundPhase::NotStarted {
            return;
        }
        self.phase = RoundPhase::Ended;
        if self.ledger.is_frozen() {
            return;
        }
        let evidence = self.gather_evidence(host, Trigger::RoundEnd, None);
        if let Some(verdict) = evaluate(&evidence) {
            self.commit(host, verdict);
        }
    }

    /// Late-join drafting. Off unless enabled in the configuration.
    pub fn on_player_spawned(&mut self, host: &mut dyn RoundHost, spawn: &PlayerSpawn) -> bool {
        if !self.config.late_join || !spawn.late_join || !spawn.job_can_be_antag {
            return false;
        }
        if self.phase != RoundPhase::Started {
            return false;
        }
        let policy = self.config.selection_policy();
        if !late_join_has_quota(spawn.total_players, self.registry.len(), &policy) {
            return false;
        }
        self.register(host, spawn.entity, true)
    }

    pub fn on_round_end_text(&self) -> Vec<String> {
        render_round_end(self.ledger.outcome(), self.ledger.conditions(), &self.registry)
    }

    fn register(&mut self, host: &mut dyn RoundHost, entity: EntityId, greet: bool) -> bool {
        let Some(session) = host.session_of(entity) else {
            debug!(%entity, "no controlling session, skipping");
            return false;
        };
        if self.registry.contains(session.id) {
            return false;
        }
        let name = host
            .display_name(entity)
            .unwrap_or_else(|| session.user_name.clone());

        if !host.has_marker(entity, Marker::Cultist) {
            host.add_marker(entity, Marker::Cultist);
        }
        let member = FactionMember {
            name,
            session: session.clone(),
            entity,
        };
        info!(name = %member.name, user = %session.user_name, "registered cultist");
        self.registry.add(session.id, member);
        if greet {
            self.greet(host, entity, &session);
        }
        true
    }

    fn greet(&self, host: &mut dyn RoundHost, entity: EntityId, session: &SessionHandle) {
        if let Some(cue) = &self.config.greeting_sound {
            host.play_sound(cue, Audience::Session(session.id));
        }
        let Some(map) = self.target_map.or_else(|| host.owning_map(entity)) else {
            return;
        };
        let station = host.map_name(map).unwrap_or_else(|| map.to_string());
        host.message(
            session.id,
            &format!("You serve the Geometer of Blood. Summon your god on {station}."),
        );
    }

    fn check_round_should_end(&mut self, host: &mut dyn RoundHost, departing: Option<EntityId>) {
        if self.phase != RoundPhase::Started || self.ledger.is_frozen() {
            return;
        }
        let evidence = self.gather_evidence(host, Trigger::MembershipLoss, departing);
        if let Some(verdict) = evaluate(&evidence) {
            self.commit(host, verdict);
        }
    }

    fn gather_evidence(
        &self,
        host: &dyn RoundHost,
        trigger: Trigger,
        departing: Option<EntityId>,
    ) -> Evidence {
        let avatar_maps = host
            .entities_with(Marker::RitualAvatar)
            .into_iter()
            .map(|avatar| host.owning_map(avatar))
            .collect();
        let members = host
            .entities_with(Marker::Cultist)
            .into_iter()
            .map(|entity| MemberStatus {
                alive: host.mob_state(entity) == Some(MobState::Alive),
                on_target_map: self.target_map.is_some()
                    && host.owning_map(entity) == self.target_map,
                active: Some(entity) != departing,
            })
            .collect();
        Evidence {
            trigger,
            target_map: self.target_map,
            avatar_maps,
            members,
            faction_size: self.registry.len(),
            ritual_quorum: self.config.ritual_quorum,
        }
    }

    fn commit(&mut self, host: &mut dyn RoundHost, verdict: Verdict) {
        match self.ledger.commit(verdict) {
            CommitResult::TerminationRequested => {
                info!(
                    round_id = %self.round_id,
                    outcome = %self.ledger.outcome(),
                    condition = %verdict.tag,
                    "terminal outcome reached, ending round"
                );
                host.end_round();
            }
            CommitResult::Recorded => {
                info!(outcome = %self.ledger.outcome(), condition = %verdict.tag, "condition recorded");
            }
            CommitResult::Frozen => {
                debug!(condition = %verdict.tag, "outcome already final, verdict dropped");
            }
        }
    }
}
