//! Scripted rounds played against the [Sandbox] host.
//!
//! Every scenario goes through the same event sequence a live server would raise:
//! start attempt, run level `InRound`, job assignment, scenario actions, run level
//! `PostRound`, then the round-end text request.

use std::collections::HashMap;

use clap::ValueEnum;
use serde::Serialize;
use tracing::{debug, info};

use crate::data::config::{CultistsConfig, RuleConfiguration};
use crate::error::RuleError;
use crate::rule::dispatch::{Dispatcher, GameEvent, Reaction, RunLevel};
use crate::rule::host::{EntityId, MapId, Marker};
use crate::rule::outcome::{ConditionTag, Outcome};
use crate::rule::rng::Rng;
use crate::rule::selector::{AntagPreferences, Candidate, CULTIST_ANTAG_ID};
use crate::rule::RoundController;
use crate::sim::sandbox::Sandbox;

pub const TARGET_MAP_NAME: &str = "Station";
pub const OUTPOST_MAP_NAME: &str = "Outpost";

/// Every seventh crewmember starts on the outpost.
const OUTPOST_STRIDE: usize = 7;
/// Chance, in percent, that surviving cultists complete the ritual in a skirmish.
const SKIRMISH_SUMMON_CHANCE: usize = 30;
/// Scenario actions draw from their own stream so selection stays comparable across scenarios.
const SCENARIO_STREAM: u64 = 0xC0FF_EE00_D15E_A5E5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    /// Random casualties, then maybe a summon on a random map.
    #[default]
    Skirmish,
    SummonOnTarget,
    SummonElsewhere,
    /// Every cultist dies.
    Purge,
    /// Nothing happens until the shuttle leaves.
    Stalemate,
    /// All cultists but one die.
    Attrition,
    /// Every cultist loses the faction marker.
    Deconversion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScenarioSetup {
    pub players: usize,
    /// The first `opted_in` players prefer the cult.
    pub opted_in: usize,
    pub seed: u64,
    pub forced: bool,
    pub scenario: Scenario,
    /// Per-cultist death chance in a skirmish, in percent.
    pub lethality: u8,
}

impl Default for ScenarioSetup {
    fn default() -> Self {
        Self {
            players: 30,
            opted_in: 5,
            seed: 7,
            forced: false,
            scenario: Scenario::Skirmish,
            lethality: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundReport {
    pub round_id: String,
    pub seed: u64,
    pub scenario: Scenario,
    pub started: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<String>,
    pub outcome: Outcome,
    pub conditions: Vec<ConditionTag>,
    pub cultists: Vec<String>,
    pub lines: Vec<String>,
    pub round_end_requests: usize,
}

pub fn run_scenario(config: &CultistsConfig, setup: &ScenarioSetup) -> Result<RoundReport, RuleError> {
    let mut controller = RoundController::activate(
        RuleConfiguration::Cultists(config.clone()),
        Rng::new(setup.seed),
    )?;
    let dispatcher = Dispatcher::cult_rule();
    let mut sandbox = Sandbox::new();
    let station = sandbox.add_map(TARGET_MAP_NAME);
    let outpost = sandbox.add_map(OUTPOST_MAP_NAME);

    let mut players = Vec::with_capacity(setup.players);
    let mut preferences = HashMap::new();
    for index in 0..setup.players {
        let map = if index % OUTPOST_STRIDE == OUTPOST_STRIDE - 1 {
            outpost
        } else {
            station
        };
        let (entity, session) = sandbox.spawn_player(
            &format!("Crewmember {}", index + 1),
            &format!("player{}", index + 1),
            map,
        );
        if index < setup.opted_in {
            preferences.insert(session.id, AntagPreferences::opted_in(CULTIST_ANTAG_ID));
        }
        players.push(Candidate {
            session,
            entity: Some(entity),
            can_be_antag: true,
        });
    }

    sandbox.push_event(GameEvent::StartAttempt {
        player_count: setup.players,
        forced: setup.forced,
    });
    let cancel_reason = sandbox
        .drain(&dispatcher, &mut controller)
        .into_iter()
        .find_map(|reaction| match reaction {
            Reaction::StartCancelled { reason } => Some(reason),
            _ => None,
        });
    if let Some(reason) = cancel_reason {
        info!(seed = setup.seed, %reason, "round did not start");
        return Ok(RoundReport {
            round_id: controller.round_id().to_string(),
            seed: setup.seed,
            scenario: setup.scenario,
            started: false,
            cancel_reason: Some(reason),
            outcome: controller.outcome(),
            conditions: Vec::new(),
            cultists: Vec::new(),
            lines: Vec::new(),
            round_end_requests: sandbox.round_end_requests(),
        });
    }

    sandbox.push_event(GameEvent::RunLevelChanged(RunLevel::InRound));
    sandbox.push_event(GameEvent::PlayersAssigned {
        players,
        preferences,
    });
    sandbox.drain(&dispatcher, &mut controller);

    let cultists: Vec<EntityId> = controller
        .registry()
        .members()
        .map(|(_, member)| member.entity)
        .collect();
    let mut rng = Rng::new(setup.seed ^ SCENARIO_STREAM);
    play_scenario(&mut sandbox, setup, &cultists, [station, outpost], &mut rng);
    sandbox.drain(&dispatcher, &mut controller);

    sandbox.push_event(GameEvent::RunLevelChanged(RunLevel::PostRound));
    sandbox.push_event(GameEvent::RoundEndTextRequested);
    let lines = sandbox
        .drain(&dispatcher, &mut controller)
        .into_iter()
        .find_map(|reaction| match reaction {
            Reaction::RoundEndText(lines) => Some(lines),
            _ => None,
        })
        .unwrap_or_default();

    Ok(RoundReport {
        round_id: controller.round_id().to_string(),
        seed: setup.seed,
        scenario: setup.scenario,
        started: true,
        cancel_reason: None,
        outcome: controller.outcome(),
        conditions: controller.conditions().to_vec(),
        cultists: controller
            .registry()
            .roster()
            .map(|member| member.name.clone())
            .collect(),
        lines,
        round_end_requests: sandbox.round_end_requests(),
    })
}

fn play_scenario(
    sandbox: &mut Sandbox,
    setup: &ScenarioSetup,
    cultists: &[EntityId],
    maps: [MapId; 2],
    rng: &mut Rng,
) {
    let [station, outpost] = maps;
    debug!(scenario = ?setup.scenario, cultists = cultists.len(), "playing scenario");
    match setup.scenario {
        Scenario::SummonOnTarget => {
            sandbox.summon_avatar(Some(station));
        }
        Scenario::SummonElsewhere => {
            sandbox.summon_avatar(Some(outpost));
        }
        Scenario::Purge => cultists.iter().for_each(|&entity| sandbox.kill(entity)),
        Scenario::Stalemate => {}
        Scenario::Attrition => cultists
            .iter()
            .skip(1)
            .for_each(|&entity| sandbox.kill(entity)),
        Scenario::Deconversion => cultists
            .iter()
            .for_each(|&entity| sandbox.remove_marker(entity, Marker::Cultist)),
        Scenario::Skirmish => {
            let mut survivors = 0;
            for &entity in cultists {
                if rng.next_below(100) < usize::from(setup.lethality) {
                    sandbox.kill(entity);
                } else {
                    survivors += 1;
                }
            }
            if survivors > 0 && rng.next_below(100) < SKIRMISH_SUMMON_CHANCE {
                sandbox.summon_avatar(Some(maps[rng.next_below(maps.len())]));
            }
        }
    }
}
