//! Handler table for the cult rule. The enclosing simulation owns the [Dispatcher] and feeds
//! it one event at a time; handlers run synchronously against the round controller.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::rule::controller::{PlayerSpawn, RoundController, StartDecision};
use crate::rule::host::{EntityId, MobState, RoundHost, SessionId};
use crate::rule::selector::{AntagPreferences, Candidate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunLevel {
    PreRoundLobby,
    InRound,
    PostRound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    StartAttempt {
        player_count: usize,
        forced: bool,
    },
    RunLevelChanged(RunLevel),
    PlayersAssigned {
        players: Vec<Candidate>,
        preferences: HashMap<SessionId, AntagPreferences>,
    },
    MarkerAdded(EntityId),
    MarkerRemoved(EntityId),
    MobStateChanged {
        entity: EntityId,
        state: MobState,
    },
    RitualSummoned {
        avatar: EntityId,
    },
    PlayerSpawned(PlayerSpawn),
    RoundEndTextRequested,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    StartAttempt,
    RunLevelChanged,
    PlayersAssigned,
    MarkerAdded,
    MarkerRemoved,
    MobStateChanged,
    RitualSummoned,
    PlayerSpawned,
    RoundEndTextRequested,
}

impl GameEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::StartAttempt { .. } => EventKind::StartAttempt,
            Self::RunLevelChanged(_) => EventKind::RunLevelChanged,
            Self::PlayersAssigned { .. } => EventKind::PlayersAssigned,
            Self::MarkerAdded(_) => EventKind::MarkerAdded,
            Self::MarkerRemoved(_) => EventKind::MarkerRemoved,
            Self::MobStateChanged { .. } => EventKind::MobStateChanged,
            Self::RitualSummoned { .. } => EventKind::RitualSummoned,
            Self::PlayerSpawned(_) => EventKind::PlayerSpawned,
            Self::RoundEndTextRequested => EventKind::RoundEndTextRequested,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    Ignored,
    Handled,
    StartAllowed,
    StartCancelled { reason: String },
    FactionSelected { chosen: usize, target: usize },
    RoundEndText(Vec<String>),
}

pub type Handler = fn(&mut RoundController, &mut dyn RoundHost, &GameEvent) -> Reaction;

#[derive(Clone, Default)]
pub struct Dispatcher {
    handlers: BTreeMap<EventKind, Vec<Handler>>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.handlers.iter().map(|(kind, list)| (kind, list.len())))
            .finish()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with the cult rule's own handlers registered.
    pub fn cult_rule() -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register(EventKind::StartAttempt, handle_start_attempt);
        dispatcher.register(EventKind::RunLevelChanged, handle_run_level);
        dispatcher.register(EventKind::PlayersAssigned, handle_players_assigned);
        dispatcher.register(EventKind::MarkerAdded, handle_marker_added);
        dispatcher.register(EventKind::MarkerRemoved, handle_marker_removed);
        dispatcher.register(EventKind::MobStateChanged, handle_mob_state);
        dispatcher.register(EventKind::RitualSummoned, handle_ritual_summoned);
        dispatcher.register(EventKind::PlayerSpawned, handle_player_spawned);
        dispatcher.register(EventKind::RoundEndTextRequested, handle_round_end_text);
        dispatcher
    }

    /// Append a handler; handlers for one kind run in registration order.
    pub fn register(&mut self, kind: EventKind, handler: Handler) {
        self.handlers.entry(kind).or_default().push(handler);
    }

    pub fn handles(&self, kind: EventKind) -> bool {
        self.handlers.get(&kind).is_some_and(|list| !list.is_empty())
    }

    /// Run every handler registered for the event's kind, returning their reactions in order.
    pub fn dispatch(
        &self,
        controller: &mut RoundController,
        host: &mut dyn RoundHost,
        event: &GameEvent,
    ) -> Vec<Reaction> {
        let Some(handlers) = self.handlers.get(&event.kind()) else {
            return Vec::new();
        };
        let mut reactions = Vec::with_capacity(handlers.len());
        for handler in handlers {
            reactions.push(handler(controller, host, event));
        }
        reactions
    }
}

fn handle_start_attempt(
    controller: &mut RoundController,
    host: &mut dyn RoundHost,
    event: &GameEvent,
) -> Reaction {
    let GameEvent::StartAttempt {
        player_count,
        forced,
    } = event
    else {
        return Reaction::Ignored;
    };
    match controller.on_start_attempt(host, *player_count, *forced) {
        StartDecision::Continue => Reaction::StartAllowed,
        StartDecision::Cancel { reason } => Reaction::StartCancelled { reason },
    }
}

fn handle_run_level(
    controller: &mut RoundController,
    host: &mut dyn RoundHost,
    event: &GameEvent,
) -> Reaction {
    match event {
        GameEvent::RunLevelChanged(RunLevel::InRound) => controller.on_round_started(host),
        GameEvent::RunLevelChanged(RunLevel::PostRound) => controller.on_round_ended(host),
        _ => return Reaction::Ignored,
    }
    Reaction::Handled
}

fn handle_players_assigned(
    controller: &mut RoundController,
    host: &mut dyn RoundHost,
    event: &GameEvent,
) -> Reaction {
    let GameEvent::PlayersAssigned {
        players,
        preferences,
    } = event
    else {
        return Reaction::Ignored;
    };
    let selection = controller.on_players_assigned(host, players, preferences);
    Reaction::FactionSelected {
        chosen: selection.chosen.len(),
        target: selection.target_count,
    }
}

fn handle_marker_added(
    controller: &mut RoundController,
    host: &mut dyn RoundHost,
    event: &GameEvent,
) -> Reaction {
    let GameEvent::MarkerAdded(entity) = event else {
        return Reaction::Ignored;
    };
    if controller.on_faction_member_added(host, *entity) {
        Reaction::Handled
    } else {
        Reaction::Ignored
    }
}

fn handle_marker_removed(
    controller: &mut RoundController,
    host: &mut dyn RoundHost,
    event: &GameEvent,
) -> Reaction {
    let GameEvent::MarkerRemoved(entity) = event else {
        return Reaction::Ignored;
    };
    controller.on_faction_member_removed(host, *entity);
    Reaction::Handled
}

fn handle_mob_state(
    controller: &mut RoundController,
    host: &mut dyn RoundHost,
    event: &GameEvent,
) -> Reaction {
    let GameEvent::MobStateChanged { entity, state } = event else {
        return Reaction::Ignored;
    };
    controller.on_death_state_changed(host, *entity, *state);
    Reaction::Handled
}

fn handle_ritual_summoned(
    controller: &mut RoundController,
    host: &mut dyn RoundHost,
    event: &GameEvent,
) -> Reaction {
    let GameEvent::RitualSummoned { avatar } = event else {
        return Reaction::Ignored;
    };
    if controller.on_ritual_summoned(host, *avatar) {
        Reaction::Handled
    } else {
        Reaction::Ignored
    }
}

fn handle_player_spawned(
    controller: &mut RoundController,
    host: &mut dyn RoundHost,
    event: &GameEvent,
) -> Reaction {
    let GameEvent::PlayerSpawned(spawn) = event else {
        return Reaction::Ignored;
    };
    if controller.on_player_spawned(host, spawn) {
        Reaction::Handled
    } else {
        Reaction::Ignored
    }
}

fn handle_round_end_text(
    controller: &mut RoundController,
    _host: &mut dyn RoundHost,
    _event: &GameEvent,
) -> Reaction {
    Reaction::RoundEndText(controller.on_round_end_text())
}
