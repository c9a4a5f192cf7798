//! In-memory host: a tiny entity store with maps, sessions and a presentation log.
//!
//! Mutations that a real simulation would broadcast (marker add/remove, death, summon)
//! are queued and delivered in order by [Sandbox::drain], one event at a time.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::Serialize;

use crate::rule::dispatch::{Dispatcher, GameEvent, Reaction};
use crate::rule::host::{
    Audience, EntityId, MapId, Marker, MobState, PlayerDirectory, Presentation, RoundTerminator,
    SessionHandle, SessionId, Simulation, StationDirectory,
};
use crate::rule::RoundController;

#[derive(Debug, Clone)]
struct SandboxEntity {
    name: String,
    session: Option<SessionHandle>,
    markers: BTreeSet<Marker>,
    mob_state: Option<MobState>,
    map: Option<MapId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PresentationRecord {
    Announcement(String),
    Sound { cue: String, session: Option<SessionId> },
    Message { session: SessionId, text: String },
}

#[derive(Debug, Clone, Default)]
pub struct Sandbox {
    entities: BTreeMap<EntityId, SandboxEntity>,
    maps: Vec<(MapId, String)>,
    attachments: BTreeMap<SessionId, EntityId>,
    next_entity: u64,
    next_session: u64,
    pending: VecDeque<GameEvent>,
    presentation: Vec<PresentationRecord>,
    round_end_requests: usize,
}

impl Sandbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a map. Maps are listed in the order they were added.
    pub fn add_map(&mut self, name: &str) -> MapId {
        let id = MapId(self.maps.len() as u32 + 1);
        self.maps.push((id, name.to_string()));
        id
    }

    pub fn spawn_entity(&mut self, name: &str, map: Option<MapId>) -> EntityId {
        self.next_entity += 1;
        let id = EntityId(self.next_entity);
        self.entities.insert(
            id,
            SandboxEntity {
                name: name.to_string(),
                session: None,
                markers: BTreeSet::new(),
                mob_state: None,
                map,
            },
        );
        id
    }

    /// Spawn a living, player-controlled body on `map`.
    pub fn spawn_player(&mut self, name: &str, user_name: &str, map: MapId) -> (EntityId, SessionHandle) {
        let entity = self.spawn_entity(name, Some(map));
        self.next_session += 1;
        let session = SessionHandle {
            id: SessionId(self.next_session),
            user_name: user_name.to_string(),
        };
        if let Some(record) = self.entities.get_mut(&entity) {
            record.session = Some(session.clone());
            record.markers.insert(Marker::Actor);
            record.mob_state = Some(MobState::Alive);
        }
        self.attachments.insert(session.id, entity);
        (entity, session)
    }

    /// Spawn a ritual avatar and raise the summon event.
    pub fn summon_avatar(&mut self, map: Option<MapId>) -> EntityId {
        let avatar = self.spawn_entity("Nar'Sie", map);
        if let Some(record) = self.entities.get_mut(&avatar) {
            record.markers.insert(Marker::RitualAvatar);
        }
        self.pending.push_back(GameEvent::RitualSummoned { avatar });
        avatar
    }

    pub fn set_mob_state(&mut self, entity: EntityId, state: MobState) {
        let Some(record) = self.entities.get_mut(&entity) else {
            return;
        };
        if record.mob_state == Some(state) {
            return;
        }
        record.mob_state = Some(state);
        self.pending
            .push_back(GameEvent::MobStateChanged { entity, state });
    }

    pub fn kill(&mut self, entity: EntityId) {
        self.set_mob_state(entity, MobState::Dead);
    }

    pub fn remove_marker(&mut self, entity: EntityId, marker: Marker) {
        let removed = self
            .entities
            .get_mut(&entity)
            .is_some_and(|record| record.markers.remove(&marker));
        if removed && marker == Marker::Cultist {
            self.pending.push_back(GameEvent::MarkerRemoved(entity));
        }
    }

    pub fn move_to(&mut self, entity: EntityId, map: Option<MapId>) {
        if let Some(record) = self.entities.get_mut(&entity) {
            record.map = map;
        }
    }

    pub fn rename(&mut self, entity: EntityId, name: &str) {
        if let Some(record) = self.entities.get_mut(&entity) {
            record.name = name.to_string();
        }
    }

    /// Move the player controlling `from` into `to`. `from` keeps its markers.
    pub fn transfer_session(&mut self, from: EntityId, to: EntityId) {
        let Some(session) = self
            .entities
            .get_mut(&from)
            .and_then(|record| record.session.take())
        else {
            return;
        };
        match self.entities.get_mut(&to) {
            Some(record) => {
                self.attachments.insert(session.id, to);
                record.session = Some(session);
            }
            None => {
                self.attachments.remove(&session.id);
            }
        }
    }

    /// Detach the player from their body; the body keeps its markers.
    pub fn disconnect(&mut self, entity: EntityId) {
        if let Some(session) = self
            .entities
            .get_mut(&entity)
            .and_then(|record| record.session.take())
        {
            self.attachments.remove(&session.id);
        }
    }

    pub fn push_event(&mut self, event: GameEvent) {
        self.pending.push_back(event);
    }

    pub fn pending_events(&self) -> usize {
        self.pending.len()
    }

    /// Deliver queued events in order until the queue is empty. Events raised while
    /// handling are appended and delivered in the same drain.
    pub fn drain(&mut self, dispatcher: &Dispatcher, controller: &mut RoundController) -> Vec<Reaction> {
        let mut reactions = Vec::new();
        while let Some(event) = self.pending.pop_front() {
            reactions.extend(dispatcher.dispatch(controller, self, &event));
        }
        reactions
    }

    pub fn presentation(&self) -> &[PresentationRecord] {
        &self.presentation
    }

    pub fn announcements(&self) -> impl Iterator<Item = &str> + '_ {
        self.presentation.iter().filter_map(|record| match record {
            PresentationRecord::Announcement(text) => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn round_end_requests(&self) -> usize {
        self.round_end_requests
    }
}

impl PlayerDirectory for Sandbox {
    fn session_of(&self, entity: EntityId) -> Option<SessionHandle> {
        self.entities.get(&entity)?.session.clone()
    }

    fn display_name(&self, entity: EntityId) -> Option<String> {
        self.entities.get(&entity).map(|record| record.name.clone())
    }

    fn attached_entity(&self, session: SessionId) -> Option<EntityId> {
        self.attachments.get(&session).copied()
    }
}

impl Simulation for Sandbox {
    fn entities_with(&self, marker: Marker) -> Vec<EntityId> {
        self.entities
            .iter()
            .filter(|(_, record)| record.markers.contains(&marker))
            .map(|(id, _)| *id)
            .collect()
    }

    fn has_marker(&self, entity: EntityId, marker: Marker) -> bool {
        self.entities
            .get(&entity)
            .is_some_and(|record| record.markers.contains(&marker))
    }

    fn add_marker(&mut self, entity: EntityId, marker: Marker) {
        let added = self
            .entities
            .get_mut(&entity)
            .is_some_and(|record| record.markers.insert(marker));
        if added && marker == Marker::Cultist {
            self.pending.push_back(GameEvent::MarkerAdded(entity));
        }
    }

    fn mob_state(&self, entity: EntityId) -> Option<MobState> {
        self.entities.get(&entity)?.mob_state
    }
}

impl StationDirectory for Sandbox {
    fn maps(&self) -> Vec<MapId> {
        self.maps.iter().map(|(id, _)| *id).collect()
    }

    fn owning_map(&self, entity: EntityId) -> Option<MapId> {
        self.entities.get(&entity)?.map
    }

    fn map_name(&self, map: MapId) -> Option<String> {
        self.maps
            .iter()
            .find(|(id, _)| *id == map)
            .map(|(_, name)| name.clone())
    }
}

impl Presentation for Sandbox {
    fn announce(&mut self, text: &str) {
        self.presentation
            .push(PresentationRecord::Announcement(text.to_string()));
    }

    fn play_sound(&mut self, cue: &str, audience: Audience) {
        let session = match audience {
            Audience::Everyone => None,
            Audience::Session(id) => Some(id),
        };
        self.presentation.push(PresentationRecord::Sound {
            cue: cue.to_string(),
            session,
        });
    }

    fn message(&mut self, session: SessionId, text: &str) {
        self.presentation.push(PresentationRecord::Message {
            session,
            text: text.to_string(),
        });
    }
}

impl RoundTerminator for Sandbox {
    fn end_round(&mut self) {
        self.round_end_requests += 1;
    }
}
