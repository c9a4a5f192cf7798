//! Collaborator surface the round rule talks to. The simulation, session storage,
//! map topology and presentation all live behind these traits; the rule only queries them.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MapId(pub u32);

/// Stable per-player id. Survives renames and body swaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity#{}", self.0)
    }
}

impl fmt::Display for MapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "map#{}", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Opaque handle to a connected player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionHandle {
    pub id: SessionId,
    /// Account name shown in the round-end roster.
    pub user_name: String,
}

/// Component markers the rule reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Marker {
    /// Presence means faction membership.
    Cultist,
    /// Tags the summoned ritual avatar.
    RitualAvatar,
    /// Entity is driven by a connected player.
    Actor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MobState {
    Alive,
    Critical,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Everyone,
    Session(SessionId),
}

/// Player/session directory.
pub trait PlayerDirectory {
    /// Controlling session of an entity, if it has a mind with an attached session.
    fn session_of(&self, entity: EntityId) -> Option<SessionHandle>;

    /// Current display name of an entity.
    fn display_name(&self, entity: EntityId) -> Option<String>;

    /// Entity the session is currently attached to.
    fn attached_entity(&self, session: SessionId) -> Option<EntityId>;
}

/// Entity/component query surface.
pub trait Simulation {
    fn entities_with(&self, marker: Marker) -> Vec<EntityId>;

    fn has_marker(&self, entity: EntityId, marker: Marker) -> bool;

    fn add_marker(&mut self, entity: EntityId, marker: Marker);

    fn mob_state(&self, entity: EntityId) -> Option<MobState>;
}

/// Map/station directory.
pub trait StationDirectory {
    /// Available maps, canonical order.
    fn maps(&self) -> Vec<MapId>;

    fn owning_map(&self, entity: EntityId) -> Option<MapId>;

    fn map_name(&self, map: MapId) -> Option<String>;
}

/// Announcements, sound cues and direct messages.
pub trait Presentation {
    fn announce(&mut self, text: &str);

    fn play_sound(&mut self, cue: &str, audience: Audience);

    fn message(&mut self, session: SessionId, text: &str);
}

/// External round-end mechanism.
pub trait RoundTerminator {
    fn end_round(&mut self);
}

/// Everything a round handler may touch.
pub trait RoundHost:
    PlayerDirectory + Simulation + StationDirectory + Presentation + RoundTerminator
{
}

impl<T> RoundHost for T where
    T: PlayerDirectory + Simulation + StationDirectory + Presentation + RoundTerminator
{
}
