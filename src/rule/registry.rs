//! Faction registry: who is in the cult this round, in join order.

use indexmap::IndexMap;
use serde::Serialize;

use crate::rule::host::{EntityId, SessionHandle, SessionId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactionMember {
    /// Display name captured when the member joined.
    pub name: String,
    pub session: SessionHandle,
    /// Body the member controlled when they joined.
    pub entity: EntityId,
}

#[derive(Debug, Clone, Default)]
pub struct FactionRegistry {
    active: IndexMap<SessionId, FactionMember>,
    departed: Vec<FactionMember>,
}

impl FactionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a member. Returns `false` (and changes nothing) when the key is already active.
    pub fn add(&mut self, key: SessionId, member: FactionMember) -> bool {
        if self.active.contains_key(&key) {
            return false;
        }
        self.departed.retain(|former| former.session.id != key);
        self.active.insert(key, member);
        true
    }

    /// Drop a member, keeping them on the roster as departed.
    pub fn remove(&mut self, key: SessionId) -> Option<FactionMember> {
        let member = self.active.shift_remove(&key)?;
        self.departed.push(member.clone());
        Some(member)
    }

    pub fn contains(&self, key: SessionId) -> bool {
        self.active.contains_key(&key)
    }

    /// Key of the active member registered with `entity`.
    pub fn key_for_entity(&self, entity: EntityId) -> Option<SessionId> {
        self.active
            .iter()
            .find(|(_, member)| member.entity == entity)
            .map(|(key, _)| *key)
    }

    /// Active members in insertion order.
    pub fn members(&self) -> impl Iterator<Item = (SessionId, &FactionMember)> + '_ {
        self.active.iter().map(|(key, member)| (*key, member))
    }

    /// Everyone who held membership this round: active first, then departed in leave order.
    pub fn roster(&self) -> impl Iterator<Item = &FactionMember> + '_ {
        self.active.values().chain(self.departed.iter())
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn clear(&mut self) {
        self.active.clear();
        self.departed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: u64, name: &str) -> (SessionId, FactionMember) {
        let key = SessionId(id);
        (
            key,
            FactionMember {
                name: name.to_string(),
                session: SessionHandle {
                    id: key,
                    user_name: format!("user{id}"),
                },
                entity: EntityId(id + 100),
            },
        )
    }

    #[test]
    fn add_is_idempotent() {
        let mut registry = FactionRegistry::new();
        let (key, m) = member(1, "Ash");
        assert!(registry.add(key, m.clone()));
        assert!(!registry.add(key, m));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut registry = FactionRegistry::new();
        for (id, name) in [(5, "Eve"), (2, "Bo"), (9, "Cy")] {
            let (key, m) = member(id, name);
            registry.add(key, m);
        }
        let names: Vec<&str> = registry.members().map(|(_, m)| m.name.as_str()).collect();
        assert_eq!(names, vec!["Eve", "Bo", "Cy"]);
    }

    #[test]
    fn removed_members_stay_on_roster() {
        let mut registry = FactionRegistry::new();
        let (a, ma) = member(1, "Ash");
        let (b, mb) = member(2, "Bo");
        registry.add(a, ma);
        registry.add(b, mb);

        assert!(registry.remove(a).is_some());
        assert!(registry.remove(a).is_none());
        assert!(!registry.contains(a));
        let roster: Vec<&str> = registry.roster().map(|m| m.name.as_str()).collect();
        assert_eq!(roster, vec!["Bo", "Ash"]);
    }

    #[test]
    fn rejoining_clears_departed_entry() {
        let mut registry = FactionRegistry::new();
        let (a, ma) = member(1, "Ash");
        registry.add(a, ma.clone());
        registry.remove(a);
        assert!(registry.add(a, ma));
        assert_eq!(registry.roster().count(), 1);
    }

    #[test]
    fn key_for_entity_finds_active_member() {
        let mut registry = FactionRegistry::new();
        let (a, ma) = member(4, "Dee");
        registry.add(a, ma);
        assert_eq!(registry.key_for_entity(EntityId(104)), Some(a));
        assert_eq!(registry.key_for_entity(EntityId(1)), None);
    }
}
