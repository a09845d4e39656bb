use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use sightline_common::{EntityId, Position};
use sightline_spatial::ChunkCoord;

use crate::index::ChunkIndex;
use crate::mob::{Mob, MobState};

/// Description of a mob to place in the world.
#[derive(Debug, Clone)]
pub struct MobSpawn {
    pub mob: String,
    pub level: Option<u32>,
    pub position: Position,
    pub health: u32,
}

/// Every live mob, by entity id.
///
/// Uses a BTreeMap so enumeration order is stable. A chunk index is kept
/// alongside; each mob updates its placement under its own state lock, so
/// lookups by chunk agree with the latest dispatched state.
#[derive(Debug)]
pub struct MobRegistry {
    inner: RwLock<Inner>,
    index: Arc<ChunkIndex>,
    state_capacity: usize,
}

#[derive(Debug)]
struct Inner {
    mobs: BTreeMap<EntityId, Arc<Mob>>,
    next_id: i32,
}

impl MobRegistry {
    /// `state_capacity` is the broadcast capacity given to each spawned mob.
    pub fn new(state_capacity: usize) -> Self {
        Self::with_first_id(state_capacity, 1)
    }

    /// Start allocating entity ids at `first_id`, leaving lower ids to players.
    pub fn with_first_id(state_capacity: usize, first_id: i32) -> Self {
        Self {
            inner: RwLock::new(Inner {
                mobs: BTreeMap::new(),
                next_id: first_id,
            }),
            index: Arc::new(ChunkIndex::default()),
            state_capacity,
        }
    }

    /// Spawn a mob under the next free entity id.
    pub fn spawn(&self, spawn: MobSpawn) -> Arc<Mob> {
        let mut inner = self.inner.write();
        let mut id = EntityId(inner.next_id);
        while inner.mobs.contains_key(&id) {
            id = EntityId(id.0 + 1);
        }
        inner.next_id = id.0 + 1;

        let mut mob = Mob::new(
            id,
            spawn.mob,
            spawn.level,
            MobState::new(spawn.position, spawn.health),
            self.state_capacity,
        );
        mob.attach(Arc::clone(&self.index));
        let mob = Arc::new(mob);
        inner.mobs.insert(id, Arc::clone(&mob));
        tracing::debug!(entity = %id, mob = mob.mob(), position = ?spawn.position, "mob spawned");
        mob
    }

    /// Insert a prebuilt mob. Returns the mob it replaced, if any.
    pub fn insert(&self, mut mob: Mob) -> Option<Arc<Mob>> {
        let id = mob.entity_id();
        let mut inner = self.inner.write();
        let replaced = inner.mobs.remove(&id);
        if let Some(old) = &replaced {
            old.detach();
        }
        mob.attach(Arc::clone(&self.index));
        inner.mobs.insert(id, Arc::new(mob));
        replaced
    }

    /// Remove a mob. Existing `Arc`s stay valid; lookups stop finding it.
    pub fn remove(&self, id: EntityId) -> Option<Arc<Mob>> {
        let removed = self.inner.write().mobs.remove(&id);
        if let Some(mob) = &removed {
            mob.detach();
            tracing::debug!(entity = %id, "mob removed");
        }
        removed
    }

    /// All mobs, in entity id order.
    pub fn all(&self) -> Vec<Arc<Mob>> {
        self.inner.read().mobs.values().cloned().collect()
    }

    /// Mobs whose current position lies in `chunk`, in entity id order.
    pub fn by_chunk(&self, chunk: ChunkCoord) -> Vec<Arc<Mob>> {
        let ids = self.index.ids_in(chunk);
        let inner = self.inner.read();
        ids.iter().filter_map(|id| inner.mobs.get(id).cloned()).collect()
    }

    /// Number of chunks holding at least one mob.
    pub fn occupied_chunks(&self) -> usize {
        self.index.chunk_count()
    }

    /// Look a mob up by entity id.
    pub fn by_id(&self, id: EntityId) -> Option<Arc<Mob>> {
        self.inner.read().mobs.get(&id).cloned()
    }

    /// Check if a mob is registered under `id`.
    pub fn contains(&self, id: EntityId) -> bool {
        self.inner.read().mobs.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().mobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().mobs.is_empty()
    }
}

impl Default for MobRegistry {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mob::MobAction;

    fn spawn_at(registry: &MobRegistry, x: f64, z: f64) -> Arc<Mob> {
        registry.spawn(MobSpawn {
            mob: "zombie_grunt".into(),
            level: None,
            position: Position::new(x, 64.0, z),
            health: 20,
        })
    }

    #[test]
    fn registry_starts_empty() {
        let registry = MobRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.all().is_empty());
    }

    #[test]
    fn spawn_allocates_sequential_ids() {
        let registry = MobRegistry::with_first_id(8, 100);
        let a = spawn_at(&registry, 0.0, 0.0);
        let b = spawn_at(&registry, 0.0, 0.0);
        assert_eq!(a.entity_id(), EntityId(100));
        assert_eq!(b.entity_id(), EntityId(101));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn spawn_skips_inserted_ids() {
        let registry = MobRegistry::new(8);
        registry.insert(Mob::new(
            EntityId(1),
            "npc",
            None,
            MobState::new(Position::ZERO, 1),
            8,
        ));
        let mob = spawn_at(&registry, 0.0, 0.0);
        assert_eq!(mob.entity_id(), EntityId(2));
    }

    #[test]
    fn by_chunk_follows_live_position() {
        let registry = MobRegistry::default();
        let mob = spawn_at(&registry, 8.0, 8.0);
        let other = spawn_at(&registry, 40.0, 8.0);

        let here: Vec<EntityId> = registry
            .by_chunk(ChunkCoord::new(0, 0))
            .iter()
            .map(|m| m.entity_id())
            .collect();
        assert_eq!(here, vec![mob.entity_id()]);

        mob.dispatch(MobAction::Move {
            position: Position::new(-8.0, 64.0, 8.0),
        });
        assert!(registry.by_chunk(ChunkCoord::new(0, 0)).is_empty());
        assert_eq!(registry.by_chunk(ChunkCoord::new(-1, 0)).len(), 1);
        assert_eq!(registry.by_chunk(ChunkCoord::new(2, 0))[0].entity_id(), other.entity_id());
    }

    #[test]
    fn remove_hides_mob() {
        let registry = MobRegistry::default();
        let mob = spawn_at(&registry, 0.0, 0.0);
        let id = mob.entity_id();
        assert!(registry.by_id(id).is_some());

        assert!(registry.remove(id).is_some());
        assert!(registry.by_id(id).is_none());
        assert!(!registry.contains(id));
        assert!(registry.remove(id).is_none());
        // The handle outlives the registry entry.
        assert_eq!(mob.entity_id(), id);
    }

    #[test]
    fn removed_mob_leaves_chunk_index() {
        let registry = MobRegistry::default();
        let mob = spawn_at(&registry, 8.0, 8.0);
        registry.remove(mob.entity_id());
        assert_eq!(registry.occupied_chunks(), 0);

        // Later moves of the stray handle do not put it back.
        mob.dispatch(MobAction::Move {
            position: Position::new(24.0, 64.0, 8.0),
        });
        assert!(registry.by_chunk(ChunkCoord::new(1, 0)).is_empty());
        assert_eq!(registry.occupied_chunks(), 0);
    }

    #[test]
    fn insert_replaces_placement() {
        let registry = MobRegistry::default();
        let state = |x: f64| MobState::new(Position::new(x, 64.0, 0.0), 1);
        registry.insert(Mob::new(EntityId(4), "npc", None, state(0.0), 8));
        let old = registry.insert(Mob::new(EntityId(4), "npc", None, state(40.0), 8));
        assert!(registry.by_chunk(ChunkCoord::new(0, 0)).is_empty());
        assert_eq!(registry.by_chunk(ChunkCoord::new(2, 0)).len(), 1);

        // The replaced handle no longer moves the new mob's placement.
        let old = old.unwrap();
        old.dispatch(MobAction::Move {
            position: Position::new(40.0, 64.0, 0.0),
        });
        old.dispatch(MobAction::Move {
            position: Position::new(60.0, 64.0, 0.0),
        });
        assert_eq!(registry.by_chunk(ChunkCoord::new(2, 0)).len(), 1);
        assert_eq!(registry.occupied_chunks(), 1);
    }

    #[test]
    fn by_chunk_is_in_id_order() {
        let registry = MobRegistry::default();
        let ids: Vec<EntityId> = (0..5)
            .map(|i| spawn_at(&registry, 1.0 + i as f64, 1.0).entity_id())
            .collect();
        let found: Vec<EntityId> = registry
            .by_chunk(ChunkCoord::new(0, 0))
            .iter()
            .map(|m| m.entity_id())
            .collect();
        assert_eq!(found, ids);
    }

    #[test]
    fn all_is_in_id_order() {
        let registry = MobRegistry::default();
        for i in 0..10 {
            spawn_at(&registry, i as f64 * 16.0, 0.0);
        }
        let ids: Vec<EntityId> = registry.all().iter().map(|m| m.entity_id()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
}
