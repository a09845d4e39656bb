use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use sightline_common::{EntityId, Position};
use sightline_spatial::chunk_of;
use tokio::sync::broadcast;

use crate::index::ChunkIndex;

/// Snapshot of a mob's state, as published on its state stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MobState {
    pub position: Position,
    /// Bumped by every action that (re)asserts the position, including a
    /// forced resync that leaves the coordinates unchanged. Consumers compare
    /// revisions, never coordinates, to detect movement.
    pub position_revision: u64,
    pub health: u32,
}

impl MobState {
    pub fn new(position: Position, health: u32) -> Self {
        Self {
            position,
            position_revision: 0,
            health,
        }
    }
}

/// A mutation of mob state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MobAction {
    /// Produced by AI/pathing.
    Move { position: Position },
    /// Re-emit the current position so every observer re-syncs.
    Resync,
    /// Produced by combat resolution.
    DealDamage { damage: u32 },
}

/// Pure state transition.
pub fn reduce(state: MobState, action: MobAction) -> MobState {
    match action {
        MobAction::Move { position } => MobState {
            position,
            position_revision: state.position_revision + 1,
            ..state
        },
        MobAction::Resync => MobState {
            position_revision: state.position_revision + 1,
            ..state
        },
        MobAction::DealDamage { damage } => {
            let health = state.health.saturating_sub(damage);
            tracing::info!(damage, health, "deal damage");
            MobState { health, ..state }
        }
    }
}

/// A live mob.
///
/// The mob owns its state and a broadcast of every snapshot it goes through.
/// Receivers only see snapshots sent after they subscribed.
#[derive(Debug)]
pub struct Mob {
    entity_id: EntityId,
    mob: String,
    level: Option<u32>,
    state: RwLock<MobState>,
    events: broadcast::Sender<MobState>,
    /// Placement map of the registry holding this mob, if any.
    index: Mutex<Option<Arc<ChunkIndex>>>,
}

impl Mob {
    /// `capacity` bounds how far a slow subscriber may fall behind before it lags.
    pub fn new(
        entity_id: EntityId,
        mob: impl Into<String>,
        level: Option<u32>,
        state: MobState,
        capacity: usize,
    ) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            entity_id,
            mob: mob.into(),
            level,
            state: RwLock::new(state),
            events,
            index: Mutex::new(None),
        }
    }

    /// Place the mob in `index` at its current chunk.
    pub(crate) fn attach(&mut self, index: Arc<ChunkIndex>) {
        index.insert(self.entity_id, chunk_of(self.state.get_mut().position));
        *self.index.get_mut() = Some(index);
    }

    /// Take the mob out of its registry's placement map for good.
    pub(crate) fn detach(&self) {
        let state = self.state.write();
        if let Some(index) = self.index.lock().take() {
            index.remove(self.entity_id, chunk_of(state.position));
        }
    }

    /// Protocol entity id.
    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    /// Catalog key of this mob's type.
    pub fn mob(&self) -> &str {
        &self.mob
    }

    /// Level shown in the name tag, if any.
    pub fn level(&self) -> Option<u32> {
        self.level
    }

    /// Current state snapshot.
    pub fn state(&self) -> MobState {
        *self.state.read()
    }

    pub fn position(&self) -> Position {
        self.state.read().position
    }

    /// Subscribe to the state stream from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<MobState> {
        self.events.subscribe()
    }

    /// Subscribe and read the current state atomically with respect to
    /// `dispatch`, so no snapshot falls between the two.
    pub fn subscribe_with_state(&self) -> (MobState, broadcast::Receiver<MobState>) {
        let state = self.state.read();
        (*state, self.events.subscribe())
    }

    /// Apply an action and publish the resulting snapshot.
    pub fn dispatch(&self, action: MobAction) -> MobState {
        let mut state = self.state.write();
        let next = reduce(*state, action);
        if let Some(index) = self.index.lock().as_ref() {
            index.relocate(self.entity_id, chunk_of(state.position), chunk_of(next.position));
        }
        *state = next;
        // No subscriber is fine: the stream is not replayed.
        let _ = self.events.send(next);
        tracing::trace!(entity = %self.entity_id, ?action, "mob state changed");
        next
    }
}
