use std::fmt;
use std::sync::Arc;

use sightline_common::{EntityId, Position};
use sightline_registry::Mob;
use sightline_spatial::{ChunkCoord, ChunkKey, chunk_of};

/// One position change of one mob.
///
/// Published under the key of the chunk the mob is now in and, when the
/// move crossed a chunk border, under the key of the chunk it left.
#[derive(Debug, Clone)]
pub struct MovementEvent {
    pub mob: Arc<Mob>,
    pub position: Position,
    /// `None` when the mob is being introduced rather than moved.
    pub previous: Option<Position>,
}

impl MovementEvent {
    pub fn entity_id(&self) -> EntityId {
        self.mob.entity_id()
    }

    pub fn chunk(&self) -> ChunkCoord {
        chunk_of(self.position)
    }

    pub fn previous_chunk(&self) -> Option<ChunkCoord> {
        self.previous.map(chunk_of)
    }

    /// Whether the move changed chunks. An introduction never crosses.
    pub fn crosses_chunks(&self) -> bool {
        self.previous_chunk().is_some_and(|prev| prev != self.chunk())
    }

    /// `position - previous`, if there is a previous position.
    pub fn delta(&self) -> Option<Position> {
        self.previous.map(|prev| self.position - prev)
    }

    /// Keys this event is published under, new chunk first.
    pub fn route_keys(&self) -> (ChunkKey, Option<ChunkKey>) {
        let exit = self
            .previous_chunk()
            .filter(|prev| *prev != self.chunk())
            .map(ChunkCoord::key);
        (self.chunk().key(), exit)
    }
}

/// Identity of one bus subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A movement event as received by one subscription.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub subscription: SubscriptionId,
    /// Key the event was published under.
    pub key: ChunkKey,
    pub event: MovementEvent,
}
