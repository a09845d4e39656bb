use serde::Serialize;
use sightline_common::{EntityId, Position};
use sightline_registry::Mob;

/// Outgoing side of a client view: where semantic visibility updates go.
///
/// Calls for one id always come in the order spawn, then any number of
/// moves, then despawn. Implementations translate them into packets.
pub trait UpdateSink {
    fn spawn(&mut self, mob: &Mob, position: Position);
    fn despawn(&mut self, ids: &[EntityId]);
    /// `position` is the absolute position after the move.
    fn relative_move(&mut self, id: EntityId, delta: Position, position: Position);
}

/// A recorded visibility update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewUpdate {
    Spawn {
        id: EntityId,
        position: Position,
    },
    Despawn {
        ids: Vec<EntityId>,
    },
    Move {
        id: EntityId,
        delta: Position,
        position: Position,
    },
}

/// Records updates in order.
impl UpdateSink for Vec<ViewUpdate> {
    fn spawn(&mut self, mob: &Mob, position: Position) {
        self.push(ViewUpdate::Spawn {
            id: mob.entity_id(),
            position,
        });
    }

    fn despawn(&mut self, ids: &[EntityId]) {
        self.push(ViewUpdate::Despawn { ids: ids.to_vec() });
    }

    fn relative_move(&mut self, id: EntityId, delta: Position, position: Position) {
        self.push(ViewUpdate::Move {
            id,
            delta,
            position,
        });
    }
}
