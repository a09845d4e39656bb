use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use sightline_registry::Mob;
use sightline_spatial::ChunkKey;
use tokio::sync::mpsc::UnboundedSender;

use crate::event::{Delivery, MovementEvent, SubscriptionId};

struct Route {
    id: SubscriptionId,
    tx: UnboundedSender<Delivery>,
}

/// In-process publish/subscribe router keyed by chunk.
///
/// Publishing never blocks and never fails: a key nobody listens to simply
/// drops the event. Each subscription receives the events of its key in
/// publish order.
pub struct MovementBus {
    routes: Mutex<HashMap<ChunkKey, Vec<Route>>>,
    next_id: AtomicU64,
}

impl MovementBus {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Route every event published under `key` into `tx` until the returned
    /// handle is dropped.
    pub fn subscribe(self: &Arc<Self>, key: ChunkKey, tx: UnboundedSender<Delivery>) -> Subscription {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.routes
            .lock()
            .entry(key)
            .or_default()
            .push(Route { id, tx });
        tracing::trace!(%key, subscription = %id, "bus subscription opened");
        Subscription {
            bus: Arc::downgrade(self),
            key,
            id,
        }
    }

    fn unsubscribe(&self, key: ChunkKey, id: SubscriptionId) {
        let mut routes = self.routes.lock();
        if let Some(subscribers) = routes.get_mut(&key) {
            subscribers.retain(|route| route.id != id);
            if subscribers.is_empty() {
                routes.remove(&key);
            }
        }
        tracing::trace!(%key, subscription = %id, "bus subscription closed");
    }

    /// Deliver `event` to every subscriber of `key`. Returns how many
    /// subscriptions received it. Closed receivers are pruned.
    pub fn publish(&self, key: ChunkKey, event: &MovementEvent) -> usize {
        let mut routes = self.routes.lock();
        let Some(subscribers) = routes.get_mut(&key) else {
            return 0;
        };
        let mut delivered = 0;
        subscribers.retain(|route| {
            let sent = route
                .tx
                .send(Delivery {
                    subscription: route.id,
                    key,
                    event: event.clone(),
                })
                .is_ok();
            delivered += usize::from(sent);
            sent
        });
        if subscribers.is_empty() {
            routes.remove(&key);
        }
        delivered
    }

    /// Publish a movement under its new chunk and, if it crossed a border,
    /// under the chunk it left. The new chunk is always served first.
    pub fn publish_movement(&self, event: MovementEvent) -> usize {
        let (entry, exit) = event.route_keys();
        tracing::trace!(
            entity = %event.entity_id(),
            chunk = %entry,
            delta = ?event.delta(),
            crossed = exit.is_some(),
            "movement"
        );
        let mut delivered = self.publish(entry, &event);
        if let Some(exit) = exit {
            delivered += self.publish(exit, &event);
        }
        delivered
    }

    /// Announce a mob at its current position with no previous position,
    /// for mobs that appear after observers are already subscribed.
    pub fn introduce(&self, mob: &Arc<Mob>) -> usize {
        self.publish_movement(MovementEvent {
            mob: Arc::clone(mob),
            position: mob.position(),
            previous: None,
        })
    }

    /// Live subscriptions for `key`.
    pub fn subscriber_count(&self, key: ChunkKey) -> usize {
        self.routes.lock().get(&key).map_or(0, Vec::len)
    }

    /// Number of keys with at least one subscription.
    pub fn key_count(&self) -> usize {
        self.routes.lock().len()
    }
}

impl Default for MovementBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle of one bus subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    bus: Weak<MovementBus>,
    key: ChunkKey,
    id: SubscriptionId,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn key(&self) -> ChunkKey {
        self.key
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(self.key, self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sightline_common::{EntityId, Position};
    use sightline_registry::MobState;
    use sightline_spatial::{ChunkCoord, chunk_key};
    use tokio::sync::mpsc;

    fn mob_at(position: Position) -> Arc<Mob> {
        Arc::new(Mob::new(
            EntityId(3),
            "zombie_grunt",
            None,
            MobState::new(position, 20),
            4,
        ))
    }

    fn moved(mob: &Arc<Mob>, from: Position, to: Position) -> MovementEvent {
        MovementEvent {
            mob: Arc::clone(mob),
            position: to,
            previous: Some(from),
        }
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let bus = MovementBus::new();
        let mob = mob_at(Position::ZERO);
        let event = moved(&mob, Position::ZERO, Position::new(1.0, 0.0, 0.0));
        assert_eq!(bus.publish_movement(event), 0);
    }

    #[test]
    fn subscriber_only_sees_its_key() {
        let bus = Arc::new(MovementBus::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sub = bus.subscribe(chunk_key(0, 0), tx);

        let mob = mob_at(Position::ZERO);
        bus.publish_movement(moved(&mob, Position::ZERO, Position::new(1.0, 0.0, 1.0)));
        bus.publish_movement(moved(
            &mob,
            Position::new(40.0, 0.0, 0.0),
            Position::new(41.0, 0.0, 0.0),
        ));

        let delivery = rx.try_recv().unwrap();
        assert_eq!(delivery.subscription, sub.id());
        assert_eq!(delivery.key, chunk_key(0, 0));
        assert_eq!(delivery.event.position, Position::new(1.0, 0.0, 1.0));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn crossing_publishes_entry_then_exit() {
        let bus = Arc::new(MovementBus::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _exit = bus.subscribe(chunk_key(3, 0), tx.clone());
        let _entry = bus.subscribe(chunk_key(2, 0), tx);

        let mob = mob_at(Position::new(50.0, 0.0, 0.0));
        let delivered = bus.publish_movement(moved(
            &mob,
            Position::new(50.0, 0.0, 0.0),
            Position::new(40.0, 0.0, 0.0),
        ));
        assert_eq!(delivered, 2);

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(first.key, chunk_key(2, 0));
        assert_eq!(second.key, chunk_key(3, 0));
        // Same payload under both keys.
        assert_eq!(first.event.position, second.event.position);
        assert_eq!(first.event.previous, second.event.previous);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let bus = Arc::new(MovementBus::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sub = bus.subscribe(chunk_key(0, 0), tx);
        assert_eq!(bus.subscriber_count(chunk_key(0, 0)), 1);

        drop(sub);
        assert_eq!(bus.subscriber_count(chunk_key(0, 0)), 0);
        assert_eq!(bus.key_count(), 0);

        let mob = mob_at(Position::ZERO);
        bus.publish_movement(moved(&mob, Position::ZERO, Position::ONE));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_receivers_are_pruned() {
        let bus = Arc::new(MovementBus::new());
        let (tx, rx) = mpsc::unbounded_channel();
        let _sub = bus.subscribe(chunk_key(0, 0), tx);
        drop(rx);

        let mob = mob_at(Position::ZERO);
        assert_eq!(bus.publish_movement(moved(&mob, Position::ZERO, Position::ONE)), 0);
        assert_eq!(bus.subscriber_count(chunk_key(0, 0)), 0);
    }

    #[test]
    fn introduce_publishes_current_position_once() {
        let bus = Arc::new(MovementBus::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _sub = bus.subscribe(ChunkCoord::new(1, 1).key(), tx);

        let mob = mob_at(Position::new(20.0, 64.0, 20.0));
        assert_eq!(bus.introduce(&mob), 1);
        let delivery = rx.try_recv().unwrap();
        assert_eq!(delivery.event.previous, None);
        assert_eq!(delivery.event.position, Position::new(20.0, 64.0, 20.0));
    }
}
