use std::collections::BTreeSet;

use sightline_bus::{Delivery, Subscription, SubscriptionId};
use sightline_common::EntityId;
use sightline_spatial::{ChunkCoord, ChunkKey};

/// Lifecycle of a view session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Subscribed, announcing the mobs already in the chunk.
    Initializing,
    /// Consuming movement events for the chunk.
    Active,
    /// Terminal. Unsubscribed and flushed.
    Cancelled,
}

/// One client's view of one loaded chunk.
///
/// Holds the bus subscription for the chunk's key and the ids this session
/// has announced to the client. Dropping the subscription is the
/// cancellation: no delivery for it is accepted afterwards.
#[derive(Debug)]
pub struct ViewSession {
    chunk: ChunkCoord,
    state: SessionState,
    tracked: BTreeSet<EntityId>,
    subscription: Option<Subscription>,
}

impl ViewSession {
    pub fn new(chunk: ChunkCoord, subscription: Subscription) -> Self {
        Self {
            chunk,
            state: SessionState::Initializing,
            tracked: BTreeSet::new(),
            subscription: Some(subscription),
        }
    }

    pub fn chunk(&self) -> ChunkCoord {
        self.chunk
    }

    pub fn key(&self) -> ChunkKey {
        self.chunk.key()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn tracked(&self) -> &BTreeSet<EntityId> {
        &self.tracked
    }

    pub fn is_tracking(&self, id: EntityId) -> bool {
        self.tracked.contains(&id)
    }

    pub fn subscription_id(&self) -> Option<SubscriptionId> {
        self.subscription.as_ref().map(Subscription::id)
    }

    /// Whether `delivery` belongs to this session's live subscription.
    pub fn accepts(&self, delivery: &Delivery) -> bool {
        self.state == SessionState::Active
            && self.subscription_id() == Some(delivery.subscription)
    }

    /// Initializing -> Active. Any other state is left alone.
    pub fn activate(&mut self) {
        if self.state == SessionState::Initializing {
            self.state = SessionState::Active;
        }
    }

    /// Start tracking an announced id. Returns false if already tracked or
    /// the session is cancelled.
    pub fn track(&mut self, id: EntityId) -> bool {
        self.state != SessionState::Cancelled && self.tracked.insert(id)
    }

    pub fn untrack(&mut self, id: EntityId) -> bool {
        self.tracked.remove(&id)
    }

    /// Terminate the session: unsubscribe and hand back every id still
    /// tracked, for a single despawn batch. Only the first call returns
    /// `Some`; later calls are no-ops.
    pub fn cancel(&mut self) -> Option<Vec<EntityId>> {
        if self.state == SessionState::Cancelled {
            return None;
        }
        self.state = SessionState::Cancelled;
        self.subscription = None;
        Some(std::mem::take(&mut self.tracked).into_iter().collect())
    }
}
