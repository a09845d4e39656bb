use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sightline_bus::{Delivery, MovementBus};
use sightline_common::{EntityId, Position};
use sightline_registry::MobRegistry;
use sightline_spatial::{ChunkCoord, ChunkKey};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::session::ViewSession;
use crate::sink::UpdateSink;
use crate::transition::{Transition, decide};
use crate::viewpoint::Viewpoint;

/// World streaming signal for one client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorldSignal {
    ChunkLoaded { x: i32, z: i32 },
    ChunkUnloaded { x: i32, z: i32 },
}

/// A mob as the client currently knows it.
#[derive(Debug, Clone, Copy)]
struct Announced {
    /// Session tracking the id.
    owner: ChunkKey,
    /// Last position sent to the client.
    position: Position,
}

/// Everything one client sees: a session per loaded chunk plus the
/// client-wide record of announced mobs.
///
/// Each announced id belongs to exactly one session at a time. Moves are sent
/// relative to the last position the client was given, so the client ends up
/// at the latest delivered position whatever order sessions were opened in.
pub struct ClientView<S: UpdateSink, V: Viewpoint> {
    registry: Arc<MobRegistry>,
    bus: Arc<MovementBus>,
    viewpoint: V,
    sink: S,
    sessions: HashMap<ChunkKey, ViewSession>,
    announced: HashMap<EntityId, Announced>,
    deliveries_tx: UnboundedSender<Delivery>,
    deliveries: UnboundedReceiver<Delivery>,
}

impl<S: UpdateSink, V: Viewpoint> ClientView<S, V> {
    /// Create a view with no loaded chunks.
    pub fn new(registry: Arc<MobRegistry>, bus: Arc<MovementBus>, viewpoint: V, sink: S) -> Self {
        let (deliveries_tx, deliveries) = mpsc::unbounded_channel();
        Self {
            registry,
            bus,
            viewpoint,
            sink,
            sessions: HashMap::new(),
            announced: HashMap::new(),
            deliveries_tx,
            deliveries,
        }
    }

    /// Open the session of `chunk` and announce the mobs already in it.
    pub fn chunk_loaded(&mut self, chunk: ChunkCoord) {
        let key = chunk.key();
        if self.sessions.contains_key(&key) {
            tracing::debug!(%chunk, "chunk already loaded");
            return;
        }

        // Subscribe before enumerating so no move falls between the two.
        let subscription = self.bus.subscribe(key, self.deliveries_tx.clone());
        let mut session = ViewSession::new(chunk, subscription);

        for mob in self.registry.by_chunk(chunk) {
            let id = mob.entity_id();
            let position = mob.position();
            match self.announced.get(&id).copied() {
                None => {
                    self.sink.spawn(&mob, position);
                    self.announced.insert(id, Announced { owner: key, position });
                }
                Some(previous) => {
                    // Announced by the session it just left; take it over.
                    if let Some(other) = self.sessions.get_mut(&previous.owner) {
                        other.untrack(id);
                    }
                    if previous.position != position {
                        self.relay(id, previous.position, position);
                    }
                    self.announced.insert(id, Announced { owner: key, position });
                }
            }
            session.track(id);
        }

        session.activate();
        tracing::debug!(%chunk, tracked = session.tracked().len(), "view session active");
        self.sessions.insert(key, session);
    }

    /// Close the session of `chunk`, despawning everything it still tracks.
    pub fn chunk_unloaded(&mut self, chunk: ChunkCoord) {
        let Some(mut session) = self.sessions.remove(&chunk.key()) else {
            tracing::trace!(%chunk, "chunk not loaded");
            return;
        };
        self.flush(&mut session);
    }

    /// Apply a chunk load or unload signal.
    pub fn signal(&mut self, signal: WorldSignal) {
        match signal {
            WorldSignal::ChunkLoaded { x, z } => self.chunk_loaded(ChunkCoord::new(x, z)),
            WorldSignal::ChunkUnloaded { x, z } => self.chunk_unloaded(ChunkCoord::new(x, z)),
        }
    }

    /// Apply one delivery from the bus.
    pub fn handle(&mut self, delivery: Delivery) {
        let Some(session) = self.sessions.get(&delivery.key) else {
            tracing::trace!(key = %delivery.key, "delivery for unloaded chunk");
            return;
        };
        if !session.accepts(&delivery) {
            tracing::trace!(subscription = %delivery.subscription, "stale delivery");
            return;
        }
        let chunk = session.chunk();
        let key = chunk.key();
        let event = delivery.event;
        let id = event.entity_id();
        if !self.registry.contains(id) {
            tracing::debug!(entity = %id, "mob no longer registered, delivery dropped");
            return;
        }

        let region = self.viewpoint.current().region();
        let known = self.announced.get(&id).copied();
        match decide(chunk, known.map(|a| a.owner), &region, &event) {
            Transition::Spawn => {
                self.sink.spawn(&event.mob, event.position);
                self.track(key, id);
                self.announced.insert(
                    id,
                    Announced {
                        owner: key,
                        position: event.position,
                    },
                );
            }
            Transition::Despawn { owner } => {
                self.sink.despawn(&[id]);
                if let Some(session) = self.sessions.get_mut(&owner) {
                    session.untrack(id);
                }
                self.announced.remove(&id);
            }
            Transition::Move => {
                if let Some(known) = known {
                    self.relay(id, known.position, event.position);
                    self.announced.insert(
                        id,
                        Announced {
                            position: event.position,
                            ..known
                        },
                    );
                }
            }
            Transition::Adopt { from, relay } => {
                if let Some(session) = self.sessions.get_mut(&from) {
                    session.untrack(id);
                }
                self.track(key, id);
                let mut position = known.map_or(event.position, |a| a.position);
                if relay {
                    self.relay(id, position, event.position);
                    position = event.position;
                }
                self.announced.insert(id, Announced { owner: key, position });
            }
            Transition::Ignore => {}
        }
    }

    /// Apply every delivery already queued. Returns how many were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(delivery) = self.deliveries.try_recv() {
            self.handle(delivery);
            handled += 1;
        }
        handled
    }

    /// Serve signals and deliveries until the signal channel closes, then
    /// flush every session.
    ///
    /// Signals are served first, so an unload always cancels the session
    /// before any delivery queued behind it is looked at.
    pub async fn run(&mut self, signals: &mut UnboundedReceiver<WorldSignal>) {
        loop {
            tokio::select! {
                biased;
                signal = signals.recv() => match signal {
                    Some(signal) => self.signal(signal),
                    None => break,
                },
                Some(delivery) = self.deliveries.recv() => self.handle(delivery),
            }
        }
        self.pump();
        self.shutdown();
    }

    /// Cancel every live session, in chunk key order.
    pub fn shutdown(&mut self) {
        let mut keys: Vec<ChunkKey> = self.sessions.keys().copied().collect();
        keys.sort();
        for key in keys {
            if let Some(mut session) = self.sessions.remove(&key) {
                self.flush(&mut session);
            }
        }
    }

    /// Get the session of a loaded chunk.
    pub fn session(&self, chunk: ChunkCoord) -> Option<&ViewSession> {
        self.sessions.get(&chunk.key())
    }

    /// Chunks with a live session, sorted.
    pub fn loaded_chunks(&self) -> Vec<ChunkCoord> {
        let mut chunks: Vec<ChunkCoord> = self.sessions.values().map(ViewSession::chunk).collect();
        chunks.sort();
        chunks
    }

    /// Whether the client currently knows about `id`.
    pub fn is_announced(&self, id: EntityId) -> bool {
        self.announced.contains_key(&id)
    }

    /// Get the sink updates are written to.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn viewpoint(&self) -> &V {
        &self.viewpoint
    }

    fn track(&mut self, key: ChunkKey, id: EntityId) {
        if let Some(session) = self.sessions.get_mut(&key) {
            session.track(id);
        }
    }

    fn relay(&mut self, id: EntityId, from: Position, to: Position) {
        self.sink.relative_move(id, to - from, to);
    }

    fn flush(&mut self, session: &mut ViewSession) {
        let Some(ids) = session.cancel() else {
            return;
        };
        for id in &ids {
            self.announced.remove(id);
        }
        tracing::debug!(chunk = %session.chunk(), despawned = ids.len(), "view session cancelled");
        if !ids.is_empty() {
            self.sink.despawn(&ids);
        }
    }
}

impl<S: UpdateSink, V: Viewpoint> Drop for ClientView<S, V> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
