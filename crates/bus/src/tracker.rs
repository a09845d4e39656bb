//! Per-mob fold tasks that feed the bus.

use std::sync::{Arc, Weak};

use sightline_common::Position;
use sightline_registry::{Mob, MobRegistry, MobState};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::{JoinHandle, JoinSet};

use crate::bus::MovementBus;
use crate::event::MovementEvent;

/// Fold over one mob's snapshots that yields a `(previous, position)` pair
/// whenever the position revision moves. Health-only snapshots yield nothing;
/// a forced resync yields a pair with equal positions.
#[derive(Debug, Clone, Copy)]
pub struct MovementFold {
    position: Position,
    revision: u64,
}

impl MovementFold {
    /// Start from the state the mob had when its stream was subscribed.
    pub fn new(initial: MobState) -> Self {
        Self {
            position: initial.position,
            revision: initial.position_revision,
        }
    }

    pub fn step(&mut self, state: MobState) -> Option<(Position, Position)> {
        if state.position_revision == self.revision {
            return None;
        }
        let previous = self.position;
        self.position = state.position;
        self.revision = state.position_revision;
        Some((previous, state.position))
    }
}

impl MovementBus {
    /// Start one fold task per registered mob.
    pub fn track(self: &Arc<Self>, registry: &MobRegistry) -> JoinSet<()> {
        let mut tasks = JoinSet::new();
        for mob in registry.all() {
            let (initial, states) = mob.subscribe_with_state();
            tasks.spawn(follow_mob(
                Arc::clone(self),
                Arc::downgrade(&mob),
                initial,
                states,
            ));
        }
        tracing::debug!(mobs = tasks.len(), "movement tracking started");
        tasks
    }

    /// Start the fold task of a single mob, e.g. one spawned after `track`.
    pub fn follow(self: &Arc<Self>, mob: &Arc<Mob>) -> JoinHandle<()> {
        let (initial, states) = mob.subscribe_with_state();
        tokio::spawn(follow_mob(
            Arc::clone(self),
            Arc::downgrade(mob),
            initial,
            states,
        ))
    }
}

/// Runs until the mob is dropped. Holds only a weak handle so the mob's
/// stream closes once the registry and every in-flight event let go of it.
async fn follow_mob(
    bus: Arc<MovementBus>,
    mob: Weak<Mob>,
    initial: MobState,
    mut states: broadcast::Receiver<MobState>,
) {
    let mut fold = MovementFold::new(initial);
    loop {
        match states.recv().await {
            Ok(state) => {
                let Some((previous, position)) = fold.step(state) else {
                    continue;
                };
                let Some(mob) = mob.upgrade() else {
                    break;
                };
                bus.publish_movement(MovementEvent {
                    mob,
                    position,
                    previous: Some(previous),
                });
            }
            Err(RecvError::Lagged(skipped)) => {
                // The next snapshot still folds against the last processed
                // position, so the skipped moves collapse into one.
                tracing::warn!(skipped, "mob state stream lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
    tracing::trace!("movement fold finished");
}
