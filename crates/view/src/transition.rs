//! The visibility rule applied to each movement delivery.

use sightline_bus::MovementEvent;
use sightline_spatial::{ChunkCoord, ChunkKey, ViewRegion};

/// What a session does with one movement delivery.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transition {
    /// Announce the mob to the client; this session owns it.
    Spawn,
    /// Withdraw the mob; `owner` is the session that tracked it.
    Despawn { owner: ChunkKey },
    /// The owning session relays the move.
    Move,
    /// Take the mob over from another session of the same client, relaying
    /// the move when `relay` is set.
    Adopt { from: ChunkKey, relay: bool },
    Ignore,
}

/// Decide the effect of `event` delivered to the session of `session_chunk`.
///
/// `owner` is the client's session currently tracking the mob, if any, and
/// `region` the client's live view. A client receives a chunk-crossing move
/// twice (entry key, then exit key); the rule acts on at most one of them:
///
/// 1. Leaving the view despawns, from the owning session.
/// 2. Otherwise only the session of the chunk the mob landed in acts: an
///    unannounced mob in view is spawned, an owned one is moved, one owned
///    by another session is adopted.
///
/// Spawn and despawn therefore never come with a move for the same event.
pub fn decide(
    session_chunk: ChunkCoord,
    owner: Option<ChunkKey>,
    region: &ViewRegion,
    event: &MovementEvent,
) -> Transition {
    let key = session_chunk.key();
    let lands_here = event.chunk() == session_chunk;
    let now_inside = region.contains(event.chunk());
    let was_inside = event
        .previous_chunk()
        .is_some_and(|chunk| region.contains(chunk));

    if was_inside && !now_inside {
        return match owner {
            Some(owner) if owner == key => Transition::Despawn { owner },
            // Stale owner the exit key will never reach.
            Some(owner)
                if lands_here && Some(owner) != event.previous_chunk().map(ChunkCoord::key) =>
            {
                Transition::Despawn { owner }
            }
            _ => Transition::Ignore,
        };
    }

    if !lands_here {
        return Transition::Ignore;
    }

    match owner {
        None if now_inside => Transition::Spawn,
        None => Transition::Ignore,
        Some(owner) if owner == key && event.previous.is_some() => Transition::Move,
        Some(owner) if owner == key => Transition::Ignore,
        Some(from) => Transition::Adopt {
            from,
            relay: event.previous.is_some(),
        },
    }
}
