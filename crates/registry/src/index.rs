use std::collections::{BTreeSet, HashMap};

use parking_lot::RwLock;
use sightline_common::EntityId;
use sightline_spatial::ChunkCoord;

/// Chunk to entity ids placement map shared by a registry and its mobs.
///
/// Ids are kept sorted so lookups come back in id order.
#[derive(Debug, Default)]
pub(crate) struct ChunkIndex {
    chunks: RwLock<HashMap<ChunkCoord, BTreeSet<EntityId>>>,
}

impl ChunkIndex {
    pub(crate) fn insert(&self, id: EntityId, chunk: ChunkCoord) {
        self.chunks.write().entry(chunk).or_default().insert(id);
    }

    pub(crate) fn remove(&self, id: EntityId, chunk: ChunkCoord) -> bool {
        let mut chunks = self.chunks.write();
        let Some(ids) = chunks.get_mut(&chunk) else {
            return false;
        };
        let removed = ids.remove(&id);
        if ids.is_empty() {
            chunks.remove(&chunk);
        }
        removed
    }

    /// Move `id` from `from` to `to`. An id no longer placed in `from` has
    /// left the registry and stays out.
    pub(crate) fn relocate(&self, id: EntityId, from: ChunkCoord, to: ChunkCoord) {
        if from != to && self.remove(id, from) {
            self.insert(id, to);
        }
    }

    pub(crate) fn ids_in(&self, chunk: ChunkCoord) -> Vec<EntityId> {
        self.chunks
            .read()
            .get(&chunk)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of occupied chunks.
    pub(crate) fn chunk_count(&self) -> usize {
        self.chunks.read().len()
    }
}
