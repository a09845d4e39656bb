use std::collections::BTreeSet;

use crate::chunk::ChunkCoord;
use crate::region::{ViewRegion, chunks_in_radius};

/// Streaming configuration: view radius plus per-update budgets.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Radius (in chunks) around the viewer that is kept loaded.
    pub view_distance: u32,
    /// Maximum number of chunks to load per update.
    pub load_budget: usize,
    /// Maximum number of chunks to unload per update.
    pub unload_budget: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            view_distance: 2,
            load_budget: 16,
            unload_budget: 16,
        }
    }
}

/// Per-update streaming statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub chunks_loaded: usize,
    pub chunks_unloaded: usize,
    pub total_loaded: usize,
}

/// Tracks which chunks a viewer has loaded and produces the load/unload
/// transitions as the viewer moves. Each chunk is reported loaded exactly
/// once per residency and unloaded exactly once after that.
pub struct ChunkStreamer {
    pub config: StreamConfig,
    loaded: BTreeSet<ChunkCoord>,
    stats: StreamStats,
}

impl ChunkStreamer {
    pub fn new(config: StreamConfig) -> Self {
        Self {
            config,
            loaded: BTreeSet::new(),
            stats: StreamStats::default(),
        }
    }

    /// Update streaming for the viewer's current chunk.
    /// Returns the chunks that were loaded and unloaded by this update.
    /// Nearest chunks load first; budgets carry the rest to later updates.
    pub fn update(&mut self, viewer: ChunkCoord) -> (Vec<ChunkCoord>, Vec<ChunkCoord>) {
        let _span = tracing::info_span!("chunk_stream_update", %viewer).entered();

        let region = ViewRegion::around(viewer, self.config.view_distance);

        let mut wanted: Vec<ChunkCoord> = chunks_in_radius(viewer, self.config.view_distance)
            .into_iter()
            .filter(|c| !self.loaded.contains(c))
            .collect();
        wanted.sort_by_key(|c| chebyshev(viewer, *c));
        let to_load: Vec<ChunkCoord> = wanted.into_iter().take(self.config.load_budget).collect();

        let to_unload: Vec<ChunkCoord> = self
            .loaded
            .iter()
            .filter(|c| !region.contains(**c))
            .take(self.config.unload_budget)
            .copied()
            .collect();

        for c in &to_load {
            tracing::debug!(chunk = %c, "loading chunk");
            self.loaded.insert(*c);
        }
        for c in &to_unload {
            tracing::debug!(chunk = %c, "unloading chunk");
            self.loaded.remove(c);
        }

        self.stats = StreamStats {
            chunks_loaded: to_load.len(),
            chunks_unloaded: to_unload.len(),
            total_loaded: self.loaded.len(),
        };

        tracing::trace!(
            loaded = to_load.len(),
            unloaded = to_unload.len(),
            total = self.loaded.len(),
            "chunk stream update complete"
        );

        (to_load, to_unload)
    }

    /// Unload everything, e.g. when the viewer disconnects.
    pub fn clear(&mut self) -> Vec<ChunkCoord> {
        let all: Vec<ChunkCoord> = std::mem::take(&mut self.loaded).into_iter().collect();
        self.stats = StreamStats {
            chunks_loaded: 0,
            chunks_unloaded: all.len(),
            total_loaded: 0,
        };
        all
    }

    pub fn loaded_chunks(&self) -> &BTreeSet<ChunkCoord> {
        &self.loaded
    }

    pub fn is_loaded(&self, chunk: ChunkCoord) -> bool {
        self.loaded.contains(&chunk)
    }

    /// Statistics from the last update.
    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }
}

fn chebyshev(a: ChunkCoord, b: ChunkCoord) -> u32 {
    a.x.abs_diff(b.x).max(a.z.abs_diff(b.z))
}
