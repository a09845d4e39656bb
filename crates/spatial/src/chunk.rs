use std::fmt;

use serde::{Deserialize, Serialize};
use sightline_common::Position;

/// Edge length of a chunk, in blocks.
pub const CHUNK_SIZE: f64 = 16.0;

/// A 2D chunk coordinate (the Y axis is not partitioned).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    /// Create a chunk coordinate.
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Routing key of this chunk.
    pub fn key(self) -> ChunkKey {
        chunk_key(self.x, self.z)
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.z)
    }
}

/// Packed chunk identity used as a bus routing key and as the index of a
/// client's loaded chunks. High 32 bits hold `x`, low 32 bits hold `z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkKey(u64);

impl ChunkKey {
    /// Unpack the coordinate this key was built from.
    pub fn coord(self) -> ChunkCoord {
        ChunkCoord {
            x: (self.0 >> 32) as u32 as i32,
            z: self.0 as u32 as i32,
        }
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.coord().fmt(f)
    }
}

/// Chunk containing a world position.
pub fn chunk_of(position: Position) -> ChunkCoord {
    ChunkCoord {
        x: (position.x / CHUNK_SIZE).floor() as i32,
        z: (position.z / CHUNK_SIZE).floor() as i32,
    }
}

/// Whether two positions fall in the same chunk.
pub fn same_chunk(a: Position, b: Position) -> bool {
    chunk_of(a) == chunk_of(b)
}

/// Injective packing of a chunk coordinate.
pub fn chunk_key(x: i32, z: i32) -> ChunkKey {
    ChunkKey(((x as u32 as u64) << 32) | z as u32 as u64)
}
