//! Spatial addressing: chunks, chunk keys, view regions and chunk streaming.
//!
//! # Invariants
//! - Equal chunk coordinates always produce equal keys, and vice versa.
//! - View regions are inclusive Chebyshev squares measured in chunks.

mod chunk;
mod region;
mod streaming;

pub use chunk::{CHUNK_SIZE, ChunkCoord, ChunkKey, chunk_key, chunk_of, same_chunk};
pub use region::{ViewRegion, chunks_in_radius, inside_view};
pub use streaming::{ChunkStreamer, StreamConfig, StreamStats};
