//! Packet emission boundary.
//!
//! Translates spawn, despawn and move updates into the entity packets a
//! client understands. Encoding is pure; [`PacketEmitter`] plugs it into a
//! client view as its update sink.

mod emitter;
mod encoder;
mod packet;

pub use emitter::{EmitStats, PacketEmitter, PacketWriter};
pub use encoder::{DELTA_SCALE, EncodeError, PacketEncoder, fixed_delta};
pub use packet::{
    ChatComponent, EntityDestroy, EntityMetadata, EntityTeleport, MetadataEntry, MetadataValue,
    Packet, RelEntityMove, SpawnEntityLiving,
};
