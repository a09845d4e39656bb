use std::collections::HashSet;

use sightline_common::{EntityId, Position};
use sightline_registry::Mob;
use sightline_view::UpdateSink;
use tokio::sync::mpsc::UnboundedSender;

use crate::encoder::PacketEncoder;
use crate::packet::Packet;

/// Where encoded packets go: a connection, a queue, a test buffer.
pub trait PacketWriter {
    fn write(&mut self, packet: Packet);
}

impl PacketWriter for Vec<Packet> {
    fn write(&mut self, packet: Packet) {
        self.push(packet);
    }
}

/// Hands packets to a connection task. A closed connection drops them.
impl PacketWriter for UnboundedSender<Packet> {
    fn write(&mut self, packet: Packet) {
        if self.send(packet).is_err() {
            tracing::trace!("connection closed, packet dropped");
        }
    }
}

/// Packet counters of one emitter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitStats {
    pub written: u64,
    pub dropped: u64,
}

/// Update sink that encodes each visibility update and writes the packets.
///
/// Ids whose spawn could not be encoded are never moved or destroyed on the
/// wire, so the client only hears about entities it was sent.
#[derive(Debug)]
pub struct PacketEmitter<W: PacketWriter> {
    encoder: PacketEncoder,
    writer: W,
    spawned: HashSet<EntityId>,
    stats: EmitStats,
}

impl<W: PacketWriter> PacketEmitter<W> {
    pub fn new(encoder: PacketEncoder, writer: W) -> Self {
        Self {
            encoder,
            writer,
            spawned: HashSet::new(),
            stats: EmitStats::default(),
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn stats(&self) -> EmitStats {
        self.stats
    }

    fn write(&mut self, packet: Packet) {
        tracing::trace!(packet = packet.name(), "packet out");
        self.writer.write(packet);
        self.stats.written += 1;
    }
}

impl<W: PacketWriter> UpdateSink for PacketEmitter<W> {
    fn spawn(&mut self, mob: &Mob, position: Position) {
        match self.encoder.spawn(mob, position) {
            Ok(packets) => {
                self.spawned.insert(mob.entity_id());
                for packet in packets {
                    self.write(packet);
                }
            }
            Err(err) => {
                tracing::warn!(%err, "spawn not sent");
                self.stats.dropped += 1;
            }
        }
    }

    fn despawn(&mut self, ids: &[EntityId]) {
        let ids: Vec<EntityId> = ids
            .iter()
            .copied()
            .filter(|id| self.spawned.remove(id))
            .collect();
        if ids.is_empty() {
            return;
        }
        let packet = self.encoder.despawn(&ids);
        self.write(packet);
    }

    fn relative_move(&mut self, id: EntityId, delta: Position, position: Position) {
        if !self.spawned.contains(&id) {
            tracing::trace!(entity = %id, "move of unsent entity skipped");
            return;
        }
        let packet = self.encoder.relative_move(id, delta, position);
        self.write(packet);
    }
}
