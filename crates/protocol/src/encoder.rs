use sightline_common::{EntityId, MobCatalog, Position};
use sightline_registry::Mob;
use thiserror::Error;
use uuid::Uuid;

use crate::packet::{
    BOOLEAN_TYPE, CHAT_TYPE, CUSTOM_NAME_KEY, CUSTOM_NAME_VISIBLE_KEY, ChatComponent,
    EntityDestroy, EntityMetadata, EntityTeleport, MetadataEntry, MetadataValue, Packet,
    RelEntityMove, SpawnEntityLiving,
};

/// Fixed-point scale of relative moves: 32 units per block, 128 steps each.
pub const DELTA_SCALE: f64 = 32.0 * 128.0;

const LEVEL_COLOR: &str = "dark_red";

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("entity {entity}: unknown mob type `{mob}`")]
    UnknownMob { entity: EntityId, mob: String },
    #[error("name tag serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Turns visibility updates into packets, looking mob types up in a catalog.
#[derive(Debug, Clone)]
pub struct PacketEncoder {
    catalog: MobCatalog,
}

impl PacketEncoder {
    pub fn new(catalog: MobCatalog) -> Self {
        Self { catalog }
    }

    /// `spawn_entity_living` at `position`, then the name tag metadata.
    pub fn spawn(&self, mob: &Mob, position: Position) -> Result<[Packet; 2], EncodeError> {
        let entity_id = mob.entity_id();
        let mob_type = self
            .catalog
            .get(mob.mob())
            .ok_or_else(|| EncodeError::UnknownMob {
                entity: entity_id,
                mob: mob.mob().to_owned(),
            })?;

        let extra = match mob.level() {
            Some(level) if level > 0 => vec![ChatComponent {
                text: format!(" [Lvl {level}]"),
                color: LEVEL_COLOR.to_owned(),
                extra: Vec::new(),
            }],
            _ => Vec::new(),
        };
        let name = ChatComponent {
            text: mob_type.display_name.clone(),
            color: mob_type.class.color().to_owned(),
            extra,
        };

        let spawn = Packet::SpawnEntityLiving(SpawnEntityLiving {
            entity_id,
            entity_uuid: Uuid::new_v4(),
            entity_type: mob_type.entity_type_id,
            x: position.x,
            y: position.y,
            z: position.z,
            yaw: 0,
            pitch: 0,
            head_pitch: 0,
            velocity_x: 0,
            velocity_y: 0,
            velocity_z: 0,
        });
        let metadata = Packet::EntityMetadata(EntityMetadata {
            entity_id,
            metadata: vec![
                MetadataEntry {
                    key: CUSTOM_NAME_KEY,
                    kind: CHAT_TYPE,
                    value: MetadataValue::Chat(serde_json::to_string(&name)?),
                },
                MetadataEntry {
                    key: CUSTOM_NAME_VISIBLE_KEY,
                    kind: BOOLEAN_TYPE,
                    value: MetadataValue::Boolean(true),
                },
            ],
        });
        Ok([spawn, metadata])
    }

    /// One `entity_destroy` naming every id.
    pub fn despawn(&self, ids: &[EntityId]) -> Packet {
        Packet::EntityDestroy(EntityDestroy {
            entity_ids: ids.to_vec(),
        })
    }

    /// `rel_entity_move`, or `entity_teleport` to `position` when the delta
    /// does not fit the fixed-point range.
    pub fn relative_move(&self, id: EntityId, delta: Position, position: Position) -> Packet {
        match (
            fixed_delta(delta.x),
            fixed_delta(delta.y),
            fixed_delta(delta.z),
        ) {
            (Some(d_x), Some(d_y), Some(d_z)) => Packet::RelEntityMove(RelEntityMove {
                entity_id: id,
                d_x,
                d_y,
                d_z,
                on_ground: true,
            }),
            _ => {
                tracing::trace!(entity = %id, ?delta, "delta out of range, teleporting");
                Packet::EntityTeleport(EntityTeleport {
                    entity_id: id,
                    x: position.x,
                    y: position.y,
                    z: position.z,
                    yaw: 0,
                    pitch: 0,
                    on_ground: true,
                })
            }
        }
    }
}

/// One axis of a relative move in protocol units, if it fits an `i16`.
pub fn fixed_delta(blocks: f64) -> Option<i16> {
    let units = (blocks * DELTA_SCALE).round();
    (units >= f64::from(i16::MIN) && units <= f64::from(i16::MAX)).then_some(units as i16)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sightline_common::{MobClass, MobType};
    use sightline_registry::MobState;

    fn catalog() -> MobCatalog {
        let mut catalog = MobCatalog::new();
        catalog.insert(
            "zombie_grunt",
            MobType {
                class: MobClass::ArchiMob,
                entity_name: "zombie".into(),
                entity_type_id: 54,
                display_name: "Grunt".into(),
            },
        );
        catalog
    }

    fn mob(level: Option<u32>) -> Mob {
        Mob::new(
            EntityId(42),
            "zombie_grunt",
            level,
            MobState::new(Position::ZERO, 20),
            4,
        )
    }

    fn name_tag(packet: &Packet) -> serde_json::Value {
        let Packet::EntityMetadata(metadata) = packet else {
            panic!("expected metadata, got {}", packet.name());
        };
        assert_eq!(metadata.metadata.len(), 2);
        assert_eq!(metadata.metadata[0].key, CUSTOM_NAME_KEY);
        assert_eq!(metadata.metadata[0].kind, CHAT_TYPE);
        assert_eq!(metadata.metadata[1].value, MetadataValue::Boolean(true));
        let MetadataValue::Chat(chat) = &metadata.metadata[0].value else {
            panic!("custom name is not chat");
        };
        serde_json::from_str(chat).unwrap()
    }

    #[test]
    fn spawn_emits_living_spawn_then_name_tag() {
        let encoder = PacketEncoder::new(catalog());
        let position = Position::new(10.5, 64.0, -3.25);
        let [spawn, metadata] = encoder.spawn(&mob(Some(3)), position).unwrap();

        let Packet::SpawnEntityLiving(spawn) = spawn else {
            panic!("expected spawn_entity_living");
        };
        assert_eq!(spawn.entity_id, EntityId(42));
        assert_eq!(spawn.entity_type, 54);
        assert_eq!((spawn.x, spawn.y, spawn.z), (10.5, 64.0, -3.25));
        assert_eq!((spawn.yaw, spawn.pitch, spawn.head_pitch), (0, 0, 0));
        assert_eq!(spawn.entity_uuid.get_version_num(), 4);

        assert_eq!(
            name_tag(&metadata),
            serde_json::json!({
                "text": "Grunt",
                "color": "gold",
                "extra": [{ "text": " [Lvl 3]", "color": "dark_red" }]
            })
        );
    }

    #[test]
    fn spawn_without_level_has_plain_name() {
        let encoder = PacketEncoder::new(catalog());
        for level in [None, Some(0)] {
            let [_, metadata] = encoder.spawn(&mob(level), Position::ZERO).unwrap();
            assert_eq!(
                name_tag(&metadata),
                serde_json::json!({ "text": "Grunt", "color": "gold" })
            );
        }
    }

    #[test]
    fn spawn_gives_fresh_uuids() {
        let encoder = PacketEncoder::new(catalog());
        let uuid = |packets: [Packet; 2]| match &packets[0] {
            Packet::SpawnEntityLiving(spawn) => spawn.entity_uuid,
            other => panic!("unexpected {}", other.name()),
        };
        let a = uuid(encoder.spawn(&mob(None), Position::ZERO).unwrap());
        let b = uuid(encoder.spawn(&mob(None), Position::ZERO).unwrap());
        assert_ne!(a, b);
    }

    #[test]
    fn unknown_mob_type_is_an_error() {
        let encoder = PacketEncoder::new(MobCatalog::new());
        let err = encoder.spawn(&mob(None), Position::ZERO).unwrap_err();
        assert!(matches!(err, EncodeError::UnknownMob { entity: EntityId(42), .. }));
        assert!(err.to_string().contains("zombie_grunt"));
    }

    #[test]
    fn relative_move_uses_fixed_point() {
        let encoder = PacketEncoder::new(catalog());
        let packet = encoder.relative_move(
            EntityId(1),
            Position::new(1.0, -0.5, 0.0001),
            Position::ZERO,
        );
        assert_eq!(
            packet,
            Packet::RelEntityMove(RelEntityMove {
                entity_id: EntityId(1),
                d_x: 4096,
                d_y: -2048,
                d_z: 0,
                on_ground: true,
            })
        );
    }

    #[test]
    fn long_move_falls_back_to_teleport() {
        let encoder = PacketEncoder::new(catalog());
        let target = Position::new(100.0, 64.0, 0.0);
        let packet = encoder.relative_move(EntityId(1), Position::new(9.0, 0.0, 0.0), target);
        let Packet::EntityTeleport(teleport) = packet else {
            panic!("expected entity_teleport, got {}", packet.name());
        };
        assert_eq!((teleport.x, teleport.y, teleport.z), (100.0, 64.0, 0.0));
    }

    #[test]
    fn fixed_delta_bounds() {
        assert_eq!(fixed_delta(7.999), Some(32764));
        assert_eq!(fixed_delta(-8.0), Some(i16::MIN));
        assert_eq!(fixed_delta(8.0), None);
        assert_eq!(fixed_delta(f64::NAN), None);
    }

    #[test]
    fn despawn_batches_ids() {
        let encoder = PacketEncoder::new(catalog());
        assert_eq!(
            encoder.despawn(&[EntityId(7), EntityId(12)]),
            Packet::EntityDestroy(EntityDestroy {
                entity_ids: vec![EntityId(7), EntityId(12)]
            })
        );
    }
}
