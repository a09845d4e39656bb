use serde::{Deserialize, Serialize};
use sightline_common::EntityId;
use uuid::Uuid;

/// Metadata index of the custom name.
pub const CUSTOM_NAME_KEY: u8 = 2;
/// Metadata index of the custom name visibility flag.
pub const CUSTOM_NAME_VISIBLE_KEY: u8 = 3;
/// Metadata type id of an optional chat component.
pub const CHAT_TYPE: i32 = 5;
/// Metadata type id of a boolean.
pub const BOOLEAN_TYPE: i32 = 7;

/// Outgoing entity packet, by protocol name with its literal fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", content = "params", rename_all = "snake_case")]
pub enum Packet {
    SpawnEntityLiving(SpawnEntityLiving),
    EntityMetadata(EntityMetadata),
    RelEntityMove(RelEntityMove),
    EntityTeleport(EntityTeleport),
    EntityDestroy(EntityDestroy),
}

impl Packet {
    pub fn name(&self) -> &'static str {
        match self {
            Packet::SpawnEntityLiving(_) => "spawn_entity_living",
            Packet::EntityMetadata(_) => "entity_metadata",
            Packet::RelEntityMove(_) => "rel_entity_move",
            Packet::EntityTeleport(_) => "entity_teleport",
            Packet::EntityDestroy(_) => "entity_destroy",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnEntityLiving {
    pub entity_id: EntityId,
    #[serde(rename = "entityUUID")]
    pub entity_uuid: Uuid,
    #[serde(rename = "type")]
    pub entity_type: i32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: i8,
    pub pitch: i8,
    pub head_pitch: i8,
    pub velocity_x: i16,
    pub velocity_y: i16,
    pub velocity_z: i16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMetadata {
    pub entity_id: EntityId,
    pub metadata: Vec<MetadataEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: u8,
    #[serde(rename = "type")]
    pub kind: i32,
    pub value: MetadataValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Boolean(bool),
    /// Serialized chat component.
    Chat(String),
}

/// Movement in 1/4096 of a block per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelEntityMove {
    pub entity_id: EntityId,
    #[serde(rename = "dX")]
    pub d_x: i16,
    #[serde(rename = "dY")]
    pub d_y: i16,
    #[serde(rename = "dZ")]
    pub d_z: i16,
    pub on_ground: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityTeleport {
    pub entity_id: EntityId,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: i8,
    pub pitch: i8,
    pub on_ground: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityDestroy {
    pub entity_ids: Vec<EntityId>,
}

/// Chat component used as a mob's name tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatComponent {
    pub text: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra: Vec<ChatComponent>,
}
