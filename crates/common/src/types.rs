use std::collections::HashMap;
use std::fmt;

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Continuous world coordinates of an entity.
pub type Position = DVec3;

/// Protocol entity id, stable for the lifetime of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub i32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Gameplay class of a mob. Drives the color of its name tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MobClass {
    #[serde(rename = "mob")]
    Mob,
    #[serde(rename = "archiMob")]
    ArchiMob,
    #[serde(rename = "boss")]
    Boss,
    #[serde(rename = "npc")]
    Npc,
    #[serde(rename = "garde")]
    Garde,
}

impl MobClass {
    /// Chat color used for the display name of this class.
    pub fn color(self) -> &'static str {
        match self {
            MobClass::Mob => "white",
            MobClass::ArchiMob => "gold",
            MobClass::Boss => "red",
            MobClass::Npc => "green",
            MobClass::Garde => "blue",
        }
    }
}

/// Static description of a kind of mob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MobType {
    pub class: MobClass,
    /// Vanilla entity the mob is rendered as, e.g. `zombie`.
    pub entity_name: String,
    /// Protocol type id of `entity_name`.
    pub entity_type_id: i32,
    pub display_name: String,
}

/// Mob kinds by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MobCatalog {
    types: HashMap<String, MobType>,
}

impl MobCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mob type under its catalog key.
    pub fn insert(&mut self, key: impl Into<String>, mob_type: MobType) {
        self.types.insert(key.into(), mob_type);
    }

    /// Look a mob type up by catalog key.
    pub fn get(&self, key: &str) -> Option<&MobType> {
        self.types.get(key)
    }

    /// Number of registered mob types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
