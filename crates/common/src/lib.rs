//! Shared types and configuration for the sightline AOI layer.

pub mod config;
mod types;

pub use config::{
    ConfigError, ScenarioConfig, SightlineConfig, SpawnConfig, StreamingConfig, ViewConfig,
    ViewerConfig,
};
pub use types::{EntityId, MobCatalog, MobClass, MobType, Position};
