//! File-backed configuration.
//!
//! YAML and JSON are both accepted; the format is picked from the file
//! extension (`.json` is JSON, anything else is YAML). Every section has
//! defaults, so an empty document is a valid config.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{MobCatalog, Position};

/// Errors from loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SightlineConfig {
    pub view: ViewConfig,
    pub streaming: StreamingConfig,
    pub mobs: MobCatalog,
    pub scenario: ScenarioConfig,
}

/// Per-client visibility settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Radius, in chunks, of the square a client sees.
    pub view_distance: u32,
    /// Capacity of each mob's state broadcast before slow readers lag.
    pub state_capacity: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            view_distance: 2,
            state_capacity: 64,
        }
    }
}

/// Chunk streaming budgets, per update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    pub load_budget: usize,
    pub unload_budget: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            load_budget: 16,
            unload_budget: 16,
        }
    }
}

/// A scripted run used by the CLI simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub ticks: u64,
    pub tick_ms: u64,
    pub spawns: Vec<SpawnConfig>,
    pub viewer: ViewerConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            ticks: 20,
            tick_ms: 50,
            spawns: Vec::new(),
            viewer: ViewerConfig::default(),
        }
    }
}

/// One mob placed in the scenario. It walks its patrol points in a loop,
/// one point per tick, starting from the first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnConfig {
    pub mob: String,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default = "default_health")]
    pub health: u32,
    pub patrol: Vec<Position>,
}

fn default_health() -> u32 {
    20
}

/// Viewer path, one point per tick. The viewer stays on the last point.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    pub path: Vec<Position>,
}

impl SightlineConfig {
    /// Load and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&text)?,
            _ => serde_yaml::from_str(&text)?,
        };
        config.validate()?;
        tracing::debug!(
            path = %path.display(),
            mobs = config.mobs.len(),
            spawns = config.scenario.spawns.len(),
            "config loaded"
        );
        Ok(config)
    }

    /// Check cross-references between sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.view.state_capacity == 0 {
            return Err(ConfigError::Invalid(
                "view.state_capacity must be positive".into(),
            ));
        }
        for (i, spawn) in self.scenario.spawns.iter().enumerate() {
            if self.mobs.get(&spawn.mob).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "scenario.spawns[{i}] references unknown mob `{}`",
                    spawn.mob
                )));
            }
            if spawn.patrol.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "scenario.spawns[{i}] has an empty patrol"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MobClass;

    const YAML: &str = r#"
view:
  view_distance: 3
mobs:
  zombie_grunt:
    class: mob
    entity_name: zombie
    entity_type_id: 102
    display_name: Zombie Grunt
scenario:
  ticks: 5
  spawns:
    - mob: zombie_grunt
      level: 4
      patrol:
        - [8.0, 64.0, 8.0]
        - [24.0, 64.0, 8.0]
  viewer:
    path:
      - [0.0, 64.0, 0.0]
"#;

    #[test]
    fn defaults() {
        let config = SightlineConfig::default();
        assert_eq!(config.view.view_distance, 2);
        assert_eq!(config.view.state_capacity, 64);
        assert_eq!(config.streaming.load_budget, 16);
        assert_eq!(config.scenario.tick_ms, 50);
        assert!(config.mobs.is_empty());
    }

    #[test]
    fn load_yaml() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sightline.yaml");
        std::fs::write(&path, YAML).unwrap();

        let config = SightlineConfig::load(&path).unwrap();
        assert_eq!(config.view.view_distance, 3);
        // Unset fields keep their defaults.
        assert_eq!(config.view.state_capacity, 64);
        assert_eq!(config.scenario.ticks, 5);

        let grunt = config.mobs.get("zombie_grunt").unwrap();
        assert_eq!(grunt.class, MobClass::Mob);
        assert_eq!(grunt.entity_type_id, 102);

        let spawn = &config.scenario.spawns[0];
        assert_eq!(spawn.level, Some(4));
        assert_eq!(spawn.health, 20);
        assert_eq!(spawn.patrol[1], Position::new(24.0, 64.0, 8.0));
    }

    #[test]
    fn load_json() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sightline.json");
        std::fs::write(&path, r#"{ "view": { "view_distance": 6 } }"#).unwrap();

        let config = SightlineConfig::load(&path).unwrap();
        assert_eq!(config.view.view_distance, 6);
    }

    #[test]
    fn unknown_mob_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.yaml");
        std::fs::write(
            &path,
            "scenario:\n  spawns:\n    - mob: ghost\n      patrol: [[0.0, 0.0, 0.0]]\n",
        )
        .unwrap();

        match SightlineConfig::load(&path) {
            Err(ConfigError::Invalid(msg)) => assert!(msg.contains("ghost")),
            other => panic!("expected Invalid, got: {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let result = SightlineConfig::load(tmp.path().join("nope.yaml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
