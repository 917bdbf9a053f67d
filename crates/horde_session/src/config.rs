//! Session configuration
//!
//! Every tunable lives in one TOML document. Missing keys fall back to the
//! built-in defaults, so an empty file is a valid configuration.
//!
//! ```toml
//! seed = 7
//! tick_interval = 0.0333
//!
//! [zombie]
//! sight_radius = 1200.0
//!
//! [[spawners]]
//! name = "gate"
//! location = { x = 0.0, y = 0.0, z = 100.0 }
//!
//! [spawners.config]
//! mode = "Wave"
//! ```

use horde_ai::ZombieConfig;
use horde_core::{HordeError, Result};
use horde_math::Vec3;
use horde_quest::{QuestItem, QuestSettings, QuestTrigger};
use horde_spawner::SpawnerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the RNG seed
pub const SEED_ENV: &str = "HORDE_SEED";
/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "HORDE_CONFIG";

/// A spawn volume placed in the level
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerPlacement {
    pub name: String,
    pub location: Vec3,
    pub config: SpawnerConfig,
}

/// A player slot and its starting weapon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSetup {
    pub location: Vec3,
    pub view_direction: Vec3,
    pub max_health: f32,
    /// Firearm id looked up in the weapon table
    pub weapon: Option<String>,
}

impl Default for PlayerSetup {
    fn default() -> Self {
        Self {
            location: Vec3::ZERO,
            view_direction: Vec3::X,
            max_health: 100.0,
            weapon: None,
        }
    }
}

/// Projectile resolution against zombie hit spheres
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub projectile_damage: f32,
    pub projectile_range: f32,
    /// Body sphere radius, centred above the feet
    pub body_radius: f32,
    pub body_height: f32,
    pub head_radius: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            projectile_damage: 34.0,
            projectile_range: 10_000.0,
            body_radius: 40.0,
            body_height: 50.0,
            head_radius: 15.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// RNG seed
    pub seed: u64,
    /// Seconds per simulation tick
    pub tick_interval: f32,
    /// Half size of the walkable floor
    pub world_half_size: f32,
    pub zombie: ZombieConfig,
    pub combat: CombatConfig,
    pub quest_settings: QuestSettings,
    pub players: Vec<PlayerSetup>,
    pub spawners: Vec<SpawnerPlacement>,
    pub quest_triggers: Vec<QuestTrigger>,
    pub quest_items: Vec<QuestItem>,
    /// JSON quest template table
    pub quest_table: Option<PathBuf>,
    /// JSON firearm definition table
    pub weapon_table: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            tick_interval: 1.0 / 30.0,
            world_half_size: 10_000.0,
            zombie: ZombieConfig::default(),
            combat: CombatConfig::default(),
            quest_settings: QuestSettings::default(),
            players: vec![PlayerSetup::default()],
            spawners: Vec::new(),
            quest_triggers: Vec::new(),
            quest_items: Vec::new(),
            quest_table: None,
            weapon_table: None,
        }
    }
}

impl SessionConfig {
    /// Load from a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| HordeError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the file named by `HORDE_CONFIG`, or defaults when unset, then
    /// apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.is_empty() => {
                log::info!("Loading session config from {}", path);
                Self::load_from_file(path)?
            }
            _ => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `HORDE_SEED`
    pub fn apply_env_overrides(&mut self) {
        if let Ok(seed) = std::env::var(SEED_ENV) {
            match seed.parse() {
                Ok(seed) => {
                    self.seed = seed;
                    log::info!("Seed from env: {}", self.seed);
                }
                Err(_) => log::warn!("Ignoring non-numeric {}={}", SEED_ENV, seed),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.tick_interval > 0.0) {
            return Err(HordeError::InvalidConfig(format!(
                "tick_interval must be positive, got {}",
                self.tick_interval
            )));
        }
        if self.world_half_size <= 0.0 {
            return Err(HordeError::InvalidConfig("world_half_size must be positive".into()));
        }
        if let Some(spawner) = self.spawners.iter().find(|s| s.name.is_empty()) {
            return Err(HordeError::InvalidConfig(format!(
                "spawner at {:?} has no name",
                spawner.location
            )));
        }
        Ok(())
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_spawner(mut self, name: impl Into<String>, location: Vec3, config: SpawnerConfig) -> Self {
        self.spawners.push(SpawnerPlacement {
            name: name.into(),
            location,
            config,
        });
        self
    }

    pub fn with_players(mut self, players: Vec<PlayerSetup>) -> Self {
        self.players = players;
        self
    }

    pub fn with_quest_trigger(mut self, trigger: QuestTrigger) -> Self {
        self.quest_triggers.push(trigger);
        self
    }

    pub fn with_quest_item(mut self, item: QuestItem) -> Self {
        self.quest_items.push(item);
        self
    }
}
