//! Spawner tunables

use horde_math::Vec3;
use serde::{Deserialize, Serialize};

/// How a volume decides when to spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnMode {
    /// One zombie per interval
    Continuous,
    /// Batches of `wave_size`, then `wave_delay` of rest
    Wave,
    /// Only on explicit `trigger_spawn`
    Triggered,
}

impl Default for SpawnMode {
    fn default() -> Self {
        Self::Continuous
    }
}

/// Per-volume configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    pub mode: SpawnMode,
    /// Agent class to spawn. `None` leaves the volume unable to spawn.
    pub spawn_class: Option<String>,
    /// Patrol tag handed to spawned agents
    pub patrol_tag: Option<String>,
    /// Whether the volume begins Inactive (true) or Disabled (false)
    pub start_enabled: bool,

    // Activation
    pub min_activation_distance: f32,
    pub max_activation_distance: f32,
    pub deactivate_when_far: bool,

    // Vision avoidance
    pub check_player_vision: bool,
    /// Half-angle of a player's view cone in degrees
    pub player_vision_angle: f32,
    /// Occluders closer than this to the volume do not hide it
    pub vision_buffer_distance: f32,

    // Timing
    pub spawn_interval: f32,
    pub spawn_interval_deviation: f32,
    pub max_concurrent_zombies: usize,
    pub wave_size: usize,
    pub wave_delay: f32,

    // Exhaustion
    pub can_exhaust: bool,
    pub max_kills_before_exhaustion: u32,
    pub can_reactivate: bool,
    pub reactivation_delay: f32,
    pub require_reentry_for_reactivation: bool,
    pub reentry_recheck_interval: f32,

    // Difficulty
    pub scale_with_global_zombie_count: bool,
    pub global_zombie_limit: usize,
    /// Multiplier reached when the global population hits its limit
    pub global_scaling_floor: f32,
    pub scale_with_player_count: bool,
    pub player_count_multiplier: f32,

    // Placement
    pub box_extent: Vec3,
    pub location_attempts: u32,
    pub nav_extent: Vec3,
    pub capsule_radius: f32,
    pub capsule_half_height: f32,
    /// Height above a candidate point used for the per-point visibility probe
    pub visibility_probe_height: f32,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            mode: SpawnMode::Continuous,
            spawn_class: Some("walker".to_string()),
            patrol_tag: None,
            start_enabled: true,

            min_activation_distance: 500.0,
            max_activation_distance: 3000.0,
            deactivate_when_far: true,

            check_player_vision: true,
            player_vision_angle: 60.0,
            vision_buffer_distance: 200.0,

            spawn_interval: 3.0,
            spawn_interval_deviation: 1.0,
            max_concurrent_zombies: 5,
            wave_size: 3,
            wave_delay: 10.0,

            can_exhaust: true,
            max_kills_before_exhaustion: 10,
            can_reactivate: true,
            reactivation_delay: 60.0,
            require_reentry_for_reactivation: true,
            reentry_recheck_interval: 10.0,

            scale_with_global_zombie_count: true,
            global_zombie_limit: 30,
            global_scaling_floor: 0.25,
            scale_with_player_count: true,
            player_count_multiplier: 1.25,

            box_extent: Vec3::new(200.0, 200.0, 100.0),
            location_attempts: 10,
            nav_extent: Vec3::new(100.0, 100.0, 200.0),
            capsule_radius: 34.0,
            capsule_half_height: 88.0,
            visibility_probe_height: 50.0,
        }
    }
}

impl SpawnerConfig {
    pub fn with_mode(mut self, mode: SpawnMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_spawn_class(mut self, class: Option<String>) -> Self {
        self.spawn_class = class;
        self
    }

    pub fn with_patrol_tag(mut self, tag: impl Into<String>) -> Self {
        self.patrol_tag = Some(tag.into());
        self
    }

    pub fn with_activation_distance(mut self, min: f32, max: f32) -> Self {
        self.min_activation_distance = min;
        self.max_activation_distance = max;
        self
    }

    pub fn with_player_vision(mut self, enabled: bool) -> Self {
        self.check_player_vision = enabled;
        self
    }

    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent_zombies = max;
        self
    }

    pub fn with_exhaustion(mut self, max_kills: u32, reactivation_delay: f32) -> Self {
        self.can_exhaust = true;
        self.max_kills_before_exhaustion = max_kills;
        self.reactivation_delay = reactivation_delay;
        self
    }

    pub fn with_box_extent(mut self, extent: Vec3) -> Self {
        self.box_extent = extent;
        self
    }

    /// Fix up inconsistent values: the minimum activation distance never
    /// exceeds the maximum and counts are at least one.
    pub fn clamped(mut self) -> Self {
        if self.min_activation_distance > self.max_activation_distance {
            self.min_activation_distance = self.max_activation_distance;
        }
        self.wave_size = self.wave_size.max(1);
        self.location_attempts = self.location_attempts.max(1);
        self.global_zombie_limit = self.global_zombie_limit.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SpawnerConfig::default();
        assert_eq!(config.mode, SpawnMode::Continuous);
        assert_eq!(config.max_concurrent_zombies, 5);
        assert_eq!(config.max_kills_before_exhaustion, 10);
        assert_eq!(config.reactivation_delay, 60.0);
        assert_eq!(config.global_zombie_limit, 30);
        assert_eq!(config.box_extent, Vec3::new(200.0, 200.0, 100.0));
    }

    #[test]
    fn test_clamped_activation_distance() {
        let config = SpawnerConfig::default()
            .with_activation_distance(4000.0, 1000.0)
            .clamped();
        assert_eq!(config.min_activation_distance, 1000.0);
        assert_eq!(config.max_activation_distance, 1000.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: SpawnerConfig =
            serde_json::from_str(r#"{ "mode": "Wave", "wave_size": 6 }"#).unwrap();
        assert_eq!(config.mode, SpawnMode::Wave);
        assert_eq!(config.wave_size, 6);
        assert_eq!(config.spawn_interval, 3.0);
    }
}
