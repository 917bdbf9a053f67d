//! Spawn volume state

use crate::config::{SpawnMode, SpawnerConfig};
use horde_ai::AgentId;
use horde_math::{Aabb, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Lifecycle of a spawn volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnerState {
    /// Waiting for a player to come into range
    Inactive,
    /// Spawning
    Active,
    /// Kill quota reached, waiting for reactivation
    Exhausted,
    /// Switched off until explicitly enabled
    Disabled,
}

impl Default for SpawnerState {
    fn default() -> Self {
        Self::Inactive
    }
}

/// A placed spawner and its population accounting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnVolume {
    /// Display name used in logs and snapshots
    pub name: String,
    /// Centre of the spawn box
    pub location: Vec3,
    pub(crate) config: SpawnerConfig,
    pub(crate) state: SpawnerState,
    pub(crate) total_kills: u32,
    pub(crate) current_alive: usize,
    pub(crate) current_wave_spawned: usize,
    pub(crate) time_since_last_spawn: f32,
    /// Interval jitter rolled for the current cycle
    pub(crate) interval_jitter: f32,
    /// Sticky while exhausted: cleared once the player leaves the band
    pub(crate) player_was_in_range: bool,
    pub(crate) spawned: BTreeSet<AgentId>,
}

impl SpawnVolume {
    pub fn new(name: impl Into<String>, location: Vec3, config: SpawnerConfig) -> Self {
        let config = config.clamped();
        let state = if config.start_enabled {
            SpawnerState::Inactive
        } else {
            SpawnerState::Disabled
        };
        Self {
            name: name.into(),
            location,
            config,
            state,
            total_kills: 0,
            current_alive: 0,
            current_wave_spawned: 0,
            time_since_last_spawn: 0.0,
            interval_jitter: 0.0,
            player_was_in_range: false,
            spawned: BTreeSet::new(),
        }
    }

    pub fn config(&self) -> &SpawnerConfig {
        &self.config
    }

    pub fn state(&self) -> SpawnerState {
        self.state
    }

    pub fn mode(&self) -> SpawnMode {
        self.config.mode
    }

    pub fn total_kills(&self) -> u32 {
        self.total_kills
    }

    pub fn current_alive(&self) -> usize {
        self.current_alive
    }

    pub fn current_wave_spawned(&self) -> usize {
        self.current_wave_spawned
    }

    pub fn time_since_last_spawn(&self) -> f32 {
        self.time_since_last_spawn
    }

    /// Agents this volume is still tracking
    pub fn spawned(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.spawned.iter().copied()
    }

    pub fn is_tracking(&self, agent: AgentId) -> bool {
        self.spawned.contains(&agent)
    }

    /// World-space spawn box
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_half_extents(self.location, self.config.box_extent)
    }

    /// Whether the concurrent cap leaves room for another zombie
    pub fn has_capacity(&self) -> bool {
        self.current_alive < self.config.max_concurrent_zombies
    }

    /// Kill quota reached with exhaustion enabled
    pub fn kill_quota_reached(&self) -> bool {
        self.config.can_exhaust && self.total_kills >= self.config.max_kills_before_exhaustion
    }

    /// Base interval plus this cycle's jitter, before difficulty scaling
    pub fn base_interval(&self) -> f32 {
        (self.config.spawn_interval + self.interval_jitter).max(0.0)
    }

    pub(crate) fn track(&mut self, agent: AgentId) {
        if self.spawned.insert(agent) {
            self.current_alive += 1;
        }
    }

    /// Stop tracking an agent. Returns whether it was tracked.
    pub(crate) fn untrack(&mut self, agent: AgentId) -> bool {
        self.spawned.remove(&agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_follows_start_enabled() {
        let volume = SpawnVolume::new("north", Vec3::ZERO, SpawnerConfig::default());
        assert_eq!(volume.state(), SpawnerState::Inactive);

        let mut config = SpawnerConfig::default();
        config.start_enabled = false;
        let volume = SpawnVolume::new("south", Vec3::ZERO, config);
        assert_eq!(volume.state(), SpawnerState::Disabled);
    }

    #[test]
    fn test_bounds_use_box_extent() {
        let volume = SpawnVolume::new("north", Vec3::new(100.0, 0.0, 100.0), SpawnerConfig::default());
        let bounds = volume.bounds();
        assert_eq!(bounds.min, Vec3::new(-100.0, -200.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(300.0, 200.0, 200.0));
    }

    #[test]
    fn test_kill_quota() {
        let mut volume = SpawnVolume::new("north", Vec3::ZERO, SpawnerConfig::default());
        volume.total_kills = 9;
        assert!(!volume.kill_quota_reached());
        volume.total_kills = 10;
        assert!(volume.kill_quota_reached());

        volume.config.can_exhaust = false;
        assert!(!volume.kill_quota_reached());
    }
}
