//! Spawn-rate difficulty scaling

use crate::config::SpawnerConfig;
use horde_math::lerp;

/// Lowest multiplier ever returned
pub const MIN_DIFFICULTY_MULTIPLIER: f32 = 0.1;

/// Spawn-rate multiplier. Intervals are divided by this value.
///
/// The global population pulls it linearly from 1.0 toward
/// `global_scaling_floor` as the live count approaches the limit, and every
/// living player beyond the first multiplies it by `player_count_multiplier`.
pub fn difficulty_multiplier(config: &SpawnerConfig, global_alive: usize, living_players: usize) -> f32 {
    let mut multiplier = 1.0;

    if config.scale_with_global_zombie_count {
        let limit = config.global_zombie_limit.max(1) as f32;
        let ratio = (global_alive as f32 / limit).clamp(0.0, 1.0);
        multiplier *= lerp(1.0, config.global_scaling_floor, ratio);
    }

    if config.scale_with_player_count && living_players > 1 {
        multiplier *= config.player_count_multiplier.powi(living_players as i32 - 1);
    }

    multiplier.max(MIN_DIFFICULTY_MULTIPLIER)
}
