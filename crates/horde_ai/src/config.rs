//! Zombie tuning

use horde_core::RandomRange;
use horde_math::Vec3;
use serde::{Deserialize, Serialize};

/// Tunables shared by every zombie in a session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZombieConfig {
    // Perception
    /// Time without a fresh sighting before the enemy is dropped
    pub lose_sight_time: RandomRange,
    /// Radius at which new enemies are noticed
    pub sight_radius: f32,
    /// Radius inside which a tracked enemy stays sensed
    pub lose_sight_radius: f32,
    /// Half-angle of the sight cone in degrees
    pub sight_half_angle: f32,
    /// Eye height over the agent origin
    pub eye_height: f32,
    /// Height of the aim point over a player's origin
    pub target_chest_offset: f32,
    /// Interval of the periodic line-of-sight poll
    pub los_check_interval: f32,
    /// Seconds without line of sight before a chase is abandoned
    pub los_lost_threshold: f32,
    /// Interval of the enemy-dead service
    pub enemy_dead_interval: f32,

    // Movement
    pub speed_idle: f32,
    pub speed_patrol: f32,
    pub speed_alert: f32,
    pub speed_chase: f32,
    /// Units per second the walk speed rises
    pub acceleration: f32,
    /// Units per second the walk speed falls
    pub deceleration: f32,
    /// Speeds closer than this snap to the target
    pub speed_snap_threshold: f32,
    /// Per-agent speed multiplier rolled at spawn
    pub speed_multiplier: RandomRange,
    /// Wander radius around the spawn point while patrolling
    pub patrol_radius: f32,
    /// Distance at which a chasing agent stops closing in
    pub chase_stop_distance: f32,
    /// Navigation projection extent for movement goals
    pub nav_extent: Vec3,

    // Investigation
    pub investigate_duration: RandomRange,
    pub investigate_acceptance_radius: f32,

    // Melee
    pub attack_cooldown: RandomRange,
    pub attack_windup: RandomRange,
    pub attack_damage: RandomRange,
    /// Height of the swing origin over the agent origin
    pub attack_origin_height: f32,
    /// Length of the swing probe
    pub attack_reach: f32,
    /// Radius of the swing probe
    pub attack_sweep_radius: f32,
    /// Radius of the player-range sphere
    pub player_range_radius: f32,
    /// Forward offset of the player-range sphere
    pub player_range_offset: f32,
    pub player_capsule_radius: f32,
    pub player_capsule_half_height: f32,

    // Hit reactions
    pub stagger_chance: f32,
    pub stagger_speed_multiplier: f32,
    pub stagger_duration: f32,
    pub anger_speed_multiplier: f32,
    pub anger_duration: f32,

    // Death
    pub max_health: f32,
    pub body_kill_reward: i32,
    pub headshot_reward: i32,
    /// Delay between death and removal
    pub corpse_grace_delay: f32,
}

impl Default for ZombieConfig {
    fn default() -> Self {
        Self {
            lose_sight_time: RandomRange::new(6.0, 12.0),
            sight_radius: 1000.0,
            lose_sight_radius: 2500.0,
            sight_half_angle: 90.0,
            eye_height: 64.0,
            target_chest_offset: 50.0,
            los_check_interval: 0.5,
            los_lost_threshold: 2.0,
            enemy_dead_interval: 0.5,

            speed_idle: 0.0,
            speed_patrol: 200.0,
            speed_alert: 300.0,
            speed_chase: 500.0,
            acceleration: 200.0,
            deceleration: 400.0,
            speed_snap_threshold: 1.0,
            speed_multiplier: RandomRange::new(0.85, 1.15),
            patrol_radius: 800.0,
            chase_stop_distance: 100.0,
            nav_extent: Vec3::new(100.0, 100.0, 200.0),

            investigate_duration: RandomRange::new(2.0, 3.0),
            investigate_acceptance_radius: 100.0,

            attack_cooldown: RandomRange::new(1.5, 2.5),
            attack_windup: RandomRange::new(0.3, 0.5),
            attack_damage: RandomRange::new(3.0, 12.0),
            attack_origin_height: 56.0,
            attack_reach: 150.0,
            attack_sweep_radius: 16.0,
            player_range_radius: 150.0,
            player_range_offset: 74.0,
            player_capsule_radius: 34.0,
            player_capsule_half_height: 88.0,

            stagger_chance: 0.3,
            stagger_speed_multiplier: 0.5,
            stagger_duration: 0.5,
            anger_speed_multiplier: 1.2,
            anger_duration: 1.0,

            max_health: 100.0,
            body_kill_reward: 100,
            headshot_reward: 250,
            corpse_grace_delay: 10.0,
        }
    }
}
