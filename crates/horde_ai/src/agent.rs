//! Zombie agent data

use crate::config::ZombieConfig;
use crate::state_machine::{AIState, StateChange};
use crate::tasks::AgentTask;
use horde_combat::Health;
use horde_core::{Handle, PlayerId};
use horde_math::{move_towards, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Generation-checked id of a zombie in the director's arena
pub type AgentId = Handle<ZombieAgent>;

/// One zombie: identity plus the runtime state the AI mutates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZombieAgent {
    /// Enemy subtype reported to quests on death
    pub enemy_type: String,
    /// Feet location
    pub location: Vec3,
    /// Horizontal facing
    pub facing: Vec3,
    /// Spawn location, center of the patrol area
    pub home: Vec3,
    /// Patrol route tag assigned by the spawner
    pub patrol_tag: Option<String>,

    pub(crate) state: AIState,
    pub(crate) previous_state: AIState,
    pub(crate) health: Health,
    pub(crate) enemy: Option<PlayerId>,
    pub(crate) last_known_enemy_location: Option<Vec3>,
    pub(crate) time_since_lost_los: f32,
    pub(crate) had_los_last_check: bool,
    pub(crate) is_staggered: bool,
    pub(crate) is_angered: bool,
    pub(crate) chase_breathing: bool,
    pub(crate) current_walk_speed: f32,
    pub(crate) target_walk_speed: f32,
    pub(crate) base_speed_multiplier: f32,
    pub(crate) last_attack_time: f64,
    pub(crate) attack_cooldown_duration: f32,
    pub(crate) players_in_range: BTreeSet<PlayerId>,

    #[serde(skip)]
    pub(crate) task: Option<AgentTask>,
    #[serde(skip)]
    pub(crate) patrol_goal: Option<Vec3>,
    #[serde(skip)]
    pub(crate) transitions: Vec<StateChange>,
}

impl ZombieAgent {
    /// Create an agent in Patrol with already-rolled per-agent randoms
    pub fn new(
        enemy_type: impl Into<String>,
        location: Vec3,
        base_speed_multiplier: f32,
        attack_cooldown_duration: f32,
        config: &ZombieConfig,
    ) -> Self {
        let patrol_speed = config.speed_patrol * base_speed_multiplier;
        Self {
            enemy_type: enemy_type.into(),
            location,
            facing: Vec3::X,
            home: location,
            patrol_tag: None,
            state: AIState::Patrol,
            previous_state: AIState::Patrol,
            health: Health::new(config.max_health),
            enemy: None,
            last_known_enemy_location: None,
            time_since_lost_los: 0.0,
            had_los_last_check: false,
            is_staggered: false,
            is_angered: false,
            chase_breathing: false,
            current_walk_speed: patrol_speed,
            target_walk_speed: patrol_speed,
            base_speed_multiplier,
            last_attack_time: f64::NEG_INFINITY,
            attack_cooldown_duration,
            players_in_range: BTreeSet::new(),
            task: None,
            patrol_goal: None,
            transitions: Vec::new(),
        }
    }

    /// Patrol route tag handed down by the spawner
    pub fn with_patrol_tag(mut self, tag: Option<String>) -> Self {
        self.patrol_tag = tag;
        self
    }

    /// Initial facing. Only the horizontal part is kept.
    pub fn with_facing(mut self, facing: Vec3) -> Self {
        let flat = Vec3::new(facing.x, facing.y, 0.0).normalize_or_zero();
        if flat != Vec3::ZERO {
            self.facing = flat;
        }
        self
    }

    /// Current AI state
    pub fn state(&self) -> AIState {
        self.state
    }

    /// State before the last transition
    pub fn previous_state(&self) -> AIState {
        self.previous_state
    }

    /// Health pool
    pub fn health(&self) -> &Health {
        &self.health
    }

    /// Whether the death path has run
    pub fn is_dead(&self) -> bool {
        self.health.is_dead
    }

    /// Tracked enemy
    pub fn enemy(&self) -> Option<PlayerId> {
        self.enemy
    }

    /// Where the enemy was last seen
    pub fn last_known_enemy_location(&self) -> Option<Vec3> {
        self.last_known_enemy_location
    }

    pub fn has_last_known_enemy_location(&self) -> bool {
        self.last_known_enemy_location.is_some()
    }

    /// Remember where the enemy was seen
    pub fn set_last_known_enemy_location(&mut self, location: Vec3) {
        self.last_known_enemy_location = Some(location);
    }

    pub fn clear_last_known_enemy_location(&mut self) {
        self.last_known_enemy_location = None;
    }

    /// Seconds the tracked enemy has been out of sight while chasing
    pub fn time_since_lost_los(&self) -> f32 {
        self.time_since_lost_los
    }

    pub fn had_los_last_check(&self) -> bool {
        self.had_los_last_check
    }

    /// Stagger overlay active
    pub fn is_staggered(&self) -> bool {
        self.is_staggered
    }

    /// Anger speed boost active
    pub fn is_angered(&self) -> bool {
        self.is_angered
    }

    /// Interpolated speed used for movement this tick
    pub fn current_walk_speed(&self) -> f32 {
        self.current_walk_speed
    }

    /// Speed the agent is interpolating towards
    pub fn target_walk_speed(&self) -> f32 {
        self.target_walk_speed
    }

    /// Per-agent speed variation rolled at spawn
    pub fn base_speed_multiplier(&self) -> f32 {
        self.base_speed_multiplier
    }

    /// Cooldown after the last attack, re-rolled after every swing
    pub fn attack_cooldown_duration(&self) -> f32 {
        self.attack_cooldown_duration
    }

    /// Living players inside the range sphere
    pub fn players_in_range_count(&self) -> usize {
        self.players_in_range.len()
    }

    pub fn is_player_in_range(&self, player: PlayerId) -> bool {
        self.players_in_range.contains(&player)
    }

    /// Whether a latent task is running
    pub fn has_task(&self) -> bool {
        self.task.is_some()
    }

    /// Running latent task, if any
    pub fn task(&self) -> Option<&AgentTask> {
        self.task.as_ref()
    }

    /// Move `current_walk_speed` toward the target at a constant rate.
    ///
    /// Deceleration is faster than acceleration. Within the snap threshold
    /// the speed is set to the target exactly.
    pub fn update_speed_interpolation(&mut self, delta: f32, config: &ZombieConfig) {
        if (self.current_walk_speed - self.target_walk_speed).abs() <= config.speed_snap_threshold {
            self.current_walk_speed = self.target_walk_speed;
            return;
        }

        let rate = if self.current_walk_speed < self.target_walk_speed {
            config.acceleration
        } else {
            config.deceleration
        };
        self.current_walk_speed = move_towards(self.current_walk_speed, self.target_walk_speed, rate * delta);
    }

    /// Whether the melee cooldown has elapsed
    pub fn can_attack(&self, now: f64) -> bool {
        now - self.last_attack_time >= self.attack_cooldown_duration as f64
    }

    /// Seconds until the next attack is allowed
    pub fn attack_cooldown_remaining(&self, now: f64) -> f32 {
        let elapsed = now - self.last_attack_time;
        (self.attack_cooldown_duration as f64 - elapsed).max(0.0) as f32
    }

    /// Restart the cooldown with a freshly rolled duration
    pub fn reset_attack_cooldown(&mut self, now: f64, next_duration: f32) {
        self.last_attack_time = now;
        self.attack_cooldown_duration = next_duration;
    }

    /// Eye location used for every sight test
    pub fn eye_location(&self, config: &ZombieConfig) -> Vec3 {
        self.location.offset_z(config.eye_height)
    }

    /// Center of the sphere used for player range counting
    pub fn range_center(&self, config: &ZombieConfig) -> Vec3 {
        self.location + self.facing * config.player_range_offset
    }

    /// Origin of the melee swing probe
    pub fn attack_origin(&self, config: &ZombieConfig) -> Vec3 {
        self.location.offset_z(config.attack_origin_height)
    }

    pub(crate) fn face_towards(&mut self, target: Vec3) {
        let flat = Vec3::new(target.x - self.location.x, target.y - self.location.y, 0.0).normalize_or_zero();
        if flat != Vec3::ZERO {
            self.facing = flat;
        }
    }

    pub(crate) fn take_transitions(&mut self) -> Vec<StateChange> {
        std::mem::take(&mut self.transitions)
    }
}
