//! Firearm fire control
//!
//! Authoritative-side state machine for player weapons:
//!
//! ```text
//! Single: Idle -> Firing -> Idle            (one shot per request)
//! Burst:  Idle -> BurstFiring -> Idle       (fixed shot count, not interruptible)
//! Full:   Idle -> AutoFiring -> Idle        (until stopped or out of ammo)
//! ```
//!
//! Requests that the current state cannot honor are absorbed without error.

use horde_core::{Effect, EffectCue, PlayerId, Presentation, Timer};
use horde_math::{radians, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Slack when comparing shot timestamps against the fire interval
pub const FIRE_TIME_TOLERANCE: f64 = 1e-4;

/// Fastest allowed interval between shots
const MIN_FIRE_RATE: f32 = 0.05;
/// Interval used when a definition carries no usable fire rate
const DEFAULT_FIRE_RATE: f32 = 0.1;

/// Selectable fire mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FireMode {
    /// One shot per trigger pull
    Single,
    /// Fixed number of shots per trigger pull
    Burst,
    /// Continuous fire while held
    Full,
}

impl Default for FireMode {
    fn default() -> Self {
        Self::Single
    }
}

/// Current firing activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FiringState {
    Idle,
    Firing,
    BurstFiring,
    AutoFiring,
}

impl Default for FiringState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Spread tuning (angles in degrees)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadConfig {
    /// Spread with no penalties
    pub base_angle: f32,
    /// Multiplier while moving
    pub moving_multiplier: f32,
    /// Multiplier while airborne
    pub airborne_multiplier: f32,
    /// Squared horizontal speed above which the shooter counts as moving
    pub moving_speed_threshold_sq: f32,
    /// Spread added per shot
    pub increase_per_shot: f32,
    /// Cap for the accumulated spread
    pub max_accumulated: f32,
    /// Idle time after which accumulated spread resets
    pub reset_time: f32,
}

impl Default for SpreadConfig {
    fn default() -> Self {
        Self {
            base_angle: 0.5,
            moving_multiplier: 1.5,
            airborne_multiplier: 2.0,
            moving_speed_threshold_sq: 100.0,
            increase_per_shot: 0.1,
            max_accumulated: 3.0,
            reset_time: 0.3,
        }
    }
}

impl SpreadConfig {
    /// Upper bound of the effective spread
    pub fn max_spread(&self) -> f32 {
        self.max_accumulated + self.base_angle * self.airborne_multiplier * self.moving_multiplier
    }
}

/// Static weapon definition, loaded from the item table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FirearmDefinition {
    /// Item id
    pub id: String,
    /// Display name
    pub display_name: String,
    /// Seconds between shots
    pub fire_rate: f32,
    /// Shots per burst
    pub burst_count: u32,
    /// Fire modes the weapon can toggle through
    pub fire_modes: Vec<FireMode>,
    /// Magazine capacity
    pub magazine_size: u32,
    /// Reload duration in seconds
    pub reload_time: f32,
    /// Projectile class to spawn per shot
    pub projectile_class: Option<String>,
    /// Spread tuning
    pub spread: SpreadConfig,
}

impl Default for FirearmDefinition {
    fn default() -> Self {
        Self {
            id: String::new(),
            display_name: String::new(),
            fire_rate: DEFAULT_FIRE_RATE,
            burst_count: 3,
            fire_modes: vec![FireMode::Single],
            magazine_size: 30,
            reload_time: 2.0,
            projectile_class: None,
            spread: SpreadConfig::default(),
        }
    }
}

impl FirearmDefinition {
    /// Create a definition with default stats and a projectile class named after the id
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            projectile_class: Some(format!("{}_projectile", id)),
            id,
            ..Default::default()
        }
    }

    /// Set seconds between shots
    pub fn with_fire_rate(mut self, seconds: f32) -> Self {
        self.fire_rate = seconds;
        self
    }

    /// Set shots per burst
    pub fn with_burst_count(mut self, count: u32) -> Self {
        self.burst_count = count;
        self
    }

    /// Set available fire modes
    pub fn with_fire_modes(mut self, modes: Vec<FireMode>) -> Self {
        self.fire_modes = modes;
        self
    }

    /// Set magazine capacity
    pub fn with_magazine_size(mut self, size: u32) -> Self {
        self.magazine_size = size;
        self
    }

    /// Set reload duration
    pub fn with_reload_time(mut self, seconds: f32) -> Self {
        self.reload_time = seconds;
        self
    }

    /// Set or clear the projectile class
    pub fn with_projectile_class(mut self, class: Option<String>) -> Self {
        self.projectile_class = class;
        self
    }

    /// Set spread tuning
    pub fn with_spread(mut self, spread: SpreadConfig) -> Self {
        self.spread = spread;
        self
    }
}

/// Shooter state sampled at the moment of a request
#[derive(Debug, Clone)]
pub struct ShooterState {
    /// Owning player
    pub owner: Option<PlayerId>,
    /// Whether the owner is alive
    pub alive: bool,
    /// Projectile origin
    pub muzzle: Vec3,
    /// Aim direction
    pub aim: Vec3,
    /// Owner velocity
    pub velocity: Vec3,
    /// Whether the owner is off the ground
    pub airborne: bool,
}

impl ShooterState {
    pub fn new(owner: PlayerId, muzzle: Vec3, aim: Vec3) -> Self {
        Self {
            owner: Some(owner),
            alive: true,
            muzzle,
            aim: aim.normalize_or_zero(),
            velocity: Vec3::ZERO,
            airborne: false,
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn airborne(mut self) -> Self {
        self.airborne = true;
        self
    }

    pub fn dead(mut self) -> Self {
        self.alive = false;
        self
    }
}

/// Request to spawn a projectile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSpawn {
    /// Projectile class
    pub class: String,
    /// Spawn location
    pub origin: Vec3,
    /// Direction after spread
    pub direction: Vec3,
    /// Owning player
    pub owner: Option<PlayerId>,
    /// World time of the shot
    pub fired_at: f64,
}

/// Notifications mirrored to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FirearmEvent {
    FiringStarted(FiringState),
    FiringStopped,
    FireModeChanged(FireMode),
    ReloadStarted,
    ReloadFinished,
}

/// Runtime firearm instance
#[derive(Debug, Clone)]
pub struct Firearm {
    definition: FirearmDefinition,
    fire_mode: FireMode,
    loaded_ammo: u32,
    state: FiringState,
    is_firing: bool,
    is_reloading: bool,
    last_fire_time: f64,
    current_burst_count: u32,
    accumulated_spread: f32,
    cached_fire_rate: f32,
    max_burst_count: u32,
    fire_timer: Option<Timer>,
    spread_reset_at: Option<f64>,
    reload_done_at: Option<f64>,
    projectiles: Vec<ProjectileSpawn>,
    events: Vec<FirearmEvent>,
}

impl Firearm {
    /// Create a firearm with a full magazine
    pub fn new(definition: FirearmDefinition) -> Self {
        let cached_fire_rate = if definition.fire_rate > 0.0 {
            definition.fire_rate.max(MIN_FIRE_RATE)
        } else {
            DEFAULT_FIRE_RATE
        };
        let fire_mode = definition.fire_modes.first().copied().unwrap_or_default();

        Self {
            loaded_ammo: definition.magazine_size,
            max_burst_count: definition.burst_count.max(1),
            cached_fire_rate,
            fire_mode,
            definition,
            state: FiringState::Idle,
            is_firing: false,
            is_reloading: false,
            last_fire_time: f64::NEG_INFINITY,
            current_burst_count: 0,
            accumulated_spread: 0.0,
            fire_timer: None,
            spread_reset_at: None,
            reload_done_at: None,
            projectiles: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn definition(&self) -> &FirearmDefinition {
        &self.definition
    }

    pub fn fire_mode(&self) -> FireMode {
        self.fire_mode
    }

    pub fn state(&self) -> FiringState {
        self.state
    }

    pub fn is_firing(&self) -> bool {
        self.is_firing
    }

    pub fn is_reloading(&self) -> bool {
        self.is_reloading
    }

    pub fn loaded_ammo(&self) -> u32 {
        self.loaded_ammo
    }

    pub fn set_loaded_ammo(&mut self, ammo: u32) {
        self.loaded_ammo = ammo;
    }

    pub fn accumulated_spread(&self) -> f32 {
        self.accumulated_spread
    }

    pub fn current_burst_count(&self) -> u32 {
        self.current_burst_count
    }

    pub fn max_burst_count(&self) -> u32 {
        self.max_burst_count
    }

    pub fn cached_fire_rate(&self) -> f32 {
        self.cached_fire_rate
    }

    /// Whether the repeating fire timer is armed
    pub fn has_fire_timer(&self) -> bool {
        self.fire_timer.is_some()
    }

    /// Ammo, owner and fire-rate gate for a single shot
    pub fn can_fire(&self, now: f64, shooter: &ShooterState) -> bool {
        if self.loaded_ammo == 0 {
            return false;
        }
        if !shooter.alive || self.is_reloading {
            return false;
        }
        now - self.last_fire_time + FIRE_TIME_TOLERANCE >= self.cached_fire_rate as f64
    }

    /// Seconds until the fire-rate gate opens
    pub fn time_until_next_shot(&self, now: f64) -> f32 {
        let remaining = self.cached_fire_rate as f64 - (now - self.last_fire_time);
        remaining.max(0.0) as f32
    }

    /// Effective spread for the shooter's current movement
    pub fn calculate_spread(&self, shooter: &ShooterState) -> f32 {
        let spread = &self.definition.spread;
        let mut current = spread.base_angle + self.accumulated_spread;

        if shooter.velocity.length_squared() > spread.moving_speed_threshold_sq {
            current *= spread.moving_multiplier;
        }
        if shooter.airborne {
            current *= spread.airborne_multiplier;
        }

        current.clamp(0.0, spread.max_spread())
    }

    /// Random direction inside the spread cone around `direction`
    pub fn apply_spread<R: Rng + ?Sized>(&self, direction: Vec3, shooter: &ShooterState, rng: &mut R) -> Vec3 {
        let spread = self.calculate_spread(shooter);
        let forward = direction.normalize_or_zero();
        if spread <= 0.0 || forward == Vec3::ZERO {
            return forward;
        }

        let half_angle = radians(spread * 0.5);
        let angle = rng.random_range(0.0..core::f32::consts::TAU);
        let radius = rng.random_range(0.0..=half_angle.sin());

        let helper = if forward.z.abs() < 0.99 { Vec3::Z } else { Vec3::X };
        let right = forward.cross(helper).normalize_or_zero();
        let up = right.cross(forward);

        (forward + right * (angle.cos() * radius) + up * (angle.sin() * radius)).normalize_or_zero()
    }

    /// Fire a single projectile if the gate allows it
    pub fn fire<P, R>(&mut self, now: f64, shooter: &ShooterState, fx: &mut P, rng: &mut R) -> bool
    where
        P: Presentation + ?Sized,
        R: Rng + ?Sized,
    {
        if !self.can_fire(now, shooter) {
            return false;
        }

        let Some(class) = self.definition.projectile_class.clone() else {
            log::warn!("Firearm '{}' has no projectile class", self.definition.id);
            return false;
        };

        // Timestamp before spawning so a re-entrant request cannot double fire
        self.last_fire_time = now;
        self.loaded_ammo = self.loaded_ammo.saturating_sub(1);

        let mut cue = EffectCue::new(Effect::MuzzleFlash, shooter.muzzle);
        if let Some(owner) = shooter.owner {
            cue = cue.with_source(owner.raw());
        }
        fx.play(cue);

        let direction = self.apply_spread(shooter.aim, shooter, rng);
        self.projectiles.push(ProjectileSpawn {
            class,
            origin: shooter.muzzle,
            direction,
            owner: shooter.owner,
            fired_at: now,
        });

        let spread = &self.definition.spread;
        self.accumulated_spread = (self.accumulated_spread + spread.increase_per_shot).min(spread.max_accumulated);
        self.spread_reset_at = Some(now + spread.reset_time as f64);
        true
    }

    /// One step of a burst or automatic sequence
    pub fn execute_fire_sequence<P, R>(&mut self, now: f64, shooter: &ShooterState, fx: &mut P, rng: &mut R)
    where
        P: Presentation + ?Sized,
        R: Rng + ?Sized,
    {
        if !self.can_fire(now, shooter) {
            if self.state == FiringState::BurstFiring {
                self.burst_complete();
            } else {
                self.stop_firing();
            }
            return;
        }

        self.fire(now, shooter, fx, rng);

        match self.state {
            FiringState::BurstFiring => {
                self.current_burst_count += 1;
                if self.current_burst_count >= self.max_burst_count {
                    self.burst_complete();
                }
            }
            FiringState::AutoFiring => {
                if self.loaded_ammo == 0 {
                    self.stop_firing();
                }
            }
            _ => {}
        }
    }

    fn burst_complete(&mut self) {
        self.fire_timer = None;
        self.current_burst_count = 0;
        self.state = FiringState::Idle;
        self.is_firing = false;
        self.events.push(FirearmEvent::FiringStopped);
    }

    /// Fire request from the owner
    pub fn server_fire<P, R>(&mut self, now: f64, shooter: &ShooterState, fx: &mut P, rng: &mut R) -> bool
    where
        P: Presentation + ?Sized,
        R: Rng + ?Sized,
    {
        if self.fire_mode == FireMode::Single {
            if !self.can_fire(now, shooter) {
                return false;
            }
            self.state = FiringState::Firing;
            let fired = self.fire(now, shooter, fx, rng);
            self.state = FiringState::Idle;
            fired
        } else {
            self.start_firing(now, shooter, fx, rng)
        }
    }

    /// Begin a firing sequence for the current mode
    pub fn start_firing<P, R>(&mut self, now: f64, shooter: &ShooterState, fx: &mut P, rng: &mut R) -> bool
    where
        P: Presentation + ?Sized,
        R: Rng + ?Sized,
    {
        if self.is_firing {
            log::trace!("start_firing absorbed: '{}' already firing", self.definition.id);
            return false;
        }
        if !self.can_fire(now, shooter) {
            return false;
        }

        let interval = self.cached_fire_rate as f64;
        match self.fire_mode {
            FireMode::Single => {
                self.state = FiringState::Firing;
                let fired = self.fire(now, shooter, fx, rng);
                self.state = FiringState::Idle;
                return fired;
            }
            FireMode::Burst => {
                self.state = FiringState::BurstFiring;
                self.is_firing = true;
                self.events.push(FirearmEvent::FiringStarted(FiringState::BurstFiring));

                self.fire(now, shooter, fx, rng);
                self.current_burst_count = 1;

                if self.current_burst_count < self.max_burst_count {
                    self.fire_timer = Some(Timer::repeating(now + interval, interval));
                } else {
                    self.burst_complete();
                }
            }
            FireMode::Full => {
                self.state = FiringState::AutoFiring;
                self.is_firing = true;
                self.events.push(FirearmEvent::FiringStarted(FiringState::AutoFiring));

                self.fire(now, shooter, fx, rng);
                self.fire_timer = Some(Timer::repeating(now + interval, interval));
            }
        }
        true
    }

    /// Stop request from the owner. Bursts always run to completion.
    pub fn stop_firing(&mut self) {
        if self.state == FiringState::BurstFiring {
            log::trace!("stop_firing absorbed: '{}' mid-burst", self.definition.id);
            return;
        }

        self.fire_timer = None;

        if self.state == FiringState::AutoFiring {
            self.state = FiringState::Idle;
            self.is_firing = false;
            self.events.push(FirearmEvent::FiringStopped);
        }
    }

    /// Cycle to the next fire mode the weapon supports
    pub fn toggle_fire_mode(&mut self) {
        let modes = &self.definition.fire_modes;
        if modes.is_empty() {
            return;
        }

        let next = match modes.iter().position(|m| *m == self.fire_mode) {
            Some(index) if index + 1 < modes.len() => modes[index + 1],
            _ => modes[0],
        };

        if next != self.fire_mode {
            self.fire_mode = next;
            self.events.push(FirearmEvent::FireModeChanged(next));
        }
    }

    /// Start reloading. Refused while firing, reloading or with a full magazine.
    pub fn begin_reload(&mut self, now: f64) -> bool {
        if self.is_firing || self.is_reloading || self.loaded_ammo >= self.definition.magazine_size {
            return false;
        }
        self.is_reloading = true;
        self.reload_done_at = Some(now + self.definition.reload_time.max(0.0) as f64);
        self.events.push(FirearmEvent::ReloadStarted);
        true
    }

    /// Advance timers: scheduled shots, spread decay and reload completion
    pub fn update<P, R>(&mut self, now: f64, shooter: &ShooterState, fx: &mut P, rng: &mut R)
    where
        P: Presentation + ?Sized,
        R: Rng + ?Sized,
    {
        while let Some(timer) = self.fire_timer {
            if timer.fires_at > now + FIRE_TIME_TOLERANCE {
                break;
            }
            let shot_time = timer.fires_at;
            self.decay_spread(shot_time);

            if let (Some(t), Some(interval)) = (self.fire_timer.as_mut(), timer.interval) {
                t.fires_at += interval;
            }
            self.execute_fire_sequence(shot_time, shooter, fx, rng);
        }

        self.decay_spread(now);

        if let Some(done_at) = self.reload_done_at {
            if done_at <= now {
                self.reload_done_at = None;
                self.is_reloading = false;
                self.loaded_ammo = self.definition.magazine_size;
                self.events.push(FirearmEvent::ReloadFinished);
            }
        }
    }

    fn decay_spread(&mut self, now: f64) {
        if let Some(reset_at) = self.spread_reset_at {
            if reset_at <= now {
                self.accumulated_spread = 0.0;
                self.spread_reset_at = None;
            }
        }
    }

    /// Take pending projectile spawn requests
    pub fn drain_projectiles(&mut self) -> Vec<ProjectileSpawn> {
        std::mem::take(&mut self.projectiles)
    }

    /// Take pending observer notifications
    pub fn drain_events(&mut self) -> Vec<FirearmEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horde_core::EffectLog;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn shooter() -> ShooterState {
        ShooterState::new(PlayerId(1), Vec3::new(0.0, 0.0, 150.0), Vec3::X)
    }

    fn rifle(modes: Vec<FireMode>) -> Firearm {
        Firearm::new(
            FirearmDefinition::new("rifle")
                .with_fire_rate(0.1)
                .with_burst_count(3)
                .with_magazine_size(30)
                .with_fire_modes(modes),
        )
    }

    #[test]
    fn test_cached_fire_rate_floor() {
        let fast = Firearm::new(FirearmDefinition::new("fast").with_fire_rate(0.01));
        assert_eq!(fast.cached_fire_rate(), 0.05);

        let broken = Firearm::new(FirearmDefinition::new("broken").with_fire_rate(0.0));
        assert_eq!(broken.cached_fire_rate(), 0.1);

        let zero_burst = Firearm::new(FirearmDefinition::new("b").with_burst_count(0));
        assert_eq!(zero_burst.max_burst_count(), 1);
    }

    #[test]
    fn test_single_fire_respects_fire_rate() {
        let mut gun = rifle(vec![FireMode::Single]);
        let mut fx = EffectLog::new();
        let mut rng = StdRng::seed_from_u64(1);
        let s = shooter();

        assert!(gun.server_fire(0.0, &s, &mut fx, &mut rng));
        assert!(!gun.server_fire(0.05, &s, &mut fx, &mut rng));
        assert!(gun.server_fire(0.1, &s, &mut fx, &mut rng));

        assert_eq!(gun.loaded_ammo(), 28);
        assert_eq!(gun.state(), FiringState::Idle);
        assert_eq!(gun.drain_projectiles().len(), 2);
        assert_eq!(fx.count(Effect::MuzzleFlash), 2);
    }

    #[test]
    fn test_cannot_fire_without_ammo_dead_or_reloading() {
        let mut gun = rifle(vec![FireMode::Single]);
        let s = shooter();

        assert!(gun.can_fire(0.0, &s));
        assert!(!gun.can_fire(0.0, &s.clone().dead()));

        gun.set_loaded_ammo(0);
        assert!(!gun.can_fire(0.0, &s));

        gun.set_loaded_ammo(5);
        assert!(gun.begin_reload(0.0));
        assert!(!gun.can_fire(0.5, &s));
    }

    #[test]
    fn test_missing_projectile_class_fires_nothing() {
        let mut gun = Firearm::new(FirearmDefinition::new("empty").with_projectile_class(None));
        let mut fx = EffectLog::new();
        let mut rng = StdRng::seed_from_u64(1);

        assert!(!gun.fire(0.0, &shooter(), &mut fx, &mut rng));
        assert_eq!(gun.loaded_ammo(), 30);
        assert!(fx.cues().is_empty());
    }

    #[test]
    fn test_single_start_firing_reports_failed_shot() {
        let mut fx = EffectLog::new();
        let mut rng = StdRng::seed_from_u64(1);
        let s = shooter();

        let mut empty = rifle(vec![FireMode::Single]);
        empty.set_loaded_ammo(0);
        assert!(!empty.start_firing(0.0, &s, &mut fx, &mut rng));

        let mut no_class = Firearm::new(
            FirearmDefinition::new("dud")
                .with_fire_modes(vec![FireMode::Single])
                .with_projectile_class(None),
        );
        assert!(!no_class.start_firing(0.0, &s, &mut fx, &mut rng));
        assert_eq!(no_class.state(), FiringState::Idle);

        let mut gun = rifle(vec![FireMode::Single]);
        assert!(gun.start_firing(0.0, &s, &mut fx, &mut rng));
        assert_eq!(gun.loaded_ammo(), 29);
    }

    #[test]
    fn test_burst_fires_exactly_max_and_ignores_stop() {
        let mut gun = rifle(vec![FireMode::Burst]);
        let mut fx = EffectLog::new();
        let mut rng = StdRng::seed_from_u64(3);
        let s = shooter();

        assert!(gun.start_firing(0.0, &s, &mut fx, &mut rng));
        assert_eq!(gun.state(), FiringState::BurstFiring);
        assert!(gun.has_fire_timer());

        // Mid-burst stop is absorbed
        gun.stop_firing();
        assert_eq!(gun.state(), FiringState::BurstFiring);
        assert!(gun.has_fire_timer());

        gun.update(0.1, &s, &mut fx, &mut rng);
        assert_eq!(gun.current_burst_count(), 2);
        gun.update(0.2, &s, &mut fx, &mut rng);

        assert_eq!(gun.state(), FiringState::Idle);
        assert!(!gun.is_firing());
        assert!(!gun.has_fire_timer());
        assert_eq!(gun.current_burst_count(), 0);

        gun.update(1.0, &s, &mut fx, &mut rng);
        assert_eq!(gun.drain_projectiles().len(), 3);
        assert_eq!(gun.loaded_ammo(), 27);
        assert_eq!(
            gun.drain_events(),
            vec![
                FirearmEvent::FiringStarted(FiringState::BurstFiring),
                FirearmEvent::FiringStopped
            ]
        );
    }

    #[test]
    fn test_burst_catches_up_in_one_long_update() {
        let mut gun = rifle(vec![FireMode::Burst]);
        let mut fx = EffectLog::new();
        let mut rng = StdRng::seed_from_u64(3);
        let s = shooter();

        gun.start_firing(0.0, &s, &mut fx, &mut rng);
        gun.update(0.5, &s, &mut fx, &mut rng);

        assert_eq!(gun.drain_projectiles().len(), 3);
        assert_eq!(gun.state(), FiringState::Idle);
    }

    #[test]
    fn test_burst_of_one_completes_immediately() {
        let mut gun = Firearm::new(
            FirearmDefinition::new("one")
                .with_burst_count(1)
                .with_fire_modes(vec![FireMode::Burst]),
        );
        let mut fx = EffectLog::new();
        let mut rng = StdRng::seed_from_u64(3);

        assert!(gun.start_firing(0.0, &shooter(), &mut fx, &mut rng));
        assert_eq!(gun.state(), FiringState::Idle);
        assert!(!gun.has_fire_timer());
        assert_eq!(gun.drain_projectiles().len(), 1);
    }

    #[test]
    fn test_auto_fire_until_stopped() {
        let mut gun = rifle(vec![FireMode::Full]);
        let mut fx = EffectLog::new();
        let mut rng = StdRng::seed_from_u64(9);
        let s = shooter();

        gun.start_firing(0.0, &s, &mut fx, &mut rng);
        assert_eq!(gun.state(), FiringState::AutoFiring);

        // Second start request is absorbed
        assert!(!gun.start_firing(0.0, &s, &mut fx, &mut rng));

        gun.update(0.1, &s, &mut fx, &mut rng);
        gun.update(0.2, &s, &mut fx, &mut rng);
        gun.stop_firing();

        assert_eq!(gun.state(), FiringState::Idle);
        assert!(!gun.has_fire_timer());
        gun.update(1.0, &s, &mut fx, &mut rng);
        assert_eq!(gun.drain_projectiles().len(), 3);
    }

    #[test]
    fn test_auto_fire_stops_when_empty() {
        let mut gun = rifle(vec![FireMode::Full]);
        gun.set_loaded_ammo(2);
        let mut fx = EffectLog::new();
        let mut rng = StdRng::seed_from_u64(9);
        let s = shooter();

        gun.start_firing(0.0, &s, &mut fx, &mut rng);
        gun.update(0.1, &s, &mut fx, &mut rng);

        assert_eq!(gun.loaded_ammo(), 0);
        assert_eq!(gun.state(), FiringState::Idle);
        assert!(!gun.is_firing());
    }

    #[test]
    fn test_stop_while_idle_is_noop() {
        let mut gun = rifle(vec![FireMode::Full]);
        gun.stop_firing();
        assert_eq!(gun.state(), FiringState::Idle);
        assert!(gun.drain_events().is_empty());
    }

    #[test]
    fn test_spread_accumulates_and_resets() {
        let mut gun = rifle(vec![FireMode::Single]);
        let mut fx = EffectLog::new();
        let mut rng = StdRng::seed_from_u64(5);
        let s = shooter();

        for i in 0..40 {
            gun.server_fire(i as f64 * 0.1, &s, &mut fx, &mut rng);
        }
        assert_eq!(gun.accumulated_spread(), 3.0);

        gun.update(3.85, &s, &mut fx, &mut rng);
        assert_eq!(gun.accumulated_spread(), 3.0);
        gun.update(4.3, &s, &mut fx, &mut rng);
        assert_eq!(gun.accumulated_spread(), 0.0);
    }

    #[test]
    fn test_spread_penalties() {
        let gun = rifle(vec![FireMode::Single]);
        let still = shooter();
        let moving = shooter().with_velocity(Vec3::new(300.0, 0.0, 0.0));
        let jumping = moving.clone().airborne();

        assert!((gun.calculate_spread(&still) - 0.5).abs() < 1e-6);
        assert!((gun.calculate_spread(&moving) - 0.75).abs() < 1e-6);
        assert!((gun.calculate_spread(&jumping) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_spread_stays_in_cone() {
        let gun = rifle(vec![FireMode::Single]);
        let s = shooter();
        let mut rng = StdRng::seed_from_u64(11);

        for _ in 0..100 {
            let dir = gun.apply_spread(Vec3::X, &s, &mut rng);
            assert!((dir.length() - 1.0).abs() < 1e-4);
            assert!(dir.angle_between_degrees(Vec3::X) <= 0.3);
        }
    }

    #[test]
    fn test_toggle_fire_mode_cycles() {
        let mut gun = rifle(vec![FireMode::Single, FireMode::Burst, FireMode::Full]);
        assert_eq!(gun.fire_mode(), FireMode::Single);

        gun.toggle_fire_mode();
        assert_eq!(gun.fire_mode(), FireMode::Burst);
        gun.toggle_fire_mode();
        assert_eq!(gun.fire_mode(), FireMode::Full);
        gun.toggle_fire_mode();
        assert_eq!(gun.fire_mode(), FireMode::Single);

        let mut single_only = rifle(vec![FireMode::Single]);
        single_only.toggle_fire_mode();
        assert!(single_only.drain_events().is_empty());
    }

    #[test]
    fn test_reload_refills_magazine() {
        let mut gun = rifle(vec![FireMode::Single]);
        let mut fx = EffectLog::new();
        let mut rng = StdRng::seed_from_u64(1);
        let s = shooter();

        assert!(!gun.begin_reload(0.0));
        gun.server_fire(0.0, &s, &mut fx, &mut rng);
        assert!(gun.begin_reload(0.1));
        assert!(!gun.begin_reload(0.2));

        gun.update(2.2, &s, &mut fx, &mut rng);
        assert!(!gun.is_reloading());
        assert_eq!(gun.loaded_ammo(), 30);
    }
}
