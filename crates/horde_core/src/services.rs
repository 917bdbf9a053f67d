//! Contracts for the services the surrounding engine provides
//!
//! The gameplay crates never own geometry, data tables, audio/visual playback
//! or player accounts. They talk to them through the traits in this module.

use crate::id::PlayerId;
use horde_math::Vec3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Result of a blocking trace
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceHit {
    /// Impact location
    pub location: Vec3,
    /// Distance from the trace start
    pub distance: f32,
}

/// Geometry queries against static world collision and the navigation mesh.
///
/// Characters are never obstacles for these queries, so callers do not
/// need to pass ignore lists for themselves or their targets.
pub trait SpatialQuery {
    /// Trace a line against blocking geometry
    fn trace_line(&self, start: Vec3, end: Vec3) -> Option<TraceHit>;

    /// Project a point onto the navigation mesh within a search extent
    fn project_to_nav(&self, point: Vec3, extent: Vec3) -> Option<Vec3>;

    /// Whether a Z-aligned capsule overlaps blocking geometry
    fn overlaps_capsule(&self, center: Vec3, radius: f32, half_height: f32) -> bool;

    /// Whether the line between two points is unobstructed
    fn has_clear_line(&self, start: Vec3, end: Vec3) -> bool {
        self.trace_line(start, end).is_none()
    }
}

/// Read-only view of a player for the current frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerView {
    /// Player identity
    pub id: PlayerId,
    /// Feet/root location
    pub location: Vec3,
    /// Camera location
    pub eye_location: Vec3,
    /// Normalized view direction
    pub view_direction: Vec3,
    /// Current velocity
    pub velocity: Vec3,
    /// Whether the player is falling or jumping
    pub airborne: bool,
    /// Whether the player is alive
    pub alive: bool,
}

impl PlayerView {
    /// Create a living player standing at `location` looking along +X
    pub fn new(id: PlayerId, location: Vec3) -> Self {
        Self {
            id,
            location,
            eye_location: location.offset_z(64.0),
            view_direction: Vec3::X,
            velocity: Vec3::ZERO,
            airborne: false,
            alive: true,
        }
    }

    /// Set the view direction
    pub fn with_view_direction(mut self, direction: Vec3) -> Self {
        self.view_direction = direction.normalize_or_zero();
        self
    }

    /// Set the eye location
    pub fn with_eye_location(mut self, eye: Vec3) -> Self {
        self.eye_location = eye;
        self
    }

    /// Mark as dead
    pub fn dead(mut self) -> Self {
        self.alive = false;
        self
    }
}

/// Nearest living player to `from`, with its distance
pub fn nearest_living_player(players: &[PlayerView], from: Vec3) -> Option<(&PlayerView, f32)> {
    players
        .iter()
        .filter(|p| p.alive)
        .map(|p| (p, p.location.distance(from)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Number of living players
pub fn living_player_count(players: &[PlayerView]) -> usize {
    players.iter().filter(|p| p.alive).count()
}

/// Find a player by id
pub fn find_player(players: &[PlayerView], id: PlayerId) -> Option<&PlayerView> {
    players.iter().find(|p| p.id == id)
}

/// Read-only definitions keyed by symbolic id
pub trait StaticData<T> {
    /// Look up a definition
    fn find(&self, id: &str) -> Option<&T>;

    /// Every id in the table, in a stable order
    fn ids(&self) -> Vec<String>;

    /// Look up a definition, falling back to the default value on a miss
    fn find_or_default(&self, id: &str) -> T
    where
        T: Clone + Default,
    {
        self.find(id).cloned().unwrap_or_default()
    }
}

/// Named presentation effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    /// Zombie noticed a player
    Alert,
    /// Start of the looping chase breathing
    ChaseBreathingStart,
    /// End of the looping chase breathing
    ChaseBreathingStop,
    /// Melee swing started
    AttackStart,
    /// Melee swing connected
    AttackHit,
    /// Zombie death
    Death,
    /// Headshot burst
    Headshot,
    /// Weapon muzzle flash and fire sound
    MuzzleFlash,
    /// Explosion
    Explosion,
    /// Quest item picked up
    Pickup,
}

/// A single fire-and-forget presentation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectCue {
    /// Which effect to play
    pub effect: Effect,
    /// Where to play it
    pub location: Vec3,
    /// Raw id of the emitting object, if any
    pub source: Option<u64>,
}

impl EffectCue {
    pub fn new(effect: Effect, location: Vec3) -> Self {
        Self {
            effect,
            location,
            source: None,
        }
    }

    pub fn with_source(mut self, source: u64) -> Self {
        self.source = Some(source);
        self
    }
}

/// Animation/audio/particle playback
pub trait Presentation {
    /// Play an effect. Nothing is returned to the caller.
    fn play(&mut self, cue: EffectCue);
}

/// Presentation sink that queues cues for forwarding to observers
#[derive(Debug, Default, Clone)]
pub struct EffectLog {
    cues: Vec<EffectCue>,
}

impl EffectLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all queued cues
    pub fn drain(&mut self) -> Vec<EffectCue> {
        std::mem::take(&mut self.cues)
    }

    pub fn cues(&self) -> &[EffectCue] {
        &self.cues
    }

    /// Number of queued cues of a given effect
    pub fn count(&self, effect: Effect) -> usize {
        self.cues.iter().filter(|c| c.effect == effect).count()
    }

    pub fn contains(&self, effect: Effect) -> bool {
        self.count(effect) > 0
    }
}

impl Presentation for EffectLog {
    fn play(&mut self, cue: EffectCue) {
        log::trace!("effect {:?} at {:?}", cue.effect, cue.location);
        self.cues.push(cue);
    }
}

/// Kind of points being awarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointKind {
    /// Regular kill or objective reward
    Casual,
    /// Headshot kill
    Headshot,
}

/// Player score and currency accounts
pub trait RewardLedger {
    fn award_points(&mut self, player: PlayerId, points: i32, kind: PointKind);
    fn award_money(&mut self, player: PlayerId, amount: i32);
}

/// Per-player account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Accumulated points
    pub points: i64,
    /// Spendable money
    pub money: i64,
    /// Number of headshot awards
    pub headshots: u32,
}

/// In-memory reward ledger
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PointsLedger {
    accounts: BTreeMap<PlayerId, Account>,
}

impl PointsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(&self, player: PlayerId) -> Account {
        self.accounts.get(&player).copied().unwrap_or_default()
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&PlayerId, &Account)> {
        self.accounts.iter()
    }
}

impl RewardLedger for PointsLedger {
    fn award_points(&mut self, player: PlayerId, points: i32, kind: PointKind) {
        let account = self.accounts.entry(player).or_default();
        account.points += points as i64;
        if kind == PointKind::Headshot {
            account.headshots += 1;
        }
    }

    fn award_money(&mut self, player: PlayerId, amount: i32) {
        self.accounts.entry(player).or_default().money += amount as i64;
    }
}
