//! horde_combat - Health, Damage, and Firearms
//!
//! Combat building blocks shared by zombies and players.
//!
//! # Features
//!
//! - Clamped health with a one-way death transition
//! - Point and radial damage with hit-bone information
//! - Firearm fire control: single, burst and full-auto modes, fire-rate
//!   gating, accumulated spread with decay, permissive intent handling
//!
//! # Example
//!
//! ```ignore
//! use horde_combat::prelude::*;
//!
//! let mut rifle = Firearm::new(FirearmDefinition::new("ak47").with_fire_rate(0.1));
//! rifle.start_firing(now, &shooter, &mut effects, &mut rng);
//! rifle.update(now + 0.1, &shooter, &mut effects, &mut rng);
//! for shot in rifle.drain_projectiles() {
//!     // spawn projectile
//! }
//! ```

pub mod damage;
pub mod firearm;
pub mod health;

pub mod prelude {
    pub use crate::damage::{DamageInfo, DamageKind, HEAD_BONE};
    pub use crate::firearm::{
        FireMode, Firearm, FirearmDefinition, FirearmEvent, FiringState, ProjectileSpawn,
        ShooterState, SpreadConfig,
    };
    pub use crate::health::Health;
}

pub use prelude::*;
