//! horde_spawner - Dynamic Zombie Spawners
//!
//! Population control for placed spawn volumes.
//!
//! # Features
//!
//! - Inactive / Active / Exhausted / Disabled volume state machine
//! - Activation by living-player distance band
//! - Vision-avoiding placement on the navmesh with a capsule clearance test
//! - Continuous, wave and externally triggered spawning
//! - Difficulty scaling by global population and player count
//! - Kill-quota exhaustion with timed, re-entry-gated reactivation
//!
//! # Example
//!
//! ```ignore
//! use horde_spawner::prelude::*;
//!
//! let mut spawners = SpawnerSystem::new();
//! let gate = spawners.add_volume(SpawnVolume::new("gate", location, SpawnerConfig::default()));
//!
//! let mut ctx = SpawnContext::new(&world, &players, &mut ai, &mut rng);
//! spawners.update(now, delta, &mut ctx);
//! ```

pub mod config;
pub mod difficulty;
pub mod events;
pub mod placement;
pub mod system;
pub mod volume;

pub mod prelude {
    pub use crate::config::{SpawnMode, SpawnerConfig};
    pub use crate::difficulty::difficulty_multiplier;
    pub use crate::events::SpawnerEvent;
    pub use crate::system::{SpawnContext, SpawnerId, SpawnerSystem, ZombieFactory};
    pub use crate::volume::{SpawnVolume, SpawnerState};
}

pub use prelude::*;
