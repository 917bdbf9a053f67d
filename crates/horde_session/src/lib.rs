//! horde_session - Authoritative Match Session
//!
//! Ties the horde crates into one server-side simulation.
//!
//! # Features
//!
//! - Fixed-order tick: firearms, projectile resolution, zombies, spawners,
//!   quest triggers and pickups, quests
//! - Event routing between subsystems (kills, melee hits, completion triggers)
//! - JSON static data tables for quests and firearms
//! - Revalidated client intents
//! - Serialisable observer snapshots
//! - TOML configuration with environment overrides
//!
//! # Example
//!
//! ```ignore
//! use horde_session::prelude::*;
//!
//! let mut session = GameSession::from_config(SessionConfig::load()?)?;
//! session.apply_intent(PlayerId(1), ClientIntent::StartFiring);
//! session.tick();
//! let snapshot = SessionSnapshot::project(&session);
//! ```

pub mod config;
pub mod data;
pub mod intent;
pub mod session;
pub mod snapshot;

pub mod prelude {
    pub use crate::config::{CombatConfig, PlayerSetup, SessionConfig, SpawnerPlacement};
    pub use crate::data::{DataTable, Keyed};
    pub use crate::intent::ClientIntent;
    pub use crate::session::{GameSession, Player, SessionEvent};
    pub use crate::snapshot::{AgentSnapshot, PlayerSnapshot, SessionSnapshot, SpawnerSnapshot};
    pub use horde_core::PlayerId;
}

pub use prelude::*;
