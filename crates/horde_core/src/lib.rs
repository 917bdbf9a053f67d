//! # horde_core - Shared Gameplay Primitives
//!
//! Foundation for the authoritative horde simulation:
//! - **Handles**: generation-checked indices into an [`Arena`]
//! - **Timers**: fires-at timer table replacing engine timer handles
//! - **Services**: contracts for spatial queries, static data, presentation
//!   and reward accounting supplied by the surrounding engine
//! - **Errors**: the shared [`HordeError`] type
//!
//! # Example
//!
//! ```ignore
//! use horde_core::prelude::*;
//!
//! let mut timers = TimerTable::new();
//! timers.schedule("lose_sight", now, 8.0);
//! for key in timers.drain_due(now + 8.0) {
//!     // handle expiry
//! }
//! ```

pub mod error;
pub mod geometry;
pub mod handle;
pub mod id;
pub mod random;
pub mod schedule;
pub mod services;

pub mod prelude {
    pub use crate::error::{HordeError, Result};
    pub use crate::geometry::BoxWorld;
    pub use crate::handle::{Arena, Handle};
    pub use crate::id::PlayerId;
    pub use crate::random::RandomRange;
    pub use crate::schedule::{Timer, TimerTable};
    pub use crate::services::{
        Account, Effect, EffectCue, EffectLog, PlayerView, PointKind, PointsLedger, Presentation,
        RewardLedger, SpatialQuery, StaticData, TraceHit,
    };
}

pub use prelude::*;
