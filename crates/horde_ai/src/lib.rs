//! horde_ai - Zombie AI
//!
//! Server-side behavior for zombie agents.
//!
//! # Features
//!
//! - Six-state machine (Idle, Patrol, Alert, Chase, Attack, Staggered) with
//!   per-state walk speeds and constant-rate speed interpolation
//! - Sight perception with a single shared line-of-sight predicate
//! - Stagger and anger hit reactions, headshot and body kills with rewards
//! - Latent attack and investigate tasks advanced per tick
//! - A director that owns agents in a generation-checked arena and drives
//!   their timers from a fires-at table
//!
//! # Example
//!
//! ```ignore
//! use horde_ai::prelude::*;
//!
//! let mut ai = HordeAi::new(ZombieConfig::default());
//! let id = ai.spawn(SpawnParams::new("walker", spawn_point), now, &mut rng);
//!
//! let mut ctx = AiContext::new(&world, &players, &mut effects, &mut ledger, &mut rng);
//! ai.update(now, delta, &mut ctx);
//! for event in ai.drain_events() {
//!     // forward kills to spawners and quests
//! }
//! ```

pub mod agent;
pub mod config;
pub mod director;
pub mod navigation;
pub mod perception;
pub mod state_machine;
pub mod tasks;

pub mod prelude {
    pub use crate::agent::{AgentId, ZombieAgent};
    pub use crate::config::ZombieConfig;
    pub use crate::director::{AgentTimer, AiContext, AiEvent, HordeAi, SpawnParams};
    pub use crate::navigation::MoveStep;
    pub use crate::perception::{can_sense, has_line_of_sight};
    pub use crate::state_machine::{AIState, StateChange};
    pub use crate::tasks::{AgentTask, AttackTask, InvestigateTask, TaskStatus};
}

pub use prelude::*;
