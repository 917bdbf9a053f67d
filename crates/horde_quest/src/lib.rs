//! horde_quest - Quest and Objective Tracking
//!
//! Server-side mission state for a match.
//!
//! # Features
//!
//! - Quest templates copied into active instances on start
//! - All / any / sequential completion modes with optional objectives
//! - Progress reports matched across every active quest
//! - Survive objectives and quest time limits
//! - Follow-up chaining, prerequisites and level-begin auto start
//! - Trigger volumes and item pickups that drive progress
//!
//! # Example
//!
//! ```ignore
//! use horde_quest::prelude::*;
//!
//! let mut quests = QuestManager::new(QuestSettings::default()).with_quests(templates);
//! quests.start_quest("FindKey");
//!
//! let mut ctx = QuestContext::new(&players, &mut ledger);
//! quests.report_item_collected("Key_Red", 1, &mut ctx);
//! for event in quests.drain_events() {
//!     // forward to observers
//! }
//! ```

pub mod config;
pub mod events;
pub mod manager;
pub mod pickups;
pub mod trigger;
pub mod types;

pub mod prelude {
    pub use crate::config::QuestSettings;
    pub use crate::events::QuestEvent;
    pub use crate::manager::{QuestContext, QuestManager};
    pub use crate::pickups::{ItemId, QuestItem, QuestItems};
    pub use crate::trigger::{QuestTrigger, QuestTriggers, TriggerAction, TriggerId, TriggerMode};
    pub use crate::types::{
        CompletionMode, ObjectiveState, ObjectiveType, QuestData, QuestObjective, QuestProgress, QuestState,
    };
}

pub use prelude::*;
