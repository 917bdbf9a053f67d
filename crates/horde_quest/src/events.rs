//! Quest notifications, delivered in the order the transitions happened

use crate::types::{ObjectiveState, QuestState};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QuestEvent {
    QuestStateChanged {
        quest: String,
        state: QuestState,
    },
    ObjectiveStateChanged {
        quest: String,
        objective: String,
        state: ObjectiveState,
    },
    /// Progress moved without completing the objective
    ObjectiveProgress {
        quest: String,
        objective: String,
        current: u32,
        target: u32,
    },
    /// A completed objective asks tagged world objects to react
    CompletionTrigger { tag: String },
    /// A sequence objective fired its level sequence
    SequenceTriggered { quest: String, tag: String },
    /// Item rewards handed out on quest completion
    RewardItemsGranted { quest: String, items: Vec<String> },
}

impl QuestEvent {
    /// Quest the event concerns, if any
    pub fn quest(&self) -> Option<&str> {
        match self {
            Self::QuestStateChanged { quest, .. }
            | Self::ObjectiveStateChanged { quest, .. }
            | Self::ObjectiveProgress { quest, .. }
            | Self::SequenceTriggered { quest, .. }
            | Self::RewardItemsGranted { quest, .. } => Some(quest),
            Self::CompletionTrigger { .. } => None,
        }
    }
}
