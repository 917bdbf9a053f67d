//! Quest manager settings

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestSettings {
    /// Allow more than one quest to run at once
    pub allow_multiple_active: bool,
    /// Cap on concurrent quests when multiple are allowed
    pub max_active_quests: usize,
    /// Quests started when the level begins
    pub auto_start_quests: Vec<String>,
    /// Delay between level begin and level quest initialisation
    pub auto_start_delay: f32,
}

impl Default for QuestSettings {
    fn default() -> Self {
        Self {
            allow_multiple_active: false,
            max_active_quests: 3,
            auto_start_quests: Vec::new(),
            auto_start_delay: 1.0,
        }
    }
}

impl QuestSettings {
    pub fn with_multiple_active(mut self, max: usize) -> Self {
        self.allow_multiple_active = true;
        self.max_active_quests = max;
        self
    }

    pub fn with_auto_start(mut self, quest_id: impl Into<String>) -> Self {
        self.auto_start_quests.push(quest_id.into());
        self
    }
}
