//! Quest and objective data
//!
//! A [`QuestData`] doubles as the read-only template loaded from static data
//! and, once started, as the active instance carrying runtime progress.

use serde::{Deserialize, Serialize};

/// What an objective measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectiveType {
    /// Reach a tagged location
    Location,
    /// Pick up quest items
    CollectItem,
    /// Kill any zombies
    KillEnemies,
    /// Kill zombies of one enemy type
    KillSpecificType,
    /// Use a tagged interactable
    Interact,
    /// Stay alive for a duration
    Survive,
    /// Keep something alive, progressed through custom reports
    Escort,
    /// Fire a level sequence
    TriggerSequence,
    /// Progressed through custom reports
    Custom,
}

impl Default for ObjectiveType {
    fn default() -> Self {
        Self::Location
    }
}

/// Lifecycle of a quest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestState {
    Inactive,
    Active,
    Completed,
    Failed,
}

impl Default for QuestState {
    fn default() -> Self {
        Self::Inactive
    }
}

/// Lifecycle of an objective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectiveState {
    /// Waiting for an earlier objective
    Locked,
    /// Tracking progress
    Active,
    Completed,
    Failed,
}

impl Default for ObjectiveState {
    fn default() -> Self {
        Self::Locked
    }
}

/// How objectives combine into quest completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompletionMode {
    /// Every required objective, all tracked at once
    AllObjectives,
    /// Any one required objective
    AnyObjective,
    /// Every required objective, one at a time in order
    SequentialObjectives,
}

impl Default for CompletionMode {
    fn default() -> Self {
        Self::AllObjectives
    }
}

/// One measurable step of a quest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestObjective {
    pub objective_id: String,
    pub display_name: String,
    pub description: String,
    pub objective_type: ObjectiveType,
    /// Optional objectives never block completion
    pub optional: bool,
    pub hidden_until_active: bool,

    pub target_count: u32,
    /// Location, interactable or sequence tag
    pub target_tag: Option<String>,
    pub target_item_id: Option<String>,
    pub target_enemy_type: Option<String>,
    /// Seconds to survive for `Survive` objectives
    pub survive_duration: f32,

    pub points_reward: i32,
    pub money_reward: i32,
    /// World tag notified when the objective completes
    pub completion_trigger_tag: Option<String>,

    pub current_count: u32,
    pub state: ObjectiveState,
    pub time_remaining: f32,
}

impl Default for QuestObjective {
    fn default() -> Self {
        Self {
            objective_id: String::new(),
            display_name: String::new(),
            description: String::new(),
            objective_type: ObjectiveType::Location,
            optional: false,
            hidden_until_active: false,
            target_count: 1,
            target_tag: None,
            target_item_id: None,
            target_enemy_type: None,
            survive_duration: 60.0,
            points_reward: 0,
            money_reward: 0,
            completion_trigger_tag: None,
            current_count: 0,
            state: ObjectiveState::Locked,
            time_remaining: 0.0,
        }
    }
}

impl QuestObjective {
    pub fn new(id: impl Into<String>, objective_type: ObjectiveType) -> Self {
        Self {
            objective_id: id.into(),
            objective_type,
            ..Default::default()
        }
    }

    /// Reach the tagged location `count` times
    pub fn location(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::new(id, ObjectiveType::Location).with_target_tag(tag)
    }

    /// Collect `count` of an item
    pub fn collect(id: impl Into<String>, item: impl Into<String>, count: u32) -> Self {
        let mut objective = Self::new(id, ObjectiveType::CollectItem).with_target_count(count);
        objective.target_item_id = Some(item.into());
        objective
    }

    /// Kill `count` zombies of any type
    pub fn kill(id: impl Into<String>, count: u32) -> Self {
        Self::new(id, ObjectiveType::KillEnemies).with_target_count(count)
    }

    /// Kill `count` zombies of one type
    pub fn kill_type(id: impl Into<String>, enemy_type: impl Into<String>, count: u32) -> Self {
        let mut objective = Self::new(id, ObjectiveType::KillSpecificType).with_target_count(count);
        objective.target_enemy_type = Some(enemy_type.into());
        objective
    }

    /// Use the tagged interactable
    pub fn interact(id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::new(id, ObjectiveType::Interact).with_target_tag(tag)
    }

    /// Stay alive for `seconds`
    pub fn survive(id: impl Into<String>, seconds: f32) -> Self {
        let mut objective = Self::new(id, ObjectiveType::Survive);
        objective.survive_duration = seconds;
        objective
    }

    pub fn with_target_count(mut self, count: u32) -> Self {
        self.target_count = count;
        self
    }

    pub fn with_target_tag(mut self, tag: impl Into<String>) -> Self {
        self.target_tag = Some(tag.into());
        self
    }

    pub fn with_rewards(mut self, points: i32, money: i32) -> Self {
        self.points_reward = points;
        self.money_reward = money;
        self
    }

    pub fn with_completion_trigger(mut self, tag: impl Into<String>) -> Self {
        self.completion_trigger_tag = Some(tag.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn hidden_until_active(mut self) -> Self {
        self.hidden_until_active = true;
        self
    }

    pub fn is_active(&self) -> bool {
        self.state == ObjectiveState::Active
    }

    pub fn is_completed(&self) -> bool {
        self.state == ObjectiveState::Completed
    }

    /// Whether observers should see this objective
    pub fn is_visible(&self) -> bool {
        !self.hidden_until_active || self.state != ObjectiveState::Locked
    }

    /// Progress in `[0, 1]`
    pub fn progress_fraction(&self) -> f32 {
        if self.target_count == 0 {
            return if self.is_completed() { 1.0 } else { 0.0 };
        }
        (self.current_count as f32 / self.target_count as f32).min(1.0)
    }

    /// Clear runtime fields for a fresh start
    pub(crate) fn reset(&mut self) {
        self.current_count = 0;
        self.state = ObjectiveState::Locked;
        self.time_remaining = if self.objective_type == ObjectiveType::Survive {
            self.survive_duration
        } else {
            0.0
        };
    }
}

/// Quest template and active instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestData {
    pub quest_id: String,
    pub name: String,
    pub description: String,
    pub short_description: String,
    pub objectives: Vec<QuestObjective>,
    pub completion_mode: CompletionMode,

    // Chain
    pub follow_up_quest_id: Option<String>,
    pub auto_start_follow_up: bool,
    pub prerequisite_quest_id: Option<String>,

    // Start triggers
    pub start_on_level_begin: bool,
    pub start_delay: f32,
    pub trigger_tag: Option<String>,

    // Rewards
    pub completion_points: i32,
    pub completion_money: i32,
    pub reward_items: Vec<String>,

    // Failure
    pub can_fail: bool,
    pub fail_on_all_players_dead: bool,
    /// Seconds allowed; zero for no limit
    pub time_limit: f32,

    pub state: QuestState,
    pub time_remaining: f32,
}

impl Default for QuestData {
    fn default() -> Self {
        Self {
            quest_id: String::new(),
            name: String::new(),
            description: String::new(),
            short_description: String::new(),
            objectives: Vec::new(),
            completion_mode: CompletionMode::AllObjectives,
            follow_up_quest_id: None,
            auto_start_follow_up: true,
            prerequisite_quest_id: None,
            start_on_level_begin: false,
            start_delay: 0.0,
            trigger_tag: None,
            completion_points: 500,
            completion_money: 0,
            reward_items: Vec::new(),
            can_fail: false,
            fail_on_all_players_dead: true,
            time_limit: 0.0,
            state: QuestState::Inactive,
            time_remaining: 0.0,
        }
    }
}

impl QuestData {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            quest_id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_objective(mut self, objective: QuestObjective) -> Self {
        self.objectives.push(objective);
        self
    }

    pub fn with_mode(mut self, mode: CompletionMode) -> Self {
        self.completion_mode = mode;
        self
    }

    pub fn with_follow_up(mut self, quest_id: impl Into<String>) -> Self {
        self.follow_up_quest_id = Some(quest_id.into());
        self
    }

    pub fn with_prerequisite(mut self, quest_id: impl Into<String>) -> Self {
        self.prerequisite_quest_id = Some(quest_id.into());
        self
    }

    pub fn with_trigger_tag(mut self, tag: impl Into<String>) -> Self {
        self.trigger_tag = Some(tag.into());
        self
    }

    pub fn with_rewards(mut self, points: i32, money: i32) -> Self {
        self.completion_points = points;
        self.completion_money = money;
        self
    }

    pub fn with_reward_item(mut self, item: impl Into<String>) -> Self {
        self.reward_items.push(item.into());
        self
    }

    /// Allow failure with an optional time limit (zero for none)
    pub fn failable(mut self, time_limit: f32) -> Self {
        self.can_fail = true;
        self.time_limit = time_limit;
        self
    }

    pub fn starts_on_level_begin(mut self, delay: f32) -> Self {
        self.start_on_level_begin = true;
        self.start_delay = delay;
        self
    }

    /// First objective currently tracking
    pub fn current_objective(&self) -> Option<&QuestObjective> {
        self.objectives.iter().find(|o| o.is_active())
    }

    pub fn objective(&self, objective_id: &str) -> Option<&QuestObjective> {
        self.objectives.iter().find(|o| o.objective_id == objective_id)
    }

    pub(crate) fn objective_index(&self, objective_id: &str) -> Option<usize> {
        self.objectives.iter().position(|o| o.objective_id == objective_id)
    }

    pub fn all_required_complete(&self) -> bool {
        self.objectives
            .iter()
            .all(|o| o.optional || o.is_completed())
    }

    pub fn any_required_complete(&self) -> bool {
        self.objectives
            .iter()
            .any(|o| !o.optional && o.is_completed())
    }

    /// Whether the objectives satisfy the completion mode
    pub fn is_satisfied(&self) -> bool {
        match self.completion_mode {
            CompletionMode::AllObjectives | CompletionMode::SequentialObjectives => {
                self.all_required_complete()
            }
            CompletionMode::AnyObjective => self.any_required_complete(),
        }
    }
}

/// Compact per-quest progress for observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestProgress {
    pub quest_id: String,
    pub state: QuestState,
    pub time_remaining: f32,
    pub objective_progress: Vec<u32>,
    pub objective_states: Vec<ObjectiveState>,
}

impl From<&QuestData> for QuestProgress {
    fn from(quest: &QuestData) -> Self {
        Self {
            quest_id: quest.quest_id.clone(),
            state: quest.state,
            time_remaining: quest.time_remaining,
            objective_progress: quest.objectives.iter().map(|o| o.current_count).collect(),
            objective_states: quest.objectives.iter().map(|o| o.state).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_defaults() {
        let quest = QuestData::new("FindKey");
        assert_eq!(quest.completion_points, 500);
        assert!(quest.auto_start_follow_up);
        assert!(!quest.can_fail);
        assert_eq!(quest.state, QuestState::Inactive);

        let objective = QuestObjective::new("o", ObjectiveType::Survive);
        assert_eq!(objective.target_count, 1);
        assert_eq!(objective.survive_duration, 60.0);
    }

    #[test]
    fn test_completion_predicates_skip_optional() {
        let mut quest = QuestData::new("q")
            .with_objective(QuestObjective::kill("a", 1))
            .with_objective(QuestObjective::kill("b", 1).optional());

        assert!(!quest.is_satisfied());
        quest.objectives[0].state = ObjectiveState::Completed;
        assert!(quest.is_satisfied());

        quest.completion_mode = CompletionMode::AnyObjective;
        quest.objectives[0].state = ObjectiveState::Active;
        quest.objectives[1].state = ObjectiveState::Completed;
        assert!(!quest.is_satisfied());
    }

    #[test]
    fn test_hidden_objective_visibility() {
        let mut objective = QuestObjective::kill("a", 3).hidden_until_active();
        assert!(!objective.is_visible());
        objective.state = ObjectiveState::Active;
        assert!(objective.is_visible());
    }

    #[test]
    fn test_template_from_json() {
        let quest: QuestData = serde_json::from_str(
            r#"{
                "quest_id": "FindKey",
                "objectives": [
                    { "objective_id": "key", "objective_type": "CollectItem", "target_item_id": "key" }
                ],
                "follow_up_quest_id": "OpenDoor"
            }"#,
        )
        .unwrap();

        assert_eq!(quest.objectives.len(), 1);
        assert_eq!(quest.objectives[0].target_count, 1);
        assert_eq!(quest.follow_up_quest_id.as_deref(), Some("OpenDoor"));
        assert_eq!(quest.completion_mode, CompletionMode::AllObjectives);
    }
}
