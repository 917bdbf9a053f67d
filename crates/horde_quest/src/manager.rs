//! Quest manager: the single authority over quest progress in a match

use crate::config::QuestSettings;
use crate::events::QuestEvent;
use crate::types::{
    CompletionMode, ObjectiveState, ObjectiveType, QuestData, QuestObjective, QuestProgress, QuestState,
};
use horde_core::services::living_player_count;
use horde_core::{HordeError, PlayerView, PointKind, RewardLedger};
use std::collections::BTreeMap;

/// Frame data and services used when rewards may be paid out
pub struct QuestContext<'a> {
    pub players: &'a [PlayerView],
    pub rewards: &'a mut dyn RewardLedger,
}

impl<'a> QuestContext<'a> {
    pub fn new(players: &'a [PlayerView], rewards: &'a mut dyn RewardLedger) -> Self {
        Self { players, rewards }
    }

    /// Pay every living player
    fn award_all(&mut self, points: i32, money: i32) {
        if points <= 0 && money <= 0 {
            return;
        }
        for player in self.players.iter().filter(|p| p.alive) {
            if points > 0 {
                self.rewards.award_points(player.id, points, PointKind::Casual);
            }
            if money > 0 {
                self.rewards.award_money(player.id, money);
            }
        }
    }
}

#[derive(Debug, Clone)]
struct PendingStart {
    quest_id: String,
    starts_at: f64,
}

/// Tracks quest templates plus the active, completed and failed sets
#[derive(Debug, Default)]
pub struct QuestManager {
    settings: QuestSettings,
    /// Templates by id
    quests: BTreeMap<String, QuestData>,
    active: Vec<QuestData>,
    completed: Vec<String>,
    failed: Vec<String>,
    pending_starts: Vec<PendingStart>,
    level_init_at: Option<f64>,
    events: Vec<QuestEvent>,
}

impl QuestManager {
    pub fn new(settings: QuestSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    /// Register templates
    pub fn with_quests(mut self, quests: impl IntoIterator<Item = QuestData>) -> Self {
        for quest in quests {
            self.register_quest(quest);
        }
        self
    }

    /// Add a template. Templates without an id are ignored.
    pub fn register_quest(&mut self, quest: QuestData) -> bool {
        if quest.quest_id.is_empty() {
            log::warn!("Ignoring quest template without an id");
            return false;
        }
        if self.quests.contains_key(&quest.quest_id) {
            log::warn!("Quest '{}' registered twice, keeping the newer template", quest.quest_id);
        }
        self.quests.insert(quest.quest_id.clone(), quest);
        true
    }

    pub fn settings(&self) -> &QuestSettings {
        &self.settings
    }

    pub fn template(&self, quest_id: &str) -> Option<&QuestData> {
        self.quests.get(quest_id)
    }

    pub fn template_count(&self) -> usize {
        self.quests.len()
    }

    /// Take pending notifications
    pub fn drain_events(&mut self) -> Vec<QuestEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Schedule level quest initialisation after the auto-start delay
    pub fn begin_level(&mut self, now: f64) {
        self.level_init_at = Some(now + self.settings.auto_start_delay.max(0.0) as f64);
    }

    /// Advance timers and survive objectives
    pub fn update(&mut self, now: f64, delta: f32, ctx: &mut QuestContext<'_>) {
        if self.level_init_at.is_some_and(|at| at <= now) {
            self.level_init_at = None;
            self.initialize_level_quests(now);
        }

        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending_starts)
            .into_iter()
            .partition(|p| p.starts_at <= now);
        self.pending_starts = waiting;
        for pending in due {
            self.start_quest(&pending.quest_id);
        }

        self.update_quest_timers(delta);
        self.update_survive_objectives(delta, ctx);

        if !ctx.players.is_empty() && living_player_count(ctx.players) == 0 {
            let doomed: Vec<String> = self
                .active
                .iter()
                .filter(|q| q.can_fail && q.fail_on_all_players_dead)
                .map(|q| q.quest_id.clone())
                .collect();
            for quest_id in doomed {
                log::info!("All players dead, failing quest '{}'", quest_id);
                self.fail_quest(&quest_id);
            }
        }
    }

    fn initialize_level_quests(&mut self, now: f64) {
        let level_quests: Vec<(String, f32)> = self
            .quests
            .values()
            .filter(|q| q.start_on_level_begin)
            .map(|q| (q.quest_id.clone(), q.start_delay))
            .collect();

        for (quest_id, delay) in level_quests {
            if delay > 0.0 {
                self.pending_starts.push(PendingStart {
                    quest_id,
                    starts_at: now + delay as f64,
                });
            } else {
                self.start_quest(&quest_id);
            }
        }

        for quest_id in self.settings.auto_start_quests.clone() {
            if !self.is_quest_active(&quest_id) && !self.is_quest_completed(&quest_id) {
                self.start_quest(&quest_id);
            }
        }
    }

    fn update_quest_timers(&mut self, delta: f32) {
        let mut expired = Vec::new();
        for quest in &mut self.active {
            if quest.time_limit > 0.0 && quest.time_remaining > 0.0 {
                quest.time_remaining -= delta;
                if quest.time_remaining <= 0.0 {
                    quest.time_remaining = 0.0;
                    if quest.can_fail {
                        expired.push(quest.quest_id.clone());
                    }
                }
            }
        }
        for quest_id in expired {
            log::info!("Quest '{}' ran out of time", quest_id);
            self.fail_quest(&quest_id);
        }
    }

    fn update_survive_objectives(&mut self, delta: f32, ctx: &mut QuestContext<'_>) {
        let mut finished = Vec::new();
        for quest in &mut self.active {
            for (index, objective) in quest.objectives.iter_mut().enumerate() {
                if objective.objective_type != ObjectiveType::Survive || !objective.is_active() {
                    continue;
                }
                objective.time_remaining -= delta;
                if objective.time_remaining <= 0.0 {
                    objective.time_remaining = 0.0;
                    finished.push((quest.quest_id.clone(), index));
                }
            }
        }
        for (quest_id, index) in finished {
            self.complete_objective(&quest_id, index, ctx);
        }
    }

    // ------------------------------------------------------------------
    // Quest control
    // ------------------------------------------------------------------

    /// Whether `start_quest` would succeed
    pub fn can_start_quest(&self, quest_id: &str) -> bool {
        if self.is_quest_active(quest_id) || self.is_quest_completed(quest_id) {
            return false;
        }
        let Some(quest) = self.quests.get(quest_id) else {
            return false;
        };
        if let Some(prerequisite) = &quest.prerequisite_quest_id {
            if !self.is_quest_completed(prerequisite) {
                return false;
            }
        }
        if self.settings.allow_multiple_active {
            self.active.len() < self.settings.max_active_quests
        } else {
            self.active.is_empty()
        }
    }

    /// Copy the template into a new active instance
    pub fn start_quest(&mut self, quest_id: &str) -> bool {
        if !self.quests.contains_key(quest_id) {
            log::warn!("{}", HordeError::QuestNotFound(quest_id.to_string()));
            return false;
        }
        if !self.can_start_quest(quest_id) {
            log::debug!("Quest '{}' cannot start now", quest_id);
            return false;
        }
        let Some(template) = self.quests.get(quest_id) else {
            return false;
        };

        let mut quest = template.clone();
        quest.state = QuestState::Active;
        quest.time_remaining = quest.time_limit;
        for objective in &mut quest.objectives {
            objective.reset();
        }

        self.failed.retain(|id| id != quest_id);
        self.events.push(QuestEvent::QuestStateChanged {
            quest: quest_id.to_string(),
            state: QuestState::Active,
        });
        activate_initial_objectives(&mut quest, &mut self.events);
        self.active.push(quest);

        log::info!("Started quest '{}'", quest_id);
        true
    }

    /// Start the first template carrying `tag`
    pub fn trigger_quest_by_tag(&mut self, tag: &str) -> bool {
        let Some(quest_id) = self
            .quests
            .values()
            .find(|q| q.trigger_tag.as_deref() == Some(tag))
            .map(|q| q.quest_id.clone())
        else {
            log::debug!("No quest uses trigger tag '{}'", tag);
            return false;
        };
        self.start_quest(&quest_id)
    }

    /// Pay rewards, record completion and chain into the follow-up
    pub fn complete_quest(&mut self, quest_id: &str, ctx: &mut QuestContext<'_>) -> bool {
        let Some(index) = self.active_index(quest_id) else {
            log::debug!("complete_quest: '{}' is not active", quest_id);
            return false;
        };
        let mut quest = self.active.remove(index);
        quest.state = QuestState::Completed;

        ctx.award_all(quest.completion_points, quest.completion_money);
        if !quest.reward_items.is_empty() {
            self.events.push(QuestEvent::RewardItemsGranted {
                quest: quest.quest_id.clone(),
                items: quest.reward_items.clone(),
            });
        }
        if !self.completed.iter().any(|id| id == quest_id) {
            self.completed.push(quest.quest_id.clone());
        }
        self.events.push(QuestEvent::QuestStateChanged {
            quest: quest.quest_id.clone(),
            state: QuestState::Completed,
        });
        log::info!("Completed quest '{}'", quest_id);

        if quest.auto_start_follow_up {
            if let Some(follow_up) = &quest.follow_up_quest_id {
                self.start_quest(follow_up);
            }
        }
        true
    }

    /// Fail an active quest that is allowed to fail
    pub fn fail_quest(&mut self, quest_id: &str) -> bool {
        let Some(index) = self.active_index(quest_id) else {
            return false;
        };
        if !self.active[index].can_fail {
            log::debug!("Quest '{}' cannot fail", quest_id);
            return false;
        }
        self.active.remove(index);
        if !self.failed.iter().any(|id| id == quest_id) {
            self.failed.push(quest_id.to_string());
        }
        self.events.push(QuestEvent::QuestStateChanged {
            quest: quest_id.to_string(),
            state: QuestState::Failed,
        });
        log::info!("Failed quest '{}'", quest_id);
        true
    }

    /// Drop an active quest without recording an outcome
    pub fn abandon_quest(&mut self, quest_id: &str) -> bool {
        let Some(index) = self.active_index(quest_id) else {
            return false;
        };
        self.active.remove(index);
        self.events.push(QuestEvent::QuestStateChanged {
            quest: quest_id.to_string(),
            state: QuestState::Inactive,
        });
        log::info!("Abandoned quest '{}'", quest_id);
        true
    }

    // ------------------------------------------------------------------
    // Progress reports
    // ------------------------------------------------------------------

    pub fn report_location_reached(&mut self, tag: &str, ctx: &mut QuestContext<'_>) {
        self.report(1, ctx, |o| {
            o.objective_type == ObjectiveType::Location && o.target_tag.as_deref() == Some(tag)
        });
    }

    pub fn report_item_collected(&mut self, item_id: &str, count: u32, ctx: &mut QuestContext<'_>) {
        self.report(count, ctx, |o| {
            o.objective_type == ObjectiveType::CollectItem && o.target_item_id.as_deref() == Some(item_id)
        });
    }

    /// A zombie of `enemy_type` died
    pub fn report_enemy_killed(&mut self, enemy_type: &str, ctx: &mut QuestContext<'_>) {
        self.report(1, ctx, |o| match o.objective_type {
            ObjectiveType::KillEnemies => true,
            ObjectiveType::KillSpecificType => o.target_enemy_type.as_deref() == Some(enemy_type),
            _ => false,
        });
    }

    pub fn report_interaction(&mut self, tag: &str, ctx: &mut QuestContext<'_>) {
        self.report(1, ctx, |o| {
            o.objective_type == ObjectiveType::Interact && o.target_tag.as_deref() == Some(tag)
        });
    }

    /// Sequence objectives complete outright
    pub fn report_sequence_triggered(&mut self, tag: &str, ctx: &mut QuestContext<'_>) {
        let hits = self.matching_objectives(|o| {
            o.objective_type == ObjectiveType::TriggerSequence && o.target_tag.as_deref() == Some(tag)
        });
        for (quest_id, index) in hits {
            if !self.is_objective_active(&quest_id, index) {
                continue;
            }
            self.events.push(QuestEvent::SequenceTriggered {
                quest: quest_id.clone(),
                tag: tag.to_string(),
            });
            self.complete_objective(&quest_id, index, ctx);
        }
    }

    /// Free-form progress for any active objective, addressed by id
    pub fn report_custom_progress(
        &mut self,
        quest_id: &str,
        objective_id: &str,
        amount: u32,
        ctx: &mut QuestContext<'_>,
    ) {
        let Some(index) = self.resolve_objective(quest_id, objective_id) else {
            return;
        };
        self.add_progress(quest_id, index, amount, ctx);
    }

    /// Complete an objective regardless of its progress
    pub fn force_complete_objective(&mut self, quest_id: &str, objective_id: &str, ctx: &mut QuestContext<'_>) {
        let Some(index) = self.resolve_objective(quest_id, objective_id) else {
            return;
        };
        self.complete_objective(quest_id, index, ctx);
    }

    fn resolve_objective(&self, quest_id: &str, objective_id: &str) -> Option<usize> {
        let Some(quest) = self.active_quest_by_id(quest_id) else {
            log::debug!("Quest '{}' is not active", quest_id);
            return None;
        };
        let index = quest.objective_index(objective_id);
        if index.is_none() {
            log::warn!(
                "{}",
                HordeError::ObjectiveNotFound {
                    quest: quest_id.to_string(),
                    objective: objective_id.to_string(),
                }
            );
        }
        index
    }

    /// Active objectives across all active quests matching the predicate
    fn matching_objectives(&self, predicate: impl Fn(&QuestObjective) -> bool) -> Vec<(String, usize)> {
        self.active
            .iter()
            .flat_map(|quest| {
                quest
                    .objectives
                    .iter()
                    .enumerate()
                    .filter(|(_, o)| o.is_active() && predicate(o))
                    .map(move |(index, _)| (quest.quest_id.clone(), index))
            })
            .collect()
    }

    fn report(&mut self, amount: u32, ctx: &mut QuestContext<'_>, predicate: impl Fn(&QuestObjective) -> bool) {
        for (quest_id, index) in self.matching_objectives(predicate) {
            self.add_progress(&quest_id, index, amount, ctx);
        }
    }

    fn is_objective_active(&self, quest_id: &str, index: usize) -> bool {
        self.active_quest_by_id(quest_id)
            .and_then(|q| q.objectives.get(index))
            .is_some_and(|o| o.is_active())
    }

    fn add_progress(&mut self, quest_id: &str, index: usize, amount: u32, ctx: &mut QuestContext<'_>) {
        let Some(quest_index) = self.active_index(quest_id) else {
            return;
        };
        let Some(objective) = self.active[quest_index].objectives.get_mut(index) else {
            return;
        };
        if !objective.is_active() {
            return;
        }

        objective.current_count = objective
            .current_count
            .saturating_add(amount)
            .min(objective.target_count);
        let (current, target) = (objective.current_count, objective.target_count);
        let objective_id = objective.objective_id.clone();

        if current >= target {
            self.complete_objective(quest_id, index, ctx);
        } else {
            log::debug!("Quest '{}' objective '{}' at {}/{}", quest_id, objective_id, current, target);
            self.events.push(QuestEvent::ObjectiveProgress {
                quest: quest_id.to_string(),
                objective: objective_id,
                current,
                target,
            });
        }
    }

    fn complete_objective(&mut self, quest_id: &str, index: usize, ctx: &mut QuestContext<'_>) {
        let Some(quest_index) = self.active_index(quest_id) else {
            return;
        };
        let quest = &mut self.active[quest_index];
        let sequential = quest.completion_mode == CompletionMode::SequentialObjectives;
        let Some(objective) = quest.objectives.get_mut(index) else {
            return;
        };
        if objective.is_completed() {
            return;
        }

        objective.current_count = objective.target_count;
        objective.state = ObjectiveState::Completed;
        objective.time_remaining = 0.0;
        let objective_id = objective.objective_id.clone();
        let (points, money) = (objective.points_reward, objective.money_reward);
        let trigger = objective.completion_trigger_tag.clone();

        log::debug!("Quest '{}' objective '{}' completed", quest_id, objective_id);
        self.events.push(QuestEvent::ObjectiveStateChanged {
            quest: quest_id.to_string(),
            objective: objective_id,
            state: ObjectiveState::Completed,
        });
        ctx.award_all(points, money);
        if let Some(tag) = trigger {
            self.events.push(QuestEvent::CompletionTrigger { tag });
        }
        if sequential {
            advance_to_next_objective(&mut self.active[quest_index], &mut self.events);
        }

        if self.active[quest_index].is_satisfied() {
            self.complete_quest(quest_id, ctx);
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    fn active_index(&self, quest_id: &str) -> Option<usize> {
        self.active.iter().position(|q| q.quest_id == quest_id)
    }

    fn active_quest_by_id(&self, quest_id: &str) -> Option<&QuestData> {
        self.active.iter().find(|q| q.quest_id == quest_id)
    }

    /// The first active quest
    pub fn active_quest(&self) -> Option<&QuestData> {
        self.active.first()
    }

    pub fn active_quests(&self) -> &[QuestData] {
        &self.active
    }

    /// Active instance if running, otherwise the template
    pub fn quest_by_id(&self, quest_id: &str) -> Option<&QuestData> {
        self.active_quest_by_id(quest_id)
            .or_else(|| self.quests.get(quest_id))
    }

    pub fn is_quest_active(&self, quest_id: &str) -> bool {
        self.active_index(quest_id).is_some()
    }

    pub fn is_quest_completed(&self, quest_id: &str) -> bool {
        self.completed.iter().any(|id| id == quest_id)
    }

    pub fn is_quest_failed(&self, quest_id: &str) -> bool {
        self.failed.iter().any(|id| id == quest_id)
    }

    pub fn quest_state(&self, quest_id: &str) -> QuestState {
        if let Some(quest) = self.active_quest_by_id(quest_id) {
            quest.state
        } else if self.is_quest_completed(quest_id) {
            QuestState::Completed
        } else if self.is_quest_failed(quest_id) {
            QuestState::Failed
        } else {
            QuestState::Inactive
        }
    }

    /// First tracking objective of an active quest
    pub fn current_objective(&self, quest_id: &str) -> Option<&QuestObjective> {
        self.active_quest_by_id(quest_id)?.current_objective()
    }

    pub fn completed_quest_ids(&self) -> &[String] {
        &self.completed
    }

    pub fn failed_quest_ids(&self) -> &[String] {
        &self.failed
    }

    /// Compact progress of every active quest
    pub fn progress_snapshot(&self) -> Vec<QuestProgress> {
        self.active.iter().map(QuestProgress::from).collect()
    }
}

fn activate_initial_objectives(quest: &mut QuestData, events: &mut Vec<QuestEvent>) {
    let count = match quest.completion_mode {
        CompletionMode::SequentialObjectives => 1,
        _ => quest.objectives.len(),
    };
    for objective in quest.objectives.iter_mut().take(count) {
        objective.state = ObjectiveState::Active;
        events.push(QuestEvent::ObjectiveStateChanged {
            quest: quest.quest_id.clone(),
            objective: objective.objective_id.clone(),
            state: ObjectiveState::Active,
        });
    }
}

/// Promote the first locked objective, keeping at most one active
fn advance_to_next_objective(quest: &mut QuestData, events: &mut Vec<QuestEvent>) {
    if quest.objectives.iter().any(|o| o.is_active()) {
        return;
    }
    if let Some(next) = quest
        .objectives
        .iter_mut()
        .find(|o| o.state == ObjectiveState::Locked)
    {
        next.state = ObjectiveState::Active;
        events.push(QuestEvent::ObjectiveStateChanged {
            quest: quest.quest_id.clone(),
            objective: next.objective_id.clone(),
            state: ObjectiveState::Active,
        });
    }
}
