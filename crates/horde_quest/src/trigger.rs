//! Quest trigger volumes
//!
//! Box volumes that start quests or report progress when players walk in,
//! interact with them, or when gameplay code fires them directly.

use crate::manager::{QuestContext, QuestManager};
use horde_core::{Arena, Handle, PlayerId, PlayerView};
use horde_math::Aabb;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// How a trigger is set off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriggerMode {
    /// A living player enters the volume
    OnOverlap,
    /// A player inside the volume interacts
    OnInteract,
    /// Only gameplay code fires it
    OnExternalCall,
    /// Every living player stands inside
    OnAllPlayersInside,
}

impl Default for TriggerMode {
    fn default() -> Self {
        Self::OnOverlap
    }
}

/// Work performed when a trigger fires, in declaration order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TriggerAction {
    StartQuest(String),
    StartQuestByTag(String),
    CompleteObjective { quest: String, objective: String },
    ReportLocation(String),
    ReportInteraction(String),
    ReportSequence(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestTrigger {
    pub name: String,
    /// Tag used by completion triggers to enable this volume
    pub tag: Option<String>,
    pub bounds: Aabb,
    pub mode: TriggerMode,
    pub actions: Vec<TriggerAction>,
    /// Disable after the first firing
    pub one_shot: bool,
    pub enabled: bool,
    pub required_active_quest: Option<String>,
    pub required_completed_quest: Option<String>,
    #[serde(skip)]
    has_triggered: bool,
    #[serde(skip)]
    players_inside: BTreeSet<PlayerId>,
}

impl Default for QuestTrigger {
    fn default() -> Self {
        Self {
            name: String::new(),
            tag: None,
            bounds: Aabb::new(horde_math::Vec3::ZERO, horde_math::Vec3::ZERO),
            mode: TriggerMode::default(),
            actions: Vec::new(),
            one_shot: true,
            enabled: true,
            required_active_quest: None,
            required_completed_quest: None,
            has_triggered: false,
            players_inside: BTreeSet::new(),
        }
    }
}

impl QuestTrigger {
    pub fn new(name: impl Into<String>, bounds: Aabb) -> Self {
        Self {
            name: name.into(),
            bounds,
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: TriggerMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_action(mut self, action: TriggerAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn repeatable(mut self) -> Self {
        self.one_shot = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn requires_active(mut self, quest_id: impl Into<String>) -> Self {
        self.required_active_quest = Some(quest_id.into());
        self
    }

    pub fn requires_completed(mut self, quest_id: impl Into<String>) -> Self {
        self.required_completed_quest = Some(quest_id.into());
        self
    }

    pub fn has_triggered(&self) -> bool {
        self.has_triggered
    }

    pub fn players_inside(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players_inside.iter().copied()
    }

    fn requirements_met(&self, quests: &QuestManager) -> bool {
        if let Some(quest) = &self.required_active_quest {
            if !quests.is_quest_active(quest) {
                return false;
            }
        }
        if let Some(quest) = &self.required_completed_quest {
            if !quests.is_quest_completed(quest) {
                return false;
            }
        }
        true
    }

    fn can_fire(&self, quests: &QuestManager) -> bool {
        self.enabled && !(self.one_shot && self.has_triggered) && self.requirements_met(quests)
    }

    fn fire(&mut self, quests: &mut QuestManager, ctx: &mut QuestContext<'_>) -> bool {
        if !self.can_fire(quests) {
            return false;
        }
        log::debug!("Quest trigger '{}' fired", self.name);
        for action in &self.actions {
            match action {
                TriggerAction::StartQuest(quest) => {
                    quests.start_quest(quest);
                }
                TriggerAction::StartQuestByTag(tag) => {
                    quests.trigger_quest_by_tag(tag);
                }
                TriggerAction::CompleteObjective { quest, objective } => {
                    quests.force_complete_objective(quest, objective, ctx)
                }
                TriggerAction::ReportLocation(tag) => quests.report_location_reached(tag, ctx),
                TriggerAction::ReportInteraction(tag) => quests.report_interaction(tag, ctx),
                TriggerAction::ReportSequence(tag) => quests.report_sequence_triggered(tag, ctx),
            }
        }
        self.has_triggered = true;
        if self.one_shot {
            self.enabled = false;
        }
        true
    }
}

pub type TriggerId = Handle<QuestTrigger>;

/// All quest triggers in the level
#[derive(Debug, Default)]
pub struct QuestTriggers {
    triggers: Arena<QuestTrigger>,
}

impl QuestTriggers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, trigger: QuestTrigger) -> TriggerId {
        self.triggers.insert(trigger)
    }

    pub fn remove(&mut self, id: TriggerId) -> Option<QuestTrigger> {
        self.triggers.remove(id)
    }

    pub fn get(&self, id: TriggerId) -> Option<&QuestTrigger> {
        self.triggers.get(id)
    }

    pub fn find(&self, name: &str) -> Option<TriggerId> {
        self.triggers
            .iter()
            .find(|(_, t)| t.name == name)
            .map(|(id, _)| id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TriggerId, &QuestTrigger)> {
        self.triggers.iter()
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Track living players entering and leaving each volume. Returns the
    /// triggers that fired.
    pub fn update(&mut self, quests: &mut QuestManager, ctx: &mut QuestContext<'_>) -> Vec<TriggerId> {
        let players: &[PlayerView] = ctx.players;
        let living = players.iter().filter(|p| p.alive).count();
        let mut fired = Vec::new();

        for (id, trigger) in self.triggers.iter_mut() {
            let inside: BTreeSet<PlayerId> = players
                .iter()
                .filter(|p| p.alive && trigger.bounds.contains_point(p.location))
                .map(|p| p.id)
                .collect();
            let entered = inside.difference(&trigger.players_inside).count();
            trigger.players_inside = inside;

            // The all-inside condition is re-checked every tick until it fires,
            // so deaths and late enabling can satisfy it without a new entry
            let should_fire = match trigger.mode {
                TriggerMode::OnOverlap => entered > 0,
                TriggerMode::OnAllPlayersInside => {
                    trigger.enabled
                        && !trigger.has_triggered
                        && living > 0
                        && trigger.players_inside.len() >= living
                }
                TriggerMode::OnInteract | TriggerMode::OnExternalCall => false,
            };
            if should_fire && trigger.fire(quests, ctx) {
                fired.push(id);
            }
        }
        fired
    }

    /// A player pressed interact. Fires every interact trigger containing them.
    pub fn interact(
        &mut self,
        player: &PlayerView,
        quests: &mut QuestManager,
        ctx: &mut QuestContext<'_>,
    ) -> Vec<TriggerId> {
        if !player.alive {
            return Vec::new();
        }
        let mut fired = Vec::new();
        for (id, trigger) in self.triggers.iter_mut() {
            if trigger.mode == TriggerMode::OnInteract
                && trigger.bounds.contains_point(player.location)
                && trigger.fire(quests, ctx)
            {
                fired.push(id);
            }
        }
        fired
    }

    /// Fire a trigger from gameplay code, regardless of its mode
    pub fn activate(&mut self, id: TriggerId, quests: &mut QuestManager, ctx: &mut QuestContext<'_>) -> bool {
        match self.triggers.get_mut(id) {
            Some(trigger) => trigger.fire(quests, ctx),
            None => false,
        }
    }

    pub fn set_enabled(&mut self, id: TriggerId, enabled: bool) -> bool {
        match self.triggers.get_mut(id) {
            Some(trigger) => {
                trigger.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Enable every trigger carrying `tag`. Returns how many matched.
    pub fn enable_tagged(&mut self, tag: &str) -> usize {
        let mut count = 0;
        for (_, trigger) in self.triggers.iter_mut() {
            if trigger.tag.as_deref() == Some(tag) {
                trigger.enabled = true;
                count += 1;
            }
        }
        if count > 0 {
            log::debug!("Enabled {} quest trigger(s) tagged '{}'", count, tag);
        }
        count
    }
}
