//! Quest item pickups

use crate::manager::{QuestContext, QuestManager};
use horde_core::{Arena, Effect, EffectCue, Handle, PlayerView, Presentation};
use horde_math::Vec3;
use serde::{Deserialize, Serialize};

/// A collectible world item that feeds `CollectItem` objectives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestItem {
    pub item_id: String,
    pub count: u32,
    pub location: Vec3,
    /// Pickup radius
    pub radius: f32,
    /// Needs an interact press instead of walking over it
    pub require_interaction: bool,
    /// Only collectable while this quest is active
    pub required_active_quest: Option<String>,
    #[serde(skip)]
    picked_up: bool,
}

impl Default for QuestItem {
    fn default() -> Self {
        Self {
            item_id: String::new(),
            count: 1,
            location: Vec3::ZERO,
            radius: 50.0,
            require_interaction: false,
            required_active_quest: None,
            picked_up: false,
        }
    }
}

impl QuestItem {
    pub fn new(item_id: impl Into<String>, location: Vec3) -> Self {
        Self {
            item_id: item_id.into(),
            location,
            ..Default::default()
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count.max(1);
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_interaction(mut self) -> Self {
        self.require_interaction = true;
        self
    }

    pub fn requires_quest(mut self, quest_id: impl Into<String>) -> Self {
        self.required_active_quest = Some(quest_id.into());
        self
    }

    pub fn is_picked_up(&self) -> bool {
        self.picked_up
    }

    fn in_reach(&self, player: &PlayerView) -> bool {
        player.alive && player.location.distance(self.location) <= self.radius
    }

    fn can_pick_up(&self, quests: &QuestManager) -> bool {
        if self.picked_up {
            return false;
        }
        match &self.required_active_quest {
            Some(quest) => quests.is_quest_active(quest),
            None => true,
        }
    }
}

pub type ItemId = Handle<QuestItem>;

/// Quest items placed in the level
#[derive(Debug, Default)]
pub struct QuestItems {
    items: Arena<QuestItem>,
}

impl QuestItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, item: QuestItem) -> ItemId {
        self.items.insert(item)
    }

    pub fn get(&self, id: ItemId) -> Option<&QuestItem> {
        self.items.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ItemId, &QuestItem)> {
        self.items.iter()
    }

    /// Items still waiting in the world
    pub fn remaining(&self) -> usize {
        self.items.iter().filter(|(_, i)| !i.picked_up).count()
    }

    /// Collect walk-over items touched by living players
    pub fn update(
        &mut self,
        quests: &mut QuestManager,
        ctx: &mut QuestContext<'_>,
        fx: &mut dyn Presentation,
    ) -> Vec<ItemId> {
        let players = ctx.players;
        let mut collected = Vec::new();
        for (id, item) in self.items.iter_mut() {
            if item.require_interaction || !item.can_pick_up(quests) {
                continue;
            }
            if players.iter().any(|p| item.in_reach(p)) {
                pick_up(item, quests, ctx, fx);
                collected.push(id);
            }
        }
        collected
    }

    /// Interact press: collect the first reachable item
    pub fn interact(
        &mut self,
        player: &PlayerView,
        quests: &mut QuestManager,
        ctx: &mut QuestContext<'_>,
        fx: &mut dyn Presentation,
    ) -> Option<ItemId> {
        let (id, item) = self
            .items
            .iter_mut()
            .find(|(_, item)| item.in_reach(player) && item.can_pick_up(quests))?;
        pick_up(item, quests, ctx, fx);
        Some(id)
    }
}

fn pick_up(item: &mut QuestItem, quests: &mut QuestManager, ctx: &mut QuestContext<'_>, fx: &mut dyn Presentation) {
    item.picked_up = true;
    log::debug!("Picked up {} x{}", item.item_id, item.count);
    fx.play(EffectCue::new(Effect::Pickup, item.location));
    quests.report_item_collected(&item.item_id, item.count, ctx);
}
