//! Built-in courtyard scenario and a scripted defender

use horde_combat::{FireMode, FirearmDefinition};
use horde_math::Vec3;
use horde_quest::{QuestData, QuestItem, QuestObjective};
use horde_session::prelude::*;
use horde_spawner::SpawnerConfig;

const KEY_LOCATION: Vec3 = Vec3::new(900.0, 400.0, 0.0);
const WALK_SPEED: f32 = 300.0;
const ENGAGE_RANGE: f32 = 2000.0;

/// Two spawners, a kill quest unlocking the basement, and a key hunt
pub fn courtyard(config: SessionConfig) -> (SessionConfig, DataTable<QuestData>, DataTable<FirearmDefinition>) {
    let quests = DataTable::from_rows(vec![
        QuestData::new("ClearCourtyard")
            .with_name("Clear the courtyard")
            .with_objective(QuestObjective::kill("kills", 5).with_completion_trigger("basement"))
            .with_follow_up("FindKey")
            .starts_on_level_begin(0.0),
        QuestData::new("FindKey")
            .with_name("Find the basement key")
            .with_objective(QuestObjective::collect("key", "Key_Red", 1))
            .with_rewards(1000, 250),
    ]);

    let weapons = DataTable::from_rows(vec![FirearmDefinition::new("rifle")
        .with_fire_rate(0.12)
        .with_fire_modes(vec![FireMode::Full, FireMode::Single])
        .with_magazine_size(30)]);

    let config = config
        .with_players(vec![
            PlayerSetup {
                weapon: Some("rifle".into()),
                ..Default::default()
            },
            PlayerSetup {
                location: Vec3::new(-200.0, 150.0, 0.0),
                ..Default::default()
            },
        ])
        .with_spawner(
            "courtyard",
            Vec3::new(1500.0, 0.0, 100.0),
            SpawnerConfig::default().with_exhaustion(8, 45.0),
        )
        .with_spawner(
            "basement",
            Vec3::new(1200.0, -1200.0, 100.0),
            SpawnerConfig {
                start_enabled: false,
                ..Default::default()
            },
        )
        .with_quest_item(QuestItem::new("Key_Red", KEY_LOCATION));

    (config, quests, weapons)
}

/// Holds position shooting the nearest zombie, then fetches the key
pub struct Defender {
    id: PlayerId,
    firing: bool,
}

impl Defender {
    pub fn new(id: PlayerId) -> Self {
        Self { id, firing: false }
    }

    pub fn act(&mut self, session: &mut GameSession) {
        let Some(player) = session.player(self.id) else {
            return;
        };
        if !player.is_alive() {
            return;
        }
        let location = player.location;
        let eye = player.view().eye_location;
        let facing = player.view_direction;
        let ammo = player.weapon.as_ref().map_or(0, |w| w.loaded_ammo());

        let mut next = location;
        if session.quests().is_quest_active("FindKey") {
            let step = WALK_SPEED * session.config().tick_interval;
            let to_key = KEY_LOCATION - location;
            next = if to_key.length() > step {
                location + to_key.normalize_or_zero() * step
            } else {
                KEY_LOCATION
            };
        }

        let body_height = session.config().combat.body_height;
        let target = session
            .ai()
            .agents()
            .filter(|(_, agent)| !agent.is_dead())
            .map(|(_, agent)| agent.location.offset_z(body_height))
            .min_by(|a, b| a.distance(eye).total_cmp(&b.distance(eye)));
        let aim = target.map_or(facing, |t| t - eye);
        session.set_player_transform(self.id, next, aim);

        if ammo == 0 {
            self.firing = false;
            session.apply_intent(self.id, ClientIntent::Reload);
            return;
        }

        match target {
            Some(t) if t.distance(eye) < ENGAGE_RANGE => {
                if !self.firing {
                    self.firing = session.apply_intent(self.id, ClientIntent::StartFiring);
                }
            }
            _ => {
                if self.firing {
                    session.apply_intent(self.id, ClientIntent::StopFiring);
                    self.firing = false;
                }
            }
        }
    }
}
