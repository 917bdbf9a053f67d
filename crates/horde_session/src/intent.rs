//! Client intents
//!
//! Requests arriving from remote players. The session revalidates each one
//! against authoritative state; anything that no longer applies is absorbed
//! with a debug log and no state change.

use crate::session::GameSession;
use horde_core::PlayerId;
use horde_quest::QuestContext;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientIntent {
    /// Single trigger pull
    Fire,
    /// Hold the trigger
    StartFiring,
    /// Release the trigger
    StopFiring,
    ToggleFireMode,
    Reload,
    /// Use whatever is within reach
    Interact,
}

impl GameSession {
    /// Apply an intent from `player`. Returns whether anything happened.
    pub fn apply_intent(&mut self, player: PlayerId, intent: ClientIntent) -> bool {
        let Some(index) = self.player_index(player) else {
            log::debug!("{:?} from unknown player {} absorbed", intent, player);
            return false;
        };
        if !self.players[index].is_alive() {
            log::debug!("{:?} from dead player {} absorbed", intent, player);
            return false;
        }

        let accepted = match intent {
            ClientIntent::Interact => self.interact(index),
            _ => self.weapon_intent(index, intent),
        };
        if !accepted {
            log::debug!("{:?} from player {} absorbed", intent, player);
        }
        accepted
    }

    fn weapon_intent(&mut self, index: usize, intent: ClientIntent) -> bool {
        let now = self.now;
        let player = &mut self.players[index];
        let shooter = player.shooter();
        let Some(weapon) = player.weapon.as_mut() else {
            return false;
        };

        let accepted = match intent {
            ClientIntent::Fire => weapon.server_fire(now, &shooter, &mut self.effects, &mut self.rng),
            ClientIntent::StartFiring => weapon.start_firing(now, &shooter, &mut self.effects, &mut self.rng),
            ClientIntent::StopFiring => {
                let was_firing = weapon.is_firing();
                weapon.stop_firing();
                was_firing && !weapon.is_firing()
            }
            ClientIntent::ToggleFireMode => {
                let before = weapon.fire_mode();
                weapon.toggle_fire_mode();
                weapon.fire_mode() != before
            }
            ClientIntent::Reload => weapon.begin_reload(now),
            ClientIntent::Interact => false,
        };
        self.collect_weapon_output(index);
        accepted
    }

    fn interact(&mut self, index: usize) -> bool {
        let view = self.players[index].view();
        let views = self.player_views();
        let (fired, picked) = {
            let mut ctx = QuestContext::new(&views, &mut self.ledger);
            let fired = self.triggers.interact(&view, &mut self.quests, &mut ctx);
            let picked = self.items.interact(&view, &mut self.quests, &mut ctx, &mut self.effects);
            (fired, picked)
        };
        self.process_quest_events();
        !fired.is_empty() || picked.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PlayerSetup, SessionConfig};
    use crate::data::DataTable;
    use horde_combat::{FireMode, FirearmDefinition};
    use horde_math::Vec3;

    fn session() -> GameSession {
        let weapons = DataTable::from_rows(vec![FirearmDefinition::new("rifle")
            .with_fire_modes(vec![FireMode::Single, FireMode::Full])
            .with_magazine_size(5)]);
        let config = SessionConfig::default().with_players(vec![
            PlayerSetup {
                weapon: Some("rifle".into()),
                ..Default::default()
            },
            PlayerSetup {
                location: Vec3::new(300.0, 0.0, 0.0),
                ..Default::default()
            },
        ]);
        GameSession::new(config, &DataTable::new(), weapons)
    }

    #[test]
    fn test_unknown_and_unarmed_players_absorbed() {
        let mut session = session();
        assert!(!session.apply_intent(PlayerId(9), ClientIntent::Fire));
        assert!(!session.apply_intent(PlayerId(2), ClientIntent::Fire));
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn test_fire_queues_projectile() {
        let mut session = session();
        assert!(session.apply_intent(PlayerId(1), ClientIntent::Fire));
        assert_eq!(session.projectiles.len(), 1);
        assert_eq!(session.players[0].weapon.as_ref().unwrap().loaded_ammo(), 4);
    }

    #[test]
    fn test_toggle_and_stop() {
        let mut session = session();
        assert!(session.apply_intent(PlayerId(1), ClientIntent::ToggleFireMode));
        assert_eq!(session.players[0].weapon.as_ref().unwrap().fire_mode(), FireMode::Full);

        assert!(!session.apply_intent(PlayerId(1), ClientIntent::StopFiring));
        assert!(session.apply_intent(PlayerId(1), ClientIntent::StartFiring));
        assert!(session.apply_intent(PlayerId(1), ClientIntent::StopFiring));
    }

    #[test]
    fn test_reload_rejected_with_full_magazine() {
        let mut session = session();
        assert!(!session.apply_intent(PlayerId(1), ClientIntent::Reload));
        session.apply_intent(PlayerId(1), ClientIntent::Fire);
        assert!(session.apply_intent(PlayerId(1), ClientIntent::Reload));
    }

    #[test]
    fn test_dead_player_absorbed() {
        let mut session = session();
        session.players[0].health.kill();
        assert!(!session.apply_intent(PlayerId(1), ClientIntent::Fire));
        assert!(session.projectiles.is_empty());
    }

    #[test]
    fn test_interact_with_nothing_nearby() {
        let mut session = session();
        assert!(!session.apply_intent(PlayerId(1), ClientIntent::Interact));
    }
}
