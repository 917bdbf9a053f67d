//! Zombie state machine
//!
//! ```text
//! Patrol/Alert/Idle --sighted--> Chase --in range--> Attack --resolved--> Chase
//! Chase --LOS lost / enemy dead--> Alert --nothing found--> Patrol
//! any --hit reaction--> Staggered --timeout--> Chase | Alert | Patrol
//! ```
//!
//! While staggered only Patrol and Idle are accepted, which is how the
//! stagger timeout hands control back.

use crate::agent::ZombieAgent;
use crate::config::ZombieConfig;
use horde_core::{Effect, EffectCue, Presentation};
use serde::{Deserialize, Serialize};

/// Behavioral state of a zombie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AIState {
    Idle,
    Patrol,
    Alert,
    Chase,
    Attack,
    Staggered,
}

impl Default for AIState {
    fn default() -> Self {
        Self::Patrol
    }
}

impl AIState {
    /// Every state, in declaration order
    pub const ALL: [AIState; 6] = [
        AIState::Idle,
        AIState::Patrol,
        AIState::Alert,
        AIState::Chase,
        AIState::Attack,
        AIState::Staggered,
    ];

    /// States accepted while the stagger overlay is active
    pub fn is_recovery(self) -> bool {
        matches!(self, AIState::Patrol | AIState::Idle)
    }

    /// Base walk speed for this state, before per-agent multipliers
    pub fn base_speed(self, config: &ZombieConfig) -> f32 {
        match self {
            AIState::Idle => config.speed_idle,
            AIState::Patrol => config.speed_patrol,
            AIState::Alert => config.speed_alert,
            AIState::Chase | AIState::Attack => config.speed_chase,
            AIState::Staggered => config.speed_patrol * config.stagger_speed_multiplier,
        }
    }
}

/// A completed transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    pub from: AIState,
    pub to: AIState,
}

impl ZombieAgent {
    /// Request a state change.
    ///
    /// Same-state requests are no-ops. While staggered, anything other than
    /// Patrol or Idle is rejected.
    pub fn set_state(
        &mut self,
        new_state: AIState,
        config: &ZombieConfig,
        fx: &mut dyn Presentation,
    ) -> Option<StateChange> {
        if self.state == new_state {
            return None;
        }
        if self.is_staggered && !new_state.is_recovery() {
            log::trace!("{:?} -> {:?} rejected while staggered", self.state, new_state);
            return None;
        }

        let change = StateChange {
            from: self.state,
            to: new_state,
        };
        self.previous_state = self.state;
        self.state = new_state;
        self.on_state_changed(change, config, fx);
        self.transitions.push(change);

        log::debug!("zombie state {:?} -> {:?}", change.from, change.to);
        Some(change)
    }

    fn on_state_changed(&mut self, change: StateChange, config: &ZombieConfig, fx: &mut dyn Presentation) {
        self.refresh_target_speed(config);

        if change.from == AIState::Patrol && matches!(change.to, AIState::Alert | AIState::Chase) {
            fx.play(EffectCue::new(Effect::Alert, self.location));
        }

        if change.to == AIState::Chase {
            if !self.chase_breathing {
                self.chase_breathing = true;
                fx.play(EffectCue::new(Effect::ChaseBreathingStart, self.location));
            }
        } else if change.from == AIState::Chase && self.chase_breathing {
            self.chase_breathing = false;
            fx.play(EffectCue::new(Effect::ChaseBreathingStop, self.location));
        }
    }

    /// Recompute the target speed from state, anger and the per-agent multiplier
    pub fn refresh_target_speed(&mut self, config: &ZombieConfig) {
        let mut speed = self.state.base_speed(config);
        if self.is_angered {
            speed *= config.anger_speed_multiplier;
        }
        self.target_walk_speed = speed * self.base_speed_multiplier;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horde_core::EffectLog;
    use horde_math::Vec3;

    fn agent() -> ZombieAgent {
        ZombieAgent::new("walker", Vec3::ZERO, 1.0, 2.0, &ZombieConfig::default())
    }

    #[test]
    fn test_same_state_is_noop() {
        let config = ZombieConfig::default();
        let mut fx = EffectLog::new();
        let mut zed = agent();

        assert!(zed.set_state(AIState::Patrol, &config, &mut fx).is_none());
        assert!(fx.cues().is_empty());
    }

    #[test]
    fn test_sighting_from_patrol() {
        let config = ZombieConfig::default();
        let mut fx = EffectLog::new();
        let mut zed = agent();
        assert_eq!(zed.current_walk_speed(), 200.0);

        let change = zed.set_state(AIState::Chase, &config, &mut fx).unwrap();
        assert_eq!(change.from, AIState::Patrol);
        assert_eq!(zed.target_walk_speed(), 500.0);
        assert!(fx.contains(Effect::Alert));
        assert!(fx.contains(Effect::ChaseBreathingStart));
        assert_eq!(zed.previous_state(), AIState::Patrol);
    }

    #[test]
    fn test_leaving_chase_stops_breathing() {
        let config = ZombieConfig::default();
        let mut fx = EffectLog::new();
        let mut zed = agent();

        zed.set_state(AIState::Chase, &config, &mut fx);
        zed.set_state(AIState::Alert, &config, &mut fx);
        assert_eq!(fx.count(Effect::ChaseBreathingStop), 1);
        // Alert -> Chase does not replay the alert sound
        zed.set_state(AIState::Chase, &config, &mut fx);
        assert_eq!(fx.count(Effect::Alert), 1);
    }

    #[test]
    fn test_staggered_rejects_non_recovery_states() {
        let config = ZombieConfig::default();
        let mut fx = EffectLog::new();

        for target in AIState::ALL {
            let mut zed = agent();
            zed.set_state(AIState::Staggered, &config, &mut fx);
            zed.is_staggered = true;

            let accepted = zed.set_state(target, &config, &mut fx).is_some();
            if target.is_recovery() {
                assert!(accepted);
                assert_eq!(zed.state(), target);
            } else {
                assert!(!accepted);
                assert_eq!(zed.state(), AIState::Staggered);
            }
        }
    }

    #[test]
    fn test_every_transition_lands_in_a_defined_state() {
        let config = ZombieConfig::default();
        let mut fx = EffectLog::new();

        for from in AIState::ALL {
            for to in AIState::ALL {
                let mut zed = agent();
                zed.set_state(from, &config, &mut fx);
                zed.set_state(to, &config, &mut fx);
                assert_eq!(zed.state(), to);
                assert!(zed.target_walk_speed() >= 0.0);
            }
        }
    }

    #[test]
    fn test_speed_table() {
        let config = ZombieConfig::default();
        assert_eq!(AIState::Idle.base_speed(&config), 0.0);
        assert_eq!(AIState::Alert.base_speed(&config), 300.0);
        assert_eq!(AIState::Attack.base_speed(&config), 500.0);
        assert_eq!(AIState::Staggered.base_speed(&config), 100.0);
    }

    #[test]
    fn test_anger_scales_target_speed() {
        let config = ZombieConfig::default();
        let mut fx = EffectLog::new();
        let mut zed = ZombieAgent::new("walker", Vec3::ZERO, 0.9, 2.0, &config);

        zed.set_state(AIState::Chase, &config, &mut fx);
        assert!((zed.target_walk_speed() - 450.0).abs() < 1e-3);

        zed.is_angered = true;
        zed.refresh_target_speed(&config);
        assert!((zed.target_walk_speed() - 540.0).abs() < 1e-3);
    }
}
