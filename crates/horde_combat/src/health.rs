//! Health pool

use serde::{Deserialize, Serialize};

/// Health pool clamped to `[0, max]` with a one-way death flag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Current health
    pub current: f32,
    /// Maximum health
    pub max: f32,
    /// Whether this entity is dead
    #[serde(skip)]
    pub is_dead: bool,
}

impl Health {
    /// Create a full health pool
    pub fn new(max_health: f32) -> Self {
        let max = max_health.max(0.0);
        Self {
            current: max,
            max,
            is_dead: false,
        }
    }

    /// Apply damage. Returns (damage actually applied, whether this killed).
    ///
    /// Damage to a dead pool is ignored.
    pub fn apply_damage(&mut self, amount: f32) -> (f32, bool) {
        if self.is_dead || amount <= 0.0 {
            return (0.0, false);
        }
        let before = self.current;
        self.current = (self.current - amount).clamp(0.0, self.max);
        let applied = before - self.current;

        if self.current <= 0.0 {
            self.is_dead = true;
            return (applied, true);
        }
        (applied, false)
    }

    /// Heal (no effect when dead)
    pub fn heal(&mut self, amount: f32) -> f32 {
        if self.is_dead || amount <= 0.0 {
            return 0.0;
        }
        let before = self.current;
        self.current = (self.current + amount).min(self.max);
        self.current - before
    }

    /// Kill outright
    pub fn kill(&mut self) -> bool {
        if self.is_dead {
            return false;
        }
        self.current = 0.0;
        self.is_dead = true;
        true
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        !self.is_dead
    }

    /// Current health as a fraction of max
    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_damage_clamps_at_zero() {
        let mut health = Health::new(100.0);

        let (applied, died) = health.apply_damage(30.0);
        assert_eq!(applied, 30.0);
        assert!(!died);
        assert_eq!(health.current, 70.0);

        let (applied, died) = health.apply_damage(500.0);
        assert_eq!(applied, 70.0);
        assert!(died);
        assert_eq!(health.current, 0.0);
        assert!(health.is_dead);
    }

    #[test]
    fn test_death_is_one_way() {
        let mut health = Health::new(100.0);
        assert!(health.kill());
        assert!(!health.kill());

        assert_eq!(health.heal(50.0), 0.0);
        assert_eq!(health.apply_damage(10.0), (0.0, false));
        assert_eq!(health.current, 0.0);
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut health = Health::new(100.0);
        health.apply_damage(20.0);
        assert_eq!(health.heal(50.0), 20.0);
        assert_eq!(health.fraction(), 1.0);
    }
}
