//! Uniform random ranges used by tunables

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Inclusive `[min, max]` range sampled uniformly
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RandomRange {
    pub min: f32,
    pub max: f32,
}

impl RandomRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// A degenerate range that always yields `value`
    pub const fn fixed(value: f32) -> Self {
        Self::new(value, value)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        let (lo, hi) = if self.min <= self.max {
            (self.min, self.max)
        } else {
            (self.max, self.min)
        };
        if hi - lo <= f32::EPSILON {
            return lo;
        }
        rng.random_range(lo..=hi)
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min.min(self.max) && value <= self.max.max(self.min)
    }
}

impl Default for RandomRange {
    fn default() -> Self {
        Self::fixed(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sample_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let range = RandomRange::new(6.0, 12.0);
        for _ in 0..200 {
            assert!(range.contains(range.sample(&mut rng)));
        }
    }

    #[test]
    fn test_fixed_and_inverted() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(RandomRange::fixed(0.5).sample(&mut rng), 0.5);

        let inverted = RandomRange::new(3.0, 1.0);
        let v = inverted.sample(&mut rng);
        assert!((1.0..=3.0).contains(&v));
    }
}
