//! Score and progression
//!
//! Speed score is accumulated as a float and only whole points are banked,
//! so the integer score never regresses and slow frames still add up.

use serde::{Deserialize, Serialize};

use super::spawner::ObstacleSpawner;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreKeeper {
    score: u64,
    /// Fractional speed score not yet banked
    carry: f32,
    near_misses: u32,
}

impl ScoreKeeper {
    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn near_misses(&self) -> u32 {
        self.near_misses
    }

    /// Bank speed score for one frame. Returns the whole points added.
    pub fn accumulate(&mut self, speed: f32, dt: f32, tuning: &Tuning) -> u64 {
        let earned = tuning.score_formula.rate(speed.max(0.0)) * dt * tuning.score_multiplier;
        let total = self.carry + earned.max(0.0);
        let whole = total.floor();
        self.carry = total - whole;
        let gained = whole as u64;
        self.score += gained;
        gained
    }

    /// Add a near-miss bonus immediately (not time-scaled)
    pub fn add_near_miss(&mut self, bonus: u64) {
        self.score += bonus;
        self.near_misses += 1;
    }
}

/// Difficulty in 0..=1: how far the spawn interval has tightened toward its floor
pub fn difficulty(distance_traveled: f32, tuning: &Tuning) -> f32 {
    let span = tuning.spawn_interval.min - tuning.spawn_interval_floor.min;
    if span <= 0.0 {
        return 1.0;
    }
    let current = ObstacleSpawner::interval_bounds(distance_traveled, tuning);
    ((tuning.spawn_interval.min - current.min) / span).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::tuning::ScoreFormula;

    #[test]
    fn test_linear_accumulates_fractions() {
        let t = Tuning::default();
        let mut keeper = ScoreKeeper::default();
        // 1.0 speed * 10 per second: one frame is 1/6 of a point
        for _ in 0..60 {
            keeper.accumulate(1.0, SIM_DT, &t);
        }
        assert!((9..=10).contains(&keeper.score()));
    }

    #[test]
    fn test_quadratic_rewards_speed() {
        let t = Tuning {
            score_formula: ScoreFormula::Quadratic,
            score_multiplier: 2.0,
            ..Default::default()
        };
        let mut keeper = ScoreKeeper::default();
        assert_eq!(keeper.accumulate(3.0, 1.0, &t), 18);
    }

    #[test]
    fn test_near_miss_bonus_is_atomic() {
        let mut keeper = ScoreKeeper::default();
        keeper.add_near_miss(50);
        assert_eq!(keeper.score(), 50);
        assert_eq!(keeper.near_misses(), 1);
    }

    #[test]
    fn test_never_regresses() {
        let t = Tuning::default();
        let mut keeper = ScoreKeeper::default();
        let mut last = 0;
        for speed in [0.0, -1.0, 0.3, 2.0, 0.0] {
            keeper.accumulate(speed, SIM_DT, &t);
            assert!(keeper.score() >= last);
            last = keeper.score();
        }
    }

    #[test]
    fn test_difficulty_ramp() {
        let t = Tuning::default();
        assert_eq!(difficulty(0.0, &t), 0.0);
        let mid = difficulty(10_000.0, &t);
        assert!(mid > 0.0 && mid < 1.0);
        assert_eq!(difficulty(1.0e7, &t), 1.0);
    }
}
