//! Data-driven game balance
//!
//! Every gameplay constant lives in [`Tuning`]. Defaults are the reference
//! tuning; JSON overrides only need the fields they change.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// How per-frame score is derived from speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreFormula {
    /// `speed * dt * multiplier`
    #[default]
    Linear,
    /// `speed^2 * dt * multiplier` (rewards sustained high speed)
    Quadratic,
}

impl ScoreFormula {
    pub fn rate(&self, speed: f32) -> f32 {
        match self {
            ScoreFormula::Linear => speed,
            ScoreFormula::Quadratic => speed * speed,
        }
    }
}

/// Inclusive min/max bounds for a randomized quantity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub min: f32,
    pub max: f32,
}

impl Span {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> f32 {
        if self.max <= self.min {
            return self.min;
        }
        rng.random_range(self.min..=self.max)
    }

    fn is_ordered(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Road ===
    /// World units between lane centres
    pub lane_width: f32,
    pub segment_length: f32,
    pub visible_segments: u32,
    /// Extra segments kept behind the vehicle before retiring
    pub segment_lookbehind: u32,
    /// Lane dashes painted per segment
    pub dashes_per_segment: u32,

    // === Obstacles ===
    /// Distance at which the first cluster appears
    pub first_spawn_distance: f32,
    /// Forward offset of new obstacles (beyond render depth)
    pub spawn_distance_ahead: f32,
    /// Probability that a cluster holds a single obstacle
    pub single_obstacle_chance: f64,
    pub obstacle_width: Span,
    pub obstacle_depth: Span,
    pub obstacle_height: Span,
    /// Initial spawn interval bounds
    pub spawn_interval: Span,
    /// Floors the interval bounds shrink toward
    pub spawn_interval_floor: Span,
    /// Interval shrink per unit of distance travelled
    pub spawn_interval_shrink: f32,
    /// Distance behind the vehicle past which obstacles are retired
    pub obstacle_cleanup_behind: f32,

    // === Vehicle ===
    pub vehicle_width: f32,
    pub vehicle_depth: f32,
    pub vehicle_height: f32,
    /// Speeds are world units per reference frame
    pub base_min_speed: f32,
    pub initial_target_speed: f32,
    pub max_speed: f32,
    /// Speed gained per second while below target
    pub acceleration: f32,
    /// Speed lost per second while above target
    pub deceleration: f32,
    /// Speed floor gain per unit of distance
    pub speed_increase_rate: f32,
    /// Target speed change per speed-up/down intent
    pub speed_step: f32,
    /// Fraction of lateral error closed per reference frame
    pub lateral_smoothing: f32,
    /// Lateral error above which the vehicle counts as drifting
    pub drift_threshold: f32,

    // === Boost ===
    pub max_fuel: f32,
    /// Fuel burned per second while boosting
    pub fuel_consume_rate: f32,
    /// Fuel regained per second while not boosting
    pub fuel_regen_rate: f32,
    /// Fraction of max fuel required to start boosting
    pub boost_activation_fraction: f32,
    pub boost_speed_multiplier: f32,
    pub boost_accel_multiplier: f32,

    // === Collision ===
    /// Multiplier (<1) on summed half-extents for the collision box
    pub collision_shrink: f32,
    /// Extra lateral reach beyond combined half-widths for near-misses
    pub near_miss_margin: f32,
    pub near_miss_bonus: u64,
    /// Seconds between near-miss rewards
    pub near_miss_cooldown: f32,

    // === Score ===
    pub score_formula: ScoreFormula,
    pub score_multiplier: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            lane_width: 4.0,
            segment_length: 20.0,
            visible_segments: 20,
            segment_lookbehind: 4,
            dashes_per_segment: 2,

            first_spawn_distance: 10.0,
            spawn_distance_ahead: 250.0,
            single_obstacle_chance: 0.7,
            obstacle_width: Span::new(2.5, 3.8),
            obstacle_depth: Span::new(3.0, 6.0),
            obstacle_height: Span::new(6.0, 30.0),
            spawn_interval: Span::new(60.0, 120.0),
            spawn_interval_floor: Span::new(25.0, 45.0),
            spawn_interval_shrink: 0.002,
            obstacle_cleanup_behind: 30.0,

            vehicle_width: 2.0,
            vehicle_depth: 4.0,
            vehicle_height: 1.2,
            base_min_speed: 0.5,
            initial_target_speed: 1.0,
            max_speed: 3.0,
            acceleration: 0.8,
            deceleration: 1.2,
            speed_increase_rate: 0.00005,
            speed_step: 0.25,
            lateral_smoothing: 0.2,
            drift_threshold: 0.6,

            max_fuel: 100.0,
            fuel_consume_rate: 25.0,
            fuel_regen_rate: 8.0,
            boost_activation_fraction: 0.1,
            boost_speed_multiplier: 1.6,
            boost_accel_multiplier: 2.5,

            collision_shrink: 0.9,
            near_miss_margin: 1.5,
            near_miss_bonus: 50,
            near_miss_cooldown: 0.5,

            score_formula: ScoreFormula::Linear,
            score_multiplier: 10.0,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override and validate it
    pub fn from_json(json: &str) -> Result<Self, GameError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        log::info!("Loaded tuning override");
        Ok(tuning)
    }

    /// Road depth kept ahead of the vehicle
    pub fn visible_depth(&self) -> f32 {
        self.visible_segments as f32 / 2.0 * self.segment_length
    }

    /// Fuel level that must be exceeded to start boosting
    pub fn boost_activation_threshold(&self) -> f32 {
        self.max_fuel * self.boost_activation_fraction
    }

    pub fn validate(&self) -> Result<(), GameError> {
        fn check(ok: bool, field: &'static str, reason: &str) -> Result<(), GameError> {
            if ok {
                Ok(())
            } else {
                Err(GameError::InvalidTuning {
                    field,
                    reason: reason.to_string(),
                })
            }
        }

        check(self.lane_width > 0.0, "lane_width", "must be positive")?;
        check(self.segment_length > 0.0, "segment_length", "must be positive")?;
        check(self.visible_segments >= 2, "visible_segments", "need at least 2")?;
        check(
            self.spawn_distance_ahead > self.visible_depth(),
            "spawn_distance_ahead",
            "must lie beyond the visible road depth",
        )?;
        check(
            (0.0..=1.0).contains(&self.single_obstacle_chance),
            "single_obstacle_chance",
            "must be a probability",
        )?;
        for (span, field) in [
            (self.obstacle_width, "obstacle_width"),
            (self.obstacle_depth, "obstacle_depth"),
            (self.obstacle_height, "obstacle_height"),
            (self.spawn_interval, "spawn_interval"),
            (self.spawn_interval_floor, "spawn_interval_floor"),
        ] {
            check(span.is_ordered() && span.min > 0.0, field, "min must be positive and <= max")?;
        }
        check(
            self.spawn_interval_floor.min <= self.spawn_interval.min
                && self.spawn_interval_floor.max <= self.spawn_interval.max,
            "spawn_interval_floor",
            "floors cannot exceed the initial interval",
        )?;
        // Consecutive clusters are at least one floor interval apart; keeping that
        // above the deepest obstacle means clusters never overlap.
        check(
            self.spawn_interval_floor.min > self.obstacle_depth.max,
            "spawn_interval_floor",
            "minimum floor must exceed the deepest obstacle",
        )?;
        check(self.base_min_speed > 0.0, "base_min_speed", "must be positive")?;
        check(
            self.max_speed >= self.base_min_speed,
            "max_speed",
            "must be at least base_min_speed",
        )?;
        check(
            self.lateral_smoothing > 0.0 && self.lateral_smoothing <= 1.0,
            "lateral_smoothing",
            "must be in (0, 1]",
        )?;
        check(self.max_fuel > 0.0, "max_fuel", "must be positive")?;
        check(
            (0.0..1.0).contains(&self.boost_activation_fraction),
            "boost_activation_fraction",
            "must be in [0, 1)",
        )?;
        check(
            self.boost_speed_multiplier >= 1.0 && self.boost_accel_multiplier >= 1.0,
            "boost_speed_multiplier",
            "boost multipliers must be >= 1",
        )?;
        check(
            self.collision_shrink > 0.0 && self.collision_shrink <= 1.0,
            "collision_shrink",
            "must be in (0, 1]",
        )?;
        check(self.near_miss_cooldown >= 0.0, "near_miss_cooldown", "cannot be negative")?;
        Ok(())
    }
}
