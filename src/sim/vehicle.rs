//! Vehicle kinematics
//!
//! Speed eases toward a target that can never drop below the rising speed
//! floor; lateral position eases toward the lane centre.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use crate::consts::SIM_DT;
use crate::tuning::Tuning;
use crate::{clamp_lane, smoothing_factor};

/// The player's car
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: EntityId,
    /// Discrete lane in {-1, 0, 1}
    pub lane: i32,
    /// x eases toward `lane * lane_width`, z decreases as the car advances
    pub pos: Vec3,
    /// World units per reference frame
    pub speed: f32,
    pub target_speed: f32,
    /// Rising speed floor (never decreases within a session)
    pub min_speed: f32,
    pub width: f32,
    pub depth: f32,
    pub height: f32,
    pub boosting: bool,
    pub drifting: bool,
    /// Roll toward the steering direction (-1..1), cosmetic
    pub lean: f32,
}

impl Vehicle {
    pub fn new(id: EntityId, tuning: &Tuning) -> Self {
        Self {
            id,
            lane: 0,
            pos: Vec3::new(0.0, tuning.vehicle_height / 2.0, 0.0),
            speed: 0.0,
            target_speed: tuning.initial_target_speed.max(tuning.base_min_speed),
            min_speed: tuning.base_min_speed,
            width: tuning.vehicle_width,
            depth: tuning.vehicle_depth,
            height: tuning.vehicle_height,
            boosting: false,
            drifting: false,
            lean: 0.0,
        }
    }

    /// Move one lane left (-1) or right (+1). Returns true if the lane changed.
    pub fn steer(&mut self, direction: i32) -> bool {
        let lane = clamp_lane(self.lane + direction.signum());
        let changed = lane != self.lane;
        self.lane = lane;
        changed
    }

    /// Nudge target speed by `steps` speed steps, bounded by the floor and max
    pub fn adjust_target_speed(&mut self, steps: i32, tuning: &Tuning) {
        let target = self.target_speed + steps as f32 * tuning.speed_step;
        self.target_speed = target.clamp(self.min_speed, tuning.max_speed.max(self.min_speed));
    }

    pub fn current_max_speed(&self, tuning: &Tuning) -> f32 {
        if self.boosting {
            tuning.max_speed * tuning.boost_speed_multiplier
        } else {
            tuning.max_speed
        }
    }

    /// Lateral world position of the current lane centre
    pub fn lane_x(&self, tuning: &Tuning) -> f32 {
        self.lane as f32 * tuning.lane_width
    }

    /// Half extents on the ground plane (x = half width, y = half depth)
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.depth / 2.0)
    }

    /// Ground-plane centre (x, z)
    pub fn ground_pos(&self) -> Vec2 {
        Vec2::new(self.pos.x, self.pos.z)
    }

    /// Integrate one step. `distance_traveled` is the distance before this step;
    /// returns how far the vehicle advanced.
    pub fn step(&mut self, dt: f32, distance_traveled: f32, tuning: &Tuning) -> f32 {
        let frames = dt / SIM_DT;

        // Rising floor, capped so it never outruns the top speed
        let floor = (tuning.base_min_speed + distance_traveled * tuning.speed_increase_rate)
            .min(tuning.max_speed);
        self.min_speed = self.min_speed.max(floor);
        self.target_speed = self.target_speed.max(self.min_speed);

        let max_speed = self.current_max_speed(tuning);
        let (goal, accel_mult) = if self.boosting {
            (max_speed, tuning.boost_accel_multiplier)
        } else {
            (self.target_speed.min(max_speed), 1.0)
        };

        if self.speed < goal {
            self.speed = (self.speed + tuning.acceleration * accel_mult * dt).min(goal);
        } else if self.speed > goal {
            self.speed = (self.speed - tuning.deceleration * dt).max(goal.max(self.min_speed));
        }

        let lane_x = self.lane_x(tuning);
        let error = lane_x - self.pos.x;
        self.pos.x += error * smoothing_factor(tuning.lateral_smoothing, frames);
        self.lean = ((lane_x - self.pos.x) / tuning.lane_width).clamp(-1.0, 1.0);

        let advance = self.speed * frames;
        self.pos.z -= advance;
        advance
    }

    /// Re-evaluate the drift flag; returns the new state on a transition
    pub fn update_drift(&mut self, tuning: &Tuning) -> Option<bool> {
        let drifting = (self.lane_x(tuning) - self.pos.x).abs() > tuning.drift_threshold;
        if drifting != self.drifting {
            self.drifting = drifting;
            Some(drifting)
        } else {
            None
        }
    }
}
