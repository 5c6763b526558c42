//! Collision and near-miss detection
//!
//! Both tests work on the ground plane (x lateral, z longitudinal) with
//! axis-aligned boxes. The collision box is shrunk so grazes read as
//! near-misses rather than crashes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use super::spawner::Obstacle;
use super::vehicle::Vehicle;
use crate::tuning::Tuning;

/// Whether two ground-plane boxes overlap on both axes once the summed
/// half-extents are scaled by `shrink`
#[inline]
pub fn boxes_overlap(a_pos: Vec2, a_half: Vec2, b_pos: Vec2, b_half: Vec2, shrink: f32) -> bool {
    let delta = (a_pos - b_pos).abs();
    let reach = (a_half + b_half) * shrink;
    delta.x < reach.x && delta.y < reach.y
}

pub fn is_collision(vehicle: &Vehicle, obstacle: &Obstacle, tuning: &Tuning) -> bool {
    boxes_overlap(
        vehicle.ground_pos(),
        vehicle.half_extents(),
        obstacle.ground_pos(),
        obstacle.half_extents(),
        tuning.collision_shrink,
    )
}

/// Close lateral pass alongside the obstacle.
///
/// The vehicle must be clear of the shrunk collision box on x; being level
/// with the obstacle on z alone (entering or leaving it) does not count.
/// Obstacles already boosted through never pay out.
pub fn is_near_miss(vehicle: &Vehicle, obstacle: &Obstacle, tuning: &Tuning) -> bool {
    if obstacle.phased {
        return false;
    }
    let delta = (vehicle.ground_pos() - obstacle.ground_pos()).abs();
    let reach = vehicle.half_extents() + obstacle.half_extents();
    delta.x >= reach.x * tuning.collision_shrink
        && delta.x < reach.x + tuning.near_miss_margin
        && delta.y < reach.y
}

/// Rate limiter for near-miss rewards
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NearMissTracker {
    cooldown: f32,
}

impl NearMissTracker {
    pub fn cooldown(&self) -> f32 {
        self.cooldown
    }

    pub fn is_ready(&self) -> bool {
        self.cooldown <= 0.0
    }

    fn tick(&mut self, dt: f32) {
        self.cooldown = (self.cooldown - dt).max(0.0);
    }

    fn trigger(&mut self, tuning: &Tuning) {
        self.cooldown = tuning.near_miss_cooldown;
    }
}

/// What one frame of evaluation found
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// Obstacles removed for falling behind the cleanup threshold
    pub retired: usize,
    /// Game-ending hit (only when not boosting)
    pub collision: Option<EntityId>,
    /// Obstacles boosted through for the first time this frame
    pub phased: Vec<EntityId>,
    /// Rewarded near-miss (at most one per cooldown window)
    pub near_miss: Option<EntityId>,
}

/// Evaluate the vehicle against every live obstacle for one frame.
///
/// Stops at the first unboosted collision; no near-miss is rewarded on a
/// crash frame.
pub fn evaluate(
    vehicle: &Vehicle,
    obstacles: &mut Vec<Obstacle>,
    near_miss: &mut NearMissTracker,
    dt: f32,
    tuning: &Tuning,
) -> Evaluation {
    let mut eval = Evaluation::default();

    let cleanup_z = vehicle.pos.z + tuning.obstacle_cleanup_behind;
    let before = obstacles.len();
    obstacles.retain(|o| o.pos.z <= cleanup_z);
    eval.retired = before - obstacles.len();

    near_miss.tick(dt);

    for obstacle in obstacles.iter_mut() {
        if !is_collision(vehicle, obstacle, tuning) {
            continue;
        }
        if !vehicle.boosting {
            eval.collision = Some(obstacle.id);
            return eval;
        }
        if !obstacle.phased {
            obstacle.phased = true;
            eval.phased.push(obstacle.id);
        }
    }

    if near_miss.is_ready() {
        if let Some(obstacle) = obstacles.iter().find(|o| is_near_miss(vehicle, o, tuning)) {
            near_miss.trigger(tuning);
            eval.near_miss = Some(obstacle.id);
        }
    }

    eval
}
