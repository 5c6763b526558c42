//! Obstacle spawning
//!
//! Buildings arrive in clusters of one or two, each in a distinct lane, placed
//! beyond the visible road. The gap until the next cluster is drawn from an
//! interval that narrows with distance travelled (the difficulty ramp).

use glam::{Vec2, Vec3};
use rand::Rng;
use rand::seq::index;
use serde::{Deserialize, Serialize};

use super::entity::{EntityId, IdAllocator, NeonColor};
use crate::consts::{LANE_COUNT, MAX_LANE};
use crate::tuning::{Span, Tuning};

/// A building in the road
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: EntityId,
    pub lane: i32,
    /// Base centre; y is half the height so the box sits on the road
    pub pos: Vec3,
    pub width: f32,
    pub depth: f32,
    pub height: f32,
    pub color: NeonColor,
    /// Set once the vehicle has boosted through it
    #[serde(default)]
    pub phased: bool,
}

impl Obstacle {
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.depth / 2.0)
    }

    pub fn ground_pos(&self) -> Vec2 {
        Vec2::new(self.pos.x, self.pos.z)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSpawner {
    /// Distance travelled at which the next cluster spawns
    next_spawn_distance: f32,
    clusters_spawned: u32,
}

impl ObstacleSpawner {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            next_spawn_distance: tuning.first_spawn_distance,
            clusters_spawned: 0,
        }
    }

    pub fn next_spawn_distance(&self) -> f32 {
        self.next_spawn_distance
    }

    pub fn clusters_spawned(&self) -> u32 {
        self.clusters_spawned
    }

    /// Interval bounds for the gap after a cluster spawned at `distance`
    pub fn interval_bounds(distance: f32, tuning: &Tuning) -> Span {
        let shrink = distance * tuning.spawn_interval_shrink;
        let min = (tuning.spawn_interval.min - shrink).max(tuning.spawn_interval_floor.min);
        let max = (tuning.spawn_interval.max - shrink).max(tuning.spawn_interval_floor.max);
        Span::new(min, max.max(min))
    }

    /// Spawn a cluster if `distance_traveled` passed the threshold.
    /// Returns the new obstacles (empty when nothing spawned).
    pub fn try_spawn<R: Rng>(
        &mut self,
        distance_traveled: f32,
        vehicle_z: f32,
        rng: &mut R,
        ids: &mut IdAllocator,
        tuning: &Tuning,
    ) -> Vec<Obstacle> {
        if distance_traveled <= self.next_spawn_distance {
            return Vec::new();
        }

        let count = if rng.random_bool(tuning.single_obstacle_chance) {
            1
        } else {
            2
        };

        let z = vehicle_z - tuning.spawn_distance_ahead;
        let cluster: Vec<Obstacle> = index::sample(rng, LANE_COUNT, count)
            .into_iter()
            .map(|slot| {
                let lane = slot as i32 - MAX_LANE;
                let width = tuning.obstacle_width.sample(rng);
                let depth = tuning.obstacle_depth.sample(rng);
                let height = tuning.obstacle_height.sample(rng);
                let color = NeonColor::ALL[rng.random_range(0..NeonColor::ALL.len())];
                Obstacle {
                    id: ids.next_id(),
                    lane,
                    pos: Vec3::new(lane as f32 * tuning.lane_width, height / 2.0, z),
                    width,
                    depth,
                    height,
                    color,
                    phased: false,
                }
            })
            .collect();

        let bounds = Self::interval_bounds(distance_traveled, tuning);
        self.next_spawn_distance += bounds.sample(rng);
        self.clusters_spawned += 1;

        log::debug!(
            "Spawned cluster #{} ({} obstacles) at z={:.1}, next at distance {:.1}",
            self.clusters_spawned,
            cluster.len(),
            z,
            self.next_spawn_distance
        );

        cluster
    }
}
