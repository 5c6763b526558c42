//! Session state and lifecycle
//!
//! A [`Session`] owns every simulation entity. Nothing is global: several
//! sessions can run side by side and tests build their own.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boost::BoostFuel;
use super::collision::NearMissTracker;
use super::effects::{Effects, ParticleKind};
use super::entity::{EntityKind, IdAllocator, RenderEntity};
use super::road::{DecorationKind, RoadStream};
use super::score::{ScoreKeeper, difficulty};
use super::spawner::{Obstacle, ObstacleSpawner};
use super::vehicle::Vehicle;
use crate::tuning::Tuning;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// No vehicle; waiting for a start command
    #[default]
    Idle,
    /// Active gameplay
    Running,
    /// Crashed; the scene stays frozen until restart
    Ended,
}

/// Final result of a run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub score: u64,
    pub distance: f32,
    pub near_misses: u32,
    pub duration_secs: f32,
}

/// Read-only per-frame view for the HUD
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub phase: GamePhase,
    /// World units per reference frame
    pub speed: f32,
    pub score: u64,
    /// 0..=100
    pub boost_percent: f32,
    pub boosting: bool,
    pub distance: f32,
    /// 0..=1
    pub difficulty: f32,
}

impl HudSnapshot {
    /// Speed as shown on the dashboard
    pub fn display_speed(&self) -> u32 {
        (self.speed * 100.0).round() as u32
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    /// Seed the RNG is rebuilt from on reset
    pub seed: u64,
    pub tuning: Tuning,
    pub phase: GamePhase,
    pub vehicle: Option<Vehicle>,
    pub road: RoadStream,
    pub obstacles: Vec<Obstacle>,
    pub spawner: ObstacleSpawner,
    pub boost: BoostFuel,
    pub near_miss: NearMissTracker,
    pub score: ScoreKeeper,
    pub distance_traveled: f32,
    /// Seconds of simulated running time
    pub elapsed: f32,
    pub frames: u64,
    /// Visual effects (not gameplay-affecting)
    pub effects: Effects,
    pub summary: Option<SessionSummary>,
    pub(crate) rng: Pcg32,
    pub(crate) ids: IdAllocator,
}

impl Session {
    /// Create an idle session
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        Self {
            seed,
            phase: GamePhase::Idle,
            vehicle: None,
            road: RoadStream::default(),
            obstacles: Vec::new(),
            spawner: ObstacleSpawner::new(&tuning),
            boost: BoostFuel::new(&tuning),
            near_miss: NearMissTracker::default(),
            score: ScoreKeeper::default(),
            distance_traveled: 0.0,
            elapsed: 0.0,
            frames: 0,
            effects: Effects::new(seed),
            summary: None,
            rng: Pcg32::seed_from_u64(seed),
            ids: IdAllocator::default(),
            tuning,
        }
    }

    /// Tear everything down and zero every counter. Leaves the session Idle.
    /// Calling it repeatedly yields the same state.
    pub fn reset(&mut self) {
        self.phase = GamePhase::Idle;
        self.vehicle = None;
        self.road.clear();
        self.obstacles.clear();
        self.spawner = ObstacleSpawner::new(&self.tuning);
        self.boost = BoostFuel::new(&self.tuning);
        self.near_miss = NearMissTracker::default();
        self.score = ScoreKeeper::default();
        self.distance_traveled = 0.0;
        self.elapsed = 0.0;
        self.frames = 0;
        self.effects.reset(self.seed);
        self.summary = None;
        self.rng = Pcg32::seed_from_u64(self.seed);
        self.ids = IdAllocator::default();
    }

    /// Reset and build a fresh world: vehicle at the origin, road seeded and
    /// extended over the visible window.
    pub fn start(&mut self) {
        self.reset();
        let vehicle = Vehicle::new(self.ids.next_id(), &self.tuning);
        self.road
            .ensure_coverage(vehicle.pos.z, &mut self.ids, &self.tuning);
        self.vehicle = Some(vehicle);
        self.phase = GamePhase::Running;
        log::info!(
            "Session started (seed {}, {} road segments)",
            self.seed,
            self.road.len()
        );
    }

    /// Start again with a new seed
    pub fn restart(&mut self, seed: u64) {
        self.seed = seed;
        self.start();
    }

    /// Crash: freeze the run and release boost/drift so looping signals stop
    pub fn end(&mut self) -> SessionSummary {
        self.boost.release();
        if let Some(vehicle) = self.vehicle.as_mut() {
            vehicle.boosting = false;
            vehicle.drifting = false;
        }
        let summary = SessionSummary {
            score: self.score.score(),
            distance: self.distance_traveled,
            near_misses: self.score.near_misses(),
            duration_secs: self.elapsed,
        };
        self.phase = GamePhase::Ended;
        self.summary = Some(summary);
        log::info!(
            "Session ended: score {}, distance {:.0}, near-misses {}",
            summary.score,
            summary.distance,
            summary.near_misses
        );
        summary
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    pub fn snapshot(&self) -> HudSnapshot {
        let vehicle = self.vehicle.as_ref();
        HudSnapshot {
            phase: self.phase,
            speed: vehicle.map_or(0.0, |v| v.speed),
            score: self.score.score(),
            boost_percent: self.boost.percent(),
            boosting: self.boost.is_active(),
            distance: self.distance_traveled,
            difficulty: difficulty(self.distance_traveled, &self.tuning),
        }
    }

    /// Entities owned by the simulation (vehicle, segments, decorations, obstacles)
    pub fn live_entity_count(&self) -> usize {
        let segments: usize = self
            .road
            .segments()
            .iter()
            .map(|s| 1 + s.decorations.len())
            .sum();
        usize::from(self.vehicle.is_some()) + segments + self.obstacles.len()
    }

    /// Flatten everything drawable into tagged render entities
    pub fn render_entities(&self) -> Vec<RenderEntity> {
        let tuning = &self.tuning;
        let mut out = Vec::with_capacity(self.live_entity_count() + self.effects.particles.len());

        let road_width = tuning.lane_width * 3.0;
        for seg in self.road.segments() {
            out.push(RenderEntity::new(
                seg.id,
                EntityKind::Segment,
                Vec3::new(0.0, 0.0, seg.z),
                Vec3::new(road_width, 0.0, seg.length),
            ));
            for deco in &seg.decorations {
                let size = match deco.kind {
                    DecorationKind::LaneDash => Vec3::new(0.15, 0.0, seg.length * 0.25),
                    DecorationKind::StreetLamp => Vec3::new(0.2, 6.0, 0.2),
                };
                let mut entity = RenderEntity::new(
                    deco.id,
                    EntityKind::Decoration,
                    Vec3::new(0.0, 0.0, seg.z) + deco.offset,
                    size,
                );
                entity.param = match deco.kind {
                    DecorationKind::LaneDash => 0.0,
                    DecorationKind::StreetLamp => 1.0,
                };
                out.push(entity);
            }
        }

        for o in &self.obstacles {
            let mut entity = RenderEntity::new(
                o.id,
                EntityKind::Obstacle,
                o.pos,
                Vec3::new(o.width, o.height, o.depth),
            );
            entity.color = o.color.index();
            entity.highlight = o.phased;
            out.push(entity);
        }

        if let Some(v) = &self.vehicle {
            let mut entity = RenderEntity::new(
                v.id,
                EntityKind::Vehicle,
                v.pos,
                Vec3::new(v.width, v.height, v.depth),
            );
            entity.param = v.lean;
            entity.highlight = v.boosting;
            out.push(entity);
        }

        for (i, point) in self.effects.trail.iter().enumerate() {
            let mut entity =
                RenderEntity::new(0, EntityKind::Trail, point.pos, Vec3::splat(0.3));
            entity.param = 1.0 - i as f32 / self.effects.trail.len() as f32;
            out.push(entity);
        }

        for p in &self.effects.particles {
            let mut entity =
                RenderEntity::new(0, EntityKind::Particle, p.pos, Vec3::splat(p.size));
            entity.param = p.life;
            entity.color = match p.kind {
                ParticleKind::Spark => 0,
                ParticleKind::Debris => 1,
                ParticleKind::Exhaust => 2,
            };
            out.push(entity);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::tick::{TickInput, tick};

    #[test]
    fn test_new_is_idle_and_empty() {
        let session = Session::new(Tuning::default(), 1);
        assert_eq!(session.phase, GamePhase::Idle);
        assert!(session.vehicle.is_none());
        assert_eq!(session.live_entity_count(), 0);
    }

    #[test]
    fn test_start_builds_world() {
        let mut session = Session::new(Tuning::default(), 1);
        session.start();
        assert!(session.is_running());
        assert!(session.vehicle.is_some());
        assert!(!session.road.is_empty());
        assert!(session.obstacles.is_empty());
        assert_eq!(session.boost.fuel(), session.tuning.max_fuel);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut session = Session::new(Tuning::default(), 42);
        session.start();
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        for _ in 0..600 {
            tick(&mut session, &input, SIM_DT);
        }

        session.reset();
        let first = (session.snapshot(), session.live_entity_count(), session.ids.clone());
        session.reset();
        let second = (session.snapshot(), session.live_entity_count(), session.ids.clone());
        assert_eq!(first, second);

        let snap = first.0;
        assert_eq!(snap.score, 0);
        assert_eq!(snap.distance, 0.0);
        assert_eq!(snap.boost_percent, 100.0);
        assert_eq!(session.live_entity_count(), 0);
        assert_eq!(session.spawner.next_spawn_distance(), session.tuning.first_spawn_distance);
    }

    #[test]
    fn test_restart_from_same_seed_rebuilds_identically() {
        let mut a = Session::new(Tuning::default(), 8);
        a.start();
        let fresh = a.render_entities();
        for _ in 0..300 {
            tick(&mut a, &TickInput::default(), SIM_DT);
        }
        a.start();
        assert_eq!(a.render_entities(), fresh);
    }

    #[test]
    fn test_end_freezes_summary() {
        let mut session = Session::new(Tuning::default(), 1);
        session.start();
        session.boost.activate();
        let summary = session.end();
        assert_eq!(session.phase, GamePhase::Ended);
        assert_eq!(session.summary, Some(summary));
        assert!(!session.boost.is_active());
        // No further frames run
        tick(&mut session, &TickInput::default(), SIM_DT);
        assert_eq!(session.frames, 0);
    }

    #[test]
    fn test_render_entities_tagged() {
        let mut session = Session::new(Tuning::default(), 1);
        session.start();
        let entities = session.render_entities();
        let vehicles = entities
            .iter()
            .filter(|e| e.kind == EntityKind::Vehicle)
            .count();
        let segments = entities
            .iter()
            .filter(|e| e.kind == EntityKind::Segment)
            .count();
        assert_eq!(vehicles, 1);
        assert_eq!(segments, session.road.len());
    }

    #[test]
    fn test_display_speed() {
        let mut session = Session::new(Tuning::default(), 1);
        session.start();
        session.vehicle.as_mut().unwrap().speed = 1.25;
        assert_eq!(session.snapshot().display_speed(), 125);
    }
}
