//! Per-frame simulation step
//!
//! Order within a frame: input intents, kinematics, boost fuel, road and
//! spawner, collision/near-miss, score, effects.

use serde::{Deserialize, Serialize};

use super::autopilot;
use super::boost::BoostEdge;
use super::collision;
use super::effects::ParticleKind;
use super::entity::EntityId;
use super::state::{GamePhase, Session, SessionSummary};
use crate::error::GameError;

/// Discrete player intents, mapped from whatever device the host reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    LaneLeft,
    LaneRight,
    SpeedUp,
    SpeedDown,
    /// Boost key pressed
    BoostDown,
    /// Boost key released
    BoostUp,
}

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub intents: Vec<Intent>,
    /// Demo mode - the autopilot drives
    pub autopilot: bool,
}

/// Things that happened during a tick, for sound/HUD/visual dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    LaneChanged { lane: i32 },
    BoostStarted,
    /// `depleted` when the tank ran dry rather than the key being released
    BoostStopped { depleted: bool },
    DriftStarted,
    DriftStopped,
    ClusterSpawned { count: usize },
    PhaseThrough { obstacle: EntityId },
    NearMiss { obstacle: EntityId, bonus: u64 },
    Crash { obstacle: EntityId, summary: SessionSummary },
}

/// Advance a running session by `dt` seconds. Returns the frame's events.
pub fn tick(session: &mut Session, input: &TickInput, dt: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if session.phase != GamePhase::Running {
        return events;
    }

    let mut intents = input.intents.clone();
    if input.autopilot {
        intents.extend(autopilot::plan(session));
    }

    let tuning = &session.tuning;
    let Some(vehicle) = session.vehicle.as_mut() else {
        let err = GameError::EntityMissing { context: "tick" };
        log::warn!("{err}; skipping frame");
        return events;
    };

    for intent in intents {
        match intent {
            Intent::LaneLeft | Intent::LaneRight => {
                let direction = if intent == Intent::LaneLeft { -1 } else { 1 };
                if vehicle.steer(direction) {
                    events.push(GameEvent::LaneChanged { lane: vehicle.lane });
                }
            }
            Intent::SpeedUp => vehicle.adjust_target_speed(1, tuning),
            Intent::SpeedDown => vehicle.adjust_target_speed(-1, tuning),
            Intent::BoostDown => {
                if session.boost.activate() {
                    events.push(GameEvent::BoostStarted);
                }
            }
            Intent::BoostUp => {
                if session.boost.release() {
                    events.push(GameEvent::BoostStopped { depleted: false });
                }
            }
        }
    }

    // Kinematics with this frame's boost state
    vehicle.boosting = session.boost.is_active();
    let advance = vehicle.step(dt, session.distance_traveled, tuning);
    session.distance_traveled += advance;

    if let Some(drifting) = vehicle.update_drift(tuning) {
        events.push(if drifting {
            GameEvent::DriftStarted
        } else {
            GameEvent::DriftStopped
        });
    }

    if let Some(BoostEdge::Stopped) = session.boost.tick(dt) {
        vehicle.boosting = false;
        events.push(GameEvent::BoostStopped { depleted: true });
    }

    // Stream road and obstacles around the new position
    let vehicle_z = vehicle.pos.z;
    session.road.retire_behind(vehicle_z, tuning);
    session.road.ensure_coverage(vehicle_z, &mut session.ids, tuning);

    let cluster = session.spawner.try_spawn(
        session.distance_traveled,
        vehicle_z,
        &mut session.rng,
        &mut session.ids,
        tuning,
    );
    if !cluster.is_empty() {
        events.push(GameEvent::ClusterSpawned {
            count: cluster.len(),
        });
        session.obstacles.extend(cluster);
    }

    let eval = collision::evaluate(
        vehicle,
        &mut session.obstacles,
        &mut session.near_miss,
        dt,
        tuning,
    );

    let vehicle_pos = vehicle.pos;
    let speed = vehicle.speed;
    let boosting = vehicle.boosting;

    if let Some(obstacle) = eval.collision {
        session.effects.burst(ParticleKind::Debris, vehicle_pos, 80, 14.0);
        session.effects.add_shake(1.0);
        let summary = session.end();
        events.push(GameEvent::Crash { obstacle, summary });
        return events;
    }

    for obstacle in eval.phased {
        session.effects.burst(ParticleKind::Spark, vehicle_pos, 12, 8.0);
        session.effects.add_shake(0.15);
        events.push(GameEvent::PhaseThrough { obstacle });
    }

    if let Some(obstacle) = eval.near_miss {
        let bonus = session.tuning.near_miss_bonus;
        session.score.add_near_miss(bonus);
        session.effects.trigger_flash();
        session.effects.add_shake(0.2);
        session.effects.burst(ParticleKind::Spark, vehicle_pos, 24, 6.0);
        events.push(GameEvent::NearMiss { obstacle, bonus });
    }

    session.score.accumulate(speed, dt, &session.tuning);

    if boosting {
        let exhaust = vehicle_pos + glam::Vec3::new(0.0, 0.0, session.tuning.vehicle_depth / 2.0);
        session.effects.burst(ParticleKind::Exhaust, exhaust, 2, 3.0);
    }
    session.effects.record_trail(vehicle_pos, speed);
    session.effects.update(dt);

    session.elapsed += dt;
    session.frames += 1;

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::SIM_DT;
    use crate::sim::boost::BoostFuel;
    use crate::sim::entity::NeonColor;
    use crate::sim::spawner::Obstacle;
    use crate::tuning::Tuning;
    use glam::Vec3;

    fn running(seed: u64) -> Session {
        let mut session = Session::new(Tuning::default(), seed);
        session.start();
        session
    }

    fn input(intents: &[Intent]) -> TickInput {
        TickInput {
            intents: intents.to_vec(),
            ..Default::default()
        }
    }

    /// Park a building on the vehicle so it overlaps this frame
    fn building_on_vehicle(session: &mut Session) -> EntityId {
        let v = session.vehicle.as_ref().unwrap();
        let pos = Vec3::new(v.pos.x, 5.0, v.pos.z - 1.0);
        let id = session.ids.next_id();
        session.obstacles.push(Obstacle {
            id,
            lane: v.lane,
            pos,
            width: 3.0,
            depth: 4.0,
            height: 10.0,
            color: NeonColor::Magenta,
            phased: false,
        });
        id
    }

    #[test]
    fn test_idle_session_does_not_tick() {
        let mut session = Session::new(Tuning::default(), 1);
        let events = tick(&mut session, &TickInput::default(), SIM_DT);
        assert!(events.is_empty());
        assert_eq!(session.frames, 0);
    }

    #[test]
    fn test_first_cluster_appears_quickly() {
        let mut session = running(5);
        let mut spawned = false;
        for _ in 0..120 {
            let events = tick(&mut session, &TickInput::default(), SIM_DT);
            if events
                .iter()
                .any(|e| matches!(e, GameEvent::ClusterSpawned { .. }))
            {
                spawned = true;
                break;
            }
        }
        assert!(spawned);
        assert!(!session.obstacles.is_empty());
    }

    #[test]
    fn test_unboosted_collision_ends_session_same_frame() {
        let mut session = running(9);
        for _ in 0..30 {
            tick(&mut session, &TickInput::default(), SIM_DT);
        }
        let score_before = session.score.score();
        let id = building_on_vehicle(&mut session);

        let events = tick(&mut session, &TickInput::default(), SIM_DT);
        assert_eq!(session.phase, GamePhase::Ended);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::Crash { obstacle, .. } if *obstacle == id)));
        // Score frozen on the crash frame
        assert_eq!(session.score.score(), score_before);

        tick(&mut session, &TickInput::default(), SIM_DT);
        assert_eq!(session.score.score(), score_before);
    }

    #[test]
    fn test_boosted_collision_phases_through() {
        let mut session = running(9);
        let events = tick(&mut session, &input(&[Intent::BoostDown]), SIM_DT);
        assert!(events.contains(&GameEvent::BoostStarted));
        let fuel_before = session.boost.fuel();
        let score_before = session.score.score();

        building_on_vehicle(&mut session);
        let events = tick(&mut session, &TickInput::default(), SIM_DT);
        assert_eq!(session.phase, GamePhase::Running);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::PhaseThrough { .. })));
        assert!(session.score.score() >= score_before);
        let burned = fuel_before - session.boost.fuel();
        assert!((burned - session.tuning.fuel_consume_rate * SIM_DT).abs() < 1e-3);
    }

    #[test]
    fn test_near_miss_awards_bonus_once() {
        let mut session = running(11);
        let (vx, vz) = {
            let v = session.vehicle.as_ref().unwrap();
            (v.pos.x, v.pos.z)
        };
        let id = session.ids.next_id();
        session.obstacles.push(Obstacle {
            id,
            lane: 1,
            pos: Vec3::new(vx + 3.5, 5.0, vz),
            width: 3.0,
            depth: 40.0,
            height: 10.0,
            color: NeonColor::Lime,
            phased: false,
        });

        let before = session.score.score();
        let events = tick(&mut session, &TickInput::default(), SIM_DT);
        let bonus = events.iter().find_map(|e| match e {
            GameEvent::NearMiss { bonus, .. } => Some(*bonus),
            _ => None,
        });
        assert_eq!(bonus, Some(50));
        assert!(session.score.score() >= before + 50);
        assert_eq!(session.near_miss.cooldown(), 0.5);

        // Still alongside next frame, but inside the cooldown window
        let events = tick(&mut session, &TickInput::default(), SIM_DT);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::NearMiss { .. })));
    }

    #[test]
    fn test_boosted_pass_through_same_lane_pays_no_near_miss() {
        let mut phased = 0;
        for step in 0..100 {
            let mut session = running(21);
            let (x, z) = {
                let v = session.vehicle.as_ref().unwrap();
                (v.pos.x, v.pos.z)
            };
            let id = session.ids.next_id();
            session.obstacles.push(Obstacle {
                id,
                lane: 0,
                pos: Vec3::new(x, 5.0, z - 2.0 - step as f32 * 0.37),
                width: 3.0,
                depth: 4.0,
                height: 10.0,
                color: NeonColor::Cyan,
                phased: false,
            });
            for _ in 0..60 {
                session.obstacles.retain(|o| o.id == id);
                session.boost = BoostFuel::new(&session.tuning);
                let events = tick(&mut session, &input(&[Intent::BoostDown]), SIM_DT);
                assert_eq!(session.phase, GamePhase::Running);
                assert!(!events.iter().any(|e| matches!(e, GameEvent::NearMiss { .. })));
                phased += events
                    .iter()
                    .filter(|e| matches!(e, GameEvent::PhaseThrough { .. }))
                    .count();
            }
        }
        assert!(phased > 0);
    }

    #[test]
    fn test_cosmetic_bursts_do_not_change_spawns() {
        let mut plain = running(31);
        let mut noisy = running(31);
        for _ in 0..600 {
            noisy.effects.burst(ParticleKind::Spark, Vec3::ZERO, 7, 1.0);
            tick(&mut plain, &TickInput::default(), SIM_DT);
            tick(&mut noisy, &TickInput::default(), SIM_DT);
            if plain.phase != GamePhase::Running {
                break;
            }
        }
        assert!(!plain.obstacles.is_empty());
        assert_eq!(plain.obstacles, noisy.obstacles);
        assert_eq!(plain.spawner, noisy.spawner);
    }

    #[test]
    fn test_boost_depletes_and_reports() {
        let mut session = running(2);
        tick(&mut session, &input(&[Intent::BoostDown]), SIM_DT);
        let mut depleted = false;
        for _ in 0..600 {
            // Keep the road clear so we only measure fuel
            session.obstacles.clear();
            let events = tick(&mut session, &TickInput::default(), SIM_DT);
            if events.contains(&GameEvent::BoostStopped { depleted: true }) {
                depleted = true;
                break;
            }
        }
        assert!(depleted);
        assert!(!session.boost.is_active());
        assert!(!session.vehicle.as_ref().unwrap().boosting);
    }

    #[test]
    fn test_lane_change_event() {
        let mut session = running(4);
        let events = tick(&mut session, &input(&[Intent::LaneLeft]), SIM_DT);
        assert!(events.contains(&GameEvent::LaneChanged { lane: -1 }));
        let events = tick(&mut session, &input(&[Intent::LaneLeft]), SIM_DT);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::LaneChanged { .. })));
    }

    #[test]
    fn test_missing_vehicle_is_noop() {
        let mut session = running(4);
        session.vehicle = None;
        let events = tick(&mut session, &TickInput::default(), SIM_DT);
        assert!(events.is_empty());
        assert_eq!(session.phase, GamePhase::Running);
    }

    #[test]
    fn test_determinism() {
        let mut a = running(99999);
        let mut b = running(99999);
        let inputs = [
            input(&[Intent::LaneLeft]),
            input(&[Intent::SpeedUp, Intent::SpeedUp]),
            input(&[Intent::BoostDown]),
            TickInput::default(),
        ];
        for _ in 0..200 {
            for i in &inputs {
                tick(&mut a, i, SIM_DT);
                tick(&mut b, i, SIM_DT);
            }
        }
        assert_eq!(a.snapshot(), b.snapshot());
        assert_eq!(a.obstacles, b.obstacles);
    }
}
