//! Demo-mode driver
//!
//! Steers out of lanes with a building coming up, boosts through when every
//! escape is blocked, and keeps the target speed up.

use super::state::Session;
use super::tick::Intent;
use crate::clamp_lane;

/// Frames of travel the autopilot looks ahead
const LOOKAHEAD_FRAMES: f32 = 40.0;

pub fn plan(session: &Session) -> Vec<Intent> {
    let mut intents = Vec::new();
    let Some(vehicle) = session.vehicle.as_ref() else {
        return intents;
    };
    let tuning = &session.tuning;

    let lookahead = tuning.vehicle_depth * 2.0 + vehicle.speed * LOOKAHEAD_FRAMES;
    let danger = |lane: i32| {
        session.obstacles.iter().any(|o| {
            o.lane == lane
                && o.pos.z < vehicle.pos.z + (o.depth + vehicle.depth) / 2.0
                && o.pos.z > vehicle.pos.z - lookahead
        })
    };

    if danger(vehicle.lane) {
        // Prefer the lane toward the centre, then the other side
        let mut options = [vehicle.lane - 1, vehicle.lane + 1];
        options.sort_by_key(|lane| lane.abs());
        let escape = options
            .into_iter()
            .find(|&lane| clamp_lane(lane) == lane && !danger(lane));

        match escape {
            Some(lane) if lane < vehicle.lane => intents.push(Intent::LaneLeft),
            Some(_) => intents.push(Intent::LaneRight),
            None if !session.boost.is_active() => intents.push(Intent::BoostDown),
            None => {}
        }
    } else if session.boost.is_active() {
        intents.push(Intent::BoostUp);
    }

    if vehicle.target_speed < tuning.max_speed * 0.8 {
        intents.push(Intent::SpeedUp);
    }

    intents
}
