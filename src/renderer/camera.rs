//! Chase camera derived from the vehicle each frame

use glam::{Mat4, Vec3};

use crate::settings::Settings;
use crate::sim::Session;

/// Height above the vehicle
const CAMERA_HEIGHT: f32 = 4.5;
/// Distance behind the vehicle
const CAMERA_DISTANCE: f32 = 10.0;
/// How far ahead of the vehicle the camera looks
const LOOK_AHEAD: f32 = 12.0;
const BASE_FOV_DEG: f32 = 60.0;
/// Extra field of view at full boost speed
const SPEED_FOV_DEG: f32 = 20.0;
/// Max world-space shake offset at shake = 1
const SHAKE_AMPLITUDE: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    /// Vertical field of view in radians
    pub fov_y: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, CAMERA_HEIGHT, CAMERA_DISTANCE),
            target: Vec3::new(0.0, 0.0, -LOOK_AHEAD),
            fov_y: BASE_FOV_DEG.to_radians(),
        }
    }
}

impl Camera {
    /// Place the camera behind the vehicle. `time` drives the shake pattern.
    pub fn follow(session: &Session, settings: &Settings, time: f32) -> Self {
        let Some(vehicle) = session.vehicle.as_ref() else {
            return Self::default();
        };

        let mut eye = vehicle.pos + Vec3::new(0.0, CAMERA_HEIGHT, CAMERA_DISTANCE);
        let target = vehicle.pos + Vec3::new(0.0, 0.0, -LOOK_AHEAD);

        let shake = session.effects.shake;
        if shake > 0.0 && settings.effective_screen_shake() {
            // Visual only; must not draw from the session RNG
            let amp = shake * SHAKE_AMPLITUDE;
            eye.x += (time * 47.0).sin() * amp;
            eye.y += (time * 59.0).cos() * amp * 0.5;
        }

        let ceiling = session.tuning.max_speed * session.tuning.boost_speed_multiplier;
        let speed_t = if ceiling > 0.0 {
            (vehicle.speed / ceiling).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let fov_deg = if settings.reduced_motion {
            BASE_FOV_DEG
        } else {
            BASE_FOV_DEG + SPEED_FOV_DEG * speed_t
        };

        Self {
            eye,
            target,
            fov_y: fov_deg.to_radians(),
        }
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.target, Vec3::Y);
        let proj = Mat4::perspective_rh(self.fov_y, aspect, 0.1, 1000.0);
        proj * view
    }
}
