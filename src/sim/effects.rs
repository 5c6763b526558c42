//! Game-feel effects: camera shake, screen flash, particles and the vehicle trail
//!
//! Purely visual. Nothing here feeds back into gameplay.

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Particle cap (quality settings may draw fewer)
pub const MAX_PARTICLES: usize = 512;

/// Maximum number of trail points to store
pub const TRAIL_LENGTH: usize = 24;

/// PCG stream for cosmetic randomness, distinct from the gameplay stream
const FX_STREAM: u64 = 0x6e65_6f6e_6678;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Near-miss sparks
    Spark,
    /// Crash debris
    Debris,
    /// Boost exhaust
    Exhaust,
}

/// A particle for visual effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub kind: ParticleKind,
    pub pos: Vec3,
    pub vel: Vec3,
    pub life: f32, // 0-1, decreases over time
    pub size: f32,
}

/// Trail point for rendering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrailPoint {
    pub pos: Vec3,
    pub speed: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Effects {
    /// Camera shake intensity (0-1)
    pub shake: f32,
    /// Screen flash intensity (0-1)
    pub flash: f32,
    pub particles: Vec<Particle>,
    /// Newest first
    pub trail: Vec<TrailPoint>,
    rng: Pcg32,
}

impl Default for Effects {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Effects {
    /// Empty effects with their own random stream derived from `seed`
    pub fn new(seed: u64) -> Self {
        Self {
            shake: 0.0,
            flash: 0.0,
            particles: Vec::new(),
            trail: Vec::new(),
            rng: Pcg32::new(seed, FX_STREAM),
        }
    }

    pub fn reset(&mut self, seed: u64) {
        *self = Self::new(seed);
    }

    /// Nothing left to animate
    pub fn is_settled(&self) -> bool {
        self.shake == 0.0 && self.flash == 0.0 && self.particles.is_empty()
    }

    pub fn add_shake(&mut self, amount: f32) {
        self.shake = (self.shake + amount).min(1.0);
    }

    pub fn trigger_flash(&mut self) {
        self.flash = 1.0;
    }

    /// Spray `count` particles from `origin`
    pub fn burst(
        &mut self,
        kind: ParticleKind,
        origin: Vec3,
        count: usize,
        speed: f32,
    ) {
        for _ in 0..count {
            if self.particles.len() >= MAX_PARTICLES {
                break;
            }
            let rng = &mut self.rng;
            let dir = Vec3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(0.0..1.0),
                rng.random_range(-1.0..1.0),
            )
            .normalize_or_zero();
            let vel = dir * speed * rng.random_range(0.5..1.0);
            let size = rng.random_range(0.1..0.35);
            self.particles.push(Particle {
                kind,
                pos: origin,
                vel,
                life: 1.0,
                size,
            });
        }
    }

    /// Record the vehicle position to the trail (call each tick while moving)
    pub fn record_trail(&mut self, pos: Vec3, speed: f32) {
        self.trail.insert(0, TrailPoint { pos, speed });
        self.trail.truncate(TRAIL_LENGTH);
    }

    /// Decay envelopes and advance particles
    pub fn update(&mut self, dt: f32) {
        self.shake *= 0.9; // Fast decay
        if self.shake < 0.01 {
            self.shake = 0.0;
        }

        self.flash *= 0.92;
        if self.flash < 0.01 {
            self.flash = 0.0;
        }

        for particle in self.particles.iter_mut() {
            particle.pos += particle.vel * dt;
            particle.vel.y -= 9.8 * dt;
            particle.vel *= 0.98;
            particle.life -= dt * match particle.kind {
                ParticleKind::Spark => 2.5,
                ParticleKind::Debris => 0.8,
                ParticleKind::Exhaust => 4.0,
            };
            particle.size *= 0.995;
        }
        self.particles.retain(|p| p.life > 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shake_decays_to_zero() {
        let mut fx = Effects::default();
        fx.add_shake(2.0);
        assert_eq!(fx.shake, 1.0);
        for _ in 0..100 {
            fx.update(1.0 / 60.0);
        }
        assert_eq!(fx.shake, 0.0);
    }

    #[test]
    fn test_burst_capped() {
        let mut fx = Effects::new(1);
        fx.burst(ParticleKind::Debris, Vec3::ZERO, MAX_PARTICLES + 50, 10.0);
        assert_eq!(fx.particles.len(), MAX_PARTICLES);
    }

    #[test]
    fn test_particles_expire() {
        let mut fx = Effects::new(1);
        fx.burst(ParticleKind::Spark, Vec3::ZERO, 20, 5.0);
        assert!(!fx.is_settled());
        for _ in 0..60 {
            fx.update(1.0 / 60.0);
        }
        assert!(fx.particles.is_empty());
        assert!(fx.is_settled());
    }

    #[test]
    fn test_reset_replays_bursts() {
        let mut fx = Effects::new(8);
        fx.burst(ParticleKind::Debris, Vec3::ZERO, 5, 10.0);
        let first = fx.particles.clone();
        fx.reset(8);
        assert!(fx.is_settled());
        fx.burst(ParticleKind::Debris, Vec3::ZERO, 5, 10.0);
        assert_eq!(fx.particles, first);
    }

    #[test]
    fn test_trail_bounded_newest_first() {
        let mut fx = Effects::default();
        for i in 0..40 {
            fx.record_trail(Vec3::new(0.0, 0.0, -(i as f32)), 1.0);
        }
        assert_eq!(fx.trail.len(), TRAIL_LENGTH);
        assert_eq!(fx.trail[0].pos.z, -39.0);
    }
}
