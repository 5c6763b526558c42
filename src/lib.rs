//! Neon Drift - An endless lane runner through a neon city
//!
//! Core modules:
//! - `sim`: Deterministic simulation (kinematics, spawning, collisions, scoring)
//! - `game`: Host-owned game loop that drives the sim and the presentation layer
//! - `presentation`: Narrow interface to the renderer, HUD and sound collaborators
//! - `renderer`: Tagged entity -> GPU instance flattening
//! - `audio`: Procedural sound backend
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod error;
pub mod game;
pub mod presentation;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::GameError;
pub use game::{Game, GameBuilder};
pub use settings::{QualityPreset, Settings};
pub use tuning::{ScoreFormula, Tuning};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one reference frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest wall-clock frame fed into the accumulator (tab switches etc.)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Lane indices run from -MAX_LANE to MAX_LANE
    pub const MAX_LANE: i32 = 1;
    pub const LANE_COUNT: usize = 3;
}

/// Clamp a lane index to the playable lanes
#[inline]
pub fn clamp_lane(lane: i32) -> i32 {
    lane.clamp(-consts::MAX_LANE, consts::MAX_LANE)
}

/// Fraction of the remaining distance closed after `frames` reference frames
/// when each frame closes `per_frame` of it.
#[inline]
pub fn smoothing_factor(per_frame: f32, frames: f32) -> f32 {
    1.0 - (1.0 - per_frame.clamp(0.0, 1.0)).powf(frames.max(0.0))
}
