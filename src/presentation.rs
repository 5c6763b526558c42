//! Presentation collaborators
//!
//! The game only ever talks to the outside world through these traits. The
//! session owns every entity; collaborators get read-only views.

use crate::renderer::Camera;
use crate::sim::{RenderEntity, SessionSummary};

/// Sounds the game can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundKind {
    Crash,
    NearMiss,
    Boost,
    Drift,
}

pub trait SoundSink {
    /// Called on session start, from inside a user gesture on the web
    fn prime(&mut self) {}
    fn play_once(&mut self, kind: SoundKind);
    fn start_loop(&mut self, kind: SoundKind);
    fn stop_loop(&mut self, kind: SoundKind);
}

pub trait Hud {
    /// Speed in dashboard units
    fn set_speed(&mut self, speed: u32);
    fn set_score(&mut self, score: u64);
    /// 0..=100
    fn set_boost(&mut self, percent: f32);
    /// One-shot screen flash
    fn flash(&mut self);
    fn show_prompt(&mut self, visible: bool);
    fn show_game_over(&mut self, summary: &SessionSummary);
}

pub trait Renderer {
    fn render(&mut self, entities: &[RenderEntity], camera: &Camera, dt: f32);
}

/// Sound sink that drops everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSound;

impl SoundSink for NullSound {
    fn play_once(&mut self, _kind: SoundKind) {}
    fn start_loop(&mut self, _kind: SoundKind) {}
    fn stop_loop(&mut self, _kind: SoundKind) {}
}
