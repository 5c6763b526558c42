//! Tagged entity views handed to the presentation layer
//!
//! The renderer never inspects simulation structs directly; it switches on
//! [`EntityKind`] over a flat list of [`RenderEntity`] records.

use glam::Vec3;
use serde::{Deserialize, Serialize};

pub type EntityId = u32;

/// Monotonic entity ID source, reset with the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdAllocator {
    next: EntityId,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdAllocator {
    pub fn next_id(&mut self) -> EntityId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Number of IDs handed out so far
    pub fn issued(&self) -> u32 {
        self.next - 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Vehicle,
    Obstacle,
    Segment,
    /// Lane dash or street lamp owned by a segment
    Decoration,
    Particle,
    /// Vehicle trail sample
    Trail,
}

/// Emissive accent for buildings (cosmetic only)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NeonColor {
    #[default]
    Magenta,
    Cyan,
    Amber,
    Lime,
    Violet,
}

impl NeonColor {
    pub const ALL: [NeonColor; 5] = [
        NeonColor::Magenta,
        NeonColor::Cyan,
        NeonColor::Amber,
        NeonColor::Lime,
        NeonColor::Violet,
    ];

    pub fn index(self) -> u32 {
        self as u32
    }
}

/// Read-only snapshot of one drawable entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderEntity {
    pub id: EntityId,
    pub kind: EntityKind,
    /// World position (x lateral, y up, z longitudinal; forward is -z)
    pub pos: Vec3,
    /// Full extents (width, height, depth)
    pub size: Vec3,
    /// Palette index for neon accents
    pub color: u32,
    /// Kind-specific scalar: vehicle lean, particle life, trail fade
    pub param: f32,
    /// Vehicle boost glow / obstacle phased-through
    pub highlight: bool,
}

impl RenderEntity {
    pub fn new(id: EntityId, kind: EntityKind, pos: Vec3, size: Vec3) -> Self {
        Self {
            id,
            kind,
            pos,
            size,
            color: 0,
            param: 0.0,
            highlight: false,
        }
    }
}
