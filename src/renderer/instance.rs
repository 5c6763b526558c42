//! GPU instance records
//!
//! Tagged render entities are flattened into fixed-layout instances a GPU
//! backend can upload as-is. One box per instance; the shader picks its look
//! from `kind`.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use super::Camera;
use crate::presentation::Renderer;
use crate::settings::Settings;
use crate::sim::{EntityKind, RenderEntity};

/// Per-instance data (48 bytes)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    pub position: [f32; 3],
    pub kind: u32,
    pub size: [f32; 3],
    pub param: f32,
    pub color: [f32; 4],
}

impl InstanceRaw {
    pub const SIZE: usize = std::mem::size_of::<InstanceRaw>();
}

pub fn kind_code(kind: EntityKind) -> u32 {
    match kind {
        EntityKind::Segment => 0,
        EntityKind::Decoration => 1,
        EntityKind::Obstacle => 2,
        EntityKind::Vehicle => 3,
        EntityKind::Trail => 4,
        EntityKind::Particle => 5,
    }
}

/// Colors for game elements
pub mod colors {
    pub const ROAD: [f32; 4] = [0.04, 0.03, 0.08, 1.0];
    pub const LANE_DASH: [f32; 4] = [0.9, 0.9, 1.0, 1.0];
    pub const STREET_LAMP: [f32; 4] = [1.0, 0.75, 0.3, 1.0];
    pub const VEHICLE: [f32; 4] = [0.2, 0.9, 1.0, 1.0];
    pub const VEHICLE_BOOST: [f32; 4] = [1.0, 0.3, 0.9, 1.0];
    pub const PHASED: [f32; 4] = [1.0, 1.0, 1.0, 0.35];
    pub const TRAIL: [f32; 4] = [0.2, 0.9, 1.0, 0.6];

    /// Building accents, indexed by `NeonColor`
    pub const NEON: [[f32; 4]; 5] = [
        [1.0, 0.1, 0.8, 1.0],
        [0.1, 0.95, 1.0, 1.0],
        [1.0, 0.7, 0.1, 1.0],
        [0.5, 1.0, 0.2, 1.0],
        [0.6, 0.3, 1.0, 1.0],
    ];

    /// Spark, debris, exhaust
    pub const PARTICLE: [[f32; 4]; 3] = [
        [1.0, 0.95, 0.6, 1.0],
        [1.0, 0.4, 0.2, 1.0],
        [0.9, 0.3, 1.0, 1.0],
    ];
}

fn color_for(entity: &RenderEntity) -> [f32; 4] {
    match entity.kind {
        EntityKind::Segment => colors::ROAD,
        EntityKind::Decoration if entity.param > 0.5 => colors::STREET_LAMP,
        EntityKind::Decoration => colors::LANE_DASH,
        EntityKind::Obstacle if entity.highlight => colors::PHASED,
        EntityKind::Obstacle => colors::NEON[entity.color as usize % colors::NEON.len()],
        EntityKind::Vehicle if entity.highlight => colors::VEHICLE_BOOST,
        EntityKind::Vehicle => colors::VEHICLE,
        EntityKind::Trail => {
            let mut c = colors::TRAIL;
            c[3] *= entity.param;
            c
        }
        EntityKind::Particle => {
            let mut c = colors::PARTICLE[entity.color as usize % colors::PARTICLE.len()];
            c[3] = entity.param.clamp(0.0, 1.0);
            c
        }
    }
}

/// Flatten entities into instances, honouring the quality settings
pub fn build_instances(entities: &[RenderEntity], settings: &Settings) -> Vec<InstanceRaw> {
    let max_particles = settings.max_particles();
    let trail_total = entities
        .iter()
        .filter(|e| e.kind == EntityKind::Trail)
        .count();
    let max_trail = settings.trail_points(trail_total);
    let lamps = settings.quality.lamps_enabled();

    let mut particles = 0;
    let mut trail = 0;
    let mut out = Vec::with_capacity(entities.len());
    for entity in entities {
        match entity.kind {
            EntityKind::Particle => {
                if particles >= max_particles {
                    continue;
                }
                particles += 1;
            }
            EntityKind::Trail => {
                if trail >= max_trail {
                    continue;
                }
                trail += 1;
            }
            EntityKind::Decoration if !lamps && entity.param > 0.5 => continue,
            _ => {}
        }
        out.push(InstanceRaw {
            position: entity.pos.to_array(),
            kind: kind_code(entity.kind),
            size: entity.size.to_array(),
            param: entity.param,
            color: color_for(entity),
        });
    }
    out
}

/// Viewport aspect used until the host reports its canvas size
pub const DEFAULT_ASPECT: f32 = 16.0 / 9.0;

/// CPU-side instance buffer; a GPU backend uploads `bytes()` and
/// `view_proj` each frame
#[derive(Debug)]
pub struct InstanceBuffer {
    pub settings: Settings,
    pub instances: Vec<InstanceRaw>,
    pub camera: Camera,
    pub view_proj: Mat4,
    aspect: f32,
    pub frames: u64,
}

impl InstanceBuffer {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            instances: Vec::new(),
            camera: Camera::default(),
            view_proj: Mat4::IDENTITY,
            aspect: DEFAULT_ASPECT,
            frames: 0,
        }
    }

    /// Track the canvas size; degenerate sizes are ignored
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

impl Renderer for InstanceBuffer {
    fn render(&mut self, entities: &[RenderEntity], camera: &Camera, _dt: f32) {
        self.instances = build_instances(entities, &self.settings);
        self.camera = *camera;
        self.view_proj = camera.view_proj(self.aspect);
        self.frames += 1;
    }
}
