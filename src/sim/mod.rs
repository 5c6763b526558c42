//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - No rendering or platform dependencies

pub mod autopilot;
pub mod boost;
pub mod collision;
pub mod effects;
pub mod entity;
pub mod road;
pub mod score;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod vehicle;

pub use boost::{BoostEdge, BoostFuel};
pub use collision::{Evaluation, NearMissTracker, evaluate, is_collision, is_near_miss};
pub use effects::{Effects, Particle, ParticleKind, TrailPoint};
pub use entity::{EntityId, EntityKind, NeonColor, RenderEntity};
pub use road::{Decoration, DecorationKind, RoadSegment, RoadStream};
pub use score::{ScoreKeeper, difficulty};
pub use spawner::{Obstacle, ObstacleSpawner};
pub use state::{GamePhase, HudSnapshot, Session, SessionSummary};
pub use tick::{GameEvent, Intent, TickInput, tick};
pub use vehicle::Vehicle;
