//! Rendering support
//!
//! Camera placement and flattening of tagged entities into GPU instances. The
//! actual draw calls belong to whichever backend implements
//! [`Renderer`](crate::presentation::Renderer).

pub mod camera;
pub mod instance;

pub use camera::Camera;
pub use instance::{InstanceBuffer, InstanceRaw, build_instances};
