//! Streaming road segments
//!
//! Segments are appended past the farthest one until the visible window ahead
//! of the vehicle is covered, and retired once they fall far enough behind.
//! The collection stays sorted by z descending (behind-most first), so new
//! segments land at the back and retirement trims the front.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::entity::{EntityId, IdAllocator};
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DecorationKind {
    LaneDash,
    StreetLamp,
}

/// Child prop owned by a segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    pub id: EntityId,
    pub kind: DecorationKind,
    /// Offset from the segment centre
    pub offset: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadSegment {
    pub id: EntityId,
    /// Longitudinal centre
    pub z: f32,
    pub length: f32,
    pub decorations: Vec<Decoration>,
}

impl RoadSegment {
    fn new(z: f32, ids: &mut IdAllocator, tuning: &Tuning) -> Self {
        let id = ids.next_id();
        let mut decorations = Vec::new();

        // Dashes on the two lane boundaries
        let dashes = tuning.dashes_per_segment.max(1);
        let spacing = tuning.segment_length / dashes as f32;
        for boundary in [-0.5, 0.5] {
            for i in 0..dashes {
                let dz = -tuning.segment_length / 2.0 + spacing * (i as f32 + 0.5);
                decorations.push(Decoration {
                    id: ids.next_id(),
                    kind: DecorationKind::LaneDash,
                    offset: Vec3::new(boundary * tuning.lane_width, 0.01, dz),
                });
            }
        }

        // A lamp on each kerb
        let kerb = tuning.lane_width * 1.5 + 1.0;
        for side in [-1.0, 1.0] {
            decorations.push(Decoration {
                id: ids.next_id(),
                kind: DecorationKind::StreetLamp,
                offset: Vec3::new(side * kerb, 0.0, 0.0),
            });
        }

        Self {
            id,
            z,
            length: tuning.segment_length,
            decorations,
        }
    }

    /// Edge farthest ahead (most negative z)
    pub fn far_edge(&self) -> f32 {
        self.z - self.length / 2.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoadStream {
    segments: Vec<RoadSegment>,
    /// Decorations released by retirement over the session
    released_decorations: u64,
}

impl RoadStream {
    pub fn segments(&self) -> &[RoadSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn released_decorations(&self) -> u64 {
        self.released_decorations
    }

    /// Drop every segment and its decorations
    pub fn clear(&mut self) {
        self.segments.clear();
        self.released_decorations = 0;
    }

    /// Farthest-ahead segment
    pub fn farthest(&self) -> Option<&RoadSegment> {
        self.segments.last()
    }

    /// Extend the road until the window ahead of `vehicle_z` is covered.
    /// Returns the number of segments appended.
    pub fn ensure_coverage(
        &mut self,
        vehicle_z: f32,
        ids: &mut IdAllocator,
        tuning: &Tuning,
    ) -> usize {
        if self.segments.is_empty() {
            self.segments.push(RoadSegment::new(vehicle_z, ids, tuning));
        }

        let ahead = tuning.visible_depth();
        let mut added = 0;
        while let Some(farthest) = self.segments.last() {
            if vehicle_z - farthest.far_edge() >= ahead {
                break;
            }
            let z = farthest.z - tuning.segment_length;
            self.segments.push(RoadSegment::new(z, ids, tuning));
            self.segments.sort_by(|a, b| b.z.total_cmp(&a.z));
            added += 1;
        }
        added
    }

    /// Retire segments that fell behind the look-behind margin.
    /// Returns the number of segments removed.
    pub fn retire_behind(&mut self, vehicle_z: f32, tuning: &Tuning) -> usize {
        let limit = vehicle_z
            + tuning.segment_length
                * (tuning.visible_segments as f32 / 2.0 + tuning.segment_lookbehind as f32);
        let before = self.segments.len();
        let mut released = 0u64;
        self.segments.retain(|s| {
            let keep = s.z <= limit;
            if !keep {
                released += s.decorations.len() as u64;
            }
            keep
        });
        self.released_decorations += released;
        let removed = before - self.segments.len();
        if removed > 0 {
            log::debug!("Retired {} road segments behind z={:.1}", removed, vehicle_z);
        }
        removed
    }

    /// Whether the stretch from `near_z` forward to `far_z` is covered without gaps
    pub fn covers(&self, near_z: f32, far_z: f32) -> bool {
        const EPS: f32 = 1e-3;
        let mut edge = near_z;
        for seg in &self.segments {
            if seg.far_edge() >= edge {
                continue;
            }
            if seg.z + seg.length / 2.0 < edge - EPS {
                return false;
            }
            edge = seg.far_edge();
            if edge <= far_z {
                return true;
            }
        }
        false
    }
}
