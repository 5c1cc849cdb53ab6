//! Collision Detection
//!
//! Axis-aligned bounding-box tests used by every other subsystem.

use crate::game::entity::Obstacle;

/// Box size assumed for entities without an explicit one (bullets,
/// particles).
pub const DEFAULT_BOX: f32 = 4.0;

/// An axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Aabb {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// A default-sized box anchored at a point.
    pub fn point(x: f32, y: f32) -> Self {
        Self::new(x, y, DEFAULT_BOX, DEFAULT_BOX)
    }

    /// Center of the box.
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Half-open overlap test on both axes.
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.x < other.x + other.w
            && self.x + self.w > other.x
            && self.y < other.y + other.h
            && self.y + self.h > other.y
    }
}

/// True iff the box overlaps any obstacle that still has health.
pub fn blocked_by_obstacles(rect: &Aabb, obstacles: &[Obstacle]) -> bool {
    obstacles
        .iter()
        .any(|o| o.health > 0.0 && rect.overlaps(&o.aabb()))
}

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    (a.0 - b.0).hypot(a.1 - b.1)
}
