//! Planar geometry shared by the layout planner, the world, and opponents.
//!
//! All intersection tests are inclusive: touching a boundary counts as an
//! intersection. Legality checks built on top of these helpers therefore fail
//! closed when a road grazes a footprint.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    min: Vec2,
    max: Vec2,
}

impl Rect {
    /// Creates a rectangle from two opposite corners in any order.
    #[must_use]
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates a rectangle centred on `center` with the provided edge lengths.
    #[must_use]
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size.abs() * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Corner with the smallest coordinates.
    #[must_use]
    pub const fn min(&self) -> Vec2 {
        self.min
    }

    /// Corner with the largest coordinates.
    #[must_use]
    pub const fn max(&self) -> Vec2 {
        self.max
    }

    /// Midpoint of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths of the rectangle.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Reports whether `point` lies inside or on the rectangle.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }

    /// Reports whether two rectangles overlap or touch.
    #[must_use]
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.max.x < other.min.x
            || self.max.y < other.min.y
            || self.min.x > other.max.x
            || self.min.y > other.max.y)
    }
}

/// Straight line segment between two points.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    start: Vec2,
    end: Vec2,
}

impl Segment {
    /// Creates a segment running from `start` to `end`.
    #[must_use]
    pub const fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    /// Starting point of the segment.
    #[must_use]
    pub const fn start(&self) -> Vec2 {
        self.start
    }

    /// End point of the segment.
    #[must_use]
    pub const fn end(&self) -> Vec2 {
        self.end
    }

    /// Euclidean length of the segment.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }

    /// Reports whether the segment collapses to a single point.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.start.distance_squared(self.end) <= f32::EPSILON
    }

    /// Interpolates along the segment; `t` is clamped to `0.0..=1.0`.
    #[must_use]
    pub fn point_at(&self, t: f32) -> Vec2 {
        self.start.lerp(self.end, t.clamp(0.0, 1.0))
    }

    /// Point on the segment nearest to `point`.
    #[must_use]
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        let direction = self.end - self.start;
        let length_sq = direction.length_squared();
        if length_sq <= f32::EPSILON {
            return self.start;
        }
        let t = (point - self.start).dot(direction) / length_sq;
        self.point_at(t)
    }

    /// Reports whether the segment passes within `radius` of `center`.
    #[must_use]
    pub fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        if radius < 0.0 {
            return false;
        }
        self.closest_point(center).distance_squared(center) <= radius * radius
    }

    /// Reports whether the segment crosses `other`.
    ///
    /// Parallel and collinear segments never intersect under this test.
    #[must_use]
    pub fn intersects_segment(&self, other: &Segment) -> bool {
        let r = self.end - self.start;
        let s = other.end - other.start;
        let denominator = r.perp_dot(s);
        if denominator.abs() <= f32::EPSILON {
            return false;
        }

        let offset = other.start - self.start;
        let t = offset.perp_dot(s) / denominator;
        let u = offset.perp_dot(r) / denominator;
        (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)
    }

    /// Reports whether any part of the segment lies inside `rect`.
    #[must_use]
    pub fn intersects_rect(&self, rect: &Rect) -> bool {
        // Liang-Barsky clipping against the four slabs.
        let delta = self.end - self.start;
        let mut t_enter = 0.0_f32;
        let mut t_exit = 1.0_f32;

        let slabs = [
            (-delta.x, self.start.x - rect.min.x),
            (delta.x, rect.max.x - self.start.x),
            (-delta.y, self.start.y - rect.min.y),
            (delta.y, rect.max.y - self.start.y),
        ];

        for (p, q) in slabs {
            if p == 0.0 {
                if q < 0.0 {
                    return false;
                }
                continue;
            }

            let t = q / p;
            if p < 0.0 {
                t_enter = t_enter.max(t);
            } else {
                t_exit = t_exit.min(t);
            }

            if t_enter > t_exit {
                return false;
            }
        }

        true
    }
}
