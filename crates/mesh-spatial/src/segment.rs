//! Line segments used for ray queries and edge reconciliation.

use nalgebra::{Point3, Vector3};

/// A finite segment between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    start: Point3<f32>,
    end: Point3<f32>,
}

impl LineSegment {
    /// Creates a segment running from `start` to `end`.
    pub fn new(start: Point3<f32>, end: Point3<f32>) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn start(&self) -> Point3<f32> {
        self.start
    }

    #[inline]
    pub fn end(&self) -> Point3<f32> {
        self.end
    }

    /// Vector from `start` to `end`.
    #[inline]
    pub fn direction(&self) -> Vector3<f32> {
        self.end - self.start
    }

    pub fn length(&self) -> f32 {
        self.direction().norm()
    }

    /// Point at parameter `t` (0.0 = start, 1.0 = end).
    #[inline]
    pub fn lerp(&self, t: f32) -> Point3<f32> {
        self.start + self.direction() * t
    }

    /// Recovers the parameter of a point lying on the segment's line.
    ///
    /// Returns `None` if the point is farther than `epsilon` from the line or
    /// the segment has zero length. The parameter is not clamped.
    pub fn lerp_inverse(&self, point: Point3<f32>, epsilon: f32) -> Option<f32> {
        let dir = self.direction();
        let len_sq = dir.norm_squared();
        if len_sq <= f32::EPSILON * f32::EPSILON {
            return None;
        }

        let offset = point - self.start;
        // |offset × dir| / |dir| is the distance from the line.
        if offset.cross(&dir).norm() > epsilon * len_sq.sqrt() {
            return None;
        }

        Some(offset.dot(&dir) / len_sq)
    }

    /// True if `point` is on the segment within `epsilon`.
    pub fn contains_point(&self, point: Point3<f32>, epsilon: f32) -> bool {
        let Some(t) = self.lerp_inverse(point, epsilon) else {
            return false;
        };
        let slack = epsilon / self.length();
        (-slack..=1.0 + slack).contains(&t)
    }

    /// Distance from `point` to the closest point of the segment.
    pub fn distance_to_point(&self, point: Point3<f32>) -> f32 {
        let dir = self.direction();
        let len_sq = dir.norm_squared();
        if len_sq <= f32::EPSILON * f32::EPSILON {
            return (point - self.start).norm();
        }

        let t = ((point - self.start).dot(&dir) / len_sq).clamp(0.0, 1.0);
        (point - self.lerp(t)).norm()
    }
}
