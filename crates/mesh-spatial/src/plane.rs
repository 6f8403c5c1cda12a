//! Plane representation and operations shared by both trees.

use nalgebra::{Affine3, Matrix3, Point3, Vector3};

/// Default epsilon for plane classification.
/// Points within this distance of the plane are considered "on" the plane.
pub const PLANE_EPSILON: f32 = 1e-5;

/// Which side of a plane a point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaneSide {
    /// Point is in front of the plane (positive side of normal)
    Front,
    /// Point is behind the plane (negative side of normal)
    Back,
    /// Point lies inside the epsilon band around the plane
    OnPlane,
}

/// Classification of a triangle relative to a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// No vertex is behind the plane, at least one is in front
    Front,
    /// No vertex is in front of the plane, at least one is behind
    Back,
    /// All vertices are on the plane (coplanar)
    Coplanar,
    /// Vertices are on both sides (spans the plane)
    Spanning,
}

/// A plane in 3D space, represented as `normal · point = offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane3D {
    normal: Vector3<f32>,
    offset: f32,
}

impl Plane3D {
    /// Builds `normal · p = offset`, rescaling both so the normal is unit length.
    ///
    /// # Panics
    /// If `normal` is zero.
    pub fn new(normal: Vector3<f32>, offset: f32) -> Self {
        let norm = normal.norm();
        assert!(norm > f32::EPSILON, "Plane normal cannot be zero");
        Self {
            normal: normal / norm,
            offset: offset / norm,
        }
    }

    /// Creates a plane from a point on the plane and a normal vector.
    ///
    /// Returns `None` if the normal has zero length.
    pub fn from_point_and_normal(point: Point3<f32>, normal: Vector3<f32>) -> Option<Self> {
        let unit_normal = normal.try_normalize(f32::EPSILON)?;
        let offset = unit_normal.dot(&point.coords);
        Some(Self {
            normal: unit_normal,
            offset,
        })
    }

    /// Creates a plane from three points.
    /// The normal direction follows the right-hand rule: (b - a) × (c - a).
    ///
    /// Returns `None` if the points are collinear.
    pub fn from_three_points(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> Option<Self> {
        let ab = b - a;
        let ac = c - a;
        Self::from_point_and_normal(a, ab.cross(&ac))
    }

    /// Returns the unit normal vector of the plane.
    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    /// Returns the signed distance from the origin to the plane along the normal.
    #[inline]
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// The point of the plane closest to the origin.
    #[inline]
    pub fn center(&self) -> Point3<f32> {
        Point3::from(self.normal * self.offset)
    }

    /// Distance of `point` along the normal; negative behind the plane.
    #[inline]
    pub fn signed_distance(&self, point: Point3<f32>) -> f32 {
        self.normal.dot(&point.coords) - self.offset
    }

    /// [`classify_point_with_epsilon`](Self::classify_point_with_epsilon) with [`PLANE_EPSILON`].
    #[inline]
    pub fn classify_point(&self, point: Point3<f32>) -> PlaneSide {
        self.classify_point_with_epsilon(point, PLANE_EPSILON)
    }

    /// Points closer than `epsilon` to the plane are [`PlaneSide::OnPlane`].
    pub fn classify_point_with_epsilon(&self, point: Point3<f32>, epsilon: f32) -> PlaneSide {
        match self.signed_distance(point) {
            d if d > epsilon => PlaneSide::Front,
            d if d < -epsilon => PlaneSide::Back,
            _ => PlaneSide::OnPlane,
        }
    }

    /// The foot of the perpendicular from `point`.
    #[inline]
    pub fn project_point(&self, point: Point3<f32>) -> Point3<f32> {
        point - self.normal * self.signed_distance(point)
    }

    /// Intersects the infinite line through `origin` along `direction`.
    ///
    /// Returns the line parameter and the intersection point, or `None` when
    /// the line runs parallel to the plane.
    pub fn intersect_line(
        &self,
        origin: Point3<f32>,
        direction: Vector3<f32>,
    ) -> Option<(f32, Point3<f32>)> {
        let denom = self.normal.dot(&direction);
        if denom.abs() < f32::EPSILON {
            return None;
        }

        let t = (self.offset - self.normal.dot(&origin.coords)) / denom;
        Some((t, origin + direction * t))
    }

    /// Crossing of the segment `start..end`, with `t` running from 0 at
    /// `start` to 1 at `end`.
    pub fn intersect_segment(
        &self,
        start: Point3<f32>,
        end: Point3<f32>,
    ) -> Option<(f32, Point3<f32>)> {
        self.intersect_line(start, end - start)
            .filter(|(t, _)| (0.0..=1.0).contains(t))
    }

    /// Maps the plane through an affine transform.
    ///
    /// The center point goes through `transform` and the normal through
    /// `normal_matrix` (the inverse transpose of the linear part), then the
    /// offset is re-derived from both. Returns `None` if the transformed
    /// normal collapses to zero.
    pub fn transformed(
        &self,
        transform: &Affine3<f32>,
        normal_matrix: &Matrix3<f32>,
    ) -> Option<Self> {
        let center = transform.transform_point(&self.center());
        let normal = normal_matrix * self.normal;
        Self::from_point_and_normal(center, normal)
    }

    /// Compares normals and offsets component-wise within `epsilon`.
    pub fn approx_eq(&self, other: &Plane3D, epsilon: f32) -> bool {
        (self.offset - other.offset).abs() < epsilon
            && (self.normal - other.normal).iter().all(|d| d.abs() < epsilon)
    }
}
