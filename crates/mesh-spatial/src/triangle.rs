//! Triangle representation and the geometric predicates the trees query.

use nalgebra::{Point3, Vector3};

use crate::{Classification, LineSegment, PLANE_EPSILON, Plane3D, PlaneSide};

/// A triangle in 3D space, defined by three vertices.
///
/// Normal and plane are derived on demand, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    vertices: [Point3<f32>; 3],
}

impl Triangle {
    /// Creates a new triangle from three points.
    ///
    /// The winding order determines the normal direction via the right-hand rule:
    /// normal = (b - a) × (c - a)
    pub fn new(a: Point3<f32>, b: Point3<f32>, c: Point3<f32>) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    /// Returns the three vertices of the triangle.
    #[inline]
    pub fn vertices(&self) -> &[Point3<f32>; 3] {
        &self.vertices
    }

    /// Computes the (unnormalized) normal vector of the triangle.
    ///
    /// Its length is twice the triangle's area.
    pub fn normal(&self) -> Vector3<f32> {
        let [a, b, c] = &self.vertices;
        let ab = b - a;
        let ac = c - a;
        ab.cross(&ac)
    }

    /// Computes the unit normal vector of the triangle.
    ///
    /// Returns `None` if the triangle is degenerate (zero area).
    pub fn unit_normal(&self) -> Option<Vector3<f32>> {
        self.normal().try_normalize(f32::EPSILON)
    }

    /// Returns the plane that this triangle lies on, or `None` for collinear vertices.
    pub fn plane(&self) -> Option<Plane3D> {
        let [a, b, c] = &self.vertices;
        Plane3D::from_three_points(*a, *b, *c)
    }

    pub fn area(&self) -> f32 {
        self.normal().norm() * 0.5
    }

    /// True if the area is below `epsilon`.
    pub fn is_degenerate(&self, epsilon: f32) -> bool {
        self.area() < epsilon
    }

    /// Computes the centroid (center of mass) of the triangle.
    pub fn centroid(&self) -> Point3<f32> {
        let [a, b, c] = &self.vertices;
        Point3::from((a.coords + b.coords + c.coords) / 3.0)
    }

    /// The three directed edges `v0→v1`, `v1→v2`, `v2→v0`.
    pub fn edges(&self) -> [LineSegment; 3] {
        let [a, b, c] = self.vertices;
        [
            LineSegment::new(a, b),
            LineSegment::new(b, c),
            LineSegment::new(c, a),
        ]
    }

    /// Classifies this triangle relative to a plane.
    ///
    /// Returns:
    /// - `Coplanar` if all vertices lie on the plane
    /// - `Front` if no vertex is behind the plane
    /// - `Back` if no vertex is in front of the plane
    /// - `Spanning` if vertices are on both sides
    pub fn classify(&self, plane: &Plane3D) -> Classification {
        self.classify_with_epsilon(plane, PLANE_EPSILON)
    }

    pub fn classify_with_epsilon(&self, plane: &Plane3D, epsilon: f32) -> Classification {
        let mut front = 0;
        let mut back = 0;
        let mut on_plane = 0;

        for vertex in &self.vertices {
            match plane.classify_point_with_epsilon(*vertex, epsilon) {
                PlaneSide::Front => front += 1,
                PlaneSide::Back => back += 1,
                PlaneSide::OnPlane => on_plane += 1,
            }
        }

        if on_plane == 3 {
            Classification::Coplanar
        } else if back == 0 {
            Classification::Front
        } else if front == 0 {
            Classification::Back
        } else {
            Classification::Spanning
        }
    }

    /// True if `point` lies on the triangle's plane and inside (or on) all three edges.
    pub fn contains_point(&self, point: Point3<f32>, epsilon: f32) -> bool {
        let Some(plane) = self.plane() else {
            return false;
        };
        if plane.classify_point_with_epsilon(point, epsilon) != PlaneSide::OnPlane {
            return false;
        }

        let normal = plane.normal();
        self.edges().iter().all(|edge| {
            let dir = edge.direction();
            let len = dir.norm();
            // Signed distance of the point from the edge, inside positive.
            dir.cross(&(point - edge.start())).dot(&normal) > -epsilon * len
        })
    }

    /// Intersects a segment with the triangle.
    ///
    /// Returns the segment parameter and the hit point.
    pub fn intersect_segment(
        &self,
        segment: &LineSegment,
        epsilon: f32,
    ) -> Option<(f32, Point3<f32>)> {
        let plane = self.plane()?;
        let (t, point) = plane.intersect_line(segment.start(), segment.direction())?;

        let slack = epsilon / segment.length();
        if !(-slack..=1.0 + slack).contains(&t) {
            return None;
        }

        self.contains_point(point, epsilon).then_some((t, point))
    }

    /// Distance from `point` to the closest point of the triangle.
    ///
    /// Uses the plane distance when the projection falls inside the triangle,
    /// otherwise the distance to the nearest edge (which covers the vertices).
    pub fn distance_to_point(&self, point: Point3<f32>) -> f32 {
        self.distance_to_point_with_epsilon(point, PLANE_EPSILON)
    }

    /// As [`distance_to_point`](Self::distance_to_point), with `epsilon` as
    /// the tolerance for the projection landing inside the triangle.
    pub fn distance_to_point_with_epsilon(&self, point: Point3<f32>, epsilon: f32) -> f32 {
        if let Some(plane) = self.plane() {
            let projected = plane.project_point(point);
            if self.contains_point(projected, epsilon) {
                return plane.signed_distance(point).abs();
            }
        }

        self.edges()
            .iter()
            .map(|edge| edge.distance_to_point(point))
            .fold(f32::INFINITY, f32::min)
    }
}
