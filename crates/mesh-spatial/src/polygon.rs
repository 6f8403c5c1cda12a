//! Convex polygon ring, the clipper's working vertex sequence.

use nalgebra::{Point3, Vector3};

use crate::Triangle;

/// A convex polygon in 3D space, defined by an ordered ring of vertices.
///
/// Vertices should be coplanar and in counter-clockwise winding order
/// when viewed from the front (the direction the normal points).
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Point3<f32>>,
}

impl Polygon {
    /// Creates a polygon from an ordered vertex ring.
    ///
    /// The ring is taken as given: clipped rings are only coplanar up to
    /// round-off, so no planarity check is made.
    ///
    /// # Panics (debug builds only)
    /// If fewer than 3 vertices are provided.
    pub fn new(vertices: Vec<Point3<f32>>) -> Self {
        debug_assert!(vertices.len() >= 3, "Polygon must have at least 3 vertices");
        Self { vertices }
    }

    /// Normal by Newell's method; robust when leading vertices are collinear.
    fn newell_normal(vertices: &[Point3<f32>]) -> Vector3<f32> {
        let n = vertices.len();
        (0..n).fold(Vector3::zeros(), |acc, i| {
            let a = vertices[i];
            let b = vertices[(i + 1) % n];
            acc + Vector3::new(
                (a.y - b.y) * (a.z + b.z),
                (a.z - b.z) * (a.x + b.x),
                (a.x - b.x) * (a.y + b.y),
            )
        })
    }

    /// Returns the vertices of the polygon.
    #[inline]
    pub fn vertices(&self) -> &[Point3<f32>] {
        &self.vertices
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns true if the polygon has no vertices (always false for valid polygons).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Computes the unit normal vector of the polygon.
    ///
    /// Returns `None` if all vertices are collinear.
    pub fn unit_normal(&self) -> Option<Vector3<f32>> {
        Self::newell_normal(&self.vertices).try_normalize(f32::EPSILON)
    }

    /// Computes the centroid (vertex average) of the polygon.
    pub fn centroid(&self) -> Point3<f32> {
        let sum: Vector3<f32> = self.vertices.iter().map(|p| p.coords).sum();
        Point3::from(sum / self.vertices.len() as f32)
    }

    pub fn area(&self) -> f32 {
        Self::newell_normal(&self.vertices).norm() * 0.5
    }

    /// Fan-triangulates the ring around vertex `start`.
    ///
    /// Yields `len - 2` triangles `(start, start+i+1, start+i+2)` with
    /// indices wrapping around the ring, preserving the winding.
    pub fn fan_from(&self, start: usize) -> impl Iterator<Item = Triangle> + '_ {
        let n = self.vertices.len();
        let apex = self.vertices[start % n];
        (0..n.saturating_sub(2)).map(move |i| {
            Triangle::new(
                apex,
                self.vertices[(start + i + 1) % n],
                self.vertices[(start + i + 2) % n],
            )
        })
    }
}
