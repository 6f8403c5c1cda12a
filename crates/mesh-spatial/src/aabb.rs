//! Axis-aligned boxes: containment, splitting and segment overlap.

use nalgebra::{Point3, Vector3};

use crate::{DrawMode, LineSegment, PLANE_EPSILON, Plane3D, Renderer, Triangle, Vertex, VertexFlags};

/// One of the three coordinate axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Unit vector along the axis.
    pub fn unit(self) -> Vector3<f32> {
        let mut v = Vector3::zeros();
        v[self.index()] = 1.0;
        v
    }
}

/// A box spanned by a `min` and a `max` corner.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisAlignedBox {
    min: Point3<f32>,
    max: Point3<f32>,
}

impl AxisAlignedBox {
    /// Creates a box from two opposite corners, in any order.
    pub fn new(a: Point3<f32>, b: Point3<f32>) -> Self {
        Self {
            min: a.inf(&b),
            max: a.sup(&b),
        }
    }

    pub fn from_center_and_dimensions(center: Point3<f32>, dimensions: Vector3<f32>) -> Self {
        let half = dimensions.abs() * 0.5;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Smallest box holding every point, or `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point3<f32>>,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let mut bounds = Self {
            min: first,
            max: first,
        };
        for point in points {
            bounds.grow_to_include_point(point);
        }
        Some(bounds)
    }

    #[inline]
    pub fn min(&self) -> Point3<f32> {
        self.min
    }

    #[inline]
    pub fn max(&self) -> Point3<f32> {
        self.max
    }

    pub fn center(&self) -> Point3<f32> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Size of the box along each axis.
    pub fn extents(&self) -> Vector3<f32> {
        self.max - self.min
    }

    pub fn grow_to_include_point(&mut self, point: Point3<f32>) {
        self.min = self.min.inf(&point);
        self.max = self.max.sup(&point);
    }

    pub fn contains_point(&self, point: Point3<f32>) -> bool {
        self.contains_point_with_epsilon(point, PLANE_EPSILON)
    }

    pub fn contains_point_with_epsilon(&self, point: Point3<f32>, epsilon: f32) -> bool {
        (0..3).all(|i| self.min[i] - epsilon <= point[i] && point[i] <= self.max[i] + epsilon)
    }

    pub fn contains_triangle(&self, triangle: &Triangle) -> bool {
        self.contains_triangle_with_epsilon(triangle, PLANE_EPSILON)
    }

    pub fn contains_triangle_with_epsilon(&self, triangle: &Triangle, epsilon: f32) -> bool {
        triangle
            .vertices()
            .iter()
            .all(|v| self.contains_point_with_epsilon(*v, epsilon))
    }

    pub fn contains_segment_with_epsilon(&self, segment: &LineSegment, epsilon: f32) -> bool {
        self.contains_point_with_epsilon(segment.start(), epsilon)
            && self.contains_point_with_epsilon(segment.end(), epsilon)
    }

    /// True if any part of the segment lies inside the box.
    ///
    /// Either endpoint is inside, or the segment crosses one of the six face
    /// planes at a point that is itself inside the box.
    pub fn intersects_segment(&self, segment: &LineSegment, epsilon: f32) -> bool {
        if self.contains_point_with_epsilon(segment.start(), epsilon)
            || self.contains_point_with_epsilon(segment.end(), epsilon)
        {
            return true;
        }

        let faces = [Axis::X, Axis::Y, Axis::Z].into_iter().flat_map(|axis| {
            [
                Plane3D::from_point_and_normal(self.min, -axis.unit()),
                Plane3D::from_point_and_normal(self.max, axis.unit()),
            ]
        });

        let slack = epsilon / segment.length().max(f32::EPSILON);
        faces.flatten().any(|face| {
            face.intersect_line(segment.start(), segment.direction())
                .is_some_and(|(t, point)| {
                    (-slack..=1.0 + slack).contains(&t)
                        && self.contains_point_with_epsilon(point, epsilon)
                })
        })
    }

    /// The axis with the largest extent; ties go to X, then Y, then Z.
    pub fn longest_axis(&self) -> Axis {
        let e = self.extents();
        if e.x >= e.y && e.x >= e.z {
            Axis::X
        } else if e.y >= e.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }

    /// Halves the box through its center.
    ///
    /// Splits along `axis`, or along [`longest_axis`](Self::longest_axis) when
    /// `None`. Returns `(lower, upper, plane)` where the plane's normal points
    /// into the upper half, so `lower` is its back and `upper` its front.
    pub fn split_in_two(&self, axis: Option<Axis>) -> (AxisAlignedBox, AxisAlignedBox, Plane3D) {
        let axis = axis.unwrap_or_else(|| self.longest_axis());
        let i = axis.index();
        let center = self.center();

        let mut lower = self.clone();
        let mut upper = self.clone();
        lower.max[i] = center[i];
        upper.min[i] = center[i];

        let plane = Plane3D::new(axis.unit(), center[i]);
        (lower, upper, plane)
    }

    /// The twelve edges of the box as corner pairs.
    pub fn edges(&self) -> [(Point3<f32>, Point3<f32>); 12] {
        let (lo, hi) = (self.min, self.max);
        let corner = |x: bool, y: bool, z: bool| {
            Point3::new(
                if x { hi.x } else { lo.x },
                if y { hi.y } else { lo.y },
                if z { hi.z } else { lo.z },
            )
        };

        [
            (corner(false, false, false), corner(true, false, false)),
            (corner(false, true, false), corner(true, true, false)),
            (corner(false, false, true), corner(true, false, true)),
            (corner(false, true, true), corner(true, true, true)),
            (corner(false, false, false), corner(false, true, false)),
            (corner(true, false, false), corner(true, true, false)),
            (corner(false, false, true), corner(false, true, true)),
            (corner(true, false, true), corner(true, true, true)),
            (corner(false, false, false), corner(false, false, true)),
            (corner(true, false, false), corner(true, false, true)),
            (corner(false, true, false), corner(false, true, true)),
            (corner(true, true, false), corner(true, true, true)),
        ]
    }

    /// Draws the box as a wireframe line batch.
    pub fn render<R: Renderer + ?Sized>(&self, renderer: &mut R) {
        renderer.begin_draw(DrawMode::Lines);
        for (a, b) in self.edges() {
            renderer.issue_vertex(&Vertex::at(a), VertexFlags::POSITION);
            renderer.issue_vertex(&Vertex::at(b), VertexFlags::POSITION);
        }
        renderer.end_draw();
    }
}
