//! Minimal triangle-mesh container the trees are built from.
//!
//! Vertices carry the attributes a renderer needs; triangles are index
//! triples into the vertex buffer.

use nalgebra::{Affine3, Matrix3, Point3, Unit, Vector2, Vector3};

use crate::{AxisAlignedBox, PLANE_EPSILON, Plane3D, SingularTransformError, Triangle};

/// A mesh vertex with its shading attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
    pub color: Vector3<f32>,
    pub tex_coords: Vector2<f32>,
    pub alpha: f32,
}

impl Default for Vertex {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            normal: Vector3::zeros(),
            color: Vector3::new(1.0, 1.0, 1.0),
            tex_coords: Vector2::zeros(),
            alpha: 1.0,
        }
    }
}

impl Vertex {
    /// A white, opaque vertex with no normal at `position`.
    pub fn at(position: Point3<f32>) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_normal(mut self, normal: Vector3<f32>) -> Self {
        self.normal = normal;
        self
    }

    pub fn with_color(mut self, color: Vector3<f32>, alpha: f32) -> Self {
        self.color = color;
        self.alpha = alpha;
        self
    }

    pub fn with_tex_coords(mut self, tex_coords: Vector2<f32>) -> Self {
        self.tex_coords = tex_coords;
        self
    }

    /// Builds the vertex at parameter `t` along the edge `a → b`.
    ///
    /// `position` is taken as given (it comes from the clipper). Color,
    /// texture coordinates and alpha are interpolated linearly; the normal is
    /// interpolated spherically so smooth shading stays continuous across the
    /// cut. Zero or opposite normals fall back to a linear blend.
    pub fn interpolate_on_edge(a: &Vertex, b: &Vertex, position: Point3<f32>, t: f32) -> Vertex {
        let normal = match (
            Unit::try_new(a.normal, f32::EPSILON),
            Unit::try_new(b.normal, f32::EPSILON),
        ) {
            (Some(na), Some(nb)) => na
                .try_slerp(&nb, t, 1e-6)
                .map(Unit::into_inner)
                .or_else(|| a.normal.lerp(&b.normal, t).try_normalize(f32::EPSILON))
                .unwrap_or(a.normal),
            _ => a.normal.lerp(&b.normal, t),
        };

        Vertex {
            position,
            normal,
            color: a.color.lerp(&b.color, t),
            tex_coords: a.tex_coords.lerp(&b.tex_coords, t),
            alpha: a.alpha + (b.alpha - a.alpha) * t,
        }
    }

    /// Maps position through `transform` and normal through `normal_matrix`.
    pub fn transformed(&self, transform: &Affine3<f32>, normal_matrix: &Matrix3<f32>) -> Vertex {
        let normal = normal_matrix * self.normal;
        Vertex {
            position: transform.transform_point(&self.position),
            // Renormalize to absorb scale and accumulated round-off.
            normal: normal.try_normalize(f32::EPSILON).unwrap_or(normal),
            ..self.clone()
        }
    }
}

/// Inverse transpose of the linear part of `transform`.
pub fn normal_matrix(transform: &Affine3<f32>) -> Result<Matrix3<f32>, SingularTransformError> {
    let linear: Matrix3<f32> = transform.matrix().fixed_view::<3, 3>(0, 0).into_owned();
    linear
        .try_inverse()
        .map(|inverse| inverse.transpose())
        .ok_or(SingularTransformError)
}

/// Applies `transform` to every vertex of a buffer in place.
pub fn transform_vertices(
    vertices: &mut [Vertex],
    transform: &Affine3<f32>,
) -> Result<(), SingularTransformError> {
    let normal_matrix = normal_matrix(transform)?;
    for vertex in vertices.iter_mut() {
        *vertex = vertex.transformed(transform, &normal_matrix);
    }
    Ok(())
}

/// Three indices into a vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexTriangle {
    indices: [usize; 3],
}

impl IndexTriangle {
    pub fn new(a: usize, b: usize, c: usize) -> Self {
        Self { indices: [a, b, c] }
    }

    #[inline]
    pub fn indices(&self) -> [usize; 3] {
        self.indices
    }

    /// Looks the three corners up in `vertices`; `None` if any index is out of bounds.
    pub fn resolve(&self, vertices: &[Vertex]) -> Option<Triangle> {
        let [a, b, c] = self.indices;
        Some(Triangle::new(
            vertices.get(a)?.position,
            vertices.get(b)?.position,
            vertices.get(c)?.position,
        ))
    }

    /// The plane of the resolved triangle, `None` if out of bounds or degenerate.
    pub fn plane(&self, vertices: &[Vertex]) -> Option<Plane3D> {
        self.resolve(vertices)?.plane()
    }
}

impl From<[usize; 3]> for IndexTriangle {
    fn from(indices: [usize; 3]) -> Self {
        Self { indices }
    }
}

/// A vertex buffer plus an ordered list of index triangles.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    vertices: Vec<Vertex>,
    triangles: Vec<IndexTriangle>,
}

impl TriangleMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a mesh with three fresh vertices per triangle.
    pub fn from_triangles<'a, I>(triangles: I) -> Self
    where
        I: IntoIterator<Item = &'a Triangle>,
    {
        let mut mesh = Self::new();
        for triangle in triangles {
            let normal = triangle.unit_normal().unwrap_or_else(Vector3::zeros);
            let [a, b, c] = triangle
                .vertices()
                .map(|p| mesh.add_vertex(Vertex::at(p).with_normal(normal)));
            mesh.add_triangle(IndexTriangle::new(a, b, c));
        }
        mesh
    }

    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    #[inline]
    pub fn triangles(&self) -> &[IndexTriangle] {
        &self.triangles
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Appends a vertex and returns its index.
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        self.vertices.push(vertex);
        self.vertices.len() - 1
    }

    pub fn add_triangle(&mut self, triangle: IndexTriangle) {
        self.triangles.push(triangle);
    }

    /// Resolves the `index`-th triangle.
    pub fn triangle(&self, index: usize) -> Option<Triangle> {
        self.triangles.get(index)?.resolve(&self.vertices)
    }

    /// Resolves every triangle, optionally dropping degenerate ones.
    ///
    /// Triangles with out-of-range indices are always skipped.
    pub fn triangle_list(&self, skip_degenerates: bool) -> Vec<Triangle> {
        self.triangles
            .iter()
            .filter_map(|t| t.resolve(&self.vertices))
            .filter(|t| !skip_degenerates || !t.is_degenerate(PLANE_EPSILON))
            .collect()
    }

    /// Box around all vertex positions, `None` for a mesh without vertices.
    pub fn bounding_box(&self) -> Option<AxisAlignedBox> {
        AxisAlignedBox::from_points(self.vertices.iter().map(|v| v.position))
    }

    /// Replaces every vertex normal by the normalized sum of the unit normals
    /// of the faces using it.
    pub fn calculate_normals(&mut self) {
        for vertex in &mut self.vertices {
            vertex.normal = Vector3::zeros();
        }

        for triangle in &self.triangles {
            let Some(plane) = triangle.plane(&self.vertices) else {
                continue;
            };
            for index in triangle.indices() {
                self.vertices[index].normal += plane.normal();
            }
        }

        for vertex in &mut self.vertices {
            if let Some(normal) = vertex.normal.try_normalize(f32::EPSILON) {
                vertex.normal = normal;
            }
        }
    }

    pub fn transform(&mut self, transform: &Affine3<f32>) -> Result<(), SingularTransformError> {
        transform_vertices(&mut self.vertices, transform)
    }

    /// An axis-aligned cube with flat-shaded faces wound counter-clockwise
    /// when seen from outside.
    pub fn cube(center: Point3<f32>, size: f32) -> Self {
        let bounds = AxisAlignedBox::from_center_and_dimensions(center, Vector3::repeat(size));
        let (lo, hi) = (bounds.min(), bounds.max());

        // 8 corners of the cube
        let corners = [
            Point3::new(lo.x, lo.y, lo.z), // 0: left-bottom-back
            Point3::new(hi.x, lo.y, lo.z), // 1: right-bottom-back
            Point3::new(hi.x, hi.y, lo.z), // 2: right-top-back
            Point3::new(lo.x, hi.y, lo.z), // 3: left-top-back
            Point3::new(lo.x, lo.y, hi.z), // 4: left-bottom-front
            Point3::new(hi.x, lo.y, hi.z), // 5: right-bottom-front
            Point3::new(hi.x, hi.y, hi.z), // 6: right-top-front
            Point3::new(lo.x, hi.y, hi.z), // 7: left-top-front
        ];

        let faces: [([usize; 4], Vector3<f32>); 6] = [
            ([4, 5, 6, 7], Vector3::z()),  // front (+Z)
            ([1, 0, 3, 2], -Vector3::z()), // back (-Z)
            ([0, 4, 7, 3], -Vector3::x()), // left (-X)
            ([5, 1, 2, 6], Vector3::x()),  // right (+X)
            ([7, 6, 2, 3], Vector3::y()),  // top (+Y)
            ([0, 1, 5, 4], -Vector3::y()), // bottom (-Y)
        ];

        let uvs = [
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(0.0, 1.0),
        ];

        let mut mesh = Self::new();
        for (quad, normal) in faces {
            let base = mesh.vertices.len();
            for (corner, uv) in quad.iter().zip(uvs) {
                mesh.add_vertex(
                    Vertex::at(corners[*corner])
                        .with_normal(normal)
                        .with_tex_coords(uv),
                );
            }
            mesh.add_triangle(IndexTriangle::new(base, base + 1, base + 2));
            mesh.add_triangle(IndexTriangle::new(base, base + 2, base + 3));
        }
        mesh
    }
}
