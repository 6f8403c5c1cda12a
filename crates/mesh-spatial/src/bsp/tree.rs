//! BSP tree container, construction and rendering.

use nalgebra::{Affine3, Matrix3, Point3};

use crate::{
    BspError, Classification, Cuttable, DrawMode, IndexTriangle, LineSegment, PLANE_EPSILON,
    Plane3D, PlaneSide, Renderer, SingularTransformError, Triangle, TriangleMesh, Vertex,
    VertexFlags, normal_matrix,
};

use super::node::BspNode;
use super::selector::{FirstTriangle, PartitionSelector};
use super::visibility::{AllSpaceVisible, SpaceVisibility};

/// Draw order of [`BspTree::render`] relative to the eye.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Farthest triangles first (painter's algorithm, translucency).
    #[default]
    BackToFront,
    /// Nearest triangles first.
    FrontToBack,
}

/// A Binary Space Partitioning tree over a triangle mesh.
///
/// BSP trees recursively partition space using planes taken from the mesh's
/// own triangles. Each node holds the triangles lying on its plane; the rest
/// go to the front or back subtree, cut in two where they straddle the plane.
/// The tree owns a copy of the mesh's vertex buffer, grown by the
/// intersection vertices that cutting creates.
///
/// # Construction
///
/// ```ignore
/// let mut tree = BspTree::new();
/// tree.generate(&mesh)?;
/// ```
///
/// # Rendering
///
/// [`render`](Self::render) replays the triangles back-to-front (or
/// front-to-back) for any eye position, which gives a correct painter's
/// algorithm order for translucent geometry. The ordering holds for rigid,
/// orientation-preserving transforms only; scaling, shearing or reflecting
/// transforms are not supported.
#[derive(Debug, Clone)]
pub struct BspTree {
    root: Option<BspNode>,
    vertices: Vec<Vertex>,
    epsilon: f32,
}

impl Default for BspTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters reported once a build finishes.
#[derive(Debug, Default)]
struct BuildStats {
    nodes: usize,
    splits: usize,
    appended_vertices: usize,
}

/// State threaded through a single [`BspTree::generate_with`] call.
struct Builder<'a, S: ?Sized> {
    vertices: Vec<Vertex>,
    selector: &'a S,
    epsilon: f32,
    stats: BuildStats,
}

/// State threaded through a single [`BspTree::render_with_visibility`] call.
struct RenderPass<'a, R: ?Sized, V: ?Sized> {
    renderer: &'a mut R,
    visibility: &'a V,
    vertices: &'a [Vertex],
    mode: RenderMode,
    eye: Point3<f32>,
    transform: Affine3<f32>,
    normal_matrix: Matrix3<f32>,
    flags: VertexFlags,
    epsilon: f32,
}

impl BspTree {
    /// Creates an empty BSP tree using [`PLANE_EPSILON`].
    pub fn new() -> Self {
        Self::with_epsilon(PLANE_EPSILON)
    }

    /// Creates an empty BSP tree with a custom classification tolerance.
    pub fn with_epsilon(epsilon: f32) -> Self {
        Self {
            root: None,
            vertices: Vec::new(),
            epsilon,
        }
    }

    #[inline]
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Builds the tree from a mesh using the default selector ([`FirstTriangle`]).
    pub fn generate(&mut self, mesh: &TriangleMesh) -> Result<(), BspError> {
        self.generate_with(mesh, &FirstTriangle)
    }

    /// Builds the tree from a mesh, choosing partitions with `selector`.
    ///
    /// Any previous content is released first. Degenerate triangles are
    /// skipped. On failure the tree is left empty; a partially built tree is
    /// never kept.
    pub fn generate_with<S>(&mut self, mesh: &TriangleMesh, selector: &S) -> Result<(), BspError>
    where
        S: PartitionSelector + ?Sized,
    {
        self.clear();

        let mut builder = Builder {
            vertices: mesh.vertices().to_vec(),
            selector,
            epsilon: self.epsilon,
            stats: BuildStats::default(),
        };

        let result = builder
            .initial_triangles(mesh.triangles())
            .and_then(|triangles| builder.build_node(triangles));

        match result {
            Ok(root) => {
                log::debug!(
                    "generated BSP tree: {} nodes, depth {}, {} splits, {} vertices appended",
                    builder.stats.nodes,
                    root.as_ref().map_or(0, BspNode::depth),
                    builder.stats.splits,
                    builder.stats.appended_vertices
                );
                self.root = root;
                self.vertices = builder.vertices;
                Ok(())
            }
            Err(err) => {
                log::warn!("BSP tree generation aborted: {err}");
                Err(err)
            }
        }
    }

    /// Releases all nodes and the vertex buffer.
    pub fn clear(&mut self) {
        self.root = None;
        self.vertices.clear();
    }

    /// Returns `true` if the tree contains no triangles.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns a reference to the root node, if any.
    #[inline]
    pub fn root(&self) -> Option<&BspNode> {
        self.root.as_ref()
    }

    /// The vertex buffer node triangles index into.
    #[inline]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Returns the total number of triangles (fragments included) in the tree.
    pub fn triangle_count(&self) -> usize {
        self.root.as_ref().map_or(0, |n| n.triangle_count())
    }

    pub fn node_count(&self) -> usize {
        self.root.as_ref().map_or(0, |n| n.node_count())
    }

    /// Returns the maximum depth of the tree (0 for empty tree).
    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, |n| n.depth())
    }

    /// Every node's plane in pre-order (node, front, back).
    pub fn planes(&self) -> Vec<Plane3D> {
        let mut planes = Vec::with_capacity(self.node_count());
        if let Some(root) = &self.root {
            root.collect_planes(&mut planes);
        }
        planes
    }

    /// Resolves all triangles in the tree, in pre-order (node, front, back).
    pub fn collect_triangles(&self) -> Vec<Triangle> {
        let mut result = Vec::with_capacity(self.triangle_count());
        collect_triangles_recursive(self.root.as_ref(), &self.vertices, &mut result);
        result
    }

    /// Emits every triangle in view order as one `Triangles` batch.
    ///
    /// `eye` is in world space. `transform` (identity if `None`) places the
    /// tree in the world: node planes and vertices go through it before use.
    pub fn render<R>(
        &self,
        renderer: &mut R,
        mode: RenderMode,
        eye: Point3<f32>,
        transform: Option<&Affine3<f32>>,
        flags: VertexFlags,
    ) -> Result<(), BspError>
    where
        R: Renderer + ?Sized,
    {
        self.render_with_visibility(renderer, mode, eye, transform, flags, &AllSpaceVisible)
    }

    /// Like [`render`](Self::render), skipping every subtree `visibility`
    /// reports as hidden.
    pub fn render_with_visibility<R, V>(
        &self,
        renderer: &mut R,
        mode: RenderMode,
        eye: Point3<f32>,
        transform: Option<&Affine3<f32>>,
        flags: VertexFlags,
        visibility: &V,
    ) -> Result<(), BspError>
    where
        R: Renderer + ?Sized,
        V: SpaceVisibility + ?Sized,
    {
        let Some(root) = &self.root else {
            return Ok(());
        };

        let transform = transform.cloned().unwrap_or_else(Affine3::identity);
        let normal_matrix = normal_matrix(&transform)?;

        renderer.begin_draw(DrawMode::Triangles);
        let mut pass = RenderPass {
            renderer: &mut *renderer,
            visibility,
            vertices: &self.vertices,
            mode,
            eye,
            transform,
            normal_matrix,
            flags,
            epsilon: self.epsilon,
        };
        let result = pass.render_node(root);
        renderer.end_draw();
        result
    }

    /// Moves the whole tree: every node plane and the vertex buffer.
    ///
    /// Planes are re-derived from their transformed center and normal. The
    /// tree's topology is unchanged.
    pub fn transform(&mut self, transform: &Affine3<f32>) -> Result<(), BspError> {
        let normal_matrix = normal_matrix(transform)?;

        if let Some(root) = self.root.as_mut() {
            root.transform_planes(transform, &normal_matrix)?;
        }
        for vertex in self.vertices.iter_mut() {
            *vertex = vertex.transformed(transform, &normal_matrix);
        }
        Ok(())
    }
}

impl<S: PartitionSelector + ?Sized> Builder<'_, S> {
    /// Validates the mesh's triangles and drops degenerate ones.
    fn initial_triangles(
        &self,
        triangles: &[IndexTriangle],
    ) -> Result<Vec<IndexTriangle>, BspError> {
        let mut kept = Vec::with_capacity(triangles.len());
        for &triangle in triangles {
            if self.resolve(triangle)?.is_degenerate(self.epsilon) {
                log::debug!("skipping degenerate triangle {triangle:?}");
                continue;
            }
            kept.push(triangle);
        }
        Ok(kept)
    }

    fn resolve(&self, triangle: IndexTriangle) -> Result<Triangle, BspError> {
        triangle.resolve(&self.vertices).ok_or_else(|| {
            let len = self.vertices.len();
            let index = triangle
                .indices()
                .into_iter()
                .find(|&i| i >= len)
                .unwrap_or(len);
            BspError::VertexOutOfBounds { index, len }
        })
    }

    /// Recursively builds a BSP node from a list of triangles.
    fn build_node(
        &mut self,
        mut triangles: Vec<IndexTriangle>,
    ) -> Result<Option<BspNode>, BspError> {
        if triangles.is_empty() {
            return Ok(None);
        }

        let chosen = self
            .selector
            .select(&triangles, &self.vertices)
            .filter(|&i| i < triangles.len())
            .unwrap_or(0);
        let partition = triangles.remove(chosen);
        let plane = self
            .resolve(partition)?
            .plane()
            .ok_or(BspError::DegeneratePartition(partition))?;

        let mut coplanar = vec![partition];
        let mut front_list = Vec::new();
        let mut back_list = Vec::new();

        for triangle in triangles {
            let resolved = self.resolve(triangle)?;
            match resolved.classify_with_epsilon(&plane, self.epsilon) {
                Classification::Coplanar => coplanar.push(triangle),
                Classification::Front => front_list.push(triangle),
                Classification::Back => back_list.push(triangle),
                Classification::Spanning => {
                    let split = resolved.cut(&plane, self.epsilon)?;
                    log::trace!(
                        "split {triangle:?} into {} front and {} back fragments",
                        split.front.len(),
                        split.back.len()
                    );
                    self.stats.splits += 1;

                    let mut appended = Vec::new();
                    for fragment in &split.front {
                        front_list.push(self.reconcile(fragment, triangle, &mut appended)?);
                    }
                    for fragment in &split.back {
                        back_list.push(self.reconcile(fragment, triangle, &mut appended)?);
                    }
                }
            }
        }

        let mut node = BspNode::with_triangles(plane, coplanar);
        self.stats.nodes += 1;
        node.set_front(self.build_node(front_list)?);
        node.set_back(self.build_node(back_list)?);

        Ok(Some(node))
    }

    /// Re-indexes a clipped fragment of `source` into the vertex buffer.
    fn reconcile(
        &mut self,
        fragment: &Triangle,
        source: IndexTriangle,
        appended: &mut Vec<usize>,
    ) -> Result<IndexTriangle, BspError> {
        let mut indices = [0; 3];
        for (slot, &position) in indices.iter_mut().zip(fragment.vertices()) {
            *slot = self.reconcile_vertex(position, source, appended)?;
        }
        Ok(IndexTriangle::from(indices))
    }

    /// Finds or creates the buffer index of a fragment corner.
    ///
    /// A corner matching one of the source triangle's vertices (or a vertex
    /// already appended for it) reuses that index. A corner on one of its
    /// edges becomes a new vertex interpolated from the edge's endpoints.
    fn reconcile_vertex(
        &mut self,
        position: Point3<f32>,
        source: IndexTriangle,
        appended: &mut Vec<usize>,
    ) -> Result<usize, BspError> {
        let epsilon = self.epsilon;
        let corners = source.indices();

        let existing = corners.iter().chain(appended.iter()).copied().find(|&i| {
            self.vertices
                .get(i)
                .is_some_and(|v| (v.position - position).norm() <= epsilon)
        });
        if let Some(index) = existing {
            return Ok(index);
        }

        for j in 0..3 {
            let (a, b) = (corners[j], corners[(j + 1) % 3]);
            let (Some(va), Some(vb)) = (self.vertices.get(a), self.vertices.get(b)) else {
                continue;
            };

            let edge = LineSegment::new(va.position, vb.position);
            let Some(t) = edge.lerp_inverse(position, epsilon) else {
                continue;
            };
            let slack = epsilon / edge.length();
            if !(-slack..=1.0 + slack).contains(&t) {
                continue;
            }

            let vertex = Vertex::interpolate_on_edge(va, vb, position, t.clamp(0.0, 1.0));
            self.vertices.push(vertex);
            self.stats.appended_vertices += 1;

            let index = self.vertices.len() - 1;
            appended.push(index);
            return Ok(index);
        }

        Err(BspError::VertexReconciliation {
            source_triangle: source,
            position,
        })
    }
}

impl<R, V> RenderPass<'_, R, V>
where
    R: Renderer + ?Sized,
    V: SpaceVisibility + ?Sized,
{
    /// Renders a node subtree in the pass's draw order.
    fn render_node(&mut self, node: &BspNode) -> Result<(), BspError> {
        let plane = node
            .plane()
            .transformed(&self.transform, &self.normal_matrix)
            .ok_or(SingularTransformError)?;
        let side = plane.classify_point_with_epsilon(self.eye, self.epsilon);

        let front_first = match self.mode {
            RenderMode::BackToFront => side == PlaneSide::Back,
            RenderMode::FrontToBack => side == PlaneSide::Front,
        };

        let front = node
            .front()
            .filter(|_| self.visibility.front_space_visible(node));
        let back = node
            .back()
            .filter(|_| self.visibility.back_space_visible(node));
        let (first, last) = if front_first { (front, back) } else { (back, front) };

        if let Some(first) = first {
            self.render_node(first)?;
        }

        for triangle in node.triangles() {
            for index in triangle.indices() {
                let vertex = self.vertices.get(index).ok_or(BspError::VertexOutOfBounds {
                    index,
                    len: self.vertices.len(),
                })?;
                let vertex = vertex.transformed(&self.transform, &self.normal_matrix);
                self.renderer.issue_vertex(&vertex, self.flags);
            }
        }

        if let Some(last) = last {
            self.render_node(last)?;
        }
        Ok(())
    }
}

/// Recursively resolves all triangles from a node subtree.
fn collect_triangles_recursive(
    node: Option<&BspNode>,
    vertices: &[Vertex],
    result: &mut Vec<Triangle>,
) {
    if let Some(n) = node {
        result.extend(n.triangles().iter().filter_map(|t| t.resolve(vertices)));
        collect_triangles_recursive(n.front(), vertices, result);
        collect_triangles_recursive(n.back(), vertices, result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordingRenderer;
    use crate::bsp::{FnVisibility, HalfSpace};
    use approx::assert_relative_eq;
    use nalgebra::{Isometry3, Vector3};

    fn make_mesh(triangles: &[[[f32; 3]; 3]]) -> TriangleMesh {
        let mut mesh = TriangleMesh::new();
        for corners in triangles {
            let [a, b, c] =
                corners.map(|p| mesh.add_vertex(Vertex::at(Point3::new(p[0], p[1], p[2]))));
            mesh.add_triangle(IndexTriangle::new(a, b, c));
        }
        mesh
    }

    /// Triangles at z = 0 (partition), z = 1 (front) and z = -1 (back).
    fn three_layers() -> TriangleMesh {
        make_mesh(&[
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]],
            [[0.0, 0.0, -1.0], [1.0, 0.0, -1.0], [0.0, 1.0, -1.0]],
        ])
    }

    fn rendered_depths(tree: &BspTree, mode: RenderMode, eye: Point3<f32>) -> Vec<f32> {
        let mut renderer = RecordingRenderer::new();
        tree.render(&mut renderer, mode, eye, None, VertexFlags::all())
            .unwrap();
        renderer.triangles().iter().map(|t| t[0].position.z).collect()
    }

    fn total_area(triangles: &[Triangle]) -> f32 {
        triangles.iter().map(Triangle::area).sum()
    }

    fn rigid(translation: Vector3<f32>, axis_angle: Vector3<f32>) -> Affine3<f32> {
        Affine3::from_matrix_unchecked(Isometry3::new(translation, axis_angle).to_homogeneous())
    }

    #[test]
    fn empty_tree() {
        let tree = BspTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.triangle_count(), 0);
        assert_eq!(tree.depth(), 0);

        let mut renderer = RecordingRenderer::new();
        let eye = Point3::origin();
        tree.render(&mut renderer, RenderMode::BackToFront, eye, None, VertexFlags::all())
            .unwrap();
        assert!(renderer.batches().is_empty());
    }

    #[test]
    fn build_empty() {
        let mut tree = BspTree::new();
        tree.generate(&TriangleMesh::new()).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn build_single_triangle() {
        let mesh = make_mesh(&[[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]]);
        let mut tree = BspTree::new();
        tree.generate(&mesh).unwrap();

        assert!(!tree.is_empty());
        assert_eq!(tree.triangle_count(), 1);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.vertices().len(), 3);
    }

    #[test]
    fn build_coplanar_triangles_share_node() {
        let mesh = make_mesh(&[
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            [[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
            // Opposite facing, same plane.
            [[3.0, 0.0, 0.0], [3.0, 1.0, 0.0], [4.0, 0.0, 0.0]],
        ]);
        let mut tree = BspTree::new();
        tree.generate(&mesh).unwrap();

        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.root().unwrap().triangles().len(), 3);
    }

    #[test]
    fn partition_triangle_is_stored_once() {
        let mut tree = BspTree::new();
        tree.generate(&three_layers()).unwrap();

        assert_eq!(tree.triangle_count(), 3);
        assert_eq!(tree.node_count(), 3);

        let root = tree.root().unwrap();
        assert_eq!(root.triangles(), &[IndexTriangle::new(0, 1, 2)]);
        assert_eq!(root.front().unwrap().triangles(), &[IndexTriangle::new(3, 4, 5)]);
        assert_eq!(root.back().unwrap().triangles(), &[IndexTriangle::new(6, 7, 8)]);
    }

    #[test]
    fn build_spanning_triangle_gets_split() {
        let mesh = make_mesh(&[
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            [[0.0, 0.0, -1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]],
        ]);
        let spanning_area = mesh.triangle(1).unwrap().area();

        let mut tree = BspTree::new();
        tree.generate(&mesh).unwrap();

        // Two front fragments on one plane, one back fragment.
        assert_eq!(tree.triangle_count(), 4);
        assert_eq!(tree.node_count(), 3);
        // Both intersection points are shared by the fragments.
        assert_eq!(tree.vertices().len(), 8);

        let root = tree.root().unwrap();
        let front = root.front().unwrap();
        let back = root.back().unwrap();
        assert_eq!(front.triangles().len(), 2);
        assert_eq!(back.triangles().len(), 1);

        let fragments: Vec<Triangle> = tree.collect_triangles().into_iter().skip(1).collect();
        assert_relative_eq!(total_area(&fragments), spanning_area, epsilon = 1e-5);
    }

    #[test]
    fn split_vertices_are_interpolated() {
        let mut mesh = TriangleMesh::new();
        mesh.add_vertex(Vertex::at(Point3::new(0.0, 0.0, 0.0)));
        mesh.add_vertex(Vertex::at(Point3::new(1.0, 0.0, 0.0)));
        mesh.add_vertex(Vertex::at(Point3::new(0.0, 1.0, 0.0)));
        mesh.add_vertex(
            Vertex::at(Point3::new(0.5, 0.5, -1.0)).with_color(Vector3::new(0.0, 0.0, 0.0), 0.0),
        );
        mesh.add_vertex(
            Vertex::at(Point3::new(0.5, 0.5, 1.0)).with_color(Vector3::new(1.0, 1.0, 1.0), 1.0),
        );
        mesh.add_vertex(Vertex::at(Point3::new(0.5, 1.5, 1.0)));
        mesh.add_triangle(IndexTriangle::new(0, 1, 2));
        mesh.add_triangle(IndexTriangle::new(3, 4, 5));

        let mut tree = BspTree::new();
        tree.generate(&mesh).unwrap();

        let midpoint = tree
            .vertices()
            .iter()
            .skip(6)
            .find(|v| (v.position - Point3::new(0.5, 0.5, 0.0)).norm() < 1e-5)
            .unwrap();
        assert_relative_eq!(midpoint.alpha, 0.5, epsilon = 1e-5);
        assert_relative_eq!(midpoint.color, Vector3::new(0.5, 0.5, 0.5), epsilon = 1e-5);
    }

    #[test]
    fn degenerate_triangles_are_skipped() {
        let mesh = make_mesh(&[
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]],
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        ]);
        let mut tree = BspTree::new();
        tree.generate(&mesh).unwrap();
        assert_eq!(tree.triangle_count(), 1);
    }

    #[test]
    fn out_of_bounds_index_clears_tree() {
        let mut tree = BspTree::new();
        tree.generate(&three_layers()).unwrap();
        assert!(!tree.is_empty());

        let mut bad = three_layers();
        bad.add_triangle(IndexTriangle::new(0, 1, 42));
        let err = tree.generate(&bad).unwrap_err();

        assert_eq!(err, BspError::VertexOutOfBounds { index: 42, len: 9 });
        assert!(tree.is_empty());
        assert!(tree.vertices().is_empty());
    }

    #[test]
    fn fragment_corner_off_every_edge_is_rejected() {
        let mesh = three_layers();
        let mut builder = Builder {
            vertices: mesh.vertices().to_vec(),
            selector: &FirstTriangle,
            epsilon: PLANE_EPSILON,
            stats: BuildStats::default(),
        };
        let source = mesh.triangles()[0];
        let mut appended = Vec::new();

        let interior = Point3::new(0.3, 0.3, 0.0);
        assert_eq!(
            builder.reconcile_vertex(interior, source, &mut appended),
            Err(BspError::VertexReconciliation {
                source_triangle: source,
                position: interior,
            })
        );
        assert!(appended.is_empty());
        assert_eq!(builder.vertices.len(), 9);

        let on_edge = Point3::new(0.5, 0.0, 0.0);
        assert_eq!(builder.reconcile_vertex(on_edge, source, &mut appended), Ok(9));
        assert_eq!(builder.reconcile_vertex(on_edge, source, &mut appended), Ok(9));
        assert_eq!(appended, vec![9]);
    }

    /// At a million units f32 resolves only sixteenths, so the clipped
    /// corners fall off the source edges and the build must fail cleanly.
    #[test]
    fn failed_split_clears_previous_tree() {
        let mut tree = BspTree::new();
        tree.generate(&three_layers()).unwrap();
        assert!(!tree.is_empty());

        let far = |x: f32, y: f32, z: f32| [1.0e6 + x, 1.0e6 + y, 1.0e6 + z];
        let mesh = make_mesh(&[
            [far(0.0, 0.0, 0.0), far(10.0, 0.0, 0.0), far(0.0, 10.0, 0.0)],
            [far(1.0, 1.0, -3.0), far(7.0, 2.0, 4.0), far(2.0, 6.0, 5.0)],
        ]);
        let err = tree.generate(&mesh).unwrap_err();

        assert!(
            matches!(err, BspError::VertexReconciliation { .. } | BspError::Clip(_)),
            "unexpected error {err:?}"
        );
        assert!(tree.is_empty());
        assert!(tree.vertices().is_empty());
    }

    #[test]
    fn custom_selector_changes_root() {
        struct Last;
        impl PartitionSelector for Last {
            fn select(&self, triangles: &[IndexTriangle], _: &[Vertex]) -> Option<usize> {
                triangles.len().checked_sub(1)
            }
        }

        let mut tree = BspTree::new();
        tree.generate_with(&three_layers(), &Last).unwrap();
        assert_eq!(tree.root().unwrap().triangles(), &[IndexTriangle::new(6, 7, 8)]);
        assert_eq!(tree.triangle_count(), 3);
    }

    #[test]
    fn back_to_front_ordering() {
        let mut tree = BspTree::new();
        tree.generate(&three_layers()).unwrap();

        let front_eye = Point3::new(0.2, 0.2, 10.0);
        let from_front = rendered_depths(&tree, RenderMode::BackToFront, front_eye);
        assert_eq!(from_front, vec![-1.0, 0.0, 1.0]);

        let back_eye = Point3::new(0.2, 0.2, -10.0);
        let from_back = rendered_depths(&tree, RenderMode::BackToFront, back_eye);
        assert_eq!(from_back, vec![1.0, 0.0, -1.0]);
    }

    #[test]
    fn front_to_back_ordering() {
        let mut tree = BspTree::new();
        tree.generate(&three_layers()).unwrap();

        let front_eye = Point3::new(0.2, 0.2, 10.0);
        let from_front = rendered_depths(&tree, RenderMode::FrontToBack, front_eye);
        assert_eq!(from_front, vec![1.0, 0.0, -1.0]);
    }

    #[test]
    fn render_is_one_triangle_batch() {
        let mut tree = BspTree::new();
        tree.generate(&three_layers()).unwrap();

        let mut renderer = RecordingRenderer::new();
        let eye = Point3::origin();
        tree.render(&mut renderer, RenderMode::BackToFront, eye, None, VertexFlags::POSITION)
            .unwrap();
        assert_eq!(renderer.batches().len(), 1);
        assert_eq!(renderer.batches()[0].mode, DrawMode::Triangles);
        assert_eq!(renderer.batches()[0].vertices.len(), 9);
    }

    #[test]
    fn hidden_space_is_skipped() {
        let mut tree = BspTree::new();
        tree.generate(&three_layers()).unwrap();

        let no_back = FnVisibility::new(|_: &BspNode, half| half != HalfSpace::Back);
        let mut renderer = RecordingRenderer::new();
        tree.render_with_visibility(
            &mut renderer,
            RenderMode::BackToFront,
            Point3::new(0.2, 0.2, 10.0),
            None,
            VertexFlags::all(),
            &no_back,
        )
        .unwrap();

        let depths: Vec<f32> = renderer.triangles().iter().map(|t| t[0].position.z).collect();
        assert_eq!(depths, vec![0.0, 1.0]);
    }

    #[test]
    fn render_transform_moves_planes_and_vertices() {
        let mut tree = BspTree::new();
        tree.generate(&three_layers()).unwrap();

        // Flip the stack upside down: the z = 1 layer ends up at z = -1.
        let flip = rigid(Vector3::zeros(), Vector3::new(std::f32::consts::PI, 0.0, 0.0));
        let mut renderer = RecordingRenderer::new();
        tree.render(
            &mut renderer,
            RenderMode::BackToFront,
            Point3::new(0.2, -0.2, 10.0),
            Some(&flip),
            VertexFlags::all(),
        )
        .unwrap();

        let depths: Vec<f32> = renderer.triangles().iter().map(|t| t[0].position.z).collect();
        assert_eq!(depths.len(), 3);
        assert_relative_eq!(depths[0], -1.0, epsilon = 1e-5);
        assert_relative_eq!(depths[1], 0.0, epsilon = 1e-5);
        assert_relative_eq!(depths[2], 1.0, epsilon = 1e-5);
        // Stored geometry is untouched.
        assert_eq!(tree.vertices()[3].position.z, 1.0);
    }

    #[test]
    fn transform_round_trip_restores_planes() {
        let mut tree = BspTree::new();
        tree.generate(&three_layers()).unwrap();
        let before = tree.planes();

        let motion = rigid(Vector3::new(1.0, -2.0, 0.5), Vector3::new(0.3, 0.4, -0.2));
        tree.transform(&motion).unwrap();
        assert!(!tree.planes()[0].approx_eq(&before[0], 1e-3));

        let inverse = motion.try_inverse().unwrap();
        tree.transform(&inverse).unwrap();
        for (restored, original) in tree.planes().iter().zip(&before) {
            assert!(restored.approx_eq(original, 1e-4), "{restored:?} != {original:?}");
        }
        assert_relative_eq!(
            tree.vertices()[3].position,
            Point3::new(0.0, 0.0, 1.0),
            epsilon = 1e-4
        );
    }

    #[test]
    fn singular_transform_is_rejected() {
        let mut tree = BspTree::new();
        tree.generate(&three_layers()).unwrap();

        let squash = Affine3::from_matrix_unchecked(nalgebra::Matrix4::new_nonuniform_scaling(
            &Vector3::new(1.0, 1.0, 0.0),
        ));
        assert_eq!(
            tree.transform(&squash),
            Err(BspError::SingularTransform(SingularTransformError))
        );
    }

    #[test]
    fn tree_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BspTree>();
    }
}
