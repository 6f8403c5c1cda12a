//! Bounding volume tree container, insertion and queries.

use std::collections::VecDeque;

use bitflags::bitflags;
use nalgebra::{Point3, Vector3};

use crate::{
    AxisAlignedBox, BoxTreeError, DrawMode, LineSegment, PLANE_EPSILON, Renderer, Triangle, Vertex,
    VertexFlags,
};

use super::node::{BoxNode, LeafNode, NearestTriangle, SegmentHit};

bitflags! {
    /// What [`BoundingBoxTree::render`] draws.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BoxTreeDrawFlags: u32 {
        /// Leaf boxes as wireframes.
        const BOXES = 0b01;
        /// Leaf triangles, one flat color per leaf.
        const TRIANGLES = 0b10;
    }
}

/// Keeps only triangles facing roughly along `normal`.
///
/// Used to build per-orientation sub-indexes such as a floor-only collision
/// tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalFilter {
    pub normal: Vector3<f32>,
    /// Largest accepted angle between the triangle normal and `normal`, in radians.
    pub max_angle: f32,
}

impl NormalFilter {
    pub fn new(normal: Vector3<f32>, max_angle: f32) -> Self {
        Self { normal, max_angle }
    }

    /// Returns `true` if the triangle passes. Degenerate triangles never do.
    pub fn accepts(&self, triangle: &Triangle) -> bool {
        triangle
            .unit_normal()
            .is_some_and(|n| n.angle(&self.normal) <= self.max_angle)
    }
}

/// A complete binary tree of axis-aligned boxes with a fixed shape.
///
/// The shape is generated up front by [`generate_nodes`](Self::generate_nodes),
/// independent of content. Triangles are inserted afterwards and descend to
/// the smallest box holding them; triangles straddling a split are cut and
/// their fragments stored on both sides.
///
/// ```ignore
/// let mut tree = BoundingBoxTree::new();
/// tree.generate_nodes(mesh.bounding_box().unwrap(), 4)?;
/// tree.insert_triangle_list(&mesh.triangle_list(true), None)?;
///
/// if let Some(hit) = tree.find_intersection(&LineSegment::new(from, to)) {
///     println!("hit at {:?}", hit.point);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct BoundingBoxTree {
    root: Option<BoxNode>,
    epsilon: f32,
}

impl Default for BoundingBoxTree {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundingBoxTree {
    /// Creates a tree with no nodes, using [`PLANE_EPSILON`].
    pub fn new() -> Self {
        Self::with_epsilon(PLANE_EPSILON)
    }

    /// Creates a tree with no nodes and a custom containment/clipping tolerance.
    pub fn with_epsilon(epsilon: f32) -> Self {
        Self {
            root: None,
            epsilon,
        }
    }

    #[inline]
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// Shapes the tree: `depth` levels over `root_box`, each level halving
    /// its parent along the longest axis.
    ///
    /// Any previous shape and its triangles are discarded.
    pub fn generate_nodes(
        &mut self,
        root_box: AxisAlignedBox,
        depth: usize,
    ) -> Result<(), BoxTreeError> {
        if depth == 0 {
            return Err(BoxTreeError::InvalidDepth);
        }

        let root = BoxNode::generate(root_box, depth);
        log::debug!(
            "generated bounding box tree: depth {depth}, {} leaves over {:?}",
            root.leaf_count(),
            root.bounds()
        );
        self.root = Some(root);
        Ok(())
    }

    /// Inserts one triangle.
    ///
    /// Fails with [`BoxTreeError::NotContained`] if the triangle leaves the
    /// root box, or [`BoxTreeError::NoNodes`] before the tree is shaped.
    pub fn insert_triangle(&mut self, triangle: &Triangle) -> Result<(), BoxTreeError> {
        let epsilon = self.epsilon;
        let root = self.root.as_mut().ok_or(BoxTreeError::NoNodes)?;
        root.insert(triangle, epsilon).inspect_err(|err| {
            log::warn!("failed to insert {triangle:?}: {err}");
        })
    }

    /// Inserts every triangle accepted by `filter` (all of them if `None`).
    ///
    /// Stops at the first failure; triangles inserted before it stay in the
    /// tree. Returns the number of triangles inserted.
    pub fn insert_triangle_list<'a, I>(
        &mut self,
        triangles: I,
        filter: Option<&NormalFilter>,
    ) -> Result<usize, BoxTreeError>
    where
        I: IntoIterator<Item = &'a Triangle>,
    {
        let mut inserted = 0;
        let mut skipped = 0;
        for triangle in triangles {
            if filter.is_some_and(|f| !f.accepts(triangle)) {
                skipped += 1;
                continue;
            }
            self.insert_triangle(triangle)?;
            inserted += 1;
        }

        log::debug!(
            "inserted {inserted} triangles ({skipped} filtered), {} stored",
            self.triangle_count()
        );
        Ok(inserted)
    }

    /// Finds the triangle hit closest to the segment's start.
    ///
    /// Returns `None` on a miss or when the tree has no nodes.
    pub fn find_intersection(&self, segment: &LineSegment) -> Option<SegmentHit<'_>> {
        let mut best = None;
        if let Some(root) = &self.root {
            root.find_intersection(segment, self.epsilon, &mut best);
        }
        best
    }

    /// Finds the stored triangle closest to `point`, no farther than
    /// `max_distance`.
    ///
    /// Only leaves whose box contains `point` are searched: a triangle in a
    /// neighbouring leaf is missed even when it is the closest one.
    pub fn find_nearest_triangle(
        &self,
        point: Point3<f32>,
        max_distance: f32,
    ) -> Option<NearestTriangle<'_>> {
        let mut best = None;
        if let Some(root) = &self.root {
            root.find_nearest(point, max_distance, self.epsilon, &mut best);
        }
        best
    }

    #[inline]
    pub fn root(&self) -> Option<&BoxNode> {
        self.root.as_ref()
    }

    /// Returns `true` until [`generate_nodes`](Self::generate_nodes) succeeds.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn leaf_count(&self) -> usize {
        self.root.as_ref().map_or(0, BoxNode::leaf_count)
    }

    pub fn triangle_count(&self) -> usize {
        self.root.as_ref().map_or(0, BoxNode::triangle_count)
    }

    /// Returns the depth of the tree (0 for a tree with no nodes).
    pub fn depth(&self) -> usize {
        self.root.as_ref().map_or(0, BoxNode::depth)
    }

    /// Iterates over the leaves, back child before front child.
    pub fn leaves(&self) -> impl Iterator<Item = &LeafNode> {
        let mut leaves = Vec::with_capacity(self.leaf_count());
        if let Some(root) = &self.root {
            root.collect_leaves(&mut leaves);
        }
        leaves.into_iter()
    }

    /// Draws leaf boxes and/or leaf triangles, breadth first.
    pub fn render<R: Renderer + ?Sized>(&self, renderer: &mut R, flags: BoxTreeDrawFlags) {
        let Some(root) = &self.root else {
            return;
        };

        let mut queue = VecDeque::from([root]);
        let mut leaf_index = 0;
        while let Some(node) = queue.pop_front() {
            let leaf = match node {
                BoxNode::Branch(branch) => {
                    queue.push_back(branch.back());
                    queue.push_back(branch.front());
                    continue;
                }
                BoxNode::Leaf(leaf) => leaf,
            };

            if flags.contains(BoxTreeDrawFlags::BOXES) {
                leaf.bounds().render(renderer);
            }
            if flags.contains(BoxTreeDrawFlags::TRIANGLES) && !leaf.triangles().is_empty() {
                render_leaf_triangles(renderer, leaf, leaf_color(leaf_index));
            }
            leaf_index += 1;
        }
    }
}

fn render_leaf_triangles<R: Renderer + ?Sized>(
    renderer: &mut R,
    leaf: &LeafNode,
    color: Vector3<f32>,
) {
    let flags = VertexFlags::POSITION | VertexFlags::NORMAL | VertexFlags::COLOR;
    renderer.begin_draw(DrawMode::Triangles);
    for triangle in leaf.triangles() {
        let normal = triangle.unit_normal().unwrap_or_else(Vector3::zeros);
        for &position in triangle.vertices() {
            let vertex = Vertex::at(position).with_normal(normal).with_color(color, 1.0);
            renderer.issue_vertex(&vertex, flags);
        }
    }
    renderer.end_draw();
}

/// A light color unique enough to tell neighbouring leaves apart.
fn leaf_color(index: usize) -> Vector3<f32> {
    let channel = |step: f32| 0.5 + 0.5 * ((index as f32 + 1.0) * step).fract();
    Vector3::new(channel(0.618_034), channel(0.414_213_6), channel(0.732_050_8))
}
