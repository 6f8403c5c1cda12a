//! BSP tree node implementation.

use nalgebra::{Affine3, Matrix3};

use crate::{BspError, IndexTriangle, Plane3D, SingularTransformError};

/// A node in the BSP tree.
///
/// Each node partitions space using a plane taken from one of its own
/// triangles and stores every triangle lying on that plane. Triangles in
/// front of or behind the plane live in the respective child subtrees; a
/// child exists only if at least one triangle fell on its side.
///
/// Triangles are indices into the tree's vertex buffer, see
/// [`BspTree::vertices`](super::BspTree::vertices).
#[derive(Debug, Clone)]
pub struct BspNode {
    /// The partitioning plane for this node.
    plane: Plane3D,

    /// Triangles coplanar with the plane, the partitioning triangle first.
    triangles: Vec<IndexTriangle>,

    /// Subtree containing triangles in FRONT of the plane.
    front: Option<Box<BspNode>>,

    /// Subtree containing triangles BEHIND the plane.
    back: Option<Box<BspNode>>,
}

impl BspNode {
    /// Creates a new BSP node with the given partitioning plane.
    ///
    /// The node starts with no triangles and no children.
    pub fn new(plane: Plane3D) -> Self {
        Self::with_triangles(plane, Vec::new())
    }

    /// Creates a new BSP node with a partitioning plane and its coplanar triangles.
    pub fn with_triangles(plane: Plane3D, triangles: Vec<IndexTriangle>) -> Self {
        Self {
            plane,
            triangles,
            front: None,
            back: None,
        }
    }

    /// Returns a reference to the partitioning plane.
    #[inline]
    pub fn plane(&self) -> &Plane3D {
        &self.plane
    }

    /// Returns the triangles lying on the partitioning plane.
    #[inline]
    pub fn triangles(&self) -> &[IndexTriangle] {
        &self.triangles
    }

    /// Returns a reference to the front child subtree.
    #[inline]
    pub fn front(&self) -> Option<&BspNode> {
        self.front.as_deref()
    }

    /// Returns a reference to the back child subtree.
    #[inline]
    pub fn back(&self) -> Option<&BspNode> {
        self.back.as_deref()
    }

    /// Sets the front child subtree.
    #[inline]
    pub fn set_front(&mut self, node: Option<BspNode>) {
        self.front = node.map(Box::new);
    }

    /// Sets the back child subtree.
    #[inline]
    pub fn set_back(&mut self, node: Option<BspNode>) {
        self.back = node.map(Box::new);
    }

    /// Checks if this node has any children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.front.is_none() && self.back.is_none()
    }

    /// Returns the total number of triangles in this subtree (including all descendants).
    pub fn triangle_count(&self) -> usize {
        let mut count = self.triangles.len();

        if let Some(ref front) = self.front {
            count += front.triangle_count();
        }
        if let Some(ref back) = self.back {
            count += back.triangle_count();
        }

        count
    }

    /// Returns the number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        1 + self.front.as_ref().map_or(0, |n| n.node_count())
            + self.back.as_ref().map_or(0, |n| n.node_count())
    }

    /// Returns the depth of this subtree (1 for a leaf node).
    pub fn depth(&self) -> usize {
        let front_depth = self.front.as_ref().map_or(0, |n| n.depth());
        let back_depth = self.back.as_ref().map_or(0, |n| n.depth());
        1 + front_depth.max(back_depth)
    }

    /// Re-derives every plane of the subtree under `transform`.
    pub(crate) fn transform_planes(
        &mut self,
        transform: &Affine3<f32>,
        normal_matrix: &Matrix3<f32>,
    ) -> Result<(), BspError> {
        self.plane = self
            .plane
            .transformed(transform, normal_matrix)
            .ok_or(SingularTransformError)?;

        if let Some(front) = self.front.as_deref_mut() {
            front.transform_planes(transform, normal_matrix)?;
        }
        if let Some(back) = self.back.as_deref_mut() {
            back.transform_planes(transform, normal_matrix)?;
        }
        Ok(())
    }

    /// Appends this subtree's planes in pre-order (node, front, back).
    pub(crate) fn collect_planes(&self, out: &mut Vec<Plane3D>) {
        out.push(self.plane.clone());
        if let Some(front) = self.front() {
            front.collect_planes(out);
        }
        if let Some(back) = self.back() {
            back.collect_planes(out);
        }
    }
}
