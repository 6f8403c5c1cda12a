//! Error types for clipping, tree construction and transformation.

use nalgebra::Point3;

use crate::IndexTriangle;

/// Failure of [`Cuttable::cut`](crate::Cuttable::cut).
#[derive(thiserror::Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ClipError {
    /// No edge crosses the plane, so there is nothing to split.
    #[error("the triangle does not straddle the plane")]
    NotSpanning,
    /// A fan fragment ended up with vertices on both sides of the plane.
    #[error("clipped fragment {fragment} has vertices on both sides of the plane")]
    InconsistentFragment {
        /// Position of the fragment in the triangle fan.
        fragment: usize,
    },
}

/// The linear part of an affine transform has no inverse, so normals cannot
/// be carried through it.
#[derive(thiserror::Error, Debug, Copy, Clone, PartialEq, Eq)]
#[error("the affine transform is singular; normals cannot be corrected")]
pub struct SingularTransformError;

/// Failure of a [`BoundingBoxTree`](crate::bvh::BoundingBoxTree) operation.
#[derive(thiserror::Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum BoxTreeError {
    /// A tree must be at least one level (a single leaf) deep.
    #[error("tree depth must be at least 1")]
    InvalidDepth,
    /// Insertion or query before `generate_nodes` shaped the tree.
    #[error("the tree has no nodes; call generate_nodes first")]
    NoNodes,
    /// The triangle leaves the box of the node it was offered to.
    #[error("the triangle is not contained in the node's bounding box")]
    NotContained,
    /// Splitting a straddling triangle across a branch plane failed.
    #[error("clipping against a branch plane failed: {0}")]
    Clip(#[from] ClipError),
}

/// Failure of a [`BspTree`](crate::bsp::BspTree) operation.
///
/// A build that fails leaves the tree empty; it is never partially valid.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BspError {
    /// Splitting a spanning triangle failed.
    #[error("clipping a spanning triangle failed: {0}")]
    Clip(#[from] ClipError),
    /// A clipped fragment vertex is neither an original vertex nor on an original edge.
    #[error(
        "fragment vertex {position:?} matches no vertex or edge of triangle {source_triangle:?}"
    )]
    VertexReconciliation {
        /// The triangle whose fragments were being re-indexed.
        source_triangle: IndexTriangle,
        /// The fragment vertex that could not be placed.
        position: Point3<f32>,
    },
    /// An index triangle points past the end of the vertex buffer.
    #[error("vertex index {index} is out of bounds for a buffer of {len} vertices")]
    VertexOutOfBounds {
        /// The offending index.
        index: usize,
        /// Length of the vertex buffer.
        len: usize,
    },
    /// The selected partitioning triangle has no plane.
    #[error("the partitioning triangle {0:?} is degenerate")]
    DegeneratePartition(IndexTriangle),
    /// See [`SingularTransformError`].
    #[error(transparent)]
    SingularTransform(#[from] SingularTransformError),
}
