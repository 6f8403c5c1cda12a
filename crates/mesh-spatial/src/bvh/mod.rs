//! Fixed-depth bounding volume tree for segment and nearest-triangle queries.
//!
//! The tree is a complete binary tree of axis-aligned boxes. Its shape is
//! chosen before any triangle is seen; triangles then sink to the leaves that
//! contain them, cut in pieces where they straddle a split.
//!
//! # Architecture
//!
//! - [`BoundingBoxTree`]: owns the root node and the tolerance
//! - [`BoxNode`]: a [`BranchNode`] (split plane, two children) or a
//!   [`LeafNode`] (triangles)
//! - [`SegmentHit`] / [`NearestTriangle`]: query results borrowing from the tree

mod node;
mod tree;

pub use node::{BoxNode, BranchNode, LeafNode, NearestTriangle, SegmentHit};
pub use tree::{BoundingBoxTree, BoxTreeDrawFlags, NormalFilter};
