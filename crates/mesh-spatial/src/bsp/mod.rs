//! Binary Space Partitioning tree for painter's-algorithm rendering.
//!
//! This module provides a BSP tree that recursively partitions 3D space using
//! planes derived from the triangles of a mesh. The tree enables:
//!
//! - Back-to-front and front-to-back rendering relative to any eye position
//! - Rigid transformation in place, without rebuilding
//! - Culling of whole half spaces through visibility hooks
//!
//! # Example
//!
//! ```ignore
//! use mesh_spatial::{BspTree, RecordingRenderer, RenderMode, TriangleMesh, VertexFlags};
//! use nalgebra::Point3;
//!
//! let mesh = TriangleMesh::cube(Point3::origin(), 2.0);
//! let mut tree = BspTree::new();
//! tree.generate(&mesh)?;
//!
//! let eye = Point3::new(0.0, 0.0, 10.0); // The location of the viewer
//! let mut renderer = RecordingRenderer::new();
//! tree.render(&mut renderer, RenderMode::BackToFront, eye, None, VertexFlags::all())?;
//! ```
//!
//! # Architecture
//!
//! - [`BspTree`]: owns the root node and the working vertex buffer
//! - [`BspNode`]: a partitioning plane and the triangles lying on it
//! - [`PartitionSelector`]: strategy trait for choosing partitioning triangles
//! - [`SpaceVisibility`]: hooks deciding whether a half space is drawn

mod node;
mod selector;
mod tree;
mod visibility;

// Re-export main types
pub use node::BspNode;
pub use selector::{FirstTriangle, PartitionSelector};
pub use tree::{BspTree, RenderMode};
pub use visibility::{AllSpaceVisible, FnVisibility, HalfSpace, SpaceVisibility};
