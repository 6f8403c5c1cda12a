//! Spatial indexing for triangle meshes.
//!
//! Two trees share one clipping primitive:
//!
//! - [`bsp::BspTree`] partitions a mesh by the planes of its own triangles and
//!   replays it in painter's-algorithm order for any eye position.
//! - [`bvh::BoundingBoxTree`] halves a box to a fixed depth and answers
//!   segment-intersection and nearest-triangle queries.
//!
//! Both cut straddling triangles with [`Cuttable::cut`].

mod aabb;
mod cuttable;
mod error;
mod mesh;
mod plane;
mod polygon;
mod render;
mod segment;
mod triangle;

pub mod bsp;
pub mod bvh;

pub use aabb::{Axis, AxisAlignedBox};
pub use cuttable::{Cuttable, TriangleSplit};
pub use error::{BoxTreeError, BspError, ClipError, SingularTransformError};
pub use mesh::{IndexTriangle, TriangleMesh, Vertex, normal_matrix, transform_vertices};
pub use plane::{Classification, PLANE_EPSILON, Plane3D, PlaneSide};
pub use polygon::Polygon;
pub use render::{DrawBatch, DrawMode, RecordingRenderer, Renderer, VertexFlags};
pub use segment::LineSegment;
pub use triangle::Triangle;

pub use bsp::{BspTree, RenderMode};
pub use bvh::{BoundingBoxTree, BoxTreeDrawFlags, NormalFilter};
