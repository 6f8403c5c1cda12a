//! Rendering sink driven by tree traversal.
//!
//! Trees never draw anything themselves. They open a batch, issue vertices
//! in the order they must be composited, and close the batch; what happens to
//! those vertices is up to the [`Renderer`] implementation.

use bitflags::bitflags;

use crate::Vertex;

/// Primitive topology of a draw batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawMode {
    Points,
    /// Every two vertices form a segment.
    Lines,
    /// Every three vertices form a triangle.
    Triangles,
}

bitflags! {
    /// Which vertex attributes the renderer should consume.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VertexFlags: u32 {
        const POSITION = 0b0001;
        const NORMAL = 0b0010;
        const COLOR = 0b0100;
        const TEX_COORDS = 0b1000;
    }
}

impl Default for VertexFlags {
    fn default() -> Self {
        VertexFlags::all()
    }
}

/// Sink for vertices emitted during traversal.
///
/// Implement this trait to forward geometry to a graphics backend. Common uses include:
/// - Immediate-mode drawing (painter's algorithm)
/// - Recording the draw order for tests or export
pub trait Renderer {
    /// Opens a batch of the given topology.
    fn begin_draw(&mut self, mode: DrawMode);

    /// Closes the batch opened by the last [`begin_draw`](Self::begin_draw).
    fn end_draw(&mut self);

    /// Emits one vertex into the open batch.
    fn issue_vertex(&mut self, vertex: &Vertex, flags: VertexFlags);
}

/// One closed (or still open) batch captured by [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub struct DrawBatch {
    pub mode: DrawMode,
    pub vertices: Vec<Vertex>,
}

/// A renderer that records every batch it receives.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    batches: Vec<DrawBatch>,
}

impl RecordingRenderer {
    /// Creates a new empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a reference to the recorded batches.
    pub fn batches(&self) -> &[DrawBatch] {
        &self.batches
    }

    /// Returns the recorded batches.
    pub fn into_batches(self) -> Vec<DrawBatch> {
        self.batches
    }

    /// Every vertex of every batch, in emission order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.batches.iter().flat_map(|b| b.vertices.iter())
    }

    /// Vertices of all `Triangles` batches grouped in threes.
    pub fn triangles(&self) -> Vec<[Vertex; 3]> {
        self.batches
            .iter()
            .filter(|b| b.mode == DrawMode::Triangles)
            .flat_map(|b| b.vertices.chunks_exact(3))
            .map(|c| [c[0].clone(), c[1].clone(), c[2].clone()])
            .collect()
    }
}

impl Renderer for RecordingRenderer {
    fn begin_draw(&mut self, mode: DrawMode) {
        self.batches.push(DrawBatch {
            mode,
            vertices: Vec::new(),
        });
    }

    fn end_draw(&mut self) {}

    fn issue_vertex(&mut self, vertex: &Vertex, _flags: VertexFlags) {
        if let Some(batch) = self.batches.last_mut() {
            batch.vertices.push(vertex.clone());
        } else {
            log::warn!("vertex issued outside of a draw batch; dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn recording_renderer_empty() {
        let renderer = RecordingRenderer::new();
        assert!(renderer.batches().is_empty());
        assert!(renderer.triangles().is_empty());
    }

    #[test]
    fn recording_renderer_groups_triangles() {
        let mut renderer = RecordingRenderer::new();
        renderer.begin_draw(DrawMode::Lines);
        renderer.issue_vertex(&Vertex::at(Point3::origin()), VertexFlags::POSITION);
        renderer.issue_vertex(&Vertex::at(Point3::new(1.0, 0.0, 0.0)), VertexFlags::POSITION);
        renderer.end_draw();

        renderer.begin_draw(DrawMode::Triangles);
        for i in 0..6 {
            renderer.issue_vertex(&Vertex::at(Point3::new(i as f32, 0.0, 0.0)), VertexFlags::all());
        }
        renderer.end_draw();

        assert_eq!(renderer.batches().len(), 2);
        assert_eq!(renderer.vertices().count(), 8);

        let triangles = renderer.triangles();
        assert_eq!(triangles.len(), 2);
        assert_eq!(triangles[1][0].position, Point3::new(3.0, 0.0, 0.0));
    }

    #[test]
    fn stray_vertex_is_dropped() {
        let mut renderer = RecordingRenderer::new();
        renderer.issue_vertex(&Vertex::at(Point3::origin()), VertexFlags::POSITION);
        assert!(renderer.batches().is_empty());
    }

    #[test]
    fn default_flags_request_everything() {
        let flags = VertexFlags::default();
        assert!(flags.contains(VertexFlags::POSITION | VertexFlags::NORMAL));
        assert!(flags.contains(VertexFlags::COLOR | VertexFlags::TEX_COORDS));
    }
}
