//! Shared visualization utilities for the mesh-spatial demos.

use macroquad::models::{Mesh, Vertex as MeshVertex, draw_mesh};
use macroquad::prelude::*;
use mesh_spatial::{DrawMode, LineSegment, Renderer, TriangleMesh, Vertex, VertexFlags};
use nalgebra::{Affine3, Isometry3, Point3, Unit, Vector3};

pub mod navigator;
pub use navigator::TreeNavigator;

/// Largest vertex count one macroquad mesh can index with `u16`, rounded
/// down to whole triangles.
const MAX_MESH_VERTICES: usize = 65_535 / 3 * 3;

/// Color used for vertices issued without [`VertexFlags::COLOR`].
const DEFAULT_COLOR: Color = Color::new(0.8, 0.8, 0.8, 1.0);

fn to_vec3(p: &Point3<f32>) -> Vec3 {
    vec3(p.x, p.y, p.z)
}

fn vertex_color(vertex: &Vertex, flags: VertexFlags) -> Color {
    if flags.contains(VertexFlags::COLOR) {
        Color::new(vertex.color.x, vertex.color.y, vertex.color.z, vertex.alpha)
    } else {
        DEFAULT_COLOR
    }
}

/// Forwards draw batches to macroquad's immediate-mode 3D drawing.
///
/// Vertices are buffered until [`Renderer::end_draw`], then flushed as
/// meshes, lines or small cubes depending on the batch's [`DrawMode`].
#[derive(Debug, Default)]
pub struct MacroquadRenderer {
    mode: Option<DrawMode>,
    positions: Vec<Vec3>,
    colors: Vec<Color>,
    tex_coords: Vec<Vec2>,
    /// Edge length of the cubes drawn for `Points` batches.
    pub point_size: f32,
}

impl MacroquadRenderer {
    pub fn new() -> Self {
        Self {
            point_size: 0.1,
            ..Self::default()
        }
    }

    fn flush_triangles(&self) {
        let chunks = self
            .positions
            .chunks(MAX_MESH_VERTICES)
            .zip(self.colors.chunks(MAX_MESH_VERTICES))
            .zip(self.tex_coords.chunks(MAX_MESH_VERTICES));

        for ((positions, colors), uvs) in chunks {
            let vertices: Vec<MeshVertex> = positions
                .iter()
                .zip(colors)
                .zip(uvs)
                .map(|((&p, &c), &uv)| MeshVertex::new2(p, uv, c))
                .collect();
            let indices = (0..vertices.len() as u16).collect();

            draw_mesh(&Mesh {
                vertices,
                indices,
                texture: None,
            });
        }
    }

    fn flush_lines(&self) {
        for (pair, colors) in self.positions.chunks_exact(2).zip(self.colors.chunks_exact(2)) {
            draw_line_3d(pair[0], pair[1], colors[0]);
        }
    }

    fn flush_points(&self) {
        let size = vec3(self.point_size, self.point_size, self.point_size);
        for (&p, &c) in self.positions.iter().zip(&self.colors) {
            draw_cube(p, size, None, c);
        }
    }
}

impl Renderer for MacroquadRenderer {
    fn begin_draw(&mut self, mode: DrawMode) {
        self.mode = Some(mode);
        self.positions.clear();
        self.colors.clear();
        self.tex_coords.clear();
    }

    fn end_draw(&mut self) {
        match self.mode.take() {
            Some(DrawMode::Triangles) => self.flush_triangles(),
            Some(DrawMode::Lines) => self.flush_lines(),
            Some(DrawMode::Points) => self.flush_points(),
            None => log::warn!("end_draw without begin_draw"),
        }
    }

    fn issue_vertex(&mut self, vertex: &Vertex, flags: VertexFlags) {
        self.positions.push(to_vec3(&vertex.position));
        self.colors.push(vertex_color(vertex, flags));
        let uv = if flags.contains(VertexFlags::TEX_COORDS) {
            vec2(vertex.tex_coords.x, vertex.tex_coords.y)
        } else {
            Vec2::ZERO
        };
        self.tex_coords.push(uv);
    }
}

/// Seeded linear congruential generator; keeps the demo scenes stable.
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Uniform in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        ((self.state >> 40) as f32) / (1u64 << 24) as f32
    }

    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }
}

/// Scatters `count` randomly rotated cubes over a `world_size` wide region.
///
/// Each cube gets its own color; `alpha` below 1.0 makes them translucent.
pub fn random_cubes(seed: u64, count: usize, world_size: f32, alpha: f32) -> TriangleMesh {
    let mut rng = Rng::new(seed);
    let mut scene = TriangleMesh::new();

    for _ in 0..count {
        let center = Vector3::new(
            (rng.next_f32() - 0.5) * world_size,
            (rng.next_f32() - 0.5) * world_size,
            (rng.next_f32() - 0.5) * world_size,
        );
        let size = rng.range(world_size / 10.0, world_size / 4.0);
        let axis = Vector3::new(rng.next_f32() - 0.5, rng.next_f32() - 0.5, rng.next_f32() - 0.5);
        let axis = Unit::try_new(axis, 0.01).unwrap_or(Vector3::x_axis());
        let angle = rng.next_f32() * std::f32::consts::TAU;
        let color = Vector3::new(rng.range(0.3, 1.0), rng.range(0.3, 1.0), rng.range(0.3, 1.0));

        let motion = Isometry3::new(center, axis.into_inner() * angle);
        let mut cube = TriangleMesh::cube(Point3::origin(), size);
        if let Err(err) = cube.transform(&Affine3::from_matrix_unchecked(motion.to_homogeneous())) {
            log::warn!("skipping cube: {err}");
            continue;
        }

        let base = scene.vertices().len();
        for vertex in cube.vertices() {
            scene.add_vertex(vertex.clone().with_color(color, alpha));
        }
        for triangle in cube.triangles() {
            let [a, b, c] = triangle.indices().map(|i| i + base);
            scene.add_triangle([a, b, c].into());
        }
    }

    scene
}

/// Simple orbit camera for 3D scene navigation.
pub struct OrbitCamera {
    pub distance: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub target: Vec3,
    /// Multiplier for scroll wheel zoom
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl OrbitCamera {
    pub fn new(distance: f32, yaw: f32, pitch: f32) -> Self {
        Self {
            distance,
            yaw,
            pitch,
            target: Vec3::ZERO,
            zoom_speed: 5.0,
            min_distance: 10.0,
            max_distance: 200.0,
        }
    }

    pub fn with_zoom(mut self, speed: f32, min: f32, max: f32) -> Self {
        self.zoom_speed = speed;
        self.min_distance = min;
        self.max_distance = max;
        self
    }

    /// Orbits with the right mouse button or arrow keys, zooms with the wheel.
    ///
    /// The left button is left free for picking.
    pub fn update(&mut self) {
        if is_mouse_button_down(MouseButton::Right) {
            let delta = mouse_delta_position();
            self.yaw -= delta.x * 2.0;
            self.pitch -= delta.y * 2.0;
        }

        let step = 1.2 * get_frame_time();
        if is_key_down(KeyCode::Left) {
            self.yaw += step;
        }
        if is_key_down(KeyCode::Right) {
            self.yaw -= step;
        }
        if is_key_down(KeyCode::Up) {
            self.pitch += step;
        }
        if is_key_down(KeyCode::Down) {
            self.pitch -= step;
        }
        self.pitch = self.pitch.clamp(-1.5, 1.5);

        let scroll = mouse_wheel().1;
        self.distance = (self.distance - scroll * self.zoom_speed)
            .clamp(self.min_distance, self.max_distance);
    }

    /// Returns the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + vec3(x, y, z)
    }

    /// Converts to macroquad's Camera3D for rendering.
    pub fn to_camera3d(&self) -> Camera3D {
        Camera3D {
            position: self.position(),
            up: Vec3::Y,
            target: self.target,
            ..Default::default()
        }
    }

    /// The eye position for BSP rendering.
    pub fn eye_point(&self) -> Point3<f32> {
        let pos = self.position();
        Point3::new(pos.x, pos.y, pos.z)
    }

    /// The segment under the mouse cursor, from the near to the far plane.
    pub fn mouse_segment(&self) -> LineSegment {
        let inverse = self.to_camera3d().matrix().inverse();
        let cursor = mouse_position_local();
        let near = inverse.project_point3(vec3(cursor.x, -cursor.y, -1.0));
        let far = inverse.project_point3(vec3(cursor.x, -cursor.y, 1.0));
        LineSegment::new(
            Point3::new(near.x, near.y, near.z),
            Point3::new(far.x, far.y, far.z),
        )
    }
}

/// Draws the world axes at the origin.
pub fn draw_axes(length: f32) {
    draw_line_3d(Vec3::ZERO, vec3(length, 0.0, 0.0), RED);
    draw_line_3d(Vec3::ZERO, vec3(0.0, length, 0.0), GREEN);
    draw_line_3d(Vec3::ZERO, vec3(0.0, 0.0, length), BLUE);
}
