use macroquad::prelude::*;
use mesh_spatial::{BspTree, RenderMode, VertexFlags};
use mesh_spatial_viz::{MacroquadRenderer, OrbitCamera, TreeNavigator, draw_axes, random_cubes};
use nalgebra::{Affine3, Isometry3, Vector3};

const NUM_CUBES: usize = 10;
const WORLD_SIZE: f32 = 30.0;
const CUBE_ALPHA: f32 = 0.45;

#[macroquad::main("BSP Translucent Cubes")]
async fn main() {
    env_logger::init();

    let mesh = random_cubes(42, NUM_CUBES, WORLD_SIZE, CUBE_ALPHA);
    log::info!(
        "generated {} cubes: {} triangles",
        NUM_CUBES,
        mesh.triangles().len()
    );

    let mut tree = BspTree::new();
    if let Err(err) = tree.generate(&mesh) {
        log::error!("failed to build BSP tree: {err}");
        return;
    }
    log::info!(
        "BSP tree built: {} triangles in {} nodes, depth {}",
        tree.triangle_count(),
        tree.node_count(),
        tree.depth()
    );

    let mut camera = OrbitCamera::new(50.0, 0.0, 0.3).with_zoom(3.0, 10.0, 150.0);
    let mut navigator = TreeNavigator::new();
    let mut renderer = MacroquadRenderer::new();
    let mut mode = RenderMode::BackToFront;
    let mut spin: Option<f32> = None;

    loop {
        camera.update();
        navigator.update(&tree);

        if is_key_pressed(KeyCode::M) {
            mode = match mode {
                RenderMode::BackToFront => RenderMode::FrontToBack,
                RenderMode::FrontToBack => RenderMode::BackToFront,
            };
        }
        if is_key_pressed(KeyCode::S) {
            spin = spin.is_none().then_some(0.0);
        }
        if let Some(angle) = spin.as_mut() {
            *angle += 0.5 * get_frame_time();
        }

        let placement = spin.map(|angle| {
            let motion = Isometry3::new(Vector3::zeros(), Vector3::y() * angle);
            Affine3::from_matrix_unchecked(motion.to_homogeneous())
        });

        clear_background(Color::from_rgba(15, 15, 25, 255));
        set_camera(&camera.to_camera3d());

        let visibility = navigator.visibility(&tree);
        let drawn = tree.render_with_visibility(
            &mut renderer,
            mode,
            camera.eye_point(),
            placement.as_ref(),
            VertexFlags::POSITION | VertexFlags::COLOR,
            &visibility,
        );
        if let Err(err) = drawn {
            log::warn!("render failed: {err}");
        }
        if placement.is_none() {
            navigator.highlight(&tree, &mut renderer);
        }

        draw_axes(8.0);
        set_default_camera();

        draw_text(
            &format!(
                "BSP Translucent Cubes - {} triangles ({} in mesh)",
                tree.triangle_count(),
                mesh.triangles().len()
            ),
            10.0,
            25.0,
            20.0,
            WHITE,
        );
        draw_text(
            &format!(
                "Nodes: {} | Depth: {} | [M]ode: {:?} | [S]pin: {}",
                tree.node_count(),
                tree.depth(),
                mode,
                if spin.is_some() { "on" } else { "off" }
            ),
            10.0,
            45.0,
            18.0,
            GRAY,
        );

        navigator.draw_ui(&tree, 70.0);

        draw_text(
            "Right-drag or arrows to rotate, scroll to zoom",
            10.0,
            155.0,
            16.0,
            DARKGRAY,
        );
        draw_text(&format!("FPS: {}", get_fps()), 10.0, 175.0, 16.0, DARKGRAY);

        next_frame().await
    }
}
