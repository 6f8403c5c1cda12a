use macroquad::prelude::*;
use mesh_spatial::{BoundingBoxTree, BoxTreeDrawFlags, NormalFilter};
use mesh_spatial_viz::{MacroquadRenderer, OrbitCamera, draw_axes, random_cubes};
use nalgebra::{Point3, Vector3};

const NUM_CUBES: usize = 12;
const WORLD_SIZE: f32 = 30.0;
const TREE_DEPTH: usize = 6;
const SEARCH_RADIUS: f32 = 4.0;

fn to_vec3(p: &Point3<f32>) -> Vec3 {
    vec3(p.x, p.y, p.z)
}

/// Builds a box tree over the scene, optionally keeping only upward faces.
fn build_tree(floors_only: bool) -> BoundingBoxTree {
    let mesh = random_cubes(7, NUM_CUBES, WORLD_SIZE, 1.0);
    let mut tree = BoundingBoxTree::new();

    let Some(bounds) = mesh.bounding_box() else {
        return tree;
    };
    if let Err(err) = tree.generate_nodes(bounds, TREE_DEPTH) {
        log::error!("failed to shape box tree: {err}");
        return tree;
    }

    let floors = NormalFilter::new(Vector3::y(), 45f32.to_radians());
    let filter = floors_only.then_some(&floors);
    match tree.insert_triangle_list(&mesh.triangle_list(true), filter) {
        Ok(inserted) => log::info!(
            "indexed {inserted} triangles as {} fragments in {} leaves",
            tree.triangle_count(),
            tree.leaf_count()
        ),
        Err(err) => log::error!("failed to index scene: {err}"),
    }
    tree
}

#[macroquad::main("Box Tree Picking")]
async fn main() {
    env_logger::init();

    let mut floors_only = false;
    let mut tree = build_tree(floors_only);
    let mut flags = BoxTreeDrawFlags::all();
    let mut camera = OrbitCamera::new(60.0, 0.5, 0.4).with_zoom(3.0, 10.0, 150.0);
    let mut renderer = MacroquadRenderer::new();

    loop {
        camera.update();

        if is_key_pressed(KeyCode::Key1) {
            flags.toggle(BoxTreeDrawFlags::BOXES);
        }
        if is_key_pressed(KeyCode::Key2) {
            flags.toggle(BoxTreeDrawFlags::TRIANGLES);
        }
        if is_key_pressed(KeyCode::G) {
            floors_only = !floors_only;
            tree = build_tree(floors_only);
        }

        let segment = camera.mouse_segment();
        let hit = tree.find_intersection(&segment);
        // Search from half a unit above the picked surface.
        let nearest = hit.as_ref().and_then(|hit| {
            let lift = hit.triangle.unit_normal().unwrap_or_else(Vector3::zeros) * 0.5;
            tree.find_nearest_triangle(hit.point + lift, SEARCH_RADIUS)
        });

        clear_background(Color::from_rgba(15, 15, 25, 255));
        set_camera(&camera.to_camera3d());

        tree.render(&mut renderer, flags);
        if let Some(hit) = &hit {
            let [a, b, c] = hit.triangle.vertices().map(|v| to_vec3(&v));
            draw_line_3d(a, b, YELLOW);
            draw_line_3d(b, c, YELLOW);
            draw_line_3d(c, a, YELLOW);
            draw_sphere(to_vec3(&hit.point), 0.3, None, RED);
        }
        draw_axes(8.0);

        set_default_camera();

        draw_text(
            &format!(
                "Box Tree Picking - {} fragments in {} leaves, depth {}",
                tree.triangle_count(),
                tree.leaf_count(),
                tree.depth()
            ),
            10.0,
            25.0,
            20.0,
            WHITE,
        );
        let status = match &hit {
            Some(hit) => format!(
                "Hit at ({:.2}, {:.2}, {:.2}), t = {:.3}",
                hit.point.x, hit.point.y, hit.point.z, hit.parameter
            ),
            None => "No hit".to_string(),
        };
        draw_text(&status, 10.0, 45.0, 18.0, YELLOW);
        if let Some(nearest) = &nearest {
            draw_text(
                &format!("Nearest triangle above hit: {:.2}", nearest.distance),
                10.0,
                65.0,
                18.0,
                GRAY,
            );
        }
        draw_text(
            &format!(
                "[1] boxes | [2] triangles | [G] floors only: {}",
                if floors_only { "on" } else { "off" }
            ),
            10.0,
            85.0,
            16.0,
            DARKGRAY,
        );
        draw_text(
            "Right-drag or arrows to rotate, scroll to zoom",
            10.0,
            105.0,
            16.0,
            DARKGRAY,
        );
        draw_text(&format!("FPS: {}", get_fps()), 10.0, 125.0, 16.0, DARKGRAY);

        next_frame().await
    }
}
