use approx::assert_relative_eq;
use mesh_spatial::{
    BspTree, IndexTriangle, PlaneSide, RecordingRenderer, RenderMode, Triangle, TriangleMesh,
    Vertex, VertexFlags,
};
use nalgebra::{Affine3, Isometry3, Point3, Vector3};

fn rigid(translation: Vector3<f32>, axis_angle: Vector3<f32>) -> Affine3<f32> {
    Affine3::from_matrix_unchecked(Isometry3::new(translation, axis_angle).to_homogeneous())
}

/// Concatenates the vertex buffers and triangle lists of several meshes.
fn merge(meshes: &[TriangleMesh]) -> TriangleMesh {
    let mut merged = TriangleMesh::new();
    for mesh in meshes {
        let base = merged.vertices().len();
        for vertex in mesh.vertices() {
            merged.add_vertex(vertex.clone());
        }
        for triangle in mesh.triangles() {
            let [a, b, c] = triangle.indices().map(|i| i + base);
            merged.add_triangle(IndexTriangle::new(a, b, c));
        }
    }
    merged
}

/// Two interpenetrating cubes, so partition planes cut through triangles.
fn crossed_cubes() -> TriangleMesh {
    let upright = TriangleMesh::cube(Point3::origin(), 2.0);
    let mut tilted = TriangleMesh::cube(Point3::origin(), 2.0);
    tilted
        .transform(&rigid(Vector3::new(0.4, 0.3, 0.2), Vector3::new(0.3, 0.5, 0.2)))
        .unwrap();
    merge(&[upright, tilted])
}

fn total_area(triangles: &[Triangle]) -> f32 {
    triangles.iter().map(Triangle::area).sum()
}

#[test]
fn generate_preserves_area_and_splits_spanning_triangles() {
    let mesh = crossed_cubes();
    let input_area = total_area(&mesh.triangle_list(true));

    let mut tree = BspTree::new();
    tree.generate(&mesh).unwrap();

    let stored = tree.collect_triangles();
    assert!(stored.len() > mesh.triangles().len());
    assert!(tree.vertices().len() > mesh.vertices().len());
    assert_relative_eq!(total_area(&stored), input_area, epsilon = 1e-3);
}

#[test]
fn node_triangles_lie_on_node_plane() {
    let mut tree = BspTree::new();
    tree.generate(&crossed_cubes()).unwrap();

    let mut stack = vec![tree.root().unwrap()];
    while let Some(node) = stack.pop() {
        for triangle in node.triangles() {
            let resolved = triangle.resolve(tree.vertices()).unwrap();
            for &v in resolved.vertices() {
                assert_eq!(
                    node.plane().classify_point_with_epsilon(v, tree.epsilon() * 10.0),
                    PlaneSide::OnPlane
                );
            }
        }
        stack.extend(node.front());
        stack.extend(node.back());
    }
}

#[test]
fn back_to_front_emits_back_node_front() {
    let mut mesh = TriangleMesh::new();
    for z in [0.0, -1.0, 1.0] {
        let a = mesh.add_vertex(Vertex::at(Point3::new(0.0, 0.0, z)));
        let b = mesh.add_vertex(Vertex::at(Point3::new(1.0, 0.0, z)));
        let c = mesh.add_vertex(Vertex::at(Point3::new(0.0, 1.0, z)));
        mesh.add_triangle(IndexTriangle::new(a, b, c));
    }

    let mut tree = BspTree::new();
    tree.generate(&mesh).unwrap();
    assert_eq!(tree.node_count(), 3);

    let mut renderer = RecordingRenderer::new();
    tree.render(
        &mut renderer,
        RenderMode::BackToFront,
        Point3::new(0.3, 0.3, 5.0),
        None,
        VertexFlags::all(),
    )
    .unwrap();

    let order: Vec<f32> = renderer.triangles().iter().map(|t| t[0].position.z).collect();
    assert_eq!(order, vec![-1.0, 0.0, 1.0]);
}

/// For a convex solid, faces turned away from the eye must all be drawn
/// before faces turned towards it.
#[test]
fn back_faces_of_convex_solid_are_drawn_first() {
    let mesh = TriangleMesh::cube(Point3::new(0.5, -0.5, 0.0), 2.0);
    let mut tree = BspTree::new();
    tree.generate(&mesh).unwrap();

    let eyes = [
        Point3::new(5.0, 1.0, 3.0),
        Point3::new(-4.0, -6.0, 2.0),
        Point3::new(0.2, 0.1, -7.0),
    ];

    for eye in eyes {
        let mut renderer = RecordingRenderer::new();
        tree.render(&mut renderer, RenderMode::BackToFront, eye, None, VertexFlags::all())
            .unwrap();

        let facing: Vec<bool> = renderer
            .triangles()
            .iter()
            .map(|[a, b, c]| {
                let tri = Triangle::new(a.position, b.position, c.position);
                tri.normal().dot(&(eye - tri.centroid())) > 0.0
            })
            .collect();
        assert_eq!(facing.len(), 12);

        let first_front = facing.iter().position(|&f| f).unwrap();
        assert!(facing[first_front..].iter().all(|&f| f), "{eye}: {facing:?}");
    }
}

#[test]
fn rigid_round_trip_restores_planes() {
    let mut tree = BspTree::new();
    tree.generate(&crossed_cubes()).unwrap();
    let planes = tree.planes();
    let positions: Vec<Point3<f32>> = tree.vertices().iter().map(|v| v.position).collect();

    let motion = rigid(Vector3::new(3.0, -1.0, 2.0), Vector3::new(-0.6, 0.2, 1.1));
    tree.transform(&motion).unwrap();
    tree.transform(&motion.inverse()).unwrap();

    assert_eq!(tree.planes().len(), planes.len());
    for (restored, original) in tree.planes().iter().zip(&planes) {
        assert!(restored.approx_eq(original, 1e-4), "{restored:?} != {original:?}");
    }
    for (vertex, original) in tree.vertices().iter().zip(&positions) {
        assert_relative_eq!(vertex.position, *original, epsilon = 1e-4);
    }
}

#[test]
fn transformed_tree_renders_like_render_transform() {
    let mesh = TriangleMesh::cube(Point3::origin(), 1.0);
    let motion = rigid(Vector3::new(0.0, 0.0, -3.0), Vector3::new(0.2, 0.9, 0.0));
    let eye = Point3::new(0.5, 1.0, 4.0);

    let mut moved = BspTree::new();
    moved.generate(&mesh).unwrap();
    moved.transform(&motion).unwrap();
    let mut a = RecordingRenderer::new();
    moved
        .render(&mut a, RenderMode::BackToFront, eye, None, VertexFlags::all())
        .unwrap();

    let mut placed = BspTree::new();
    placed.generate(&mesh).unwrap();
    let mut b = RecordingRenderer::new();
    placed
        .render(&mut b, RenderMode::BackToFront, eye, Some(&motion), VertexFlags::all())
        .unwrap();

    let (a, b) = (a.triangles(), b.triangles());
    assert_eq!(a.len(), b.len());
    for (ta, tb) in a.iter().zip(&b) {
        for (va, vb) in ta.iter().zip(tb) {
            assert_relative_eq!(va.position, vb.position, epsilon = 1e-5);
            assert_relative_eq!(va.normal, vb.normal, epsilon = 1e-5);
        }
    }
}

#[test]
fn clear_releases_everything() {
    let mut tree = BspTree::new();
    tree.generate(&crossed_cubes()).unwrap();
    assert!(!tree.is_empty());

    tree.clear();
    assert!(tree.is_empty());
    assert!(tree.vertices().is_empty());
    assert_eq!(tree.triangle_count(), 0);
}
