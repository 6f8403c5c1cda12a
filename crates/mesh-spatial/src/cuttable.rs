//! Triangle clipping against a plane.

use crate::{Classification, ClipError, Plane3D, PlaneSide, Polygon, Triangle};

/// Fragments of a triangle on either side of a cutting plane.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleSplit {
    /// Fragments with no vertex behind the plane.
    pub front: Vec<Triangle>,
    /// Fragments with no vertex in front of the plane.
    pub back: Vec<Triangle>,
}

/// Trait for geometry that can be cut by a plane.
pub trait Cuttable {
    /// Cuts the geometry by a plane into front and back triangle fragments.
    ///
    /// Fails with [`ClipError::NotSpanning`] when no edge crosses the plane
    /// (the caller keeps the geometry whole) and with
    /// [`ClipError::InconsistentFragment`] when round-off leaves a fragment
    /// on both sides.
    fn cut(&self, plane: &Plane3D, epsilon: f32) -> Result<TriangleSplit, ClipError>;
}

impl Cuttable for Triangle {
    fn cut(&self, plane: &Plane3D, epsilon: f32) -> Result<TriangleSplit, ClipError> {
        split_triangle(self, plane, epsilon)
    }
}

/// Splits a triangle into a fan of fragments.
///
/// Walks the three directed edges, inserting the intersection point after
/// the start vertex of every edge whose endpoints lie strictly on opposite
/// sides. The resulting ring (4 or 5 vertices) is fanned from the first
/// inserted point, so every fan triangle has that point as its apex and its
/// other two vertices on a single side.
fn split_triangle(
    triangle: &Triangle,
    plane: &Plane3D,
    epsilon: f32,
) -> Result<TriangleSplit, ClipError> {
    let vertices = triangle.vertices();
    let sides = vertices.map(|v| plane.classify_point_with_epsilon(v, epsilon));

    let mut ring = Vec::with_capacity(5);
    let mut first_cut = None;

    for i in 0..3 {
        let j = (i + 1) % 3;
        ring.push(vertices[i]);

        let crosses = matches!(
            (sides[i], sides[j]),
            (PlaneSide::Front, PlaneSide::Back) | (PlaneSide::Back, PlaneSide::Front)
        );
        if !crosses {
            continue;
        }

        if let Some((_, point)) = plane.intersect_segment(vertices[i], vertices[j]) {
            let duplicate = ring.iter().any(|v| (v - point).norm() <= epsilon);
            if !duplicate {
                ring.push(point);
                first_cut.get_or_insert(ring.len() - 1);
            }
        }
    }

    let Some(apex) = first_cut else {
        return Err(ClipError::NotSpanning);
    };

    let mut split = TriangleSplit::default();
    for (fragment_index, fragment) in Polygon::new(ring).fan_from(apex).enumerate() {
        if fragment.is_degenerate(epsilon) {
            continue;
        }

        match fragment.classify_with_epsilon(plane, epsilon) {
            Classification::Front => split.front.push(fragment),
            Classification::Back => split.back.push(fragment),
            Classification::Coplanar | Classification::Spanning => {
                log::debug!(
                    "fragment {fragment_index} of {triangle:?} is not on one side of {plane:?}"
                );
                return Err(ClipError::InconsistentFragment {
                    fragment: fragment_index,
                });
            }
        }
    }

    Ok(split)
}
