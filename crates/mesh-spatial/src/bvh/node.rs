//! Bounding volume tree nodes.

use nalgebra::Point3;

use crate::{AxisAlignedBox, BoxTreeError, Cuttable, LineSegment, Plane3D, Triangle};

/// A node of the bounding volume tree.
///
/// The shape of the tree (depth and box subdivision) is fixed when the nodes
/// are generated; afterwards only leaf triangle lists change.
#[derive(Debug, Clone)]
pub enum BoxNode {
    Branch(BranchNode),
    Leaf(LeafNode),
}

/// Interior node: two children split by a plane through the center of its box.
#[derive(Debug, Clone)]
pub struct BranchNode {
    bounds: AxisAlignedBox,
    /// Normal points into the front child's half.
    plane: Plane3D,
    front: Box<BoxNode>,
    back: Box<BoxNode>,
}

/// Terminal node holding triangles that fit inside its box.
#[derive(Debug, Clone)]
pub struct LeafNode {
    bounds: AxisAlignedBox,
    triangles: Vec<Triangle>,
}

/// Closest triangle hit along a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentHit<'a> {
    pub triangle: &'a Triangle,
    pub point: Point3<f32>,
    /// Segment parameter of `point` (0.0 = start, 1.0 = end).
    pub parameter: f32,
}

/// Triangle closest to a query point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestTriangle<'a> {
    pub triangle: &'a Triangle,
    pub distance: f32,
}

impl BranchNode {
    #[inline]
    pub fn bounds(&self) -> &AxisAlignedBox {
        &self.bounds
    }

    #[inline]
    pub fn plane(&self) -> &Plane3D {
        &self.plane
    }

    /// Child covering the half the plane normal points into.
    #[inline]
    pub fn front(&self) -> &BoxNode {
        &self.front
    }

    #[inline]
    pub fn back(&self) -> &BoxNode {
        &self.back
    }
}

impl LeafNode {
    #[inline]
    pub fn bounds(&self) -> &AxisAlignedBox {
        &self.bounds
    }

    #[inline]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }
}

impl BoxNode {
    /// Builds a complete tree of `depth` levels over `bounds`.
    ///
    /// `depth` 1 is a single leaf; each further level halves the box along
    /// its longest axis.
    pub(crate) fn generate(bounds: AxisAlignedBox, depth: usize) -> BoxNode {
        if depth <= 1 {
            return BoxNode::Leaf(LeafNode {
                bounds,
                triangles: Vec::new(),
            });
        }

        let (lower, upper, plane) = bounds.split_in_two(None);
        BoxNode::Branch(BranchNode {
            bounds,
            plane,
            back: Box::new(BoxNode::generate(lower, depth - 1)),
            front: Box::new(BoxNode::generate(upper, depth - 1)),
        })
    }

    pub fn bounds(&self) -> &AxisAlignedBox {
        match self {
            BoxNode::Branch(branch) => &branch.bounds,
            BoxNode::Leaf(leaf) => &leaf.bounds,
        }
    }

    /// Inserts a triangle, or fails with [`BoxTreeError::NotContained`] if
    /// this node's box cannot hold it.
    ///
    /// A branch hands the triangle to the first of its back and front
    /// children whose box holds it whole. If neither does, the triangle is
    /// cut by the branch plane and the fragments go to their sides. Errors
    /// from deeper levels are returned as is.
    pub(crate) fn insert(
        &mut self,
        triangle: &Triangle,
        epsilon: f32,
    ) -> Result<(), BoxTreeError> {
        match self {
            BoxNode::Leaf(leaf) => {
                if !leaf.bounds.contains_triangle_with_epsilon(triangle, epsilon) {
                    return Err(BoxTreeError::NotContained);
                }
                leaf.triangles.push(triangle.clone());
                Ok(())
            }
            BoxNode::Branch(branch) => {
                if !branch.bounds.contains_triangle_with_epsilon(triangle, epsilon) {
                    return Err(BoxTreeError::NotContained);
                }

                for child in [&mut branch.back, &mut branch.front] {
                    if child.bounds().contains_triangle_with_epsilon(triangle, epsilon) {
                        return child.insert(triangle, epsilon);
                    }
                }

                let split = triangle.cut(&branch.plane, epsilon)?;
                log::trace!(
                    "split triangle across {:?}: {} front, {} back",
                    branch.plane,
                    split.front.len(),
                    split.back.len()
                );

                for fragment in &split.back {
                    branch.back.insert(fragment, epsilon)?;
                }
                for fragment in &split.front {
                    branch.front.insert(fragment, epsilon)?;
                }
                Ok(())
            }
        }
    }

    /// Updates `best` with the smallest-parameter hit in this subtree.
    ///
    /// Subtrees whose box the segment misses are skipped.
    pub(crate) fn find_intersection<'a>(
        &'a self,
        segment: &LineSegment,
        epsilon: f32,
        best: &mut Option<SegmentHit<'a>>,
    ) {
        if !self.bounds().intersects_segment(segment, epsilon) {
            return;
        }

        match self {
            BoxNode::Branch(branch) => {
                branch.back.find_intersection(segment, epsilon, best);
                branch.front.find_intersection(segment, epsilon, best);
            }
            BoxNode::Leaf(leaf) => {
                for triangle in &leaf.triangles {
                    let Some((parameter, point)) = triangle.intersect_segment(segment, epsilon)
                    else {
                        continue;
                    };
                    if best.is_none_or(|hit| parameter < hit.parameter) {
                        *best = Some(SegmentHit {
                            triangle,
                            point,
                            parameter,
                        });
                    }
                }
            }
        }
    }

    /// Updates `best` with the closest triangle within `max_distance`.
    ///
    /// Only subtrees whose box contains `point` are searched, so a triangle
    /// just across a box boundary from the point is never considered.
    pub(crate) fn find_nearest<'a>(
        &'a self,
        point: Point3<f32>,
        max_distance: f32,
        epsilon: f32,
        best: &mut Option<NearestTriangle<'a>>,
    ) {
        if !self.bounds().contains_point_with_epsilon(point, epsilon) {
            return;
        }

        match self {
            BoxNode::Branch(branch) => {
                branch.back.find_nearest(point, max_distance, epsilon, best);
                branch.front.find_nearest(point, max_distance, epsilon, best);
            }
            BoxNode::Leaf(leaf) => {
                for triangle in &leaf.triangles {
                    let distance = triangle.distance_to_point_with_epsilon(point, epsilon);
                    if distance > max_distance {
                        continue;
                    }
                    if best.is_none_or(|nearest| distance < nearest.distance) {
                        *best = Some(NearestTriangle { triangle, distance });
                    }
                }
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            BoxNode::Branch(branch) => branch.back.leaf_count() + branch.front.leaf_count(),
            BoxNode::Leaf(_) => 1,
        }
    }

    /// Number of stored triangles, counting duplicated fragments once per leaf.
    pub fn triangle_count(&self) -> usize {
        match self {
            BoxNode::Branch(branch) => {
                branch.back.triangle_count() + branch.front.triangle_count()
            }
            BoxNode::Leaf(leaf) => leaf.triangles.len(),
        }
    }

    /// Returns the depth of this subtree (1 for a leaf node).
    pub fn depth(&self) -> usize {
        match self {
            BoxNode::Branch(branch) => 1 + branch.back.depth().max(branch.front.depth()),
            BoxNode::Leaf(_) => 1,
        }
    }

    /// Collects leaves back-first, depth-first.
    pub(crate) fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a LeafNode>) {
        match self {
            BoxNode::Branch(branch) => {
                branch.back.collect_leaves(out);
                branch.front.collect_leaves(out);
            }
            BoxNode::Leaf(leaf) => out.push(leaf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PLANE_EPSILON;
    use nalgebra::Vector3;

    fn unit_cube() -> AxisAlignedBox {
        AxisAlignedBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
    }

    fn make_triangle(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> Triangle {
        Triangle::new(
            Point3::new(a[0], a[1], a[2]),
            Point3::new(b[0], b[1], b[2]),
            Point3::new(c[0], c[1], c[2]),
        )
    }

    #[test]
    fn depth_one_is_a_leaf() {
        let node = BoxNode::generate(unit_cube(), 1);
        assert!(matches!(node, BoxNode::Leaf(_)));
        assert_eq!(node.leaf_count(), 1);
        assert_eq!(node.depth(), 1);
    }

    #[test]
    fn generate_halves_longest_axis_first() {
        let node = BoxNode::generate(unit_cube(), 3);
        assert_eq!(node.leaf_count(), 4);
        assert_eq!(node.depth(), 3);

        let BoxNode::Branch(root) = &node else {
            panic!("expected a branch");
        };
        assert_eq!(root.plane().normal(), Vector3::x());
        assert_eq!(root.back().bounds().max().x, 0.5);
        assert_eq!(root.front().bounds().min().x, 0.5);

        // Halves are 0.5 × 1 × 1, so the next split is along Y.
        let BoxNode::Branch(back) = root.back() else {
            panic!("expected a branch");
        };
        assert_eq!(back.plane().normal(), Vector3::y());
    }

    #[test]
    fn straddling_triangle_is_split_between_children() {
        let mut node = BoxNode::generate(unit_cube(), 2);
        let tri = make_triangle([0.2, 0.2, 0.5], [0.8, 0.2, 0.5], [0.5, 0.8, 0.5]);
        node.insert(&tri, PLANE_EPSILON).unwrap();

        let BoxNode::Branch(root) = &node else {
            panic!("expected a branch");
        };
        assert!(root.back().triangle_count() >= 1);
        assert!(root.front().triangle_count() >= 1);

        let mut leaves = Vec::new();
        node.collect_leaves(&mut leaves);
        for leaf in leaves {
            for t in leaf.triangles() {
                assert!(leaf.bounds().contains_triangle(t));
            }
        }
    }

    #[test]
    fn contained_triangle_stays_whole() {
        let mut node = BoxNode::generate(unit_cube(), 2);
        let tri = make_triangle([0.6, 0.2, 0.5], [0.8, 0.2, 0.5], [0.7, 0.8, 0.5]);
        node.insert(&tri, PLANE_EPSILON).unwrap();
        assert_eq!(node.triangle_count(), 1);

        let BoxNode::Branch(root) = &node else {
            panic!("expected a branch");
        };
        assert_eq!(root.front().triangle_count(), 1);
    }

    #[test]
    fn outside_triangle_is_rejected() {
        let mut node = BoxNode::generate(unit_cube(), 3);
        let tri = make_triangle([0.5, 0.5, 0.5], [1.5, 0.5, 0.5], [0.5, 0.9, 0.5]);
        assert_eq!(node.insert(&tri, PLANE_EPSILON), Err(BoxTreeError::NotContained));
        assert_eq!(node.triangle_count(), 0);
    }

    fn empty_leaf(bounds: AxisAlignedBox) -> Box<BoxNode> {
        Box::new(BoxNode::Leaf(LeafNode {
            bounds,
            triangles: Vec::new(),
        }))
    }

    #[test]
    fn failure_below_a_child_is_not_retried_elsewhere() {
        // The back half's upper quarter is too short for the triangle's tip.
        let back_half = AxisAlignedBox::new(Point3::origin(), Point3::new(1.0, 2.0, 2.0));
        let back = BoxNode::Branch(BranchNode {
            bounds: back_half,
            plane: Plane3D::from_point_and_normal(Point3::new(0.0, 1.0, 0.0), Vector3::y())
                .unwrap(),
            back: empty_leaf(AxisAlignedBox::new(
                Point3::origin(),
                Point3::new(1.0, 1.0, 2.0),
            )),
            front: empty_leaf(AxisAlignedBox::new(
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(1.0, 1.5, 2.0),
            )),
        });
        let mut node = BoxNode::Branch(BranchNode {
            bounds: AxisAlignedBox::new(Point3::origin(), Point3::new(2.0, 2.0, 2.0)),
            plane: Plane3D::from_point_and_normal(Point3::new(1.0, 0.0, 0.0), Vector3::x())
                .unwrap(),
            back: Box::new(back),
            front: empty_leaf(AxisAlignedBox::new(
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 2.0, 2.0),
            )),
        });

        let tri = make_triangle([0.2, 0.5, 0.5], [0.8, 0.5, 0.5], [0.5, 1.8, 0.5]);
        assert_eq!(node.insert(&tri, PLANE_EPSILON), Err(BoxTreeError::NotContained));

        let BoxNode::Branch(root) = &node else {
            panic!("expected a branch");
        };
        assert_eq!(root.front().triangle_count(), 0);
    }

    #[test]
    fn nearest_uses_the_tree_tolerance() {
        let mut node = BoxNode::generate(unit_cube(), 1);
        let tri = make_triangle([0.2, 0.0, 0.0], [1.0, 0.0, 0.0], [0.2, 1.0, 0.0]);
        node.insert(&tri, PLANE_EPSILON).unwrap();
        let beside = Point3::new(0.19, 0.5, 0.1);

        let mut loose = None;
        node.find_nearest(beside, 1.0, 0.05, &mut loose);
        assert!((loose.unwrap().distance - 0.1).abs() < 1e-5);

        let mut strict = None;
        node.find_nearest(beside, 1.0, PLANE_EPSILON, &mut strict);
        assert!(strict.unwrap().distance > 0.1004);
    }
}
