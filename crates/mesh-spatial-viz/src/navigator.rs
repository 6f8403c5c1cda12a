//! BSP tree navigation utilities for interactive visualization.

use macroquad::prelude::*;
use mesh_spatial::bsp::{BspNode, FnVisibility, HalfSpace, SpaceVisibility};
use mesh_spatial::{BspTree, DrawMode, Renderer, Vertex, VertexFlags};
use nalgebra::Vector3;

/// Interactive BSP tree navigator for exploring tree structure.
///
/// The path from the root to the selected node is a list of half spaces.
/// With isolation on, every half space branching off that path is culled
/// so only the selected subtree and the nodes above it are drawn.
#[derive(Debug, Default)]
pub struct TreeNavigator {
    path: Vec<HalfSpace>,
    isolate: bool,
}

impl TreeNavigator {
    /// Creates a new navigator starting at the root.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current navigation path.
    pub fn path(&self) -> &[HalfSpace] {
        &self.path
    }

    pub fn is_isolating(&self) -> bool {
        self.isolate
    }

    /// Attempts to descend into `side`. Returns true if that child exists.
    pub fn descend(&mut self, tree: &BspTree, side: HalfSpace) -> bool {
        let child = self.current_node(tree).and_then(|node| match side {
            HalfSpace::Front => node.front(),
            HalfSpace::Back => node.back(),
        });
        if child.is_some() {
            self.path.push(side);
        }
        child.is_some()
    }

    /// Navigates to the parent node. Returns true if not already at root.
    pub fn go_parent(&mut self) -> bool {
        self.path.pop().is_some()
    }

    pub fn go_root(&mut self) {
        self.path.clear();
    }

    /// Handles keyboard input. Returns true if the selection changed.
    pub fn update(&mut self, tree: &BspTree) -> bool {
        let mut changed = false;

        if is_key_pressed(KeyCode::F) {
            changed |= self.descend(tree, HalfSpace::Front);
        }
        if is_key_pressed(KeyCode::B) {
            changed |= self.descend(tree, HalfSpace::Back);
        }
        if is_key_pressed(KeyCode::P) {
            changed |= self.go_parent();
        }
        if is_key_pressed(KeyCode::R) && !self.path.is_empty() {
            self.go_root();
            changed = true;
        }
        if is_key_pressed(KeyCode::I) {
            self.isolate = !self.isolate;
            changed = true;
        }

        changed
    }

    /// Returns the selected node, if the tree is non-empty and the path
    /// still exists after a rebuild.
    pub fn current_node<'a>(&self, tree: &'a BspTree) -> Option<&'a BspNode> {
        let mut current = tree.root()?;
        for side in &self.path {
            current = match side {
                HalfSpace::Front => current.front()?,
                HalfSpace::Back => current.back()?,
            };
        }
        Some(current)
    }

    /// The nodes along the path, each paired with the half space taken there.
    fn path_nodes<'a>(&self, tree: &'a BspTree) -> Vec<(&'a BspNode, HalfSpace)> {
        let mut nodes = Vec::with_capacity(self.path.len());
        let Some(mut current) = tree.root() else {
            return nodes;
        };
        for &side in &self.path {
            let next = match side {
                HalfSpace::Front => current.front(),
                HalfSpace::Back => current.back(),
            };
            let Some(next) = next else { break };
            nodes.push((current, side));
            current = next;
        }
        nodes
    }

    /// Visibility hooks for rendering `tree` with the current selection.
    pub fn visibility<'a>(&self, tree: &'a BspTree) -> impl SpaceVisibility + use<'a> {
        let culled = if self.isolate {
            self.path_nodes(tree)
        } else {
            Vec::new()
        };

        FnVisibility::new(move |node: &BspNode, space: HalfSpace| {
            culled
                .iter()
                .find(|(on_path, _)| std::ptr::eq(*on_path, node))
                .is_none_or(|&(_, taken)| taken == space)
        })
    }

    /// Outlines the triangles stored at the selected node.
    pub fn highlight<R: Renderer + ?Sized>(&self, tree: &BspTree, renderer: &mut R) {
        let Some(node) = self.current_node(tree) else {
            return;
        };

        let outline = Vector3::new(1.0, 1.0, 0.0);
        renderer.begin_draw(DrawMode::Lines);
        for triangle in node.triangles() {
            let Some(resolved) = triangle.resolve(tree.vertices()) else {
                continue;
            };
            let [a, b, c] = *resolved.vertices();
            for (start, end) in [(a, b), (b, c), (c, a)] {
                for p in [start, end] {
                    let vertex = Vertex::at(p).with_color(outline, 1.0);
                    renderer.issue_vertex(&vertex, VertexFlags::all());
                }
            }
        }
        renderer.end_draw();
    }

    /// Draws the navigation UI overlay.
    pub fn draw_ui(&self, tree: &BspTree, y_offset: f32) {
        let node = self.current_node(tree);
        let subtree_triangles = node.map_or(0, BspNode::triangle_count);
        let has_front = node.is_some_and(|n| n.front().is_some());
        let has_back = node.is_some_and(|n| n.back().is_some());
        let is_leaf = node.is_none_or(BspNode::is_leaf);

        let path_str = if self.path.is_empty() {
            "root".to_string()
        } else {
            self.path
                .iter()
                .map(|side| match side {
                    HalfSpace::Front => "F",
                    HalfSpace::Back => "B",
                })
                .collect::<Vec<_>>()
                .join(" -> ")
        };

        draw_text(
            &format!(
                "Subtree: {} triangles, {} at node",
                subtree_triangles,
                node.map_or(0, |n| n.triangles().len())
            ),
            10.0,
            y_offset,
            18.0,
            WHITE,
        );
        draw_text(
            &format!("Path: {} (depth {})", path_str, self.path.len()),
            10.0,
            y_offset + 20.0,
            18.0,
            YELLOW,
        );
        draw_text(
            &format!(
                "Children: {}{}{}",
                if has_front { "[F]ront " } else { "" },
                if has_back { "[B]ack " } else { "" },
                if is_leaf { "(leaf)" } else { "" }
            ),
            10.0,
            y_offset + 40.0,
            18.0,
            if is_leaf { ORANGE } else { GREEN },
        );
        draw_text(
            &format!(
                "[P]arent | [R]oot | [I]solate: {}",
                if self.isolate { "on" } else { "off" }
            ),
            10.0,
            y_offset + 60.0,
            16.0,
            DARKGRAY,
        );
    }
}
