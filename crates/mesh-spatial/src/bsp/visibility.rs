//! Visibility hooks consulted during BSP rendering.
//!
//! Before descending into a child subtree the renderer asks whether that half
//! space can be seen at all. Answering `false` skips the whole subtree, which
//! is where potentially-visible-set culling plugs in.

use super::BspNode;

/// Decides whether the half spaces of a node can be seen.
///
/// Both hooks default to `true`.
pub trait SpaceVisibility {
    /// Called before rendering `node`'s front subtree.
    fn front_space_visible(&self, _node: &BspNode) -> bool {
        true
    }

    /// Called before rendering `node`'s back subtree.
    fn back_space_visible(&self, _node: &BspNode) -> bool {
        true
    }
}

/// Everything is visible.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllSpaceVisible;

impl SpaceVisibility for AllSpaceVisible {}

/// Which child subtree a visibility query is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfSpace {
    Front,
    Back,
}

/// Visibility decided by a closure.
pub struct FnVisibility<F>
where
    F: Fn(&BspNode, HalfSpace) -> bool,
{
    func: F,
}

impl<F> FnVisibility<F>
where
    F: Fn(&BspNode, HalfSpace) -> bool,
{
    /// Creates a new visibility hook from a closure.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F> SpaceVisibility for FnVisibility<F>
where
    F: Fn(&BspNode, HalfSpace) -> bool,
{
    fn front_space_visible(&self, node: &BspNode) -> bool {
        (self.func)(node, HalfSpace::Front)
    }

    fn back_space_visible(&self, node: &BspNode) -> bool {
        (self.func)(node, HalfSpace::Back)
    }
}
