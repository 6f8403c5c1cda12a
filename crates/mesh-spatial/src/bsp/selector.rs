//! Partition selection strategies for BSP tree construction.
//!
//! The choice of partitioning triangle affects tree balance and the number
//! of triangle splits during construction.

use crate::{IndexTriangle, Vertex};

/// Strategy for selecting which triangle's plane partitions a node.
///
/// Whatever the choice, every other triangle is still classified against the
/// chosen plane as front, back, coplanar or spanning.
pub trait PartitionSelector {
    /// Returns the position in `triangles` of the partitioning triangle.
    ///
    /// `triangles` is never empty. `vertices` resolves their indices. A
    /// missing or out-of-range choice falls back to the first triangle.
    fn select(&self, triangles: &[IndexTriangle], vertices: &[Vertex]) -> Option<usize>;
}

/// Selects the first remaining triangle.
///
/// This is a placeholder heuristic: it does nothing to balance the tree or
/// reduce splits, and depends entirely on input order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstTriangle;

impl PartitionSelector for FirstTriangle {
    fn select(&self, triangles: &[IndexTriangle], _vertices: &[Vertex]) -> Option<usize> {
        (!triangles.is_empty()).then_some(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_triangle_empty() {
        assert_eq!(FirstTriangle.select(&[], &[]), None);
    }

    #[test]
    fn first_triangle_selects_first() {
        let triangles = [IndexTriangle::new(0, 1, 2), IndexTriangle::new(2, 1, 3)];
        assert_eq!(FirstTriangle.select(&triangles, &[]), Some(0));
    }
}
