//! Bounding-box index used by the compositor's plane assignment.

use crate::geometry::Rect;

/// Accumulates rectangles and answers intersection queries against the set.
///
/// The expected population is the handful of draw bounds a plane receives per
/// frame, so a flat list with an early-out scan beats a spatial tree here.
#[derive(Debug, Clone, Default)]
pub struct BoundingBoxIndex {
    rects: Vec<Rect>,
}

impl BoundingBoxIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, rect: Rect) {
        self.rects.push(rect);
    }

    /// True when any inserted rectangle intersects `query`.
    pub fn intersects_any(&self, query: Rect) -> bool {
        self.rects.iter().any(|rect| rect.intersects(query))
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_index_matches_nothing() {
        let index = BoundingBoxIndex::new();
        assert!(!index.intersects_any(Rect::from_xywh(0.0, 0.0, 100.0, 100.0)));
        assert!(index.is_empty());
    }

    #[test]
    fn test_intersects_any() {
        let mut index = BoundingBoxIndex::new();
        index.insert(Rect::from_xywh(0.0, 0.0, 10.0, 10.0));
        index.insert(Rect::from_xywh(50.0, 50.0, 10.0, 10.0));

        assert!(index.intersects_any(Rect::from_xywh(5.0, 5.0, 10.0, 10.0)));
        assert!(index.intersects_any(Rect::from_xywh(55.0, 55.0, 1.0, 1.0)));
        assert!(!index.intersects_any(Rect::from_xywh(20.0, 20.0, 10.0, 10.0)));
        assert_eq!(2, index.len());
    }

    #[test]
    fn test_touching_edges_do_not_intersect() {
        let mut index = BoundingBoxIndex::new();
        index.insert(Rect::from_xywh(0.0, 0.0, 10.0, 10.0));
        assert!(!index.intersects_any(Rect::from_xywh(10.0, 0.0, 10.0, 10.0)));
    }
}
