//! Absolute transform/opacity/clip resolution along a context stack.

use strata_types::{BorderRadius, Matrix, Path, Rect, Scalar};

/// Resolves the absolute opacity, transform and clip path at a point in a
/// display list. Each pushed context is relative to its parent; the state
/// accumulates them into absolute values usable for plane assignment and
/// damage computation.
#[derive(Debug, Clone)]
pub struct CompositionState {
    absolute_clip_path: Path,
    absolute_matrix: Matrix,
    absolute_opacity: Scalar,
}

impl Default for CompositionState {
    fn default() -> Self {
        Self {
            absolute_clip_path: Path::new(),
            absolute_matrix: Matrix::IDENTITY,
            absolute_opacity: 1.0,
        }
    }
}

impl CompositionState {
    pub fn new(clip_path: Path, matrix: Matrix, opacity: Scalar) -> Self {
        Self {
            absolute_clip_path: clip_path,
            absolute_matrix: matrix,
            absolute_opacity: opacity,
        }
    }

    /// Derives the state for a child context.
    pub fn push_context(&self, opacity: Scalar, matrix: &Matrix) -> Self {
        let mut new_matrix = self.absolute_matrix;
        new_matrix.pre_concat(matrix);

        Self {
            absolute_clip_path: self.absolute_clip_path.clone(),
            absolute_matrix: new_matrix,
            absolute_opacity: self.absolute_opacity * opacity,
        }
    }

    pub fn clip_rect(&mut self, width: Scalar, height: Scalar) {
        let mut clip_path = Path::new();
        clip_path.add_rect(Rect::from_ltrb(0.0, 0.0, width, height), true);
        self.update_clip(clip_path);
    }

    pub fn clip_round(&mut self, border_radius: &BorderRadius, width: Scalar, height: Scalar) {
        let clip_path = border_radius.get_path(Rect::from_ltrb(0.0, 0.0, width, height));
        self.update_clip(clip_path);
    }

    fn update_clip(&mut self, mut path: Path) {
        path.transform(&self.absolute_matrix);

        if self.absolute_clip_path.is_empty() {
            self.absolute_clip_path = path;
        } else {
            self.absolute_clip_path = self.absolute_clip_path.intersection(&path);
        }
    }

    #[inline]
    pub fn absolute_opacity(&self) -> Scalar {
        self.absolute_opacity
    }

    #[inline]
    pub fn absolute_matrix(&self) -> &Matrix {
        &self.absolute_matrix
    }

    #[inline]
    pub fn absolute_clip_path(&self) -> &Path {
        &self.absolute_clip_path
    }

    /// Maps a context-local rect to absolute coordinates.
    pub fn absolute_rect(&self, local_rect: Rect) -> Rect {
        self.absolute_matrix.map_rect(local_rect)
    }

    /// Maps a context-local rect to absolute coordinates and intersects it
    /// with the accumulated clip bounds.
    pub fn absolute_clipped_rect(&self, local_rect: Rect) -> Rect {
        let absolute_rect = self.absolute_rect(local_rect);

        match self.absolute_clip_path.bounds() {
            Some(clip_bounds) => clip_bounds.intersection(absolute_rect),
            None => absolute_rect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_identity() {
        let state = CompositionState::default();
        assert_eq!(1.0, state.absolute_opacity());
        assert!(state.absolute_matrix().is_identity());
        assert!(state.absolute_clip_path().is_empty());
        assert_eq!(
            Rect::from_xywh(1.0, 2.0, 3.0, 4.0),
            state.absolute_rect(Rect::from_xywh(1.0, 2.0, 3.0, 4.0))
        );
    }

    #[test]
    fn test_push_context_accumulates() {
        let state = CompositionState::default();
        let child = state.push_context(0.5, &Matrix::from_translate(10.0, 20.0));
        let grandchild = child.push_context(0.5, &Matrix::from_translate(30.0, 40.0));

        assert_eq!(0.25, grandchild.absolute_opacity());
        assert_eq!(
            Rect::from_xywh(40.0, 60.0, 5.0, 5.0),
            grandchild.absolute_rect(Rect::from_xywh(0.0, 0.0, 5.0, 5.0))
        );
    }

    #[test]
    fn test_clip_rect_is_transformed() {
        let state = CompositionState::default();
        let mut child = state.push_context(1.0, &Matrix::from_translate(10.0, 20.0));
        child.clip_rect(50.0, 25.0);

        let clip_bounds = child.absolute_clip_path().bounds().unwrap();
        assert_eq!(Rect::from_xywh(10.0, 20.0, 50.0, 25.0), clip_bounds);
    }

    #[test]
    fn test_clips_accumulate_by_intersection() {
        let mut state = CompositionState::default();
        state.clip_rect(100.0, 100.0);

        let mut child = state.push_context(1.0, &Matrix::from_translate(80.0, 80.0));
        child.clip_rect(50.0, 50.0);

        let clip_bounds = child.absolute_clip_path().bounds().unwrap();
        assert_eq!(Rect::from_xywh(80.0, 80.0, 20.0, 20.0), clip_bounds);
    }

    #[test]
    fn test_absolute_clipped_rect() {
        let mut state = CompositionState::default();
        state.clip_rect(50.0, 50.0);

        assert_eq!(
            Rect::from_xywh(25.0, 25.0, 25.0, 25.0),
            state.absolute_clipped_rect(Rect::from_xywh(25.0, 25.0, 100.0, 100.0))
        );
    }
}
