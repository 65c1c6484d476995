//! Per-corner border radius specification.

use crate::geometry::path::Path;
use crate::geometry::Rect;
use crate::scalar::Scalar;

/// Rounded-corner radii, each either absolute or a percentage of the shorter
/// rectangle side.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BorderRadius {
    top_left: Scalar,
    top_right: Scalar,
    bottom_right: Scalar,
    bottom_left: Scalar,
    top_left_is_percent: bool,
    top_right_is_percent: bool,
    bottom_right_is_percent: bool,
    bottom_left_is_percent: bool,
}

impl BorderRadius {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        top_left: Scalar,
        top_right: Scalar,
        bottom_right: Scalar,
        bottom_left: Scalar,
        top_left_is_percent: bool,
        top_right_is_percent: bool,
        bottom_right_is_percent: bool,
        bottom_left_is_percent: bool,
    ) -> Self {
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
            top_left_is_percent,
            top_right_is_percent,
            bottom_right_is_percent,
            bottom_left_is_percent,
        }
    }

    /// Same radius for all corners.
    pub fn all(corners: Scalar, is_percent: bool) -> Self {
        Self::new(
            corners, corners, corners, corners, is_percent, is_percent, is_percent, is_percent,
        )
    }

    /// 50% on all corners: a circle for square bounds, a capsule otherwise.
    pub fn circle() -> Self {
        Self::all(50.0, true)
    }

    #[inline]
    pub fn top_left(&self) -> Scalar {
        self.top_left
    }

    #[inline]
    pub fn top_right(&self) -> Scalar {
        self.top_right
    }

    #[inline]
    pub fn bottom_right(&self) -> Scalar {
        self.bottom_right
    }

    #[inline]
    pub fn bottom_left(&self) -> Scalar {
        self.bottom_left
    }

    /// Empty when every corner radius is zero.
    pub fn is_empty(&self) -> bool {
        self.top_left == 0.0
            && self.top_right == 0.0
            && self.bottom_right == 0.0
            && self.bottom_left == 0.0
    }

    /// The reference side length for percent-based corners.
    #[inline]
    pub fn side_length_for_percentages(bounds: Rect) -> Scalar {
        bounds.width().min(bounds.height())
    }

    /// Per-corner (x, y) radii resolved against `bounds`, ordered top-left,
    /// top-right, bottom-right, bottom-left.
    pub fn resolve(&self, bounds: Rect) -> [Scalar; 8] {
        let side = Self::side_length_for_percentages(bounds);
        let resolve_one = |value: Scalar, is_percent: bool| {
            if is_percent {
                side * value / 100.0
            } else {
                value
            }
        };

        let top_left = resolve_one(self.top_left, self.top_left_is_percent);
        let top_right = resolve_one(self.top_right, self.top_right_is_percent);
        let bottom_right = resolve_one(self.bottom_right, self.bottom_right_is_percent);
        let bottom_left = resolve_one(self.bottom_left, self.bottom_left_is_percent);

        [
            top_left,
            top_left,
            top_right,
            top_right,
            bottom_right,
            bottom_right,
            bottom_left,
            bottom_left,
        ]
    }

    /// Appends the rounded-rect contour for `bounds` to `path`. A rectangle
    /// contour is appended when the radius is empty.
    pub fn apply_to_path(&self, bounds: Rect, path: &mut Path) {
        if self.is_empty() {
            path.add_rect(bounds, true);
        } else {
            path.add_round_rect(bounds, self.resolve(bounds), true);
        }
    }

    /// Builds the rounded-rect path for `bounds`.
    pub fn get_path(&self, bounds: Rect) -> Path {
        let mut path = Path::new();
        self.apply_to_path(bounds, &mut path);
        path
    }
}

impl std::fmt::Display for BorderRadius {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let corner = |value: Scalar, is_percent: bool| {
            if is_percent {
                format!("{value}%")
            } else {
                value.to_string()
            }
        };
        write!(
            f,
            "[{}, {}, {}, {}]",
            corner(self.top_left, self.top_left_is_percent),
            corner(self.top_right, self.top_right_is_percent),
            corner(self.bottom_right, self.bottom_right_is_percent),
            corner(self.bottom_left, self.bottom_left_is_percent),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        assert!(BorderRadius::default().is_empty());
        assert!(!BorderRadius::all(4.0, false).is_empty());
        assert!(!BorderRadius::circle().is_empty());
    }

    #[test]
    fn test_percent_resolution_uses_shorter_side() {
        let radius = BorderRadius::circle();
        let resolved = radius.resolve(Rect::from_xywh(0.0, 0.0, 100.0, 60.0));
        assert_eq!(30.0, resolved[0]);
        assert_eq!(30.0, resolved[7]);
    }

    #[test]
    fn test_absolute_resolution() {
        let radius = BorderRadius::new(1.0, 2.0, 3.0, 4.0, false, false, false, false);
        let resolved = radius.resolve(Rect::from_xywh(0.0, 0.0, 100.0, 100.0));
        assert_eq!([1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 4.0], resolved);
    }

    #[test]
    fn test_empty_radius_builds_rect_path() {
        let bounds = Rect::from_xywh(0.0, 0.0, 20.0, 10.0);
        let path = BorderRadius::default().get_path(bounds);

        let mut expected = Path::new();
        expected.add_rect(bounds, true);
        assert_eq!(expected, path);
    }

    #[test]
    fn test_circle_path_bounds() {
        let bounds = Rect::from_xywh(0.0, 0.0, 100.0, 100.0);
        let path = BorderRadius::circle().get_path(bounds);
        assert_eq!(Some(bounds), path.bounds());
    }

    #[test]
    fn test_display() {
        let radius = BorderRadius::new(50.0, 50.0, 2.0, 2.0, true, true, false, false);
        assert_eq!("[50%, 50%, 2, 2]", radius.to_string());
    }
}
