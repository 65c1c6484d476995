//! 3×3 affine transform matrix.

use crate::geometry::{Point, Rect};
use crate::scalar::Scalar;

// Component indexes, matching the conventional row-major 3x3 layout.
const SCALE_X: usize = 0;
const SKEW_X: usize = 1;
const TRANS_X: usize = 2;
const SKEW_Y: usize = 3;
const SCALE_Y: usize = 4;
const TRANS_Y: usize = 5;
const PERSP_0: usize = 6;
const PERSP_1: usize = 7;
const PERSP_2: usize = 8;

/// A 3×3 row-major matrix restricted to affine transforms.
///
/// Points map as column vectors: `p' = M · p`. The bottom row is always
/// `[0, 0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    values: [Scalar; 9],
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Self = Self {
        values: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
    };

    #[inline]
    pub fn new() -> Self {
        Self::IDENTITY
    }

    pub fn from_translate(tx: Scalar, ty: Scalar) -> Self {
        let mut matrix = Self::IDENTITY;
        matrix.values[TRANS_X] = tx;
        matrix.values[TRANS_Y] = ty;
        matrix
    }

    pub fn from_scale(sx: Scalar, sy: Scalar) -> Self {
        let mut matrix = Self::IDENTITY;
        matrix.values[SCALE_X] = sx;
        matrix.values[SCALE_Y] = sy;
        matrix
    }

    pub fn from_scale_translate(sx: Scalar, sy: Scalar, tx: Scalar, ty: Scalar) -> Self {
        let mut matrix = Self::from_scale(sx, sy);
        matrix.values[TRANS_X] = tx;
        matrix.values[TRANS_Y] = ty;
        matrix
    }

    #[inline]
    pub fn set_identity(&mut self) {
        *self = Self::IDENTITY;
    }

    #[inline]
    pub fn get(&self, index: usize) -> Scalar {
        self.values[index]
    }

    #[inline]
    pub fn translate_x(&self) -> Scalar {
        self.values[TRANS_X]
    }

    #[inline]
    pub fn set_translate_x(&mut self, tx: Scalar) {
        self.values[TRANS_X] = tx;
    }

    #[inline]
    pub fn translate_y(&self) -> Scalar {
        self.values[TRANS_Y]
    }

    #[inline]
    pub fn set_translate_y(&mut self, ty: Scalar) {
        self.values[TRANS_Y] = ty;
    }

    #[inline]
    pub fn scale_x(&self) -> Scalar {
        self.values[SCALE_X]
    }

    #[inline]
    pub fn set_scale_x(&mut self, sx: Scalar) {
        self.values[SCALE_X] = sx;
    }

    #[inline]
    pub fn scale_y(&self) -> Scalar {
        self.values[SCALE_Y]
    }

    #[inline]
    pub fn set_scale_y(&mut self, sy: Scalar) {
        self.values[SCALE_Y] = sy;
    }

    #[inline]
    pub fn skew_x(&self) -> Scalar {
        self.values[SKEW_X]
    }

    #[inline]
    pub fn set_skew_x(&mut self, kx: Scalar) {
        self.values[SKEW_X] = kx;
    }

    #[inline]
    pub fn skew_y(&self) -> Scalar {
        self.values[SKEW_Y]
    }

    #[inline]
    pub fn set_skew_y(&mut self, ky: Scalar) {
        self.values[SKEW_Y] = ky;
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// True when the matrix only translates (or is the identity).
    ///
    /// Governs whether an external surface placement can collapse into a
    /// frame origin instead of carrying a full transform.
    pub fn is_identity_or_translate(&self) -> bool {
        self.values[SCALE_X] == 1.0
            && self.values[SKEW_X] == 0.0
            && self.values[SKEW_Y] == 0.0
            && self.values[SCALE_Y] == 1.0
            && self.values[PERSP_0] == 0.0
            && self.values[PERSP_1] == 0.0
            && self.values[PERSP_2] == 1.0
    }

    fn concat(a: &Matrix, b: &Matrix) -> Matrix {
        let ma = &a.values;
        let mb = &b.values;

        Matrix {
            values: [
                ma[0] * mb[0] + ma[1] * mb[3],
                ma[0] * mb[1] + ma[1] * mb[4],
                ma[0] * mb[2] + ma[1] * mb[5] + ma[2],
                ma[3] * mb[0] + ma[4] * mb[3],
                ma[3] * mb[1] + ma[4] * mb[4],
                ma[3] * mb[2] + ma[4] * mb[5] + ma[5],
                0.0,
                0.0,
                1.0,
            ],
        }
    }

    /// `self = self · other`: `other` applies first.
    pub fn pre_concat(&mut self, other: &Matrix) {
        *self = Self::concat(self, other);
    }

    /// `self = other · self`: `other` applies last.
    pub fn post_concat(&mut self, other: &Matrix) {
        *self = Self::concat(other, self);
    }

    pub fn pre_scale(&mut self, sx: Scalar, sy: Scalar) {
        self.pre_concat(&Self::from_scale(sx, sy));
    }

    pub fn post_scale(&mut self, sx: Scalar, sy: Scalar) {
        self.post_concat(&Self::from_scale(sx, sy));
    }

    /// Post-composes a rotation of `radians` about the pivot `(px, py)`.
    ///
    /// Sine/cosine values within float noise of 0 and ±1 are snapped so
    /// quarter-turn rotations stay exact.
    pub fn post_rotate(&mut self, radians: Scalar, px: Scalar, py: Scalar) {
        let (sin, cos) = radians.sin_cos();
        let sin = snap_trig(sin);
        let cos = snap_trig(cos);

        let rotation = Matrix {
            values: [
                cos,
                -sin,
                px - cos * px + sin * py,
                sin,
                cos,
                py - sin * px - cos * py,
                0.0,
                0.0,
                1.0,
            ],
        };

        self.post_concat(&rotation);
    }

    pub fn post_rotate_degrees(&mut self, degrees: Scalar, px: Scalar, py: Scalar) {
        self.post_rotate(degrees.to_radians(), px, py);
    }

    #[inline]
    pub fn map_point(&self, point: Point) -> Point {
        let m = &self.values;
        Point::new(
            m[0] * point.x + m[1] * point.y + m[2],
            m[3] * point.x + m[4] * point.y + m[5],
        )
    }

    /// Maps the four corners of `rect` and returns their bounding rect.
    pub fn map_rect(&self, rect: Rect) -> Rect {
        let corners = [
            self.map_point(Point::new(rect.left, rect.top)),
            self.map_point(Point::new(rect.right, rect.top)),
            self.map_point(Point::new(rect.right, rect.bottom)),
            self.map_point(Point::new(rect.left, rect.bottom)),
        ];

        let mut left = corners[0].x;
        let mut top = corners[0].y;
        let mut right = corners[0].x;
        let mut bottom = corners[0].y;

        for corner in &corners[1..] {
            left = left.min(corner.x);
            top = top.min(corner.y);
            right = right.max(corner.x);
            bottom = bottom.max(corner.y);
        }

        Rect::from_ltrb(left, top, right, bottom)
    }

    /// The inverse transform, or `None` when the matrix is degenerate.
    pub fn invert(&self) -> Option<Matrix> {
        let m = &self.values;
        let det = m[0] * m[4] - m[1] * m[3];

        if det == 0.0 || !det.is_finite() {
            return None;
        }

        let inv_det = 1.0 / det;
        Some(Matrix {
            values: [
                m[4] * inv_det,
                -m[1] * inv_det,
                (m[1] * m[5] - m[2] * m[4]) * inv_det,
                -m[3] * inv_det,
                m[0] * inv_det,
                (m[2] * m[3] - m[0] * m[5]) * inv_det,
                0.0,
                0.0,
                1.0,
            ],
        })
    }

    /// All nine components, row-major.
    pub fn to_array(&self) -> [Scalar; 9] {
        self.values
    }
}

fn snap_trig(value: Scalar) -> Scalar {
    const TOLERANCE: Scalar = 1e-6;
    if value.abs() < TOLERANCE {
        0.0
    } else if (value.abs() - 1.0).abs() < TOLERANCE {
        value.signum()
    } else {
        value
    }
}

impl std::fmt::Display for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let m = &self.values;
        write!(
            f,
            "[{}, {}, {}, {}, {}, {}, {}, {}, {}]",
            m[0], m[1], m[2], m[3], m[4], m[5], m[6], m[7], m[8]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_rect_near(expected: Rect, actual: Rect) {
        let eps = 1e-4;
        assert!(
            (expected.left - actual.left).abs() < eps
                && (expected.top - actual.top).abs() < eps
                && (expected.right - actual.right).abs() < eps
                && (expected.bottom - actual.bottom).abs() < eps,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn test_identity() {
        let matrix = Matrix::new();
        assert!(matrix.is_identity());
        assert!(matrix.is_identity_or_translate());
        assert_eq!(Point::new(3.0, 4.0), matrix.map_point(Point::new(3.0, 4.0)));
    }

    #[test]
    fn test_translate_only() {
        let matrix = Matrix::from_translate(10.0, 20.0);
        assert!(!matrix.is_identity());
        assert!(matrix.is_identity_or_translate());
        assert_eq!(Point::new(11.0, 22.0), matrix.map_point(Point::new(1.0, 2.0)));
    }

    #[test]
    fn test_scale_is_not_translate() {
        let matrix = Matrix::from_scale(2.0, 2.0);
        assert!(!matrix.is_identity_or_translate());
    }

    #[test]
    fn test_pre_concat_applies_other_first() {
        let mut matrix = Matrix::from_translate(10.0, 0.0);
        matrix.pre_concat(&Matrix::from_scale(2.0, 2.0));

        // Scale happens in the child space, then translate.
        assert_eq!(Point::new(12.0, 2.0), matrix.map_point(Point::new(1.0, 1.0)));
    }

    #[test]
    fn test_post_concat_applies_other_last() {
        let mut matrix = Matrix::from_translate(10.0, 0.0);
        matrix.post_concat(&Matrix::from_scale(2.0, 2.0));

        assert_eq!(Point::new(22.0, 2.0), matrix.map_point(Point::new(1.0, 1.0)));
    }

    #[test]
    fn test_post_rotate_about_pivot() {
        let mut matrix = Matrix::new();
        matrix.post_rotate_degrees(90.0, 25.0, 25.0);

        let mapped = matrix.map_point(Point::new(25.0, 0.0));
        assert!((mapped.x - 50.0).abs() < 1e-4);
        assert!((mapped.y - 25.0).abs() < 1e-4);
    }

    #[test]
    fn test_quarter_turns_are_exact() {
        let mut matrix = Matrix::new();
        matrix.post_rotate_degrees(90.0, 0.0, 0.0);

        assert_eq!(0.0, matrix.scale_x());
        assert_eq!(-1.0, matrix.skew_x());
        assert_eq!(1.0, matrix.skew_y());
        assert_eq!(0.0, matrix.scale_y());
    }

    #[test]
    fn test_map_rect_with_rotation() {
        let mut matrix = Matrix::new();
        matrix.post_rotate_degrees(90.0, 25.0, 25.0);

        // A square centered on the pivot maps onto itself.
        assert_rect_near(
            Rect::from_xywh(0.0, 0.0, 50.0, 50.0),
            matrix.map_rect(Rect::from_xywh(0.0, 0.0, 50.0, 50.0)),
        );
    }

    #[test]
    fn test_map_rect_scale_translate() {
        let matrix = Matrix::from_scale_translate(2.0, 4.0, 10.0, 20.0);
        assert_eq!(
            Rect::from_xywh(10.0, 20.0, 100.0, 200.0),
            matrix.map_rect(Rect::from_xywh(0.0, 0.0, 50.0, 50.0))
        );
    }

    #[test]
    fn test_invert_round_trips() {
        let mut matrix = Matrix::from_scale_translate(2.0, 3.0, 5.0, 7.0);
        matrix.post_rotate_degrees(30.0, 1.0, 2.0);

        let inverse = matrix.invert().unwrap();
        let point = Point::new(13.0, -4.0);
        let round_tripped = inverse.map_point(matrix.map_point(point));

        assert!((round_tripped.x - point.x).abs() < 1e-3);
        assert!((round_tripped.y - point.y).abs() < 1e-3);
    }

    #[test]
    fn test_invert_degenerate() {
        assert!(Matrix::from_scale(0.0, 1.0).invert().is_none());
    }

    #[test]
    fn test_display_format() {
        assert_eq!("[1, 0, 0, 0, 1, 0, 0, 0, 1]", Matrix::IDENTITY.to_string());
    }
}
