//! Geometry primitives: points, vectors, sizes, rectangles.

pub mod border_radius;
pub mod contour;
pub mod matrix;
pub mod path;

use crate::scalar::Scalar;

/// A direction or offset in 2D space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector {
    pub dx: Scalar,
    pub dy: Scalar,
}

impl Vector {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    #[inline]
    pub const fn new(dx: Scalar, dy: Scalar) -> Self {
        Self { dx, dy }
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: Scalar,
    pub height: Scalar,
}

impl Size {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    #[inline]
    pub const fn new(width: Scalar, height: Scalar) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// A position in 2D space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: Scalar,
    pub y: Scalar,
}

impl Point {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    #[inline]
    pub const fn new(x: Scalar, y: Scalar) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn offset(self, dx: Scalar, dy: Scalar) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Euclidean distance of the vector `(dx, dy)` from the origin.
    #[inline]
    pub fn length(dx: Scalar, dy: Scalar) -> Scalar {
        (dx * dx + dy * dy).sqrt()
    }

    #[inline]
    pub fn distance(a: Point, b: Point) -> Scalar {
        Self::length(a.x - b.x, a.y - b.y)
    }
}

/// How [`Rect::make_fitting_size`] scales and positions a size inside a rect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FittingMode {
    /// Stretch to cover the whole rect.
    #[default]
    Fill,
    /// Keep the size as-is, centered.
    Center,
    /// Scale preserving aspect ratio until the rect is fully covered, centered.
    CenterScaleFill,
    /// Scale preserving aspect ratio until the size fully fits, centered.
    CenterScaleFit,
}

/// An axis-aligned rectangle stored as left/top/right/bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: Scalar,
    pub top: Scalar,
    pub right: Scalar,
    pub bottom: Scalar,
}

impl Rect {
    pub const EMPTY: Self = Self::from_ltrb(0.0, 0.0, 0.0, 0.0);

    #[inline]
    pub const fn from_ltrb(left: Scalar, top: Scalar, right: Scalar, bottom: Scalar) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    #[inline]
    pub const fn from_xywh(x: Scalar, y: Scalar, w: Scalar, h: Scalar) -> Self {
        Self::from_ltrb(x, y, x + w, y + h)
    }

    #[inline]
    pub fn from_size(size: Size) -> Self {
        Self::from_xywh(0.0, 0.0, size.width, size.height)
    }

    #[inline]
    pub fn x(self) -> Scalar {
        self.left
    }

    #[inline]
    pub fn y(self) -> Scalar {
        self.top
    }

    #[inline]
    pub fn width(self) -> Scalar {
        self.right - self.left
    }

    #[inline]
    pub fn height(self) -> Scalar {
        self.bottom - self.top
    }

    #[inline]
    pub fn size(self) -> Size {
        Size::new(self.width(), self.height())
    }

    #[inline]
    pub fn center(self) -> Point {
        Point::new(
            self.left + self.width() / 2.0,
            self.top + self.height() / 2.0,
        )
    }

    /// A rect is empty when either extent is non-positive.
    #[inline]
    pub fn is_empty(self) -> bool {
        !(self.left < self.right && self.top < self.bottom)
    }

    #[inline]
    pub fn with_offset(self, dx: Scalar, dy: Scalar) -> Self {
        Self::from_ltrb(self.left + dx, self.top + dy, self.right + dx, self.bottom + dy)
    }

    #[inline]
    pub fn with_insets(self, horizontal: Scalar, vertical: Scalar) -> Self {
        Self::from_ltrb(
            self.left + horizontal,
            self.top + vertical,
            self.right - horizontal,
            self.bottom - vertical,
        )
    }

    /// True when the interiors overlap. Empty rects intersect nothing;
    /// rects that merely share an edge do not intersect.
    #[inline]
    pub fn intersects(self, other: Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.top < other.bottom
            && other.top < self.bottom
    }

    /// The overlapping region, or an empty rect when the rects are disjoint.
    pub fn intersection(self, other: Rect) -> Rect {
        let x = self.left.max(other.left);
        let y = self.top.max(other.top);
        let width = self.right.min(other.right) - x;
        let height = self.bottom.min(other.bottom) - y;

        if width < 0.0 || height < 0.0 {
            return Rect::EMPTY;
        }

        Rect::from_xywh(x, y, width, height)
    }

    /// Expands this rect to enclose `other`. Empty inputs are ignored; when
    /// `self` is empty it becomes `other`.
    pub fn join(&mut self, other: Rect) {
        if other.is_empty() {
            return;
        }

        if self.is_empty() {
            *self = other;
        } else {
            self.left = self.left.min(other.left);
            self.top = self.top.min(other.top);
            self.right = self.right.max(other.right);
            self.bottom = self.bottom.max(other.bottom);
        }
    }

    /// Edge-inclusive point containment.
    #[inline]
    pub fn contains(self, point: Point) -> bool {
        !(point.x < self.left || point.x > self.right || point.y < self.top || point.y > self.bottom)
    }

    /// The closest point to `to_point` within the rectangle bounds.
    #[inline]
    pub fn closest_point(self, to_point: Point) -> Point {
        Point::new(
            to_point.x.clamp(self.left, self.right),
            to_point.y.clamp(self.top, self.bottom),
        )
    }

    /// Returns a rect scaling and positioning `size` inside this rect using
    /// the given fitting mode.
    pub fn make_fitting_size(self, size: Size, mode: FittingMode) -> Rect {
        let self_width = self.width();
        let self_height = self.height();
        let half_width = self_width / 2.0;
        let half_height = self_height / 2.0;

        match mode {
            FittingMode::Fill => self,
            FittingMode::Center => Rect::from_xywh(
                self.left + half_width - size.width / 2.0,
                self.top + half_height - size.height / 2.0,
                size.width,
                size.height,
            ),
            FittingMode::CenterScaleFill | FittingMode::CenterScaleFit => {
                let w_ratio = self_width / size.width;
                let h_ratio = self_height / size.height;
                let ratio = if mode == FittingMode::CenterScaleFill {
                    w_ratio.max(h_ratio)
                } else {
                    w_ratio.min(h_ratio)
                };

                let target_width = size.width * ratio;
                let target_height = size.height * ratio;

                Rect::from_xywh(
                    self.left + half_width - target_width / 2.0,
                    self.top + half_height - target_height / 2.0,
                    target_width,
                    target_height,
                )
            }
        }
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "x: {}, y: {}, w: {}, h: {}",
            self.left,
            self.top,
            self.width(),
            self.height()
        )
    }
}
