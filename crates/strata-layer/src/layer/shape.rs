//! Shape layers: path fill and stroke with arc-length trimming.

use strata_painting::{DrawingContext, MaskFilter, Paint, StrokeCap, StrokeJoin};
use strata_types::{Color, Path, PathInterpolator, Scalar};

/// Draws a path with independent fill and stroke paints. `stroke_start` and
/// `stroke_end` (fractions of the summed contour length) trim the drawn
/// portion, which is how progress indicators and path-reveal animations are
/// built.
pub struct ShapeLayer {
    path: Path,
    fill_paint: Paint,
    stroke_paint: Paint,
    stroke_start: Scalar,
    stroke_end: Scalar,
    interpolator: Option<PathInterpolator>,
}

impl Default for ShapeLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl ShapeLayer {
    pub fn new() -> Self {
        let mut stroke_paint = Paint::new();
        stroke_paint.set_anti_alias(true);
        stroke_paint.set_stroke(true);
        stroke_paint.set_stroke_cap(StrokeCap::Butt);
        stroke_paint.set_stroke_join(StrokeJoin::Miter);
        stroke_paint.set_color(Color::TRANSPARENT);
        stroke_paint.set_stroke_width(1.0);

        let mut fill_paint = Paint::new();
        fill_paint.set_anti_alias(true);
        fill_paint.set_stroke(false);
        fill_paint.set_color(Color::TRANSPARENT);

        Self {
            path: Path::new(),
            fill_paint,
            stroke_paint,
            stroke_start: 0.0,
            stroke_end: 1.0,
            interpolator: None,
        }
    }

    pub(crate) fn on_draw(&mut self, context: &mut DrawingContext) {
        if self.stroke_start == 0.0 && self.stroke_end == 1.0 {
            context.draw_paint_with_path(&self.fill_paint, &self.path);
            context.draw_paint_with_path(&self.stroke_paint, &self.path);
            return;
        }

        let interpolator = self
            .interpolator
            .get_or_insert_with(|| PathInterpolator::new(&self.path));
        let trimmed = interpolator
            .interpolate(self.stroke_start, self.stroke_end)
            .clone();

        context.draw_paint_with_path(&self.fill_paint, &trimmed);
        context.draw_paint_with_path(&self.stroke_paint, &trimmed);
    }

    /// Replaces the path; returns true (always dirty).
    pub(crate) fn set_path(&mut self, path: Path) -> bool {
        self.path = path;
        self.interpolator = None;
        true
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn set_stroke_width(&mut self, stroke_width: Scalar) -> bool {
        self.stroke_paint.set_stroke_width(stroke_width);
        true
    }

    #[inline]
    pub fn stroke_width(&self) -> Scalar {
        self.stroke_paint.stroke_width()
    }

    pub(crate) fn set_stroke_color(&mut self, color: Color) -> bool {
        self.stroke_paint.set_color(color);
        true
    }

    #[inline]
    pub fn stroke_color(&self) -> Color {
        self.stroke_paint.color()
    }

    pub(crate) fn set_fill_color(&mut self, color: Color) -> bool {
        self.fill_paint.set_color(color);
        true
    }

    #[inline]
    pub fn fill_color(&self) -> Color {
        self.fill_paint.color()
    }

    pub(crate) fn set_stroke_cap(&mut self, cap: StrokeCap) -> bool {
        self.stroke_paint.set_stroke_cap(cap);
        true
    }

    pub(crate) fn set_stroke_join(&mut self, join: StrokeJoin) -> bool {
        self.stroke_paint.set_stroke_join(join);
        true
    }

    pub(crate) fn set_stroke_start(&mut self, stroke_start: Scalar) -> bool {
        if self.stroke_start == stroke_start {
            return false;
        }
        self.stroke_start = stroke_start;
        true
    }

    #[inline]
    pub fn stroke_start(&self) -> Scalar {
        self.stroke_start
    }

    pub(crate) fn set_stroke_end(&mut self, stroke_end: Scalar) -> bool {
        if self.stroke_end == stroke_end {
            return false;
        }
        self.stroke_end = stroke_end;
        true
    }

    #[inline]
    pub fn stroke_end(&self) -> Scalar {
        self.stroke_end
    }

    pub(crate) fn set_mask_filter(&mut self, mask_filter: Option<MaskFilter>) -> bool {
        self.stroke_paint.set_mask_filter(mask_filter);
        self.fill_paint.set_mask_filter(mask_filter);
        true
    }
}
