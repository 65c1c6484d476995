//! Vector path made of move/line/quad/conic/cubic/close verbs.

use crate::geometry::matrix::Matrix;
use crate::geometry::{Point, Rect};
use crate::scalar::Scalar;

/// Conic weight producing a circular quadrant.
pub(crate) const QUARTER_CIRCLE_WEIGHT: Scalar = std::f32::consts::FRAC_1_SQRT_2;

/// One path command. The number of stored points per verb:
/// Move 1, Line 1, Quad 2, Conic 2 (+ weight), Cubic 3, Close 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathVerb {
    Move,
    Line,
    Quad,
    Conic,
    Cubic,
    Close,
}

/// Receiver for [`Path::visit`]. Curve callbacks include the segment's start
/// point.
pub trait PathVisitor {
    fn move_to(&mut self, point: Point);
    fn line(&mut self, from: Point, to: Point);
    fn quad(&mut self, from: Point, control: Point, to: Point);
    fn conic(&mut self, from: Point, control: Point, to: Point, weight: Scalar);
    fn cubic(&mut self, from: Point, control1: Point, control2: Point, to: Point);
    fn close(&mut self);
}

/// An ordered sequence of contours built from drawing verbs.
///
/// Equality compares the verb/point/weight sequences exactly, so two paths
/// are equal only when they were built the same way.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    verbs: Vec<PathVerb>,
    points: Vec<Point>,
    conic_weights: Vec<Scalar>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }

    pub fn reset(&mut self) {
        self.verbs.clear();
        self.points.clear();
        self.conic_weights.clear();
    }

    #[inline]
    pub fn verbs(&self) -> &[PathVerb] {
        &self.verbs
    }

    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    // A contour must start with a move. Drawing verbs issued with no open
    // contour implicitly start one at the origin.
    fn ensure_contour(&mut self) {
        match self.verbs.last() {
            None | Some(PathVerb::Close) => self.move_to(0.0, 0.0),
            _ => {}
        }
    }

    pub fn move_to(&mut self, x: Scalar, y: Scalar) {
        self.verbs.push(PathVerb::Move);
        self.points.push(Point::new(x, y));
    }

    pub fn line_to(&mut self, x: Scalar, y: Scalar) {
        self.ensure_contour();
        self.verbs.push(PathVerb::Line);
        self.points.push(Point::new(x, y));
    }

    pub fn quad_to(&mut self, x0: Scalar, y0: Scalar, x1: Scalar, y1: Scalar) {
        self.ensure_contour();
        self.verbs.push(PathVerb::Quad);
        self.points.push(Point::new(x0, y0));
        self.points.push(Point::new(x1, y1));
    }

    pub fn conic_to(&mut self, x0: Scalar, y0: Scalar, x1: Scalar, y1: Scalar, weight: Scalar) {
        self.ensure_contour();
        self.verbs.push(PathVerb::Conic);
        self.points.push(Point::new(x0, y0));
        self.points.push(Point::new(x1, y1));
        self.conic_weights.push(weight);
    }

    pub fn cubic_to(
        &mut self,
        x0: Scalar,
        y0: Scalar,
        x1: Scalar,
        y1: Scalar,
        x2: Scalar,
        y2: Scalar,
    ) {
        self.ensure_contour();
        self.verbs.push(PathVerb::Cubic);
        self.points.push(Point::new(x0, y0));
        self.points.push(Point::new(x1, y1));
        self.points.push(Point::new(x2, y2));
    }

    /// Closes the current contour. A line segment back to the contour start
    /// is implied during playback.
    pub fn close(&mut self) {
        if !matches!(self.verbs.last(), None | Some(PathVerb::Close)) {
            self.verbs.push(PathVerb::Close);
        }
    }

    /// Adds a closed rectangle contour.
    pub fn add_rect(&mut self, bounds: Rect, clockwise: bool) {
        self.move_to(bounds.left, bounds.top);
        if clockwise {
            self.line_to(bounds.right, bounds.top);
            self.line_to(bounds.right, bounds.bottom);
            self.line_to(bounds.left, bounds.bottom);
        } else {
            self.line_to(bounds.left, bounds.bottom);
            self.line_to(bounds.right, bounds.bottom);
            self.line_to(bounds.right, bounds.top);
        }
        self.close();
    }

    /// Adds a closed oval contour inscribed in `bounds`, built from four
    /// conic quadrants starting at the right edge midpoint.
    pub fn add_oval(&mut self, bounds: Rect, clockwise: bool) {
        let cx = bounds.left + bounds.width() / 2.0;
        let cy = bounds.top + bounds.height() / 2.0;
        let (l, t, r, b) = (bounds.left, bounds.top, bounds.right, bounds.bottom);
        let w = QUARTER_CIRCLE_WEIGHT;

        self.move_to(r, cy);
        if clockwise {
            self.conic_to(r, b, cx, b, w);
            self.conic_to(l, b, l, cy, w);
            self.conic_to(l, t, cx, t, w);
            self.conic_to(r, t, r, cy, w);
        } else {
            self.conic_to(r, t, cx, t, w);
            self.conic_to(l, t, l, cy, w);
            self.conic_to(l, b, cx, b, w);
            self.conic_to(r, b, r, cy, w);
        }
        self.close();
    }

    /// Adds a closed rounded-rectangle contour. `radii` holds per-corner
    /// (x, y) radii ordered top-left, top-right, bottom-right, bottom-left.
    /// Radii whose sums exceed the bounds are scaled down proportionally.
    pub fn add_round_rect(&mut self, bounds: Rect, radii: [Scalar; 8], clockwise: bool) {
        let width = bounds.width();
        let height = bounds.height();

        let mut radii = radii.map(|radius| radius.max(0.0));
        let mut scale: Scalar = 1.0;
        for (pair_sum, side) in [
            (radii[0] + radii[2], width),  // top edge
            (radii[5] + radii[7], height), // left edge
            (radii[4] + radii[6], width),  // bottom edge
            (radii[1] + radii[3], height), // right edge
        ] {
            if pair_sum > side && pair_sum > 0.0 {
                scale = scale.min(side / pair_sum);
            }
        }
        if scale < 1.0 {
            for radius in &mut radii {
                *radius *= scale;
            }
        }

        let [tl_x, tl_y, tr_x, tr_y, br_x, br_y, bl_x, bl_y] = radii;
        let (l, t, r, b) = (bounds.left, bounds.top, bounds.right, bounds.bottom);
        let w = QUARTER_CIRCLE_WEIGHT;

        if clockwise {
            self.move_to(l + tl_x, t);
            self.line_to(r - tr_x, t);
            self.conic_to(r, t, r, t + tr_y, w);
            self.line_to(r, b - br_y);
            self.conic_to(r, b, r - br_x, b, w);
            self.line_to(l + bl_x, b);
            self.conic_to(l, b, l, b - bl_y, w);
            self.line_to(l, t + tl_y);
            self.conic_to(l, t, l + tl_x, t, w);
        } else {
            self.move_to(l + tl_x, t);
            self.conic_to(l, t, l, t + tl_y, w);
            self.line_to(l, b - bl_y);
            self.conic_to(l, b, l + bl_x, b, w);
            self.line_to(r - br_x, b);
            self.conic_to(r, b, r, b - br_y, w);
            self.line_to(r, t + tr_y);
            self.conic_to(r, t, r - tr_x, t, w);
        }
        self.close();
    }

    /// [`Path::add_round_rect`] with one (x, y) radius for all corners.
    pub fn add_round_rect_xy(&mut self, bounds: Rect, rx: Scalar, ry: Scalar, clockwise: bool) {
        self.add_round_rect(bounds, [rx, ry, rx, ry, rx, ry, rx, ry], clockwise);
    }

    /// Appends an elliptical arc as a new contour. Angles are in degrees;
    /// zero is the positive x-axis and positive sweeps are clockwise.
    pub fn arc_to(&mut self, oval: Rect, start_angle: Scalar, sweep_angle: Scalar) {
        if sweep_angle == 0.0 {
            return;
        }

        let cx = oval.left + oval.width() / 2.0;
        let cy = oval.top + oval.height() / 2.0;
        let rx = oval.width() / 2.0;
        let ry = oval.height() / 2.0;

        let sweep = sweep_angle.clamp(-360.0, 360.0).to_radians();
        let start = start_angle.to_radians();

        let segments = (sweep.abs() / std::f32::consts::FRAC_PI_2).ceil().max(1.0) as usize;
        let step = sweep / segments as Scalar;

        let point_at = |angle: Scalar| Point::new(cx + rx * angle.cos(), cy + ry * angle.sin());

        self.move_to(point_at(start).x, point_at(start).y);

        for segment in 0..segments {
            let a0 = start + step * segment as Scalar;
            let a1 = a0 + step;
            let half = (a1 - a0) / 2.0;
            let mid = (a0 + a1) / 2.0;
            let weight = half.cos().abs();

            // The control point sits at the tangent intersection of the unit
            // circle arc, scaled onto the ellipse.
            let control = Point::new(
                cx + rx * (mid.cos() / half.cos()),
                cy + ry * (mid.sin() / half.cos()),
            );
            let end = point_at(a1);

            self.conic_to(control.x, control.y, end.x, end.y, weight);
        }
    }

    /// Appends all contours of `other`.
    pub fn add_path(&mut self, other: &Path) {
        self.verbs.extend_from_slice(&other.verbs);
        self.points.extend_from_slice(&other.points);
        self.conic_weights.extend_from_slice(&other.conic_weights);
    }

    /// Transforms every stored point in place. Conic weights are invariant
    /// under affine transforms.
    pub fn transform(&mut self, matrix: &Matrix) {
        for point in &mut self.points {
            *point = matrix.map_point(*point);
        }
    }

    /// Bounds of the control points, or `None` for an empty path.
    pub fn bounds(&self) -> Option<Rect> {
        let first = self.points.first()?;

        let mut left = first.x;
        let mut top = first.y;
        let mut right = first.x;
        let mut bottom = first.y;

        for point in &self.points[1..] {
            left = left.min(point.x);
            top = top.min(point.y);
            right = right.max(point.x);
            bottom = bottom.max(point.y);
        }

        Some(Rect::from_ltrb(left, top, right, bottom))
    }

    /// Walks the path, dispatching each verb to `visitor`.
    pub fn visit(&self, visitor: &mut dyn PathVisitor) {
        let mut point_index = 0;
        let mut weight_index = 0;
        let mut current = Point::ZERO;

        for verb in &self.verbs {
            match verb {
                PathVerb::Move => {
                    current = self.points[point_index];
                    point_index += 1;
                    visitor.move_to(current);
                }
                PathVerb::Line => {
                    let to = self.points[point_index];
                    point_index += 1;
                    visitor.line(current, to);
                    current = to;
                }
                PathVerb::Quad => {
                    let control = self.points[point_index];
                    let to = self.points[point_index + 1];
                    point_index += 2;
                    visitor.quad(current, control, to);
                    current = to;
                }
                PathVerb::Conic => {
                    let control = self.points[point_index];
                    let to = self.points[point_index + 1];
                    point_index += 2;
                    let weight = self.conic_weights[weight_index];
                    weight_index += 1;
                    visitor.conic(current, control, to, weight);
                    current = to;
                }
                PathVerb::Cubic => {
                    let control1 = self.points[point_index];
                    let control2 = self.points[point_index + 1];
                    let to = self.points[point_index + 2];
                    point_index += 3;
                    visitor.cubic(current, control1, control2, to);
                    current = to;
                }
                PathVerb::Close => visitor.close(),
            }
        }
    }

    /// Flattens every contour into a polyline with the default tolerance.
    ///
    /// Each returned contour carries its points and whether the source
    /// contour was explicitly closed.
    pub fn flatten(&self) -> Vec<FlattenedContour> {
        let mut flattener = Flattener::default();
        self.visit(&mut flattener);
        flattener.finish()
    }

    /// Boolean intersection with `other`.
    ///
    /// The clip operand is flattened and treated as a single convex region;
    /// every clip path produced by the rendering core (rects and rounded
    /// rects under affine transforms) satisfies this. Each subject contour is
    /// clipped independently and surviving regions are emitted as closed
    /// polygon contours.
    pub fn intersection(&self, other: &Path) -> Path {
        let mut output = Path::new();

        if self.is_empty() || other.is_empty() {
            return output;
        }

        let clip = match other
            .flatten()
            .into_iter()
            .map(|contour| contour.points)
            .find(|points| points.len() >= 3)
        {
            Some(points) => points,
            None => return output,
        };

        for contour in self.flatten() {
            if contour.points.len() < 3 {
                continue;
            }

            let clipped = clip_polygon(&contour.points, &clip);
            if clipped.len() < 3 {
                continue;
            }

            output.move_to(clipped[0].x, clipped[0].y);
            for point in &clipped[1..] {
                output.line_to(point.x, point.y);
            }
            output.close();
        }

        output
    }
}

/// One flattened contour produced by [`Path::flatten`].
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedContour {
    pub points: Vec<Point>,
    pub closed: bool,
}

// ----------------------------------------------------------------------------
// Flattening
// ----------------------------------------------------------------------------

// Maximum chord length retained when subdividing curves.
const FLATTEN_STEP: Scalar = 0.5;
const MIN_CURVE_SEGMENTS: usize = 4;
const MAX_CURVE_SEGMENTS: usize = 64;

fn curve_segment_count(control_polygon_length: Scalar) -> usize {
    ((control_polygon_length / FLATTEN_STEP) as usize).clamp(MIN_CURVE_SEGMENTS, MAX_CURVE_SEGMENTS)
}

fn quad_at(p0: Point, p1: Point, p2: Point, t: Scalar) -> Point {
    let u = 1.0 - t;
    Point::new(
        u * u * p0.x + 2.0 * u * t * p1.x + t * t * p2.x,
        u * u * p0.y + 2.0 * u * t * p1.y + t * t * p2.y,
    )
}

fn conic_at(p0: Point, p1: Point, p2: Point, weight: Scalar, t: Scalar) -> Point {
    let u = 1.0 - t;
    let denominator = u * u + 2.0 * u * t * weight + t * t;
    Point::new(
        (u * u * p0.x + 2.0 * u * t * weight * p1.x + t * t * p2.x) / denominator,
        (u * u * p0.y + 2.0 * u * t * weight * p1.y + t * t * p2.y) / denominator,
    )
}

fn cubic_at(p0: Point, p1: Point, p2: Point, p3: Point, t: Scalar) -> Point {
    let u = 1.0 - t;
    let a = u * u * u;
    let b = 3.0 * u * u * t;
    let c = 3.0 * u * t * t;
    let d = t * t * t;
    Point::new(
        a * p0.x + b * p1.x + c * p2.x + d * p3.x,
        a * p0.y + b * p1.y + c * p2.y + d * p3.y,
    )
}

#[derive(Default)]
struct Flattener {
    contours: Vec<FlattenedContour>,
    current: Vec<Point>,
}

impl Flattener {
    fn flush(&mut self, closed: bool) {
        if !self.current.is_empty() {
            let points = std::mem::take(&mut self.current);
            self.contours.push(FlattenedContour { points, closed });
        }
    }

    fn finish(mut self) -> Vec<FlattenedContour> {
        self.flush(false);
        self.contours
    }

    fn sample_curve(&mut self, segments: usize, eval: impl Fn(Scalar) -> Point) {
        for step in 1..=segments {
            let t = step as Scalar / segments as Scalar;
            self.current.push(eval(t));
        }
    }
}

impl PathVisitor for Flattener {
    fn move_to(&mut self, point: Point) {
        self.flush(false);
        self.current.push(point);
    }

    fn line(&mut self, _from: Point, to: Point) {
        self.current.push(to);
    }

    fn quad(&mut self, from: Point, control: Point, to: Point) {
        let length = Point::distance(from, control) + Point::distance(control, to);
        self.sample_curve(curve_segment_count(length), |t| quad_at(from, control, to, t));
    }

    fn conic(&mut self, from: Point, control: Point, to: Point, weight: Scalar) {
        let length = Point::distance(from, control) + Point::distance(control, to);
        self.sample_curve(curve_segment_count(length), |t| {
            conic_at(from, control, to, weight, t)
        });
    }

    fn cubic(&mut self, from: Point, control1: Point, control2: Point, to: Point) {
        let length = Point::distance(from, control1)
            + Point::distance(control1, control2)
            + Point::distance(control2, to);
        self.sample_curve(curve_segment_count(length), |t| {
            cubic_at(from, control1, control2, to, t)
        });
    }

    fn close(&mut self) {
        self.flush(true);
    }
}

// ----------------------------------------------------------------------------
// Polygon clipping (Sutherland-Hodgman, convex clip)
// ----------------------------------------------------------------------------

fn polygon_signed_area(points: &[Point]) -> Scalar {
    let mut area = 0.0;
    for (index, point) in points.iter().enumerate() {
        let next = points[(index + 1) % points.len()];
        area += point.x * next.y - next.x * point.y;
    }
    area / 2.0
}

fn clip_polygon(subject: &[Point], clip: &[Point]) -> Vec<Point> {
    // Orientation decides which side of each clip edge is "inside".
    let orientation = if polygon_signed_area(clip) >= 0.0 { 1.0 } else { -1.0 };

    let mut output: Vec<Point> = subject.to_vec();

    for (index, edge_start) in clip.iter().enumerate() {
        if output.is_empty() {
            break;
        }

        let edge_end = clip[(index + 1) % clip.len()];
        let edge = Point::new(edge_end.x - edge_start.x, edge_end.y - edge_start.y);

        let is_inside = |point: Point| -> bool {
            let cross = edge.x * (point.y - edge_start.y) - edge.y * (point.x - edge_start.x);
            cross * orientation >= 0.0
        };

        let intersect = |from: Point, to: Point| -> Point {
            let direction = Point::new(to.x - from.x, to.y - from.y);
            let denominator = edge.x * direction.y - edge.y * direction.x;
            if denominator == 0.0 {
                return to;
            }
            let t = (edge.x * (from.y - edge_start.y) - edge.y * (from.x - edge_start.x))
                / -denominator;
            Point::new(from.x + direction.x * t, from.y + direction.y * t)
        };

        let input = std::mem::take(&mut output);
        for (point_index, &point) in input.iter().enumerate() {
            let previous = input[(point_index + input.len() - 1) % input.len()];
            let point_inside = is_inside(point);
            let previous_inside = is_inside(previous);

            if point_inside {
                if !previous_inside {
                    output.push(intersect(previous, point));
                }
                output.push(point);
            } else if previous_inside {
                output.push(intersect(previous, point));
            }
        }
    }

    output
}
