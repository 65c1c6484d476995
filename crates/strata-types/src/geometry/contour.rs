//! Arc-length measurement over path contours.

use crate::geometry::path::Path;
use crate::geometry::Point;
use crate::scalar::Scalar;
use smallvec::SmallVec;

/// Arc-length measure of one flattened contour.
#[derive(Debug, Clone)]
pub struct ContourMeasure {
    points: Vec<Point>,
    // Cumulative length up to each point; same length as `points`.
    cumulative: Vec<Scalar>,
}

impl ContourMeasure {
    fn new(mut points: Vec<Point>, closed: bool) -> Self {
        if closed {
            if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
                if first != last {
                    points.push(first);
                }
            }
        }

        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (index, point) in points.iter().enumerate() {
            if index > 0 {
                total += Point::distance(points[index - 1], *point);
            }
            cumulative.push(total);
        }

        Self { points, cumulative }
    }

    /// Total arc length of the contour.
    pub fn length(&self) -> Scalar {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// The point at the given arc length, clamped to the contour.
    pub fn point_at(&self, distance: Scalar) -> Option<Point> {
        if self.points.is_empty() {
            return None;
        }

        let distance = distance.clamp(0.0, self.length());
        let index = match self
            .cumulative
            .iter()
            .position(|&length| length >= distance)
        {
            Some(0) | None => return self.points.first().copied(),
            Some(index) => index,
        };

        let segment_start = self.cumulative[index - 1];
        let segment_length = self.cumulative[index] - segment_start;
        let t = if segment_length > 0.0 {
            (distance - segment_start) / segment_length
        } else {
            0.0
        };

        let from = self.points[index - 1];
        let to = self.points[index];
        Some(Point::new(
            from.x + (to.x - from.x) * t,
            from.y + (to.y - from.y) * t,
        ))
    }

    /// Appends the sub-contour between the two arc lengths to `output`.
    /// Returns false when the segment is degenerate.
    pub fn segment(&self, start: Scalar, end: Scalar, output: &mut Path) -> bool {
        if self.points.len() < 2 || end <= start {
            return false;
        }

        let start = start.clamp(0.0, self.length());
        let end = end.clamp(0.0, self.length());
        if end <= start {
            return false;
        }

        let Some(first) = self.point_at(start) else {
            return false;
        };
        output.move_to(first.x, first.y);

        for (index, &length) in self.cumulative.iter().enumerate() {
            if length > start && length < end {
                let point = self.points[index];
                output.line_to(point.x, point.y);
            }
        }

        if let Some(last) = self.point_at(end) {
            output.line_to(last.x, last.y);
        }

        true
    }
}

/// Extracts path segments by fractional arc length, summing lengths across
/// contours. Used by the shape layer's stroke-start/end trimming.
#[derive(Debug, Clone)]
pub struct PathInterpolator {
    contours: SmallVec<[ContourMeasure; 1]>,
    total_length: Scalar,
    interpolated: Path,
}

impl PathInterpolator {
    pub fn new(path: &Path) -> Self {
        let mut contours: SmallVec<[ContourMeasure; 1]> = SmallVec::new();
        let mut total_length = 0.0;

        for flattened in path.flatten() {
            let measure = ContourMeasure::new(flattened.points, flattened.closed);
            total_length += measure.length();
            contours.push(measure);
        }

        Self {
            contours,
            total_length,
            interpolated: Path::new(),
        }
    }

    pub fn total_length(&self) -> Scalar {
        self.total_length
    }

    /// Rebuilds and returns the path between the fractional arc lengths
    /// `start` and `end` (each relative to the summed contour length).
    pub fn interpolate(&mut self, start: Scalar, end: Scalar) -> &Path {
        self.interpolated.reset();

        let absolute_start = start * self.total_length;
        let absolute_end = end * self.total_length;

        let mut current_start = 0.0;
        for contour in &self.contours {
            let contour_length = contour.length();
            let current_end = current_start + contour_length;

            if current_start >= absolute_end {
                break;
            }

            let relative_start = (absolute_start - current_start).clamp(0.0, contour_length);
            let relative_end = (absolute_end - current_start).min(contour_length);

            if relative_start != relative_end
                && !contour.segment(relative_start, relative_end, &mut self.interpolated)
            {
                break;
            }

            current_start = current_end;
        }

        &self.interpolated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn line_path(length: Scalar) -> Path {
        let mut path = Path::new();
        path.move_to(0.0, 0.0);
        path.line_to(length, 0.0);
        path
    }

    #[test]
    fn test_contour_length() {
        let measures = PathInterpolator::new(&line_path(100.0));
        assert_eq!(100.0, measures.total_length());
    }

    #[test]
    fn test_closed_contour_includes_closing_edge() {
        let mut path = Path::new();
        path.add_rect(Rect::from_xywh(0.0, 0.0, 10.0, 10.0), true);

        let interpolator = PathInterpolator::new(&path);
        assert_eq!(40.0, interpolator.total_length());
    }

    #[test]
    fn test_interpolate_full_range() {
        let mut interpolator = PathInterpolator::new(&line_path(100.0));
        let segment = interpolator.interpolate(0.0, 1.0);

        let bounds = segment.bounds().unwrap();
        assert!((bounds.left - 0.0).abs() < 1e-3);
        assert!((bounds.right - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_interpolate_partial_range() {
        let mut interpolator = PathInterpolator::new(&line_path(100.0));
        let segment = interpolator.interpolate(0.25, 0.75);

        let bounds = segment.bounds().unwrap();
        assert!((bounds.left - 25.0).abs() < 1e-3);
        assert!((bounds.right - 75.0).abs() < 1e-3);
    }

    #[test]
    fn test_interpolate_degenerate_range_is_empty() {
        let mut interpolator = PathInterpolator::new(&line_path(100.0));
        assert!(interpolator.interpolate(0.5, 0.5).is_empty());
    }

    #[test]
    fn test_interpolate_spans_contours() {
        let mut path = Path::new();
        path.move_to(0.0, 0.0);
        path.line_to(50.0, 0.0);
        path.move_to(0.0, 10.0);
        path.line_to(50.0, 10.0);

        let mut interpolator = PathInterpolator::new(&path);
        assert_eq!(100.0, interpolator.total_length());

        // The second half starts midway through the first contour and spans
        // into the second one.
        let segment = interpolator.interpolate(0.25, 0.75).clone();
        let bounds = segment.bounds().unwrap();
        assert!((bounds.left - 0.0).abs() < 1e-3);
        assert!((bounds.right - 50.0).abs() < 1e-3);
        assert!((bounds.top - 0.0).abs() < 1e-3);
        assert!((bounds.bottom - 10.0).abs() < 1e-3);
    }
}
