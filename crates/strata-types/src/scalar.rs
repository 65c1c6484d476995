//! Scalar and time primitives.

/// The scalar type used throughout the rendering core.
pub type Scalar = f32;

/// Converts a value in physical pixels to scalar units at the given scale.
#[inline]
pub fn pixels_to_scalar(pixels: i32, point_scale: f32) -> Scalar {
    pixels as Scalar / point_scale
}

/// Snaps a value to the pixel grid at the given raster scale.
///
/// Used when replaying context translations during display-list playback so
/// that neighboring layers do not produce sub-pixel seams.
#[inline]
pub fn sanitize_scalar_for_scale(value: Scalar, scale: Scalar) -> Scalar {
    (value * scale).round() / scale
}

/// A point in time, in seconds.
///
/// Display lists are stamped with the frame time they were produced at. The
/// reference epoch is whatever clock the embedder uses; the core only ever
/// compares and reports these values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimePoint(f64);

impl TimePoint {
    pub const ZERO: Self = Self(0.0);

    #[inline]
    pub const fn from_seconds(seconds: f64) -> Self {
        Self(seconds)
    }

    #[inline]
    pub const fn seconds(self) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_scalar_snaps_to_pixel_grid() {
        assert_eq!(1.0, sanitize_scalar_for_scale(1.2, 1.0));
        assert_eq!(1.5, sanitize_scalar_for_scale(1.4, 2.0));
        assert_eq!(0.0, sanitize_scalar_for_scale(0.2, 1.0));
        assert_eq!(-2.0, sanitize_scalar_for_scale(-1.6, 1.0));
    }

    #[test]
    fn test_sanitize_scalar_keeps_exact_values() {
        assert_eq!(4.0, sanitize_scalar_for_scale(4.0, 1.0));
        assert_eq!(4.25, sanitize_scalar_for_scale(4.25, 4.0));
    }

    #[test]
    fn test_time_point_seconds() {
        assert_eq!(0.0, TimePoint::ZERO.seconds());
        assert_eq!(1.25, TimePoint::from_seconds(1.25).seconds());
    }
}
