//! # Strata Types
//!
//! Value types shared by every crate in the Strata rendering core:
//!
//! - Scalars, time points and pixel-grid snapping helpers
//! - 32-bit ARGB [`Color`]
//! - Geometry: [`Point`], [`Vector`], [`Size`], [`Rect`], [`Matrix`]
//! - [`Path`] with affine transforms, boolean intersection and arc-length
//!   measurement
//! - [`BorderRadius`] corner specifications (absolute or percent based)
//! - [`BoundingBoxIndex`] used by the compositor's plane assignment
//!
//! All types are value-semantic, `Copy` or cheap to clone, and compare by
//! exact component equality. Tolerance-based comparisons belong to call
//! sites.

pub mod bbox;
pub mod color;
pub mod geometry;
pub mod scalar;

pub use bbox::BoundingBoxIndex;
pub use color::Color;
pub use geometry::border_radius::BorderRadius;
pub use geometry::contour::{ContourMeasure, PathInterpolator};
pub use geometry::matrix::Matrix;
pub use geometry::path::{Path, PathVerb, PathVisitor};
pub use geometry::{FittingMode, Point, Rect, Size, Vector};
pub use scalar::{sanitize_scalar_for_scale, Scalar, TimePoint};
