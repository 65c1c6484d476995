//! Error taxonomy for rasterization.

use thiserror::Error;

/// Errors surfaced by rasterization entry points.
///
/// Layer-tree and display-list operations do not return errors; they enforce
/// their preconditions with assertions.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RasterError {
    /// Delta rasterization was asked to blend into an unsupported bitmap.
    #[error("delta rasterization is only supported for premultiplied RGBA or BGRA bitmaps")]
    BitmapFormatUnsupported,

    /// A bitmap factory failed to allocate.
    #[error("bitmap allocation failed: {0}")]
    BitmapAllocationFailed(String),

    /// A bitmap refused to expose its bytes.
    #[error("failed to lock bitmap bytes")]
    BitmapLockFailed,

    /// An external surface failed to rasterize into the provided bitmap.
    #[error("failed to rasterize external surface: {0}")]
    ExternalSurfaceRasterFailed(String),

    /// An external surface without a bitmap factory was asked to rasterize.
    #[error("cannot rasterize an external surface without a bitmap factory")]
    MissingBitmapFactory,
}
