//! External (host-owned) surfaces and their presenter state.

use std::sync::Arc;

use strata_types::{Matrix, Path, Rect, Scalar, Size};

use crate::bitmap::{Bitmap, BitmapFactory};
use crate::error::RasterError;

/// A surface the engine does not draw itself, typically an embedded platform
/// view. The host mutates it; the engine samples `relative_size` during draw
/// and asks it to rasterize when running in fast mode or when compositing
/// into a bitmap.
pub trait ExternalSurface: Send + Sync {
    fn relative_size(&self) -> Size;

    /// The layer that draws this surface keeps the relative size in sync
    /// with its frame.
    fn set_relative_size(&self, size: Size);

    /// Factory used to allocate bitmaps when the engine rasterizes this
    /// surface. `None` makes rasterization fail with
    /// [`RasterError::MissingBitmapFactory`].
    fn raster_bitmap_factory(&self) -> Option<Arc<dyn BitmapFactory>> {
        None
    }

    /// Draws the surface's current content into `bitmap`.
    fn raster_into(
        &self,
        bitmap: &Arc<dyn Bitmap>,
        frame: Rect,
        transform: &Matrix,
        raster_scale_x: Scalar,
        raster_scale_y: Scalar,
    ) -> Result<(), RasterError>;
}

/// An immutable capture of an [`ExternalSurface`] reference, created each
/// time the owning layer redraws.
///
/// The surface itself keeps mutating underneath; display lists and the
/// compositor hold the snapshot so identity comparisons stay stable for the
/// frame the snapshot belongs to.
pub struct ExternalSurfaceSnapshot {
    surface: Arc<dyn ExternalSurface>,
}

impl ExternalSurfaceSnapshot {
    pub fn new(surface: Arc<dyn ExternalSurface>) -> Self {
        Self { surface }
    }

    #[inline]
    pub fn surface(&self) -> &Arc<dyn ExternalSurface> {
        &self.surface
    }
}

impl std::fmt::Debug for ExternalSurfaceSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExternalSurfaceSnapshot")
            .field("relative_size", &self.surface.relative_size())
            .finish()
    }
}

/// The absolute placement at which the host should present an external
/// surface: frame, transform, clip and opacity, all in surface-output
/// coordinates.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PresenterState {
    pub frame: Rect,
    pub transform: Matrix,
    pub clip_path: Path,
    pub opacity: Scalar,
}

impl PresenterState {
    pub fn new(frame: Rect, transform: Matrix, clip_path: Path, opacity: Scalar) -> Self {
        Self {
            frame,
            transform,
            clip_path,
            opacity,
        }
    }
}
