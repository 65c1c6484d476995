//! External layers: host-owned surfaces embedded in the tree.

use std::sync::Arc;

use strata_painting::{DrawingContext, ExternalSurface, Image, RasterError};
use strata_types::{Matrix, Rect, Scalar, Size};

/// Draws an [`ExternalSurface`], a rendering source the engine does not
/// manage (an embedded platform view).
///
/// Depending on the root's rasterization policy the layer either records the
/// surface reference for later composition (accurate path) or rasterizes the
/// surface into a bitmap right away and blits it (fast path).
#[derive(Default)]
pub struct ExternalLayer {
    surface: Option<Arc<dyn ExternalSurface>>,
}

impl ExternalLayer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn surface(&self) -> Option<&Arc<dyn ExternalSurface>> {
        self.surface.as_ref()
    }

    /// Returns true when the surface actually changed.
    pub(crate) fn set_surface(&mut self, surface: Option<Arc<dyn ExternalSurface>>) -> bool {
        let changed = match (&self.surface, &surface) {
            (Some(current), Some(new)) => !Arc::ptr_eq(current, new),
            (None, None) => false,
            _ => true,
        };

        if changed {
            self.surface = surface;
        }
        changed
    }

    pub(crate) fn on_draw(
        &mut self,
        context: &mut DrawingContext,
        frame_size: Size,
        rasterize: bool,
        display_scale: Scalar,
    ) {
        let Some(surface) = &self.surface else {
            return;
        };

        surface.set_relative_size(frame_size);

        if rasterize {
            match Self::raster_surface(surface, frame_size, display_scale) {
                Ok(image) => {
                    let image_rect = Rect::from_size(image.size());
                    let bounds = Rect::from_size(frame_size);
                    context.draw_image(&image, image_rect, bounds, None);
                }
                Err(error) => {
                    tracing::error!(%error, "failed to draw external layer");
                }
            }
        } else {
            context.draw_external_surface(Arc::clone(surface));
        }
    }

    fn raster_surface(
        surface: &Arc<dyn ExternalSurface>,
        frame_size: Size,
        display_scale: Scalar,
    ) -> Result<Image, RasterError> {
        let factory = surface
            .raster_bitmap_factory()
            .ok_or(RasterError::MissingBitmapFactory)?;

        let width_in_pixels = (frame_size.width * display_scale) as i32;
        let height_in_pixels = (frame_size.height * display_scale) as i32;
        let bitmap = factory.create_bitmap(width_in_pixels, height_in_pixels)?;

        surface
            .raster_into(
                &bitmap,
                Rect::from_size(frame_size),
                &Matrix::IDENTITY,
                display_scale,
                display_scale,
            )
            .map_err(|error| {
                RasterError::ExternalSurfaceRasterFailed(error.to_string())
            })?;

        Ok(Image::from_bitmap(bitmap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use strata_painting::{Bitmap, BitmapFactory, BitmapInfo, MemoryBitmap};

    struct TestSurface {
        size: Mutex<Size>,
        factory: Option<Arc<dyn BitmapFactory>>,
        raster_calls: AtomicUsize,
    }

    struct TestFactory;

    impl BitmapFactory for TestFactory {
        fn create_bitmap(&self, width: i32, height: i32) -> Result<Arc<dyn Bitmap>, RasterError> {
            Ok(Arc::new(MemoryBitmap::new(BitmapInfo::rgba_premul(width, height))?))
        }
    }

    impl ExternalSurface for TestSurface {
        fn relative_size(&self) -> Size {
            *self.size.lock()
        }

        fn set_relative_size(&self, size: Size) {
            *self.size.lock() = size;
        }

        fn raster_bitmap_factory(&self) -> Option<Arc<dyn BitmapFactory>> {
            self.factory.clone()
        }

        fn raster_into(
            &self,
            _bitmap: &Arc<dyn Bitmap>,
            _frame: Rect,
            _transform: &Matrix,
            _raster_scale_x: Scalar,
            _raster_scale_y: Scalar,
        ) -> Result<(), RasterError> {
            self.raster_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn surface_with_factory(factory: Option<Arc<dyn BitmapFactory>>) -> Arc<TestSurface> {
        Arc::new(TestSurface {
            size: Mutex::new(Size::ZERO),
            factory,
            raster_calls: AtomicUsize::new(0),
        })
    }

    #[test]
    fn test_accurate_path_records_surface_reference() {
        let surface = surface_with_factory(None);
        let mut layer = ExternalLayer::new();
        layer.set_surface(Some(surface.clone() as Arc<dyn ExternalSurface>));

        let mut context = DrawingContext::new(40.0, 30.0);
        layer.on_draw(&mut context, Size::new(40.0, 30.0), false, 1.0);

        let content = context.finish();
        assert!(content.external_surface.is_some());
        assert!(content.picture.is_none());
        // The surface size was synced with the frame.
        assert_eq!(Size::new(40.0, 30.0), surface.relative_size());
        assert_eq!(0, surface.raster_calls.load(Ordering::SeqCst));
    }

    #[test]
    fn test_fast_path_rasterizes_into_image() {
        let surface = surface_with_factory(Some(Arc::new(TestFactory)));
        let mut layer = ExternalLayer::new();
        layer.set_surface(Some(surface.clone() as Arc<dyn ExternalSurface>));

        let mut context = DrawingContext::new(40.0, 30.0);
        layer.on_draw(&mut context, Size::new(40.0, 30.0), true, 2.0);

        let content = context.finish();
        assert!(content.picture.is_some());
        assert!(content.external_surface.is_none());
        assert_eq!(1, surface.raster_calls.load(Ordering::SeqCst));
    }

    #[test]
    fn test_fast_path_without_factory_draws_nothing() {
        let surface = surface_with_factory(None);
        let mut layer = ExternalLayer::new();
        layer.set_surface(Some(surface as Arc<dyn ExternalSurface>));

        let mut context = DrawingContext::new(40.0, 30.0);
        layer.on_draw(&mut context, Size::new(40.0, 30.0), true, 1.0);

        let content = context.finish();
        assert!(content.is_empty());
    }

    #[test]
    fn test_set_surface_change_detection() {
        let a = surface_with_factory(None) as Arc<dyn ExternalSurface>;
        let b = surface_with_factory(None) as Arc<dyn ExternalSurface>;

        let mut layer = ExternalLayer::new();
        assert!(layer.set_surface(Some(Arc::clone(&a))));
        assert!(!layer.set_surface(Some(Arc::clone(&a))));
        assert!(layer.set_surface(Some(b)));
        assert!(layer.set_surface(None));
        assert!(!layer.set_surface(None));
    }
}
