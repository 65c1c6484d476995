//! Per-layer drawing context and the content it produces.

use std::sync::Arc;

use strata_types::{BorderRadius, FittingMode, Matrix, Path, Rect, Scalar};

use crate::bitmap::{Bitmap, Image};
use crate::canvas::{Canvas, Picture, PictureRecorder};
use crate::lazy_path::LazyPath;
use crate::paint::Paint;
use crate::surface::{ExternalSurface, ExternalSurfaceSnapshot};

/// The output of one drawing context: a recorded picture, a reference to an
/// external surface, neither, or both.
#[derive(Debug, Clone, Default)]
pub struct LayerContent {
    pub picture: Option<Arc<Picture>>,
    pub external_surface: Option<Arc<ExternalSurfaceSnapshot>>,
}

impl LayerContent {
    pub fn new(
        picture: Option<Arc<Picture>>,
        external_surface: Option<Arc<ExternalSurfaceSnapshot>>,
    ) -> Self {
        Self {
            picture,
            external_surface,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.picture.is_none() && self.external_surface.is_none()
    }

    pub fn clear(&mut self) {
        self.picture = None;
        self.external_surface = None;
    }
}

/// Records the drawing of one logical layer part (background, content or
/// foreground) into a picture, and carries at most one external surface
/// reference.
///
/// The recording canvas is started lazily on the first draw, so a context
/// that never draws finishes into empty content.
pub struct DrawingContext {
    draw_bounds: Rect,
    recorder: PictureRecorder,
    external_surface: Option<Arc<dyn ExternalSurface>>,
}

impl DrawingContext {
    pub fn new(width: Scalar, height: Scalar) -> Self {
        Self {
            draw_bounds: Rect::from_xywh(0.0, 0.0, width, height),
            recorder: PictureRecorder::new(),
            external_surface: None,
        }
    }

    #[inline]
    pub fn draw_bounds(&self) -> Rect {
        self.draw_bounds
    }

    /// Completes the recording and returns the produced content.
    pub fn finish(mut self) -> LayerContent {
        let external_surface = self
            .external_surface
            .take()
            .map(|surface| Arc::new(ExternalSurfaceSnapshot::new(surface)));

        LayerContent::new(self.recorder.finish_recording_as_picture(), external_surface)
    }

    /// Draws `paint` over the draw bounds with the given border radius.
    pub fn draw_paint_with_radius(
        &mut self,
        paint: &Paint,
        border_radius: &BorderRadius,
        lazy_path: &mut LazyPath,
    ) {
        self.draw_paint_with_radius_in_rect(paint, border_radius, self.draw_bounds, lazy_path);
    }

    /// Draws `paint` over `target_rect` with the given border radius,
    /// reusing the cached rounded path while the size is stable.
    pub fn draw_paint_with_radius_in_rect(
        &mut self,
        paint: &Paint,
        border_radius: &BorderRadius,
        target_rect: Rect,
        lazy_path: &mut LazyPath,
    ) {
        if border_radius.is_empty() {
            self.draw_paint_in_rect(paint, target_rect);
        } else {
            if lazy_path.update(target_rect.size()) {
                border_radius.apply_to_path(target_rect, lazy_path.path());
            }
            self.draw_paint_with_path(paint, lazy_path.path_ref());
        }
    }

    pub fn draw_paint_in_rect(&mut self, paint: &Paint, target_rect: Rect) {
        self.canvas().draw_rect(target_rect, paint);
    }

    pub fn draw_paint_with_path(&mut self, paint: &Paint, path: &Path) {
        if !path.is_empty() {
            self.canvas().draw_path(path, paint);
        }
    }

    /// Draws `bitmap` into the draw bounds, positioned by `fitting_mode`.
    pub fn draw_bitmap(&mut self, bitmap: Arc<dyn Bitmap>, fitting_mode: FittingMode) {
        let image = Image::from_bitmap(bitmap);
        let image_rect = Rect::from_size(image.size());
        let target_rect = self.draw_bounds.make_fitting_size(image.size(), fitting_mode);

        self.draw_image(&image, image_rect, target_rect, None);
    }

    pub fn draw_image(&mut self, image: &Image, src: Rect, dst: Rect, paint: Option<&Paint>) {
        self.canvas().draw_image_rect(image, src, dst, paint);
    }

    /// Attaches the external surface this context represents. At most one
    /// surface may be attached per context.
    pub fn draw_external_surface(&mut self, surface: Arc<dyn ExternalSurface>) {
        debug_assert!(
            self.external_surface.is_none(),
            "a drawing context can reference at most one external surface"
        );
        self.external_surface = Some(surface);
    }

    pub fn clip_rect(&mut self, rect: Rect) {
        self.canvas().clip_rect(rect, true);
    }

    pub fn clip_path(&mut self, path: &Path) {
        self.canvas().clip_path(path, true);
    }

    pub fn concat(&mut self, matrix: &Matrix) {
        self.canvas().concat(matrix);
    }

    pub fn save(&mut self) -> usize {
        self.canvas().save()
    }

    pub fn restore_to_count(&mut self, count: usize) {
        self.canvas().restore_to_count(count);
    }

    /// The recording canvas, starting the recording on first use.
    pub fn canvas(&mut self) -> &mut dyn Canvas {
        if !self.recorder.is_recording() {
            return self.recorder.begin_recording(self.draw_bounds);
        }
        self.recorder.canvas().expect("recording is active")
    }
}

impl std::fmt::Debug for DrawingContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawingContext")
            .field("draw_bounds", &self.draw_bounds)
            .field("recording", &self.recorder.is_recording())
            .field("has_external_surface", &self.external_surface.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RasterError;
    use parking_lot::Mutex;
    use strata_types::{Color, Size};

    struct StubSurface {
        size: Mutex<Size>,
    }

    impl StubSurface {
        fn shared() -> Arc<dyn ExternalSurface> {
            Arc::new(Self {
                size: Mutex::new(Size::ZERO),
            })
        }
    }

    impl ExternalSurface for StubSurface {
        fn relative_size(&self) -> Size {
            *self.size.lock()
        }

        fn set_relative_size(&self, size: Size) {
            *self.size.lock() = size;
        }

        fn raster_into(
            &self,
            _bitmap: &Arc<dyn Bitmap>,
            _frame: Rect,
            _transform: &Matrix,
            _raster_scale_x: Scalar,
            _raster_scale_y: Scalar,
        ) -> Result<(), RasterError> {
            Ok(())
        }
    }

    #[test]
    fn test_empty_context_finishes_empty() {
        let context = DrawingContext::new(100.0, 100.0);
        let content = context.finish();
        assert!(content.is_empty());
    }

    #[test]
    fn test_drawn_context_produces_picture() {
        let mut context = DrawingContext::new(100.0, 100.0);
        context.draw_paint_in_rect(&Paint::fill(Color::RED), Rect::from_xywh(0.0, 0.0, 10.0, 10.0));

        let content = context.finish();
        let picture = content.picture.expect("picture should be recorded");
        assert_eq!(Rect::from_xywh(0.0, 0.0, 100.0, 100.0), picture.cull_rect());
        assert!(content.external_surface.is_none());
    }

    #[test]
    fn test_external_surface_snapshot() {
        let mut context = DrawingContext::new(50.0, 50.0);
        context.draw_external_surface(StubSurface::shared());

        let content = context.finish();
        assert!(content.picture.is_none());
        assert!(content.external_surface.is_some());
    }

    #[test]
    fn test_rounded_paint_uses_lazy_path() {
        let mut context = DrawingContext::new(100.0, 100.0);
        let mut lazy_path = LazyPath::new();
        let radius = BorderRadius::all(8.0, false);

        context.draw_paint_with_radius(&Paint::fill(Color::BLUE), &radius, &mut lazy_path);
        assert!(!lazy_path.path_ref().is_empty());

        // A second draw at the same size keeps the cached path.
        let before = lazy_path.path_ref().clone();
        context.draw_paint_with_radius(&Paint::fill(Color::RED), &radius, &mut lazy_path);
        assert_eq!(before, *lazy_path.path_ref());
    }

    #[test]
    fn test_empty_radius_draws_rect() {
        let mut context = DrawingContext::new(100.0, 100.0);
        let mut lazy_path = LazyPath::new();

        context.draw_paint_with_radius(
            &Paint::fill(Color::BLUE),
            &BorderRadius::default(),
            &mut lazy_path,
        );
        // The lazy path stays untouched for square corners.
        assert!(lazy_path.path_ref().is_empty());

        let content = context.finish();
        assert!(content.picture.is_some());
    }

    #[test]
    fn test_layer_content_clear() {
        let mut context = DrawingContext::new(10.0, 10.0);
        context.draw_paint_in_rect(&Paint::new(), Rect::from_xywh(0.0, 0.0, 5.0, 5.0));
        let mut content = context.finish();

        assert!(!content.is_empty());
        content.clear();
        assert!(content.is_empty());
    }
}
