//! Shared helpers: display-list builder, stub surfaces, and a recording
//! drawable-surface backend.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use strata_painting::{
    Bitmap, BitmapFactory, BitmapInfo, Canvas, DisplayList, DrawingContext, ExternalSurface,
    Image, LayerContent, MemoryBitmap, Paint, Picture, RasterError,
};
use strata_raster::{DrawableSurface, DrawableSurfaceFactory};
use strata_types::{Matrix, Path, Rect, Scalar, Size, TimePoint};

// ----------------------------------------------------------------------------
// Display-list builder
// ----------------------------------------------------------------------------

pub struct DisplayListBuilder {
    pub list: DisplayList,
}

impl DisplayListBuilder {
    pub fn new(width: Scalar, height: Scalar) -> Self {
        Self {
            list: DisplayList::new(Size::new(width, height), TimePoint::ZERO),
        }
    }

    pub fn finish(self) -> Arc<DisplayList> {
        Arc::new(self.list)
    }

    pub fn context(
        &mut self,
        tx: Scalar,
        ty: Scalar,
        opacity: Scalar,
        f: impl FnOnce(&mut Self),
    ) {
        self.context_tracked(tx, ty, opacity, 0, true, f);
    }

    pub fn context_tracked(
        &mut self,
        tx: Scalar,
        ty: Scalar,
        opacity: Scalar,
        layer_id: u64,
        has_updates: bool,
        f: impl FnOnce(&mut Self),
    ) {
        let matrix = Matrix::from_translate(tx, ty);
        self.list.push_context(&matrix, opacity, layer_id, has_updates);
        f(self);
        self.list.pop_context();
    }

    pub fn rectangle(&mut self, width: Scalar, height: Scalar, opacity: Scalar) -> LayerContent {
        let mut context = DrawingContext::new(width, height);
        context.draw_paint_in_rect(
            &Paint::fill(strata_types::Color::RED),
            Rect::from_xywh(0.0, 0.0, width, height),
        );

        let content = context.finish();
        self.list.append_layer_content(&content, opacity);
        content
    }

    pub fn external_surface_with(
        &mut self,
        surface: Arc<dyn ExternalSurface>,
        opacity: Scalar,
    ) -> LayerContent {
        let size = surface.relative_size();
        let mut context = DrawingContext::new(size.width, size.height);
        context.draw_external_surface(surface);

        let content = context.finish();
        self.list.append_layer_content(&content, opacity);
        content
    }

    pub fn clip(&mut self, width: Scalar, height: Scalar) {
        self.list.append_clip_rect(width, height);
    }
}

// ----------------------------------------------------------------------------
// External surfaces
// ----------------------------------------------------------------------------

pub struct TestBitmapFactory;

impl BitmapFactory for TestBitmapFactory {
    fn create_bitmap(&self, width: i32, height: i32) -> Result<Arc<dyn Bitmap>, RasterError> {
        Ok(Arc::new(MemoryBitmap::new(BitmapInfo::rgba_premul(
            width, height,
        ))?))
    }
}

/// A controllable external surface counting raster requests.
pub struct TestExternalSurface {
    size: Mutex<Size>,
    factory: Option<Arc<dyn BitmapFactory>>,
    pub raster_calls: AtomicUsize,
    pub fail_raster: bool,
}

impl TestExternalSurface {
    pub fn with_factory(width: Scalar, height: Scalar) -> Arc<Self> {
        Arc::new(Self {
            size: Mutex::new(Size::new(width, height)),
            factory: Some(Arc::new(TestBitmapFactory)),
            raster_calls: AtomicUsize::new(0),
            fail_raster: false,
        })
    }

    pub fn without_factory(width: Scalar, height: Scalar) -> Arc<Self> {
        Arc::new(Self {
            size: Mutex::new(Size::new(width, height)),
            factory: None,
            raster_calls: AtomicUsize::new(0),
            fail_raster: false,
        })
    }

    pub fn failing(width: Scalar, height: Scalar) -> Arc<Self> {
        Arc::new(Self {
            size: Mutex::new(Size::new(width, height)),
            factory: Some(Arc::new(TestBitmapFactory)),
            raster_calls: AtomicUsize::new(0),
            fail_raster: true,
        })
    }

    pub fn raster_call_count(&self) -> usize {
        self.raster_calls.load(Ordering::SeqCst)
    }
}

impl ExternalSurface for TestExternalSurface {
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
        if self.fail_raster {
            return Err(RasterError::ExternalSurfaceRasterFailed("stub failure".into()));
        }
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Drawable-surface backend
// ----------------------------------------------------------------------------

/// A canvas stamping a per-surface fill value over the bitmap on every draw,
/// giving delta tests observable pixel changes without a real rasterizer.
pub struct StampCanvas {
    bitmap: Arc<dyn Bitmap>,
    fill_value: u8,
    pub draw_ops: usize,
}

impl StampCanvas {
    fn stamp(&mut self) {
        self.draw_ops += 1;
        let fill_value = self.fill_value;
        self.bitmap.with_bytes(&mut |bytes| bytes.fill(fill_value));
    }
}

impl Canvas for StampCanvas {
    fn save(&mut self) -> usize {
        0
    }

    fn save_layer(&mut self, _paint: Option<&Paint>) -> usize {
        0
    }

    fn restore(&mut self) {}

    fn restore_to_count(&mut self, _count: usize) {}

    fn scale(&mut self, _sx: Scalar, _sy: Scalar) {}

    fn concat(&mut self, _matrix: &Matrix) {}

    fn clip_rect(&mut self, _rect: Rect, _anti_alias: bool) {}

    fn clip_path(&mut self, _path: &Path, _anti_alias: bool) {}

    fn draw_rect(&mut self, _rect: Rect, _paint: &Paint) {
        self.stamp();
    }

    fn draw_path(&mut self, _path: &Path, _paint: &Paint) {
        self.stamp();
    }

    fn draw_paint(&mut self, _paint: &Paint) {}

    fn draw_image(&mut self, _image: &Image, _x: Scalar, _y: Scalar, _paint: Option<&Paint>) {
        self.stamp();
    }

    fn draw_image_rect(&mut self, _image: &Image, _src: Rect, _dst: Rect, _paint: Option<&Paint>) {
        self.stamp();
    }

    fn draw_picture(
        &mut self,
        _picture: &Arc<Picture>,
        _matrix: Option<&Matrix>,
        _paint: Option<&Paint>,
    ) {
        self.stamp();
    }
}

pub struct StampSurface {
    canvas: StampCanvas,
}

impl DrawableSurface for StampSurface {
    fn canvas(&mut self) -> &mut dyn Canvas {
        &mut self.canvas
    }
}

/// Creates [`StampSurface`]s; each surface stamps a fresh, increasing fill
/// value so repeated rasters are distinguishable.
#[derive(Default)]
pub struct StampSurfaceFactory {
    surfaces_created: AtomicUsize,
}

impl StampSurfaceFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn surfaces_created(&self) -> usize {
        self.surfaces_created.load(Ordering::SeqCst)
    }
}

impl DrawableSurfaceFactory for StampSurfaceFactory {
    fn create_surface(
        &self,
        bitmap: Arc<dyn Bitmap>,
    ) -> Result<Box<dyn DrawableSurface>, RasterError> {
        let count = self.surfaces_created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StampSurface {
            canvas: StampCanvas {
                bitmap,
                fill_value: (count % 200) as u8 + 1,
                draw_ops: 0,
            },
        }))
    }
}

/// Reads a full copy of the bitmap's bytes.
pub fn bitmap_bytes(bitmap: &Arc<dyn Bitmap>) -> Vec<u8> {
    let mut out = Vec::new();
    bitmap.with_bytes(&mut |bytes| out = bytes.to_vec());
    out
}
