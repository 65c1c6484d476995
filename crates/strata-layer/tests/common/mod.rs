//! Shared helpers for the integration suites: a display-list builder and a
//! stub external surface.

#![allow(dead_code)]

use std::sync::Arc;

use parking_lot::Mutex;
use strata_painting::{
    Bitmap, DisplayList, DrawingContext, ExternalSurface, LayerContent, Mask, Paint, RasterError,
};
use strata_types::{BorderRadius, Color, Matrix, Rect, Scalar, Size, TimePoint};

pub struct StubSurface {
    size: Mutex<Size>,
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

pub fn stub_surface(width: Scalar, height: Scalar) -> Arc<dyn ExternalSurface> {
    Arc::new(StubSurface {
        size: Mutex::new(Size::new(width, height)),
    })
}

/// Builds display lists the way the layer tree emits them, for driving the
/// compositor and damage resolver directly.
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

    /// Pushes a translated context around `f`.
    pub fn context(
        &mut self,
        tx: Scalar,
        ty: Scalar,
        opacity: Scalar,
        f: impl FnOnce(&mut Self),
    ) {
        self.context_tracked(tx, ty, opacity, 0, true, f);
    }

    pub fn context_matrix(
        &mut self,
        matrix: Matrix,
        opacity: Scalar,
        f: impl FnOnce(&mut Self),
    ) {
        self.list.push_context(&matrix, opacity, 0, true);
        f(self);
        self.list.pop_context();
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

    /// Records a filled rectangle picture and appends it, returning the
    /// content so expected lists can reuse the same picture identity.
    pub fn rectangle(&mut self, width: Scalar, height: Scalar, opacity: Scalar) -> LayerContent {
        let mut context = DrawingContext::new(width, height);
        context.draw_paint_in_rect(
            &Paint::fill(Color::RED),
            Rect::from_xywh(0.0, 0.0, width, height),
        );

        let content = context.finish();
        self.list.append_layer_content(&content, opacity);
        content
    }

    /// Appends a reference to a fresh stub external surface.
    pub fn external_surface(
        &mut self,
        width: Scalar,
        height: Scalar,
        opacity: Scalar,
    ) -> LayerContent {
        let mut context = DrawingContext::new(width, height);
        context.draw_external_surface(stub_surface(width, height));

        let content = context.finish();
        self.list.append_layer_content(&content, opacity);
        content
    }

    pub fn layer_content(&mut self, content: &LayerContent, opacity: Scalar) {
        self.list.append_layer_content(content, opacity);
    }

    pub fn clip(&mut self, width: Scalar, height: Scalar) {
        self.list.append_clip_rect(width, height);
    }

    pub fn clip_round(&mut self, border_radius: &BorderRadius, width: Scalar, height: Scalar) {
        self.list.append_clip_round(border_radius, width, height);
    }

    /// Brackets `f` between prepare/apply of `mask`.
    pub fn mask(&mut self, mask: Arc<dyn Mask>, f: impl FnOnce(&mut Self)) {
        self.list.append_prepare_mask(Arc::clone(&mask));
        f(self);
        self.list.append_apply_mask(mask);
    }

    /// Appends a fresh plane (making it current) around `f`.
    pub fn plane(&mut self, f: impl FnOnce(&mut Self)) {
        self.list.append_plane();
        f(self);
    }
}
