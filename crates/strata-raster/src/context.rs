//! The raster context: drives display lists into bitmaps.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use strata_layer::{Compositor, CompositorPlane, PlaneList};
use strata_painting::{
    BlendMode, Bitmap, BitmapInfo, Canvas, DisplayList, ExternalSurfaceSnapshot, Image,
    MemoryBitmap, Paint, PresenterState, RasterError,
};
use strata_types::{Color, Matrix, Rect, Scalar};

use crate::blit;
use crate::damage::DamageResolver;

/// How external surfaces are turned into pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalSurfaceRasterization {
    /// The external layer rasterizes its surface at frame size; transforms
    /// apply post-rasterization. High draw-cache hit rate, lower fidelity
    /// under transforms.
    Fast,
    /// The compositor splits planes and the surface is rasterized with its
    /// final transform applied. Accurate, but redraws on every placement
    /// change.
    Accurate,
}

/// The outcome of a raster call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RasterResult {
    pub rendered_pixels_count: usize,
}

/// A backend drawing surface over a bitmap, producing the canvas raster
/// playback draws into.
pub trait DrawableSurface {
    fn canvas(&mut self) -> &mut dyn Canvas;

    /// Called after drawing completes so the backend can submit its work.
    fn flush(&mut self) {}
}

/// Creates [`DrawableSurface`]s for bitmaps. Implemented by the graphics
/// backend.
pub trait DrawableSurfaceFactory: Send + Sync {
    fn create_surface(
        &self,
        bitmap: Arc<dyn Bitmap>,
    ) -> Result<Box<dyn DrawableSurface>, RasterError>;
}

struct CachedExternalImage {
    image: Image,
    snapshot: Arc<ExternalSurfaceSnapshot>,
    frame: Rect,
    transform: Matrix,
    raster_scale_x: Scalar,
    raster_scale_y: Scalar,
    last_raster_id: usize,
}

#[derive(Default)]
struct RasterState {
    cached_external_images: Vec<CachedExternalImage>,
    last_bitmap: Option<Arc<dyn Bitmap>>,
    damage_resolver: DamageResolver,
}

/// Rasterizes display lists into target bitmaps.
///
/// In [`ExternalSurfaceRasterization::Accurate`] mode the context runs the
/// compositor first and rasterizes external surfaces into cached
/// sub-bitmaps which it composites under their presenter clip and opacity.
/// With delta rasterization enabled, only regions damaged since the last
/// raster are redrawn into an internal bitmap which is then blitted out.
///
/// Cross-call state (bitmap, caches, damage) sits behind one mutex, so
/// concurrent raster calls serialize and the context is `Send + Sync`.
pub struct RasterContext {
    surface_factory: Arc<dyn DrawableSurfaceFactory>,
    rasterization: ExternalSurfaceRasterization,
    delta_rasterization_enabled: bool,
    raster_sequence: AtomicUsize,
    state: Mutex<RasterState>,
}

impl RasterContext {
    pub fn new(
        surface_factory: Arc<dyn DrawableSurfaceFactory>,
        rasterization: ExternalSurfaceRasterization,
        delta_rasterization_enabled: bool,
    ) -> Self {
        Self {
            surface_factory,
            rasterization,
            delta_rasterization_enabled,
            raster_sequence: AtomicUsize::new(0),
            state: Mutex::new(RasterState::default()),
        }
    }

    #[inline]
    pub fn rasterization(&self) -> ExternalSurfaceRasterization {
        self.rasterization
    }

    #[inline]
    pub fn is_delta_rasterization_enabled(&self) -> bool {
        self.delta_rasterization_enabled
    }

    fn perform_composition_if_needed(
        &self,
        display_list: &Arc<DisplayList>,
    ) -> (Arc<DisplayList>, PlaneList) {
        let mut plane_list = PlaneList::new();

        let resolved = if self.rasterization == ExternalSurfaceRasterization::Accurate
            && display_list.has_external_surfaces()
        {
            Compositor::new().perform_composition(display_list, &mut plane_list)
        } else {
            plane_list.append_drawable();
            Arc::clone(display_list)
        };

        (resolved, plane_list)
    }

    /// Rasterizes `display_list` into `bitmap`.
    ///
    /// With `should_clear_bitmap_before_drawing` the target contents are
    /// replaced; otherwise the frame blends over them, which in delta mode
    /// requires a premultiplied RGBA/BGRA bitmap.
    pub fn raster(
        &self,
        display_list: &Arc<DisplayList>,
        bitmap: &Arc<dyn Bitmap>,
        should_clear_bitmap_before_drawing: bool,
    ) -> Result<RasterResult, RasterError> {
        let raster_id = self.raster_sequence.fetch_add(1, Ordering::SeqCst) + 1;

        let bitmap_info = bitmap.info();
        let composition = self.perform_composition_if_needed(display_list);

        let mut output = RasterResult {
            rendered_pixels_count: bitmap_info.width.max(0) as usize
                * bitmap_info.height.max(0) as usize,
        };

        let mut state = self.state.lock();

        if self.delta_rasterization_enabled {
            let damage_rects = Self::compute_damage_rects(&mut state, display_list, &bitmap_info);

            if Self::needs_new_bitmap(&state, &bitmap_info) {
                // The previous delta bitmap no longer matches; start over
                // with a full raster into a fresh internal bitmap.
                state.last_bitmap = None;

                tracing::debug!(
                    width = bitmap_info.width,
                    height = bitmap_info.height,
                    "allocating delta bitmap"
                );
                let new_bitmap: Arc<dyn Bitmap> = Arc::new(MemoryBitmap::new(bitmap_info)?);
                state.last_bitmap = Some(Arc::clone(&new_bitmap));

                self.raster_full(
                    &mut state,
                    &new_bitmap,
                    &composition,
                    &bitmap_info,
                    should_clear_bitmap_before_drawing,
                    raster_id,
                )?;
            } else {
                let delta_bitmap = state
                    .last_bitmap
                    .clone()
                    .expect("delta bitmap exists when no reallocation is needed");

                let result = self.raster_damaged(
                    &mut state,
                    &composition,
                    &delta_bitmap,
                    &bitmap_info,
                    &damage_rects,
                    raster_id,
                )?;
                output.rendered_pixels_count = result.rendered_pixels_count;
            }

            let delta_bitmap = state
                .last_bitmap
                .clone()
                .expect("delta bitmap was just ensured");
            Self::blit_delta_bitmap_to_output(
                &delta_bitmap,
                bitmap,
                &bitmap_info,
                should_clear_bitmap_before_drawing,
            )?;
        } else {
            self.raster_full(
                &mut state,
                bitmap,
                &composition,
                &bitmap_info,
                should_clear_bitmap_before_drawing,
                raster_id,
            )?;
        }

        Self::remove_unused_cached_external_images(&mut state, raster_id);

        Ok(output)
    }

    /// Rasterizes only the regions of `display_list` that changed since the
    /// previous raster, straight into `bitmap`.
    pub fn raster_delta(
        &self,
        display_list: &Arc<DisplayList>,
        bitmap: &Arc<dyn Bitmap>,
    ) -> Result<RasterResult, RasterError> {
        let raster_id = self.raster_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let bitmap_info = bitmap.info();

        let mut state = self.state.lock();

        let damage_rects = Self::compute_damage_rects(&mut state, display_list, &bitmap_info);
        let composition = self.perform_composition_if_needed(display_list);

        let result = self.raster_damaged(
            &mut state,
            &composition,
            bitmap,
            &bitmap_info,
            &damage_rects,
            raster_id,
        );

        Self::remove_unused_cached_external_images(&mut state, raster_id);

        result
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn compute_damage_rects(
        state: &mut RasterState,
        display_list: &Arc<DisplayList>,
        bitmap_info: &BitmapInfo,
    ) -> Vec<Rect> {
        state
            .damage_resolver
            .begin_updates(bitmap_info.width as Scalar, bitmap_info.height as Scalar);
        state.damage_resolver.add_damage_from_display_list(display_list);
        state.damage_resolver.end_updates()
    }

    fn needs_new_bitmap(state: &RasterState, bitmap_info: &BitmapInfo) -> bool {
        match &state.last_bitmap {
            Some(bitmap) => bitmap.info() != *bitmap_info,
            None => true,
        }
    }

    fn raster_full(
        &self,
        state: &mut RasterState,
        bitmap: &Arc<dyn Bitmap>,
        composition: &(Arc<DisplayList>, PlaneList),
        bitmap_info: &BitmapInfo,
        should_clear_bitmap_before_drawing: bool,
        raster_id: usize,
    ) -> Result<(), RasterError> {
        let mut surface = self.surface_factory.create_surface(Arc::clone(bitmap))?;

        let result = self.do_raster(
            state,
            surface.as_mut(),
            &composition.0,
            &composition.1,
            bitmap_info,
            should_clear_bitmap_before_drawing,
            raster_id,
        );

        surface.flush();
        result
    }

    fn raster_damaged(
        &self,
        state: &mut RasterState,
        composition: &(Arc<DisplayList>, PlaneList),
        bitmap: &Arc<dyn Bitmap>,
        bitmap_info: &BitmapInfo,
        damage_rects: &[Rect],
        raster_id: usize,
    ) -> Result<RasterResult, RasterError> {
        let mut surface = self.surface_factory.create_surface(Arc::clone(bitmap))?;

        let mut output = RasterResult::default();

        for damage_rect in damage_rects {
            let canvas = surface.canvas();
            let save_count = canvas.save();
            canvas.clip_rect(*damage_rect, false);

            let result = self.do_raster(
                state,
                surface.as_mut(),
                &composition.0,
                &composition.1,
                bitmap_info,
                true,
                raster_id,
            );

            surface.canvas().restore_to_count(save_count);
            result?;

            output.rendered_pixels_count +=
                damage_rect.width().max(0.0) as usize * damage_rect.height().max(0.0) as usize;
        }

        surface.flush();

        Ok(output)
    }

    #[allow(clippy::too_many_arguments)]
    fn do_raster(
        &self,
        state: &mut RasterState,
        surface: &mut dyn DrawableSurface,
        display_list: &DisplayList,
        plane_list: &PlaneList,
        bitmap_info: &BitmapInfo,
        should_clear_bitmap_before_drawing: bool,
        raster_id: usize,
    ) -> Result<(), RasterError> {
        if should_clear_bitmap_before_drawing {
            let mut clear = Paint::new();
            clear.set_color(Color::TRANSPARENT);
            clear.set_blend_mode(BlendMode::Src);
            surface.canvas().draw_paint(&clear);
        }

        let mut drawable_plane_index = 0;
        for plane in plane_list {
            match plane {
                CompositorPlane::Drawable => {
                    display_list.draw_to_size(
                        surface.canvas(),
                        drawable_plane_index,
                        bitmap_info.width as Scalar,
                        bitmap_info.height as Scalar,
                        false,
                    );
                    drawable_plane_index += 1;
                }
                CompositorPlane::External {
                    snapshot,
                    presenter_state,
                } => {
                    let raster_scale_x = bitmap_info.width as Scalar / display_list.size().width;
                    let raster_scale_y = bitmap_info.height as Scalar / display_list.size().height;

                    let image = self.image_for_external_surface(
                        state,
                        snapshot,
                        presenter_state,
                        bitmap_info,
                        raster_scale_x,
                        raster_scale_y,
                        raster_id,
                    )?;

                    let canvas = surface.canvas();
                    let save_count = canvas.save();

                    if !presenter_state.clip_path.is_empty() {
                        let mut clip_path = presenter_state.clip_path.clone();
                        clip_path.transform(&Matrix::from_scale(raster_scale_x, raster_scale_y));
                        canvas.clip_path(&clip_path, true);
                    }

                    let mut paint = Paint::new();
                    paint.set_anti_alias(true);
                    paint.set_alpha(presenter_state.opacity);
                    canvas.draw_image(&image, 0.0, 0.0, Some(&paint));

                    canvas.restore_to_count(save_count);
                }
            }
        }

        Ok(())
    }

    /// Looks up or produces the rasterized image of an external surface for
    /// the given placement and raster scale.
    #[allow(clippy::too_many_arguments)]
    fn image_for_external_surface(
        &self,
        state: &mut RasterState,
        snapshot: &Arc<ExternalSurfaceSnapshot>,
        presenter_state: &PresenterState,
        bitmap_info: &BitmapInfo,
        raster_scale_x: Scalar,
        raster_scale_y: Scalar,
        raster_id: usize,
    ) -> Result<Image, RasterError> {
        for cached in &mut state.cached_external_images {
            if Arc::ptr_eq(&cached.snapshot, snapshot)
                && cached.frame == presenter_state.frame
                && cached.transform == presenter_state.transform
                && cached.raster_scale_x == raster_scale_x
                && cached.raster_scale_y == raster_scale_y
            {
                cached.last_raster_id = raster_id;
                return Ok(cached.image.clone());
            }
        }

        tracing::debug!(frame = ?presenter_state.frame, "rasterizing external surface");

        let factory = snapshot
            .surface()
            .raster_bitmap_factory()
            .ok_or(RasterError::MissingBitmapFactory)?;

        let bitmap = factory.create_bitmap(bitmap_info.width, bitmap_info.height)?;

        bitmap.with_bytes(&mut |bytes| bytes.fill(0));

        snapshot
            .surface()
            .raster_into(
                &bitmap,
                presenter_state.frame,
                &presenter_state.transform,
                raster_scale_x,
                raster_scale_y,
            )
            .map_err(|error| RasterError::ExternalSurfaceRasterFailed(error.to_string()))?;

        let image = Image::from_bitmap(bitmap);

        state.cached_external_images.push(CachedExternalImage {
            image: image.clone(),
            snapshot: Arc::clone(snapshot),
            frame: presenter_state.frame,
            transform: presenter_state.transform,
            raster_scale_x,
            raster_scale_y,
            last_raster_id: raster_id,
        });

        Ok(image)
    }

    fn remove_unused_cached_external_images(state: &mut RasterState, raster_id: usize) {
        state
            .cached_external_images
            .retain(|cached| cached.last_raster_id >= raster_id);
    }

    fn blit_delta_bitmap_to_output(
        delta_bitmap: &Arc<dyn Bitmap>,
        output_bitmap: &Arc<dyn Bitmap>,
        bitmap_info: &BitmapInfo,
        full_replace: bool,
    ) -> Result<(), RasterError> {
        if full_replace {
            blit::copy_bitmap_bytes(delta_bitmap, output_bitmap, bitmap_info)
        } else {
            blit::blend_bitmap_src_over(delta_bitmap, output_bitmap, bitmap_info)
        }
    }
}

impl std::fmt::Debug for RasterContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterContext")
            .field("rasterization", &self.rasterization)
            .field("delta_enabled", &self.delta_rasterization_enabled)
            .finish()
    }
}
