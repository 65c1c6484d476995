//! # Strata
//!
//! A retained-layer 2D rendering core: a layer tree renders into a typed
//! display list, the compositor splits that list across planes so external
//! (host-owned) surfaces stack correctly between engine content, and the
//! raster context turns the result into pixels, redrawing only damaged
//! regions when delta rasterization is on.
//!
//! ```text
//! LayerTree ─▶ DisplayList ─▶ Compositor ─▶ (DisplayList, PlaneList) ─▶ RasterContext ─▶ Bitmap
//! ```
//!
//! The crates compose bottom-up:
//!
//! - [`strata_types`]: geometry, color, matrices, paths
//! - [`strata_painting`]: paints, the canvas seam, drawing contexts and the
//!   display list
//! - [`strata_layer`]: the retained layer tree and the compositor
//! - [`strata_raster`]: damage resolution and rasterization

pub use strata_layer as layer;
pub use strata_painting as painting;
pub use strata_raster as raster;
pub use strata_types as types;

/// Commonly used types, re-exported flat.
pub mod prelude {
    pub use strata_layer::{
        Animation, CompositionState, Compositor, CompositorPlane, DrawMetrics, EventId,
        GestureRecognizer, LayerRoot, LayerTree, MaskLayer, MaskPositioning, NodeId,
        PaintMaskLayer, PlaneList,
    };
    pub use strata_painting::{
        Bitmap, BitmapFactory, BitmapInfo, BlendMode, Canvas, ColorType, DisplayList,
        DisplayListVisitor, DrawingContext, ExternalSurface, ExternalSurfaceSnapshot, Image,
        LayerContent, Mask, MemoryBitmap, Paint, Picture, PictureRecorder, PresenterState,
        RasterError,
    };
    pub use strata_raster::{
        DamageResolver, DrawableSurface, DrawableSurfaceFactory, ExternalSurfaceRasterization,
        RasterContext, RasterResult,
    };
    pub use strata_types::{
        BorderRadius, BoundingBoxIndex, Color, FittingMode, Matrix, Path, Point, Rect, Scalar,
        Size, TimePoint, Vector,
    };
}
