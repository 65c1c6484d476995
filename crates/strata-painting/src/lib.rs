//! # Strata Painting
//!
//! The painting layer of the Strata rendering core:
//!
//! - [`Paint`] and its blend/stroke/filter parameters
//! - The [`Canvas`] seam to the 2D graphics backend, with [`Picture`]
//!   recording for cached layer contents
//! - [`Bitmap`]/[`BitmapFactory`] traits over host pixel buffers
//! - [`ExternalSurface`] handles for host-owned (platform view) surfaces
//! - [`DrawingContext`], the per-layer-part recorder producing
//!   [`LayerContent`]
//! - The [`DisplayList`]: a typed, append-only op stream grouped into
//!   planes, with playback, plane management and debug JSON dumps
//!
//! ```text
//! Layer tree ──draw──▶ DisplayList ──compositor──▶ planes ──raster──▶ Bitmap
//! ```

pub mod bitmap;
pub mod box_shadow;
pub mod canvas;
pub mod context;
pub mod display_list;
pub mod error;
pub mod gradient;
pub mod lazy_path;
pub mod mask;
pub mod paint;
pub mod surface;

pub use bitmap::{AlphaType, Bitmap, BitmapFactory, BitmapInfo, ColorType, Image, MemoryBitmap};
pub use box_shadow::BoxShadow;
pub use canvas::{Canvas, Picture, PictureOp, PictureRecorder, RecordingCanvas};
pub use context::{DrawingContext, LayerContent};
pub use display_list::ops::{
    ApplyMaskOp, ClipRectOp, ClipRoundOp, DisplayListVisitor, DrawExternalSurfaceOp, DrawPictureOp,
    Op, PrepareMaskOp, PushContextOp,
};
pub use display_list::DisplayList;
pub use error::RasterError;
pub use gradient::{
    GradientBacking, GradientKind, LinearGradient, LinearGradientOrientation, RadialGradient,
};
pub use lazy_path::LazyPath;
pub use mask::{CompositeMask, Mask, PaintMask};
pub use paint::{BlendMode, BlurStyle, MaskFilter, Paint, Shader, StrokeCap, StrokeJoin};
pub use surface::{ExternalSurface, ExternalSurfaceSnapshot, PresenterState};
