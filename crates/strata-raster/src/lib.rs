//! # Strata Raster
//!
//! Turns resolved display lists into pixels:
//!
//! - [`RasterContext`]: runs the compositor when needed, rasterizes planes
//!   through the backend's [`DrawableSurfaceFactory`], caches rasterized
//!   external surfaces, and supports delta rasterization that redraws only
//!   damaged regions
//! - [`DamageResolver`]: diffs consecutive frames' display lists into the
//!   minimum set of changed rectangles
//!
//! Errors surface as [`RasterError`](strata_painting::RasterError); a
//! failed raster call leaves the caller's bitmap untouched or partially
//! drawn but never panics.

mod blit;
pub mod context;
pub mod damage;

pub use context::{
    DrawableSurface, DrawableSurfaceFactory, ExternalSurfaceRasterization, RasterContext,
    RasterResult,
};
pub use damage::DamageResolver;
pub use strata_painting::RasterError;
