//! Bitmap and image abstractions over host pixel buffers.

use std::sync::Arc;

use parking_lot::Mutex;
use strata_types::Scalar;

use crate::error::RasterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorType {
    Rgba8888,
    Bgra8888,
    Alpha8,
    Rgb565,
}

impl ColorType {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8888 | Self::Bgra8888 => 4,
            Self::Alpha8 => 1,
            Self::Rgb565 => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaType {
    Opaque,
    Premul,
    Unpremul,
}

/// Shape and layout of a pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapInfo {
    pub width: i32,
    pub height: i32,
    pub color_type: ColorType,
    pub alpha_type: AlphaType,
    pub row_bytes: usize,
}

impl BitmapInfo {
    pub fn new(width: i32, height: i32, color_type: ColorType, alpha_type: AlphaType) -> Self {
        Self {
            width,
            height,
            color_type,
            alpha_type,
            row_bytes: width.max(0) as usize * color_type.bytes_per_pixel(),
        }
    }

    /// Premultiplied 32-bit RGBA, the layout delta rasterization expects.
    pub fn rgba_premul(width: i32, height: i32) -> Self {
        Self::new(width, height, ColorType::Rgba8888, AlphaType::Premul)
    }

    #[inline]
    pub fn bytes_len(&self) -> usize {
        self.row_bytes * self.height.max(0) as usize
    }
}

/// A lockable pixel buffer owned by the host (or by the raster context for
/// its internal delta bitmap).
///
/// Locking is closure-scoped: `with_bytes` runs `f` with the raw bytes and
/// returns false when the lock could not be taken.
pub trait Bitmap: Send + Sync {
    fn info(&self) -> BitmapInfo;

    fn with_bytes(&self, f: &mut dyn FnMut(&mut [u8])) -> bool;
}

/// Allocates bitmaps on behalf of the core, e.g. for rasterizing external
/// surfaces.
pub trait BitmapFactory: Send + Sync {
    fn create_bitmap(&self, width: i32, height: i32) -> Result<Arc<dyn Bitmap>, RasterError>;
}

/// A heap-backed [`Bitmap`], used for the raster context's internal delta
/// buffer and by tests.
pub struct MemoryBitmap {
    info: BitmapInfo,
    bytes: Mutex<Vec<u8>>,
}

impl MemoryBitmap {
    pub fn new(info: BitmapInfo) -> Result<Self, RasterError> {
        if info.width <= 0 || info.height <= 0 {
            return Err(RasterError::BitmapAllocationFailed(format!(
                "invalid dimensions {}x{}",
                info.width, info.height
            )));
        }
        if info.row_bytes < info.width as usize * info.color_type.bytes_per_pixel() {
            return Err(RasterError::BitmapAllocationFailed(format!(
                "row bytes {} too small for width {}",
                info.row_bytes, info.width
            )));
        }

        Ok(Self {
            bytes: Mutex::new(vec![0; info.bytes_len()]),
            info,
        })
    }
}

impl std::fmt::Debug for MemoryBitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBitmap").field("info", &self.info).finish()
    }
}

impl Bitmap for MemoryBitmap {
    fn info(&self) -> BitmapInfo {
        self.info
    }

    fn with_bytes(&self, f: &mut dyn FnMut(&mut [u8])) -> bool {
        let mut bytes = self.bytes.lock();
        f(&mut bytes);
        true
    }
}

/// An immutable handle over a bitmap, drawable through a canvas.
#[derive(Clone)]
pub struct Image {
    bitmap: Arc<dyn Bitmap>,
}

impl Image {
    pub fn from_bitmap(bitmap: Arc<dyn Bitmap>) -> Self {
        Self { bitmap }
    }

    #[inline]
    pub fn width(&self) -> i32 {
        self.bitmap.info().width
    }

    #[inline]
    pub fn height(&self) -> i32 {
        self.bitmap.info().height
    }

    #[inline]
    pub fn size(&self) -> strata_types::Size {
        strata_types::Size::new(self.width() as Scalar, self.height() as Scalar)
    }

    #[inline]
    pub fn bitmap(&self) -> &Arc<dyn Bitmap> {
        &self.bitmap
    }
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}
