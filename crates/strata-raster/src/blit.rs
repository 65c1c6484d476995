//! Pixel transfers from the internal delta bitmap to the caller's bitmap.

use std::sync::Arc;

use strata_painting::{AlphaType, Bitmap, BitmapInfo, ColorType, RasterError};

/// Copies the whole buffer byte for byte.
pub(crate) fn copy_bitmap_bytes(
    source: &Arc<dyn Bitmap>,
    destination: &Arc<dyn Bitmap>,
    info: &BitmapInfo,
) -> Result<(), RasterError> {
    let bytes_len = info.bytes_len();
    let mut copied = false;

    let locked = source.with_bytes(&mut |source_bytes| {
        copied = destination.with_bytes(&mut |destination_bytes| {
            destination_bytes[..bytes_len].copy_from_slice(&source_bytes[..bytes_len]);
        });
    });

    if !locked || !copied {
        return Err(RasterError::BitmapLockFailed);
    }

    Ok(())
}

/// Blends the source over the destination row by row, assuming
/// premultiplied 32-bit RGBA or BGRA. Both layouts keep alpha in the fourth
/// byte, so one code path covers them.
pub(crate) fn blend_bitmap_src_over(
    source: &Arc<dyn Bitmap>,
    destination: &Arc<dyn Bitmap>,
    info: &BitmapInfo,
) -> Result<(), RasterError> {
    if info.alpha_type != AlphaType::Premul {
        return Err(RasterError::BitmapFormatUnsupported);
    }
    if info.color_type != ColorType::Rgba8888 && info.color_type != ColorType::Bgra8888 {
        return Err(RasterError::BitmapFormatUnsupported);
    }

    let width = info.width as usize;
    let height = info.height as usize;
    let row_bytes = info.row_bytes;
    let mut blended = false;

    let locked = source.with_bytes(&mut |source_bytes| {
        blended = destination.with_bytes(&mut |destination_bytes| {
            for row in 0..height {
                let offset = row * row_bytes;
                blend_row_src_over(
                    &source_bytes[offset..offset + width * 4],
                    &mut destination_bytes[offset..offset + width * 4],
                );
            }
        });
    });

    if !locked || !blended {
        return Err(RasterError::BitmapLockFailed);
    }

    Ok(())
}

fn blend_row_src_over(source: &[u8], destination: &mut [u8]) {
    for (source_pixel, destination_pixel) in
        source.chunks_exact(4).zip(destination.chunks_exact_mut(4))
    {
        let alpha = source_pixel[3];

        if alpha == 0xFF {
            destination_pixel.copy_from_slice(source_pixel);
        } else if alpha != 0 {
            let inverse = u32::from(0xFF - alpha);
            for channel in 0..4 {
                let blended = u32::from(source_pixel[channel])
                    + (u32::from(destination_pixel[channel]) * inverse + 127) / 255;
                destination_pixel[channel] = blended.min(0xFF) as u8;
            }
        }
    }
}
