// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Interop between `PixelBuffer` and the `image` crate, plus lossless
// quarter-turn rotation for the host's rotate gesture.

use image::{DynamicImage, RgbaImage, imageops};
use scanwerk_core::PixelBuffer;
use scanwerk_core::error::{Result, ScanError};
use tracing::debug;

/// Copy into an `image::RgbaImage` (for encoding or display by the host).
pub fn to_rgba_image(buf: &PixelBuffer) -> Result<RgbaImage> {
    RgbaImage::from_raw(buf.width(), buf.height(), buf.data().to_vec()).ok_or_else(|| {
        ScanError::Image(format!(
            "buffer of {} bytes does not fit {}x{} RGBA",
            buf.data().len(),
            buf.width(),
            buf.height()
        ))
    })
}

/// Take ownership of an `image::RgbaImage`'s pixels.
pub fn from_rgba_image(image: RgbaImage) -> Result<PixelBuffer> {
    let (width, height) = image.dimensions();
    PixelBuffer::from_raw(width, height, image.into_raw())
}

/// Convert any decoded image to straight-alpha RGBA8.
pub fn from_dynamic(image: &DynamicImage) -> Result<PixelBuffer> {
    from_rgba_image(image.to_rgba8())
}

/// Rotate 90 degrees clockwise; width and height swap.
pub fn rotate_clockwise(buf: &PixelBuffer) -> Result<PixelBuffer> {
    let rotated = imageops::rotate90(&to_rgba_image(buf)?);
    debug!(width = rotated.width(), height = rotated.height(), "Rotated clockwise");
    from_rgba_image(rotated)
}

/// Rotate 90 degrees counter-clockwise; width and height swap.
pub fn rotate_counter_clockwise(buf: &PixelBuffer) -> Result<PixelBuffer> {
    let rotated = imageops::rotate270(&to_rgba_image(buf)?);
    debug!(width = rotated.width(), height = rotated.height(), "Rotated counter-clockwise");
    from_rgba_image(rotated)
}
