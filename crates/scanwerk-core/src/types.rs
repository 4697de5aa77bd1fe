// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Scanwerk correction engine.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};

/// Bytes per RGBA pixel.
pub const CHANNELS: usize = 4;

/// A point in device-independent (CSS) pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite (not NaN or infinite).
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Scale into buffer pixel space by a device pixel ratio.
    pub fn scaled(&self, dpr: f64) -> Self {
        Self::new(self.x * dpr, self.y * dpr)
    }
}

/// An axis-aligned rectangle in CSS pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// The four crop corners in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderedQuad {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_left: Point,
    pub bottom_right: Point,
}

impl OrderedQuad {
    /// Corners as `[TL, TR, BL, BR]`.
    pub fn to_array(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_left,
            self.bottom_right,
        ]
    }
}

/// Output size in buffer pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// An opaque colour sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Slider state for the photometric filter pipeline.
///
/// Each slider ranges over `-100..=100`; zero everywhere (the default) is the
/// identity transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    pub brightness: i32,
    pub contrast: i32,
    pub saturation: i32,
    pub black_and_white: bool,
}

impl FilterConfig {
    /// Copy of this config with every slider clamped into `-100..=100`.
    pub fn clamped(&self) -> Self {
        Self {
            brightness: self.brightness.clamp(-100, 100),
            contrast: self.contrast.clamp(-100, 100),
            saturation: self.saturation.clamp(-100, 100),
            black_and_white: self.black_and_white,
        }
    }
}

/// Dense row-major RGBA8 buffer with straight (non-premultiplied) alpha.
///
/// The invariant `data.len() == width * height * 4` holds for every value of
/// this type; the fields are private so it cannot be broken from outside.
/// `Clone` is a deep copy and never shares storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Allocate a fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; byte_len(width, height)],
        }
    }

    /// Allocate a buffer where every pixel is `rgba`.
    pub fn from_pixel(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(byte_len(width, height));
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Wrap existing RGBA bytes, checking the length invariant.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = byte_len(width, height);
        if data.len() != expected {
            return Err(ScanError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Byte offset of pixel `(x, y)`, or `None` outside the buffer.
    pub fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| (y as usize * self.width as usize + x as usize) * CHANNELS)
    }

    /// RGBA value at `(x, y)`, or `None` outside the buffer.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.offset(x, y).map(|i| {
            let mut px = [0u8; 4];
            px.copy_from_slice(&self.data[i..i + CHANNELS]);
            px
        })
    }

    /// Overwrite pixel `(x, y)`. Returns `false` if it lies outside the buffer.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) -> bool {
        match self.offset(x, y) {
            Some(i) => {
                self.data[i..i + CHANNELS].copy_from_slice(&rgba);
                true
            }
            None => false,
        }
    }

    /// Iterate pixels as mutable 4-byte chunks.
    pub fn pixels_mut(&mut self) -> std::slice::ChunksExactMut<'_, u8> {
        self.data.chunks_exact_mut(CHANNELS)
    }

    /// Iterate pixels as 4-byte chunks.
    pub fn pixels(&self) -> std::slice::ChunksExact<'_, u8> {
        self.data.chunks_exact(CHANNELS)
    }
}

fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * CHANNELS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_rejects_wrong_length() {
        let err = PixelBuffer::from_raw(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(
            err,
            ScanError::BufferSizeMismatch {
                expected: 16,
                actual: 15
            }
        ));
    }

    #[test]
    fn pixel_access_is_bounds_checked() {
        let mut buf = PixelBuffer::new(3, 2);
        assert!(buf.set_pixel(2, 1, [1, 2, 3, 4]));
        assert!(!buf.set_pixel(3, 0, [9, 9, 9, 9]));
        assert_eq!(buf.pixel(2, 1), Some([1, 2, 3, 4]));
        assert_eq!(buf.pixel(0, 2), None);
        assert_eq!(buf.offset(2, 1), Some(20));
    }

    #[test]
    fn clone_does_not_share_storage() {
        let original = PixelBuffer::from_pixel(2, 2, [10, 20, 30, 255]);
        let mut copy = original.clone();
        copy.set_pixel(0, 0, [0, 0, 0, 0]);
        assert_eq!(original.pixel(0, 0), Some([10, 20, 30, 255]));
        assert_ne!(original.data().as_ptr(), copy.data().as_ptr());
    }

    #[test]
    fn filter_config_default_is_identity_and_clamps() {
        let cfg = FilterConfig::default();
        assert_eq!(cfg.brightness, 0);
        assert!(!cfg.black_and_white);

        let wild = FilterConfig {
            brightness: 250,
            contrast: -300,
            saturation: 5,
            black_and_white: true,
        };
        let tamed = wild.clamped();
        assert_eq!(tamed.brightness, 100);
        assert_eq!(tamed.contrast, -100);
        assert_eq!(tamed.saturation, 5);
        assert!(tamed.black_and_white);
    }

    #[test]
    fn ordered_quad_array_order() {
        let quad = OrderedQuad {
            top_left: Point::new(0.0, 0.0),
            top_right: Point::new(1.0, 0.0),
            bottom_left: Point::new(0.0, 1.0),
            bottom_right: Point::new(1.0, 1.0),
        };
        assert_eq!(quad.to_array()[2], Point::new(0.0, 1.0));
    }
}
