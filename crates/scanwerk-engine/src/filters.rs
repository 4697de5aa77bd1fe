// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Photometric filter pipeline — brightness/contrast, saturation and
// black-and-white conversion over RGBA buffers.
//
// Operators mutate the buffer in place and never touch alpha. Use
// `apply_cloned` (or `clone_buffer` first) when the caller's copy must survive.

use scanwerk_core::{FilterConfig, PixelBuffer};
use tracing::{debug, instrument};

/// Contrast pivots around this channel value.
const MIDPOINT: f64 = 128.0;

/// Binarization never uses a threshold below this.
const BW_THRESHOLD_FLOOR: f64 = 128.0;

/// Fraction of the mean luma used as the binarization threshold.
const BW_MEAN_BIAS: f64 = 0.85;

/// ITU-R BT.601 luma.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> f64 {
    0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64
}

#[inline]
fn to_channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Adjust contrast around the midpoint, then add brightness.
///
/// Both values range over `-100..=100`. Contrast scales by
/// `(contrast + 100) / 100`; brightness shifts by `brightness / 100 * 255`.
/// Contrast goes first, so a dark pixel pushed to 0 by contrast is then lifted
/// by brightness rather than the other way around.
pub fn brightness_contrast(buf: &mut PixelBuffer, brightness: i32, contrast: i32) {
    let brightness = brightness.clamp(-100, 100) as f64;
    let factor = (contrast.clamp(-100, 100) + 100) as f64 / 100.0;
    let shift = brightness / 100.0 * 255.0;

    let mut lut = [0u8; 256];
    for (v, out) in lut.iter_mut().enumerate() {
        *out = to_channel((v as f64 - MIDPOINT) * factor + MIDPOINT + shift);
    }

    for px in buf.pixels_mut() {
        px[0] = lut[px[0] as usize];
        px[1] = lut[px[1] as usize];
        px[2] = lut[px[2] as usize];
    }
}

/// Scale each channel's distance from the pixel's luma.
///
/// `saturation` ranges over `-100..=100`: -100 is pure grayscale, 0 is the
/// identity, 100 doubles colourfulness.
pub fn saturation(buf: &mut PixelBuffer, saturation: i32) {
    let factor = (saturation.clamp(-100, 100) + 100) as f64 / 100.0;
    for px in buf.pixels_mut() {
        let gray = luma(px[0], px[1], px[2]);
        for c in &mut px[..3] {
            *c = to_channel(gray + factor * (*c as f64 - gray));
        }
    }
}

/// Binarize to pure black and white with a single global threshold.
///
/// The threshold is `max(128, mean_luma * 0.85)`: light, paper-dominated
/// pages push it up so faint ink still reads as dark, but it never drops
/// below 128. This is a fixed formula, not Otsu or locally adaptive
/// thresholding.
pub fn black_and_white(buf: &mut PixelBuffer) {
    let count = buf.pixel_count();
    if count == 0 {
        return;
    }

    let total: f64 = buf.pixels().map(|px| luma(px[0], px[1], px[2])).sum();
    let mean = total / count as f64;
    let threshold = BW_THRESHOLD_FLOOR.max(mean * BW_MEAN_BIAS);
    debug!(mean, threshold, "Binarization threshold computed");

    for px in buf.pixels_mut() {
        let v = if luma(px[0], px[1], px[2]) <= threshold {
            0
        } else {
            255
        };
        px[0] = v;
        px[1] = v;
        px[2] = v;
    }
}

/// Whether `config` changes anything at all.
pub fn has_active_filters(config: &FilterConfig) -> bool {
    config.brightness != 0
        || config.contrast != 0
        || config.saturation != 0
        || config.black_and_white
}

/// Run the filter pipeline in place.
///
/// Fixed order:
///
/// 1. Black-and-white, if enabled. Saturation is then skipped since it has no
///    meaning on a binarized image.
/// 2. Otherwise saturation, if non-zero.
/// 3. Brightness/contrast last, if either is non-zero.
#[instrument(skip(buf), fields(width = buf.width(), height = buf.height()))]
pub fn apply(buf: &mut PixelBuffer, config: &FilterConfig) {
    let config = config.clamped();
    if !has_active_filters(&config) {
        return;
    }

    if config.black_and_white {
        black_and_white(buf);
    } else if config.saturation != 0 {
        saturation(buf, config.saturation);
    }

    if config.brightness != 0 || config.contrast != 0 {
        brightness_contrast(buf, config.brightness, config.contrast);
    }
    debug!("Filters applied");
}

/// Filtered copy of `buf`; the input is left untouched.
pub fn apply_cloned(buf: &PixelBuffer, config: &FilterConfig) -> PixelBuffer {
    let mut out = clone_buffer(buf);
    apply(&mut out, config);
    out
}

/// Deep copy sharing no storage with `buf`.
pub fn clone_buffer(buf: &PixelBuffer) -> PixelBuffer {
    buf.clone()
}
