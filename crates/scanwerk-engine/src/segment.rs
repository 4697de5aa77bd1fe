// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background segmentation — knock out pixels close to a sampled paper colour.

use scanwerk_core::{PixelBuffer, Point, Rgb, SegmentConfig};
use tracing::{debug, instrument};

/// Largest possible RGB distance, `sqrt(3 * 255^2)`.
pub const MAX_COLOR_DISTANCE: f64 = 441.672_955_930_063_7;

/// Colour of the pixel containing `(x, y)` in buffer space.
///
/// Coordinates are floored. Anything outside the buffer (or NaN) yields
/// `None`: a stray click is not an error.
pub fn sample_color(buf: &PixelBuffer, x: f64, y: f64) -> Option<Rgb> {
    let (fx, fy) = (x.floor(), y.floor());
    if !(fx >= 0.0 && fy >= 0.0 && fx < buf.width() as f64 && fy < buf.height() as f64) {
        return None;
    }
    buf.pixel(fx as u32, fy as u32)
        .map(|[r, g, b, _]| Rgb::new(r, g, b))
}

/// [`sample_color`] at a CSS-space point shown at device pixel ratio `dpr`.
pub fn sample_color_at(buf: &PixelBuffer, point: Point, dpr: f64) -> Option<Rgb> {
    let p = point.scaled(dpr);
    sample_color(buf, p.x, p.y)
}

/// Euclidean distance in RGB space, in `0.0..=MAX_COLOR_DISTANCE`.
pub fn color_distance(a: Rgb, b: Rgb) -> f64 {
    let dr = a.r as f64 - b.r as f64;
    let dg = a.g as f64 - b.g as f64;
    let db = a.b as f64 - b.b as f64;
    (dr * dr + dg * dg + db * db).sqrt()
}

/// Hard alpha matte against a reference colour.
///
/// Tolerance is a slider value clamped into `0..=max_tolerance`; each step
/// widens the accepted RGB distance by `distance_per_step`. Matching pixels
/// become fully transparent and everything else is left as it was, so there
/// is no feathering. That suits flat, evenly lit paper but leaves halos on
/// shadowed or textured backgrounds.
#[derive(Debug, Clone, Copy, Default)]
pub struct Segmenter {
    config: SegmentConfig,
}

impl Segmenter {
    pub fn new(config: SegmentConfig) -> Self {
        Self { config }
    }

    /// Largest RGB distance still treated as background at `tolerance`.
    pub fn max_distance(&self, tolerance: f64) -> f64 {
        let tolerance = if tolerance.is_nan() {
            0.0
        } else {
            tolerance.clamp(0.0, self.config.max_tolerance)
        };
        tolerance * self.config.distance_per_step
    }

    /// Segmented copy of `buf`; the input is never modified.
    pub fn segment(&self, buf: &PixelBuffer, target: Rgb, tolerance: f64) -> PixelBuffer {
        let mut out = buf.clone();
        self.segment_in_place(&mut out, target, tolerance);
        out
    }

    /// Clear alpha on every pixel within range of `target`. Returns how many
    /// pixels matched.
    #[instrument(skip(self, buf), fields(width = buf.width(), height = buf.height()))]
    pub fn segment_in_place(&self, buf: &mut PixelBuffer, target: Rgb, tolerance: f64) -> usize {
        let max_distance = self.max_distance(tolerance);
        let mut matched = 0;
        for px in buf.pixels_mut() {
            if color_distance(Rgb::new(px[0], px[1], px[2]), target) <= max_distance {
                px[3] = 0;
                matched += 1;
            }
        }
        debug!(max_distance, matched, "Background segmented");
        matched
    }
}

/// Segment with the default slider mapping (0..=50, 4.41 per step).
pub fn segment(buf: &PixelBuffer, target: Rgb, tolerance: f64) -> PixelBuffer {
    Segmenter::default().segment(buf, target, tolerance)
}

/// In-place [`segment`] for hot paths.
pub fn segment_in_place(buf: &mut PixelBuffer, target: Rgb, tolerance: f64) -> usize {
    Segmenter::default().segment_in_place(buf, target, tolerance)
}
