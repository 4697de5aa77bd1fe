// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectifier — maps the user's crop quadrilateral onto an
// axis-aligned rectangle.

use imageproc::geometric_transformations::Projection;
use scanwerk_core::error::{Result, ScanError};
use scanwerk_core::{CHANNELS, Dimensions, OrderedQuad, PixelBuffer, Point, RectifyConfig, Resampling};
use tracing::{debug, info, instrument, warn};

use crate::crop::{self, check_dpr};
use crate::geometry::shoelace_area;

/// Written wherever the back-projected coordinate misses the source image.
const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Quadrilaterals smaller than this (square CSS pixels) cannot be inverted
/// reliably.
const MIN_QUAD_AREA: f64 = 1.0;

/// A successfully rectified image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rectified {
    pub buffer: PixelBuffer,
    pub dimensions: Dimensions,
}

/// Rectifies crop quadrilaterals with a fixed set of size limits and a
/// resampling mode.
///
/// ## Pipeline
///
/// 1. Require four finite crop points
/// 2. Order them as `[TL, TR, BL, BR]`
/// 3. Size the output from the longer of each pair of opposite edges
/// 4. Reject outputs outside `min_side..=max_side`
/// 5. Build the quad-to-rectangle projection and invert it
/// 6. Walk every destination pixel, back-project into the source and sample
///
/// Destination pixels that land outside the source become fully transparent
/// rather than black so hosts can composite the result over any background.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rectifier {
    config: RectifyConfig,
}

impl Rectifier {
    pub fn new(config: RectifyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RectifyConfig {
        &self.config
    }

    /// Rectify the region of `source` outlined by `quad` (CSS coordinates).
    ///
    /// `dpr` converts CSS coordinates into `source` pixel indices.
    #[instrument(skip(self, source, quad), fields(src_w = source.width(), src_h = source.height()))]
    pub fn rectify(&self, source: &PixelBuffer, quad: &[Point], dpr: f64) -> Result<Rectified> {
        if quad.len() != 4 {
            warn!(points = quad.len(), "Rectify called without four crop points");
            return Err(ScanError::WrongPointCount { got: quad.len() });
        }
        if !crop::validate(quad) {
            warn!("Rectify called with non-finite crop points");
            return Err(ScanError::NonFiniteCoordinates);
        }
        check_dpr(dpr)?;

        let ordered = crop::order(quad)?;
        let dims = crop::output_dimensions(&ordered.to_array(), dpr)?;
        self.check_bounds(dims)?;

        let inverse = inverse_projection(&ordered, dims)?;
        debug!(out_w = dims.width, out_h = dims.height, "Inverse projection built");

        let buffer = match self.config.resampling {
            Resampling::Nearest => resample_nearest(source, &inverse, dims, dpr),
            Resampling::Bilinear => resample_bilinear(source, &inverse, dims, dpr),
        };

        info!(
            out_w = dims.width,
            out_h = dims.height,
            resampling = ?self.config.resampling,
            "Perspective correction applied"
        );
        Ok(Rectified {
            buffer,
            dimensions: dims,
        })
    }

    fn check_bounds(&self, dims: Dimensions) -> Result<()> {
        let RectifyConfig {
            min_side, max_side, ..
        } = self.config;
        if dims.width < min_side || dims.height < min_side {
            warn!(%dims, min_side, "Crop area too small");
            return Err(ScanError::CropTooSmall {
                width: dims.width,
                height: dims.height,
                min: min_side,
            });
        }
        if dims.width > max_side || dims.height > max_side {
            warn!(%dims, max_side, "Crop area too large");
            return Err(ScanError::CropTooLarge {
                width: dims.width,
                height: dims.height,
                max: max_side,
            });
        }
        Ok(())
    }
}

/// Rectify with the default limits (50..=5000 px) and nearest-neighbour
/// sampling.
pub fn rectify(source: &PixelBuffer, quad: &[Point], dpr: f64) -> Result<Rectified> {
    Rectifier::default().rectify(source, quad, dpr)
}

/// Destination-to-source mapping for `quad` rectified into `dims`.
///
/// The forward projection sends the ordered corners to `(0,0)`, `(w,0)`,
/// `(0,h)`, `(w,h)` in CSS space; the returned projection is its inverse, so
/// resampling can iterate destination pixels and never leaves holes.
fn inverse_projection(quad: &OrderedQuad, dims: Dimensions) -> Result<Projection> {
    // Boundary order for the area test: TL, TR, BR, BL.
    let area = shoelace_area(&[
        quad.top_left,
        quad.top_right,
        quad.bottom_right,
        quad.bottom_left,
    ]);
    if area < MIN_QUAD_AREA {
        warn!(area, "Degenerate crop quadrilateral");
        return Err(ScanError::DegenerateQuad(format!(
            "enclosed area is {area:.2} square pixels"
        )));
    }

    let from = quad.to_array().map(|p| (p.x as f32, p.y as f32));
    let (w, h) = (dims.width as f32, dims.height as f32);
    let to = [(0.0, 0.0), (w, 0.0), (0.0, h), (w, h)];

    let forward = Projection::from_control_points(from, to).ok_or_else(|| {
        warn!("Failed to compute projective transform");
        ScanError::DegenerateQuad("no projective transform fits these corners".into())
    })?;
    let inverse = forward.invert();

    // A singular solution shows up as non-finite output at the corners.
    let corners_finite = to.iter().all(|&(x, y)| {
        let (sx, sy) = inverse * (x, y);
        sx.is_finite() && sy.is_finite()
    });
    if !corners_finite {
        warn!("Inverse projection produced non-finite coordinates");
        return Err(ScanError::DegenerateQuad(
            "the perspective transform cannot be inverted".into(),
        ));
    }
    Ok(inverse)
}

/// Back-project destination pixel `(x, y)` into source buffer space.
#[inline]
fn source_coords(inverse: &Projection, x: u32, y: u32, dpr: f64) -> (f64, f64) {
    let (sx, sy) = *inverse * (x as f32, y as f32);
    (sx as f64 * dpr, sy as f64 * dpr)
}

/// Nearest source pixel for a buffer-space coordinate, if it lies inside.
///
/// Ties round away from zero, so `-0.5` misses the image and `w - 0.5`
/// lands on `w`, also outside.
#[inline]
fn nearest_index(source: &PixelBuffer, sx: f64, sy: f64) -> Option<(u32, u32)> {
    if !(sx.is_finite() && sy.is_finite()) {
        return None;
    }
    let (rx, ry) = (sx.round(), sy.round());
    let in_bounds =
        rx >= 0.0 && ry >= 0.0 && rx < source.width() as f64 && ry < source.height() as f64;
    in_bounds.then_some((rx as u32, ry as u32))
}

fn resample_nearest(
    source: &PixelBuffer,
    inverse: &Projection,
    dims: Dimensions,
    dpr: f64,
) -> PixelBuffer {
    let mut out = PixelBuffer::new(dims.width, dims.height);
    let src = source.data();
    let mut chunks = out.pixels_mut();
    for y in 0..dims.height {
        for x in 0..dims.width {
            let Some(dst) = chunks.next() else { continue };
            let (sx, sy) = source_coords(inverse, x, y, dpr);
            match nearest_index(source, sx, sy).and_then(|(ix, iy)| source.offset(ix, iy)) {
                Some(i) => dst.copy_from_slice(&src[i..i + CHANNELS]),
                None => dst.copy_from_slice(&TRANSPARENT),
            }
        }
    }
    out
}

/// Same coverage as nearest-neighbour, but blends the 2x2 neighbourhood.
fn resample_bilinear(
    source: &PixelBuffer,
    inverse: &Projection,
    dims: Dimensions,
    dpr: f64,
) -> PixelBuffer {
    let mut out = PixelBuffer::new(dims.width, dims.height);
    let mut chunks = out.pixels_mut();
    for y in 0..dims.height {
        for x in 0..dims.width {
            let Some(dst) = chunks.next() else { continue };
            let (sx, sy) = source_coords(inverse, x, y, dpr);
            if nearest_index(source, sx, sy).is_none() {
                dst.copy_from_slice(&TRANSPARENT);
                continue;
            }

            dst.copy_from_slice(&bilinear_sample(source, sx, sy));
        }
    }
    out
}

/// Blend the 2x2 neighbourhood around a buffer-space coordinate. The
/// coordinate is clamped to the pixel centres at the image border.
fn bilinear_sample(source: &PixelBuffer, sx: f64, sy: f64) -> [u8; 4] {
    let (max_x, max_y) = (
        source.width().saturating_sub(1) as f64,
        source.height().saturating_sub(1) as f64,
    );
    let (cx, cy) = (sx.clamp(0.0, max_x), sy.clamp(0.0, max_y));
    let (x0, y0) = (cx.floor(), cy.floor());
    let (fx, fy) = (cx - x0, cy - y0);
    let (x0, y0) = (x0 as u32, y0 as u32);
    let x1 = (x0 + 1).min(max_x as u32);
    let y1 = (y0 + 1).min(max_y as u32);

    let px = |ix, iy| source.pixel(ix, iy).unwrap_or(TRANSPARENT);
    let (p00, p10, p01, p11) = (px(x0, y0), px(x1, y0), px(x0, y1), px(x1, y1));
    let mut out = [0u8; 4];
    for c in 0..CHANNELS {
        let top = p00[c] as f64 * (1.0 - fx) + p10[c] as f64 * fx;
        let bottom = p01[c] as f64 * (1.0 - fx) + p11[c] as f64 * fx;
        out[c] = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
    }
    out
}
