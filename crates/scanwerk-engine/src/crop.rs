// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Crop-point model — placing, validating and ordering the four corners of the
// document quadrilateral, and sizing the rectified output from them.

use scanwerk_core::error::{Result, ScanError};
use scanwerk_core::{Dimensions, OrderedQuad, Point, Rect};

use crate::geometry::distance;

/// Middle corners whose y coordinates differ by more than this (CSS pixels)
/// are ordered by y; closer than that, y is noise and x decides.
pub const ORDER_Y_THRESHOLD: f64 = 10.0;

/// Corners of `rect` as `[TL, TR, BL, BR]`.
pub fn initialize(rect: Rect) -> [Point; 4] {
    let right = rect.x + rect.width;
    let bottom = rect.y + rect.height;
    [
        Point::new(rect.x, rect.y),
        Point::new(right, rect.y),
        Point::new(rect.x, bottom),
        Point::new(right, bottom),
    ]
}

/// True iff there are exactly four points and every coordinate is finite.
///
/// A `false` means "not ready", not a failure.
pub fn validate(points: &[Point]) -> bool {
    points.len() == 4 && points.iter().all(Point::is_finite)
}

/// Put four unordered corners into canonical `[TL, TR, BL, BR]` form.
///
/// `x + y` ranks how top-left a corner is, so the minimum is top-left and the
/// maximum is bottom-right. The remaining pair is split by y when they are
/// more than [`ORDER_Y_THRESHOLD`] apart vertically (upper one is top-right),
/// otherwise by x (rightmost is top-right).
pub fn order(points: &[Point]) -> Result<OrderedQuad> {
    let mut sorted: [Point; 4] = points
        .try_into()
        .map_err(|_| ScanError::WrongPointCount { got: points.len() })?;
    sorted.sort_by(|a, b| (a.x + a.y).total_cmp(&(b.x + b.y)));

    let (a, b) = (sorted[1], sorted[2]);
    let a_is_top_right = if (a.y - b.y).abs() > ORDER_Y_THRESHOLD {
        a.y < b.y
    } else {
        a.x >= b.x
    };
    let (top_right, bottom_left) = if a_is_top_right { (a, b) } else { (b, a) };

    Ok(OrderedQuad {
        top_left: sorted[0],
        top_right,
        bottom_left,
        bottom_right: sorted[3],
    })
}

/// Output size in buffer pixels for a quadrilateral in `[TL, TR, BL, BR]`
/// slots.
///
/// Points are read positionally and are not reordered here; pass the result
/// of [`order`] (or use [`ordered_output_dimensions`]) when the slots may be
/// shuffled. Each side takes the longer of its two opposite edges so a
/// trapezoid never loses content.
pub fn output_dimensions(points: &[Point], dpr: f64) -> Result<Dimensions> {
    let [p0, p1, p2, p3]: [Point; 4] = points
        .try_into()
        .map_err(|_| ScanError::WrongPointCount { got: points.len() })?;

    let top_width = distance(p0, p1);
    let bottom_width = distance(p2, p3);
    let left_height = distance(p0, p2);
    let right_height = distance(p1, p3);

    Ok(Dimensions::new(
        to_pixels(top_width.max(bottom_width) * dpr),
        to_pixels(left_height.max(right_height) * dpr),
    ))
}

/// [`order`] followed by [`output_dimensions`].
pub fn ordered_output_dimensions(points: &[Point], dpr: f64) -> Result<Dimensions> {
    let quad = order(points)?;
    output_dimensions(&quad.to_array(), dpr)
}

/// Reject device pixel ratios outside `[1, inf)`.
pub(crate) fn check_dpr(dpr: f64) -> Result<()> {
    if dpr.is_finite() && dpr >= 1.0 {
        Ok(())
    } else {
        Err(ScanError::InvalidPixelRatio(dpr))
    }
}

// Saturating float-to-int cast; NaN maps to 0.
fn to_pixels(length: f64) -> u32 {
    length.round() as u32
}
