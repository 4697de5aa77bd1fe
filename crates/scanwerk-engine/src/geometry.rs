// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plane geometry helpers shared by the crop model and the rectifier.

use scanwerk_core::{Point, Rect};

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    (b.x - a.x).hypot(b.y - a.y)
}

/// Smallest axis-aligned rectangle containing every point, or `None` for an
/// empty slice.
pub fn bounding_rect(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
}

/// Area of a polygon with vertices in boundary order (CW or CCW), by the
/// shoelace formula.
pub fn shoelace_area(vertices: &[Point]) -> f64 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += vertices[i].x * vertices[j].y;
        twice_area -= vertices[j].x * vertices[i].y;
    }
    twice_area.abs() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_is_euclidean() {
        let d = distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0));
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn bounding_rect_covers_all_points() {
        let rect = bounding_rect(&[
            Point::new(5.0, 2.0),
            Point::new(-1.0, 7.0),
            Point::new(3.0, -4.0),
        ])
        .expect("non-empty");
        assert_eq!(rect, Rect::new(-1.0, -4.0, 6.0, 11.0));
        assert!(bounding_rect(&[]).is_none());
    }

    #[test]
    fn shoelace_area_rectangle() {
        let corners = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 5.0),
            Point::new(0.0, 5.0),
        ];
        assert!((shoelace_area(&corners) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn shoelace_area_collinear_is_zero() {
        let line = [
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(200.0, 0.0),
            Point::new(300.0, 0.0),
        ];
        assert_eq!(shoelace_area(&line), 0.0);
    }
}
