// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// scanwerk-engine — Geometric and photometric correction for photographed pages.
//
// Provides crop-point ordering and sizing, perspective rectification, a
// brightness/contrast/saturation/black-and-white filter pipeline, colour-
// distance background removal, and an editing session tying them together.
// Every operation is a synchronous function over caller-owned buffers.

pub mod crop;
pub mod filters;
pub mod geometry;
pub mod raster;
pub mod rectify;
pub mod segment;
pub mod session;

// Re-export the primary types so callers can use `scanwerk_engine::Rectifier` etc.
pub use rectify::{Rectified, Rectifier, rectify};
pub use segment::{Segmenter, color_distance, sample_color, segment};
pub use session::ScanSession;
