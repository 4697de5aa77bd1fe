// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Scanwerk.
//
// Every message is written so a host can show it to the user verbatim.

use thiserror::Error;

/// Top-level error type for all Scanwerk operations.
#[derive(Debug, Error)]
pub enum ScanError {
    // -- Crop geometry --
    #[error("Need exactly 4 crop points (got {got}).")]
    WrongPointCount { got: usize },

    #[error("Crop points must have finite coordinates.")]
    NonFiniteCoordinates,

    #[error("Crop area too small. Minimum dimensions: {min}x{min} pixels.")]
    CropTooSmall { width: u32, height: u32, min: u32 },

    #[error("Crop area too large. Maximum dimensions: {max}x{max} pixels.")]
    CropTooLarge { width: u32, height: u32, max: u32 },

    #[error("Crop points do not form a valid quadrilateral: {0}")]
    DegenerateQuad(String),

    #[error("Device pixel ratio must be a finite number of at least 1 (got {0}).")]
    InvalidPixelRatio(f64),

    // -- Session state --
    #[error("Crop mode is not active.")]
    CropModeInactive,

    #[error("Crop point index {0} is out of range (expected 0..=3).")]
    CropPointIndex(usize),

    // -- Buffers --
    #[error("Pixel buffer size mismatch: expected {expected} bytes, got {actual}.")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("Image processing failed: {0}")]
    Image(String),

    // -- Host I/O --
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;
