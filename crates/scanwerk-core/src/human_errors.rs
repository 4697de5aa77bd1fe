// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the scanning UI.
//
// Every engine error is mapped to a short heading plus a concrete suggestion.
// The severity drives how the host presents it.

use crate::error::ScanError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The user can fix it by adjusting the crop, sliders, or selection.
    ActionRequired,
    /// Retrying with the same input will not help (bad file, wrong format).
    Permanent,
    /// A bug or environment problem; worth reporting.
    Internal,
}

/// A human-readable error with a plain English message and a suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert a `ScanError` into a `HumanError` fit for a dialog or toast.
pub fn humanize_error(err: &ScanError) -> HumanError {
    match err {
        ScanError::WrongPointCount { .. } | ScanError::NonFiniteCoordinates => HumanError {
            message: "The crop corners aren't ready yet.".into(),
            suggestion: "Place all four corner handles on the page, then tap Apply.".into(),
            severity: Severity::ActionRequired,
        },

        ScanError::CropTooSmall { width, height, min } => HumanError {
            message: err.to_string(),
            suggestion: format!(
                "The selected area is only {width}x{height} pixels. Drag the corners further apart (at least {min} pixels each way)."
            ),
            severity: Severity::ActionRequired,
        },

        ScanError::CropTooLarge { width, height, max } => HumanError {
            message: err.to_string(),
            suggestion: format!(
                "The selected area would be {width}x{height} pixels. Pull the corners closer together (at most {max} pixels each way)."
            ),
            severity: Severity::ActionRequired,
        },

        ScanError::DegenerateQuad(_) => HumanError {
            message: "The crop corners don't outline a page.".into(),
            suggestion: "Move the corners so they surround the page without crossing or lining up.".into(),
            severity: Severity::ActionRequired,
        },

        ScanError::CropModeInactive => HumanError {
            message: "Cropping hasn't been started.".into(),
            suggestion: "Tap Crop first, then adjust the corners.".into(),
            severity: Severity::ActionRequired,
        },

        ScanError::CropPointIndex(_) | ScanError::InvalidPixelRatio(_) => HumanError {
            message: "Something went wrong while editing the scan.".into(),
            suggestion: format!("Please report this problem. ({err})"),
            severity: Severity::Internal,
        },

        ScanError::BufferSizeMismatch { .. } | ScanError::Image(_) => HumanError {
            message: "This picture couldn't be processed.".into(),
            suggestion: "Try taking the photo again or choosing a different picture.".into(),
            severity: Severity::Permanent,
        },

        ScanError::Io(io) => HumanError {
            message: "The file couldn't be read or written.".into(),
            suggestion: format!("Check that the location exists and you have permission to use it. ({io})"),
            severity: Severity::Permanent,
        },

        ScanError::Serialization(_) => HumanError {
            message: "The settings file is damaged.".into(),
            suggestion: "Delete the settings file to restore the defaults.".into(),
            severity: Severity::Permanent,
        },
    }
}
