// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How the rectifier samples the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resampling {
    /// Round the back-projected coordinate to the nearest source pixel.
    #[default]
    Nearest,
    /// Blend the four surrounding source pixels.
    Bilinear,
}

/// Perspective rectification settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectifyConfig {
    /// Smallest accepted output side, in buffer pixels.
    pub min_side: u32,
    /// Largest accepted output side, in buffer pixels.
    pub max_side: u32,
    pub resampling: Resampling,
}

impl Default for RectifyConfig {
    fn default() -> Self {
        Self {
            min_side: 50,
            max_side: 5000,
            resampling: Resampling::Nearest,
        }
    }
}

/// Background segmentation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// RGB distance covered by one tolerance step. At the default of 4.41 a
    /// tolerance of 50 spans roughly half the largest possible distance.
    pub distance_per_step: f64,
    /// Upper bound of the tolerance slider.
    pub max_tolerance: f64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            distance_per_step: 4.41,
            max_tolerance: 50.0,
        }
    }
}

/// Settings handed to the engine by its host.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub rectify: RectifyConfig,
    pub segment: SegmentConfig,
    /// Host-owned default export location. The engine never reads it.
    pub default_save_location: Option<String>,
}

impl ScanConfig {
    /// Parse a JSON document; absent fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_limits() {
        let cfg = ScanConfig::default();
        assert_eq!(cfg.rectify.min_side, 50);
        assert_eq!(cfg.rectify.max_side, 5000);
        assert_eq!(cfg.rectify.resampling, Resampling::Nearest);
        assert!((cfg.segment.distance_per_step - 4.41).abs() < f64::EPSILON);
        assert!(cfg.default_save_location.is_none());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = ScanConfig::from_json_str(r#"{"rectify": {"resampling": "bilinear"}}"#)
            .expect("valid config");
        assert_eq!(cfg.rectify.resampling, Resampling::Bilinear);
        assert_eq!(cfg.rectify.min_side, 50);
        assert_eq!(cfg.segment, SegmentConfig::default());
    }

    #[test]
    fn json_round_trip_preserves_save_location() {
        let cfg = ScanConfig {
            default_save_location: Some("Scans/Inbox".into()),
            ..ScanConfig::default()
        };
        let json = cfg.to_json_string().expect("serializes");
        assert_eq!(ScanConfig::from_json_str(&json).expect("parses"), cfg);
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let err = ScanConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, crate::ScanError::Serialization(_)));
    }
}
