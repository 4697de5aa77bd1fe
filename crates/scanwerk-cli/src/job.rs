// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Processing jobs — what to do to one photographed page, and running it.

use std::path::Path;

use scanwerk_core::{FilterConfig, Point, Rgb, ScanConfig, ScanError};
use scanwerk_engine::{ScanSession, raster};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Errors raised by the command-line host.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("image codec error: {0}")]
    Codec(#[from] image::ImageError),

    #[error("invalid {what}: {detail}")]
    Parse { what: &'static str, detail: String },

    #[error("background sample point ({x}, {y}) is outside the image")]
    SampleOutside { x: f64, y: f64 },
}

pub type CliResult<T> = Result<T, CliError>;

/// Background removal request. The reference colour is either given
/// directly or sampled from the (cropped, filtered) page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundJob {
    #[serde(default)]
    pub color: Option<Rgb>,
    #[serde(default)]
    pub sample_at: Option<Point>,
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

fn default_tolerance() -> f64 {
    10.0
}

fn default_dpr() -> f64 {
    1.0
}

/// Everything to do to one page, in order: crop, filter, remove background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Crop corners in CSS pixels, any order.
    #[serde(default)]
    pub corners: Option<Vec<Point>>,
    #[serde(default = "default_dpr")]
    pub dpr: f64,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub background: Option<BackgroundJob>,
}

impl Default for Job {
    fn default() -> Self {
        Self {
            corners: None,
            dpr: default_dpr(),
            filters: FilterConfig::default(),
            background: None,
        }
    }
}

impl Job {
    pub fn from_json_str(json: &str) -> CliResult<Self> {
        serde_json::from_str(json).map_err(|err| CliError::Scan(err.into()))
    }
}

/// Decode `input`, run `job` over it and write the result to `output` as PNG.
#[instrument(skip_all, fields(input = %input.display(), output = %output.display()))]
pub fn run(input: &Path, output: &Path, job: &Job, config: &ScanConfig) -> CliResult<()> {
    let decoded = image::open(input)?;
    let buffer = raster::from_dynamic(&decoded)?;
    info!(width = buffer.width(), height = buffer.height(), "Page decoded");

    let finished = process(buffer, job, config)?;

    raster::to_rgba_image(&finished)?.save_with_format(output, image::ImageFormat::Png)?;
    info!(
        width = finished.width(),
        height = finished.height(),
        "Page written"
    );
    Ok(())
}

/// Run `job` over an in-memory page.
pub fn process(
    buffer: scanwerk_core::PixelBuffer,
    job: &Job,
    config: &ScanConfig,
) -> CliResult<scanwerk_core::PixelBuffer> {
    let mut session = ScanSession::with_config(buffer, job.dpr, config.clone())?;

    if let Some(corners) = &job.corners {
        if corners.len() != 4 {
            return Err(ScanError::WrongPointCount { got: corners.len() }.into());
        }
        session.enter_crop_mode();
        for (index, point) in corners.iter().enumerate() {
            session.move_crop_point(index, *point)?;
        }
        let dims = session.apply_crop()?;
        info!(%dims, "Cropped");
    }

    session.set_filters(job.filters);
    session.commit_filters();

    if let Some(background) = &job.background {
        let target = match (background.color, background.sample_at) {
            (Some(color), _) => color,
            (None, Some(point)) => session.sample_background(point).ok_or(
                CliError::SampleOutside {
                    x: point.x,
                    y: point.y,
                },
            )?,
            (None, None) => {
                warn!("Background removal requested without a colour; sampling the top-left pixel");
                session
                    .sample_background(Point::new(0.0, 0.0))
                    .ok_or(CliError::SampleOutside { x: 0.0, y: 0.0 })?
            }
        };
        session.preview_segmentation(target, background.tolerance);
        session.commit_segmentation();
        info!(?target, tolerance = background.tolerance, "Background removed");
    }

    Ok(session.into_image())
}

/// Parse `x,y;x,y;x,y;x,y`.
pub fn parse_corners(text: &str) -> CliResult<Vec<Point>> {
    text.split(';').map(parse_point).collect()
}

/// Parse `x,y`.
pub fn parse_point(text: &str) -> CliResult<Point> {
    let parse_err = || CliError::Parse {
        what: "point",
        detail: format!("expected x,y but got {text:?}"),
    };
    let (x, y) = text.trim().split_once(',').ok_or_else(parse_err)?;
    let x = x.trim().parse::<f64>().map_err(|_| parse_err())?;
    let y = y.trim().parse::<f64>().map_err(|_| parse_err())?;
    Ok(Point::new(x, y))
}

/// Parse `r,g,b` with each channel in 0..=255.
pub fn parse_rgb(text: &str) -> CliResult<Rgb> {
    let channels: Vec<u8> = text
        .split(',')
        .map(|part| part.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .map_err(|err| CliError::Parse {
            what: "colour",
            detail: format!("{text:?}: {err}"),
        })?;
    match channels[..] {
        [r, g, b] => Ok(Rgb::new(r, g, b)),
        _ => Err(CliError::Parse {
            what: "colour",
            detail: format!("expected r,g,b but got {text:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use scanwerk_core::PixelBuffer;

    #[test]
    fn parses_corner_list() {
        let corners = parse_corners("0,0; 100,0;0,80 ;100,80").expect("valid");
        assert_eq!(corners.len(), 4);
        assert_eq!(corners[3], Point::new(100.0, 80.0));
        assert!(parse_corners("0,0;oops").is_err());
    }

    #[test]
    fn parses_rgb_triplet() {
        assert_eq!(parse_rgb("255, 250,240").expect("valid"), Rgb::new(255, 250, 240));
        assert!(parse_rgb("1,2").is_err());
        assert!(parse_rgb("1,2,300").is_err());
    }

    #[test]
    fn job_json_fills_defaults() {
        let job = Job::from_json_str(r#"{"filters": {"black_and_white": true}}"#).expect("valid");
        assert_eq!(job.dpr, 1.0);
        assert!(job.filters.black_and_white);
        assert!(job.corners.is_none());
    }

    #[test]
    fn process_crops_filters_and_removes_background() {
        let mut page = PixelBuffer::from_pixel(120, 100, [40, 40, 40, 255]);
        for y in 10..90 {
            for x in 10..110 {
                page.set_pixel(x, y, [250, 250, 250, 255]);
            }
        }
        page.set_pixel(60, 50, [10, 10, 200, 255]);

        let job = Job {
            corners: Some(vec![
                Point::new(110.0, 90.0),
                Point::new(10.0, 10.0),
                Point::new(110.0, 10.0),
                Point::new(10.0, 90.0),
            ]),
            background: Some(BackgroundJob {
                color: None,
                sample_at: Some(Point::new(2.0, 2.0)),
                tolerance: 0.0,
            }),
            ..Job::default()
        };
        let out = process(page, &job, &ScanConfig::default()).expect("processes");
        assert_eq!((out.width(), out.height()), (100, 80));
        assert_eq!(out.pixel(5, 5), Some([250, 250, 250, 0]));
        assert_eq!(out.pixel(50, 40), Some([10, 10, 200, 255]));
    }

    #[test]
    fn process_rejects_short_corner_list() {
        let job = Job {
            corners: Some(vec![Point::new(0.0, 0.0); 3]),
            ..Job::default()
        };
        let err = process(PixelBuffer::new(60, 60), &job, &ScanConfig::default()).unwrap_err();
        assert!(matches!(err, CliError::Scan(ScanError::WrongPointCount { got: 3 })));
    }

    #[test]
    fn run_writes_png() {
        let dir = tempfile::tempdir().expect("temp dir");
        let input = dir.path().join("page.png");
        let output = dir.path().join("out.png");
        RgbaImage::from_pixel(64, 64, Rgba([200, 180, 160, 255]))
            .save(&input)
            .expect("write fixture");

        let job = Job {
            filters: FilterConfig {
                black_and_white: true,
                ..FilterConfig::default()
            },
            ..Job::default()
        };
        run(&input, &output, &job, &ScanConfig::default()).expect("runs");

        let written = image::open(&output).expect("decodes").to_rgba8();
        assert_eq!(written.dimensions(), (64, 64));
        // Uniform page: luma ~184 vs threshold ~156 -> white.
        assert_eq!(written.get_pixel(10, 10), &Rgba([255, 255, 255, 255]));
    }
}
