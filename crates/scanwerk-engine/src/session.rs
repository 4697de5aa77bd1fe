// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Editing session — owns the working image and the transient state that
// comes and goes with the host's editing modes (crop points, pending filter
// settings, the pre-segmentation snapshot).

use scanwerk_core::error::{Result, ScanError};
use scanwerk_core::{Dimensions, FilterConfig, PixelBuffer, Point, Rect, Rgb, ScanConfig};
use tracing::{debug, info, instrument};

use crate::crop::{self, check_dpr};
use crate::filters;
use crate::raster;
use crate::rectify::Rectifier;
use crate::segment::{self, Segmenter};

/// One document being edited.
///
/// Crop points live only while crop mode is active: entering crop mode puts
/// them on the image corners, and applying, cancelling, or rotating discards
/// them. Rotation never tries to re-project them.
///
/// Filter settings are previewed on a copy. The working image only changes
/// when they are committed.
#[derive(Debug, Clone)]
pub struct ScanSession {
    /// The working image.
    image: PixelBuffer,
    /// Buffer pixels per CSS pixel.
    dpr: f64,
    config: ScanConfig,
    crop_points: Option<[Point; 4]>,
    filters: FilterConfig,
    /// Image as it was before the pending segmentation preview.
    before_segmentation: Option<PixelBuffer>,
}

impl ScanSession {
    // -- Construction ---------------------------------------------------------

    pub fn new(image: PixelBuffer, dpr: f64) -> Result<Self> {
        Self::with_config(image, dpr, ScanConfig::default())
    }

    pub fn with_config(image: PixelBuffer, dpr: f64, config: ScanConfig) -> Result<Self> {
        check_dpr(dpr)?;
        info!(width = image.width(), height = image.height(), dpr, "Scan session opened");
        Ok(Self {
            image,
            dpr,
            config,
            crop_points: None,
            filters: FilterConfig::default(),
            before_segmentation: None,
        })
    }

    // -- Accessors ------------------------------------------------------------

    /// The working image, without pending filters.
    pub fn image(&self) -> &PixelBuffer {
        &self.image
    }

    pub fn dpr(&self) -> f64 {
        self.dpr
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn filters(&self) -> &FilterConfig {
        &self.filters
    }

    /// The working image's extent in CSS pixels.
    pub fn css_rect(&self) -> Rect {
        Rect::new(
            0.0,
            0.0,
            self.image.width() as f64 / self.dpr,
            self.image.height() as f64 / self.dpr,
        )
    }

    // -- Crop mode ------------------------------------------------------------

    /// Enter crop mode with a handle on each image corner.
    pub fn enter_crop_mode(&mut self) -> [Point; 4] {
        let points = crop::initialize(self.css_rect());
        self.crop_points = Some(points);
        debug!(?points, "Crop mode entered");
        points
    }

    pub fn is_cropping(&self) -> bool {
        self.crop_points.is_some()
    }

    pub fn crop_points(&self) -> Option<&[Point; 4]> {
        self.crop_points.as_ref()
    }

    /// Move one handle (index 0..=3) to a new CSS-space position.
    pub fn move_crop_point(&mut self, index: usize, point: Point) -> Result<()> {
        let points = self.crop_points.as_mut().ok_or(ScanError::CropModeInactive)?;
        let slot = points.get_mut(index).ok_or(ScanError::CropPointIndex(index))?;
        *slot = point;
        Ok(())
    }

    /// Crop mode is active and every handle has a usable position.
    pub fn is_crop_ready(&self) -> bool {
        self.crop_points.as_ref().is_some_and(|p| crop::validate(p))
    }

    /// Rectify the working image to the current crop and leave crop mode.
    ///
    /// On failure crop mode stays active so the user can adjust the handles.
    #[instrument(skip(self))]
    pub fn apply_crop(&mut self) -> Result<Dimensions> {
        let points = self.crop_points.ok_or(ScanError::CropModeInactive)?;
        let rectified =
            Rectifier::new(self.config.rectify).rectify(&self.image, &points, self.dpr)?;
        self.image = rectified.buffer;
        self.crop_points = None;
        self.before_segmentation = None;
        info!(dims = %rectified.dimensions, "Crop applied");
        Ok(rectified.dimensions)
    }

    pub fn cancel_crop(&mut self) {
        self.crop_points = None;
    }

    // -- Rotation -------------------------------------------------------------

    /// Rotate a quarter turn clockwise. Any crop in progress is discarded.
    pub fn rotate_clockwise(&mut self) -> Result<()> {
        self.image = raster::rotate_clockwise(&self.image)?;
        self.after_rotation();
        Ok(())
    }

    /// Rotate a quarter turn counter-clockwise. Any crop in progress is
    /// discarded.
    pub fn rotate_counter_clockwise(&mut self) -> Result<()> {
        self.image = raster::rotate_counter_clockwise(&self.image)?;
        self.after_rotation();
        Ok(())
    }

    fn after_rotation(&mut self) {
        if self.crop_points.take().is_some() {
            debug!("Crop points cleared by rotation");
        }
        self.before_segmentation = None;
    }

    // -- Filters --------------------------------------------------------------

    pub fn set_filters(&mut self, config: FilterConfig) {
        self.filters = config.clamped();
    }

    /// Working image with the pending filters applied. The working image
    /// itself is left alone.
    pub fn preview(&self) -> PixelBuffer {
        filters::apply_cloned(&self.image, &self.filters)
    }

    /// Bake the pending filters into the working image and reset them.
    ///
    /// During a segmentation preview the snapshot is filtered as well, so a
    /// later preview or a cancel keeps the committed filters.
    pub fn commit_filters(&mut self) {
        if filters::has_active_filters(&self.filters) {
            filters::apply(&mut self.image, &self.filters);
            if let Some(snapshot) = self.before_segmentation.as_mut() {
                filters::apply(snapshot, &self.filters);
            }
            info!(filters = ?self.filters, "Filters committed");
        }
        self.filters = FilterConfig::default();
    }

    // -- Background removal ---------------------------------------------------

    /// Colour under a CSS-space point, or `None` off the image.
    pub fn sample_background(&self, point: Point) -> Option<Rgb> {
        segment::sample_color_at(self.image(), point, self.dpr)
    }

    /// Matte out `target` at `tolerance`. The first preview snapshots the
    /// image; later previews re-run from that snapshot so tolerance changes
    /// can shrink the matte as well as grow it.
    pub fn preview_segmentation(&mut self, target: Rgb, tolerance: f64) -> &PixelBuffer {
        let base = self
            .before_segmentation
            .get_or_insert_with(|| self.image.clone());
        self.image = Segmenter::new(self.config.segment).segment(base, target, tolerance);
        &self.image
    }

    pub fn is_segmenting(&self) -> bool {
        self.before_segmentation.is_some()
    }

    /// Keep the segmented image and drop the snapshot.
    pub fn commit_segmentation(&mut self) {
        self.before_segmentation = None;
    }

    /// Restore the image as it was before the first preview.
    pub fn cancel_segmentation(&mut self) {
        if let Some(original) = self.before_segmentation.take() {
            self.image = original;
        }
    }

    // -- Output ---------------------------------------------------------------

    /// Finished image for the export sink: the working image with any pending
    /// filters applied.
    pub fn export(&self) -> PixelBuffer {
        self.preview()
    }

    /// Consume the session, returning the finished image.
    pub fn into_image(mut self) -> PixelBuffer {
        self.commit_filters();
        self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(width: u32, height: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::from_pixel(width, height, [250, 250, 245, 255]);
        for x in 10..width.saturating_sub(10) {
            buf.set_pixel(x, height / 2, [20, 20, 30, 255]);
        }
        buf
    }

    #[test]
    fn rejects_invalid_dpr() {
        assert!(matches!(
            ScanSession::new(page(10, 10), 0.0),
            Err(ScanError::InvalidPixelRatio(_))
        ));
    }

    #[test]
    fn crop_mode_starts_on_css_corners() {
        let mut session = ScanSession::new(page(200, 100), 2.0).expect("valid dpr");
        let points = session.enter_crop_mode();
        assert_eq!(points[3], Point::new(100.0, 50.0));
        assert!(session.is_cropping());
        assert!(session.is_crop_ready());
    }

    #[test]
    fn crop_operations_require_crop_mode() {
        let mut session = ScanSession::new(page(100, 100), 1.0).expect("valid dpr");
        assert!(matches!(
            session.move_crop_point(0, Point::new(1.0, 1.0)),
            Err(ScanError::CropModeInactive)
        ));
        assert!(matches!(session.apply_crop(), Err(ScanError::CropModeInactive)));
        assert!(!session.is_crop_ready());
    }

    #[test]
    fn move_crop_point_checks_index() {
        let mut session = ScanSession::new(page(100, 100), 1.0).expect("valid dpr");
        session.enter_crop_mode();
        assert!(matches!(
            session.move_crop_point(4, Point::new(1.0, 1.0)),
            Err(ScanError::CropPointIndex(4))
        ));
        session
            .move_crop_point(0, Point::new(f64::NAN, 0.0))
            .expect("index in range");
        assert!(!session.is_crop_ready());
    }

    #[test]
    fn apply_crop_replaces_image_and_leaves_crop_mode() {
        let mut session = ScanSession::new(page(300, 200), 1.0).expect("valid dpr");
        session.enter_crop_mode();
        session.move_crop_point(0, Point::new(20.0, 20.0)).unwrap();
        session.move_crop_point(3, Point::new(300.0, 200.0)).unwrap();
        session.move_crop_point(1, Point::new(300.0, 20.0)).unwrap();
        session.move_crop_point(2, Point::new(20.0, 200.0)).unwrap();

        let dims = session.apply_crop().expect("valid crop");
        assert_eq!(dims, Dimensions::new(280, 180));
        assert_eq!(session.image().dimensions(), dims);
        assert!(!session.is_cropping());
    }

    #[test]
    fn failed_crop_keeps_crop_mode() {
        let mut session = ScanSession::new(page(300, 200), 1.0).expect("valid dpr");
        session.enter_crop_mode();
        session.move_crop_point(1, Point::new(20.0, 0.0)).unwrap();
        session.move_crop_point(3, Point::new(20.0, 200.0)).unwrap();
        assert!(matches!(
            session.apply_crop(),
            Err(ScanError::CropTooSmall { .. })
        ));
        assert!(session.is_cropping());
        assert_eq!(session.image().dimensions(), Dimensions::new(300, 200));
    }

    #[test]
    fn rotation_clears_crop_points() {
        let mut session = ScanSession::new(page(120, 80), 1.0).expect("valid dpr");
        session.enter_crop_mode();
        session.rotate_clockwise().expect("rotates");
        assert!(!session.is_cropping());
        assert_eq!(session.image().dimensions(), Dimensions::new(80, 120));
        session.rotate_counter_clockwise().expect("rotates");
        assert_eq!(session.image(), &page(120, 80));
    }

    #[test]
    fn preview_does_not_touch_working_image() {
        let original = page(40, 40);
        let mut session = ScanSession::new(original.clone(), 1.0).expect("valid dpr");
        session.set_filters(FilterConfig {
            black_and_white: true,
            ..FilterConfig::default()
        });
        let preview = session.preview();
        assert_ne!(preview, original);
        assert_eq!(session.image(), &original);
        assert_eq!(session.export(), preview);

        session.commit_filters();
        assert_eq!(session.image(), &preview);
        assert_eq!(session.filters(), &FilterConfig::default());
    }

    #[test]
    fn segmentation_preview_can_be_cancelled() {
        let original = page(30, 30);
        let mut session = ScanSession::new(original.clone(), 1.0).expect("valid dpr");
        let paper = session
            .sample_background(Point::new(1.0, 1.0))
            .expect("on image");
        assert_eq!(paper, Rgb::new(250, 250, 245));

        let matted = session.preview_segmentation(paper, 5.0).clone();
        assert_eq!(matted.pixel(0, 0).map(|p| p[3]), Some(0));
        assert_eq!(matted.pixel(15, 15).map(|p| p[3]), Some(255));
        assert!(session.is_segmenting());

        session.cancel_segmentation();
        assert_eq!(session.image(), &original);
        assert!(!session.is_segmenting());
    }

    #[test]
    fn segmentation_preview_reruns_from_snapshot() {
        let mut session = ScanSession::new(page(30, 30), 1.0).expect("valid dpr");
        let ink = Rgb::new(20, 20, 30);
        // Mid-gray at full tolerance swallows both page and ink.
        session.preview_segmentation(Rgb::new(135, 135, 138), 50.0);
        assert_eq!(session.image().pixel(0, 0).map(|p| p[3]), Some(0));
        assert_eq!(session.image().pixel(15, 15).map(|p| p[3]), Some(0));
        // Re-running against the ink restores the page.
        session.preview_segmentation(ink, 1.0);
        assert_eq!(session.image().pixel(0, 0).map(|p| p[3]), Some(255));
        assert_eq!(session.image().pixel(15, 15).map(|p| p[3]), Some(0));

        session.commit_segmentation();
        assert!(!session.is_segmenting());
        assert_eq!(session.image().pixel(15, 15).map(|p| p[3]), Some(0));
    }

    #[test]
    fn filters_committed_mid_segmentation_survive_rerun_and_cancel() {
        let mut page = PixelBuffer::from_pixel(10, 10, [240, 240, 240, 255]);
        page.set_pixel(5, 5, [100, 100, 100, 255]);
        let paper = Rgb::new(240, 240, 240);
        let mut session = ScanSession::new(page, 1.0).expect("valid dpr");

        session.preview_segmentation(paper, 1.0);
        session.set_filters(FilterConfig {
            brightness: -100,
            ..FilterConfig::default()
        });
        session.commit_filters();
        assert_eq!(session.image().pixel(5, 5), Some([0, 0, 0, 255]));
        assert_eq!(session.image().pixel(0, 0), Some([0, 0, 0, 0]));

        // The darkened page no longer matches the old paper colour.
        session.preview_segmentation(paper, 2.0);
        assert_eq!(session.image().pixel(5, 5), Some([0, 0, 0, 255]));
        assert_eq!(session.image().pixel(0, 0), Some([0, 0, 0, 255]));

        session.cancel_segmentation();
        assert!(session.image().pixels().all(|px| px[..] == [0, 0, 0, 255]));
    }

    #[test]
    fn into_image_bakes_pending_filters() {
        let mut session = ScanSession::new(page(20, 20), 1.0).expect("valid dpr");
        session.set_filters(FilterConfig {
            brightness: -100,
            ..FilterConfig::default()
        });
        let out = session.into_image();
        assert!(out.pixels().all(|px| px[..3] == [0, 0, 0]));
    }
}
