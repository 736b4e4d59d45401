use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, dilate, open};
use tracing::trace;

use crate::motion_pipeline::background::BackgroundModel;
use crate::motion_pipeline::common::error::Result;
use crate::motion_pipeline::frame::{Frame, preprocess};
use crate::motion_pipeline::mask::types::{FOREGROUND, MaskConfig, MotionMask};

/// Computes the cleaned binary difference between a frame and the background.
pub struct MotionExtractor {
    config: MaskConfig,
}

impl MotionExtractor {
    pub fn new(config: MaskConfig) -> Result<Self> {
        config.cleanup.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MaskConfig {
        &self.config
    }

    /// Preprocesses `frame` and extracts its mask.
    pub fn extract(&self, frame: &Frame, background: &BackgroundModel) -> Result<MotionMask> {
        let current = preprocess(frame, self.config.blur);
        self.extract_preprocessed(&current, background)
    }

    /// Extracts the mask for a frame that already went through
    /// [`preprocess`] with this extractor's blur kernel.
    pub fn extract_preprocessed(
        &self,
        current: &GrayImage,
        background: &BackgroundModel,
    ) -> Result<MotionMask> {
        background.ensure_matches(current)?;

        let binary = self.binarize(current, background.reference());
        let cleaned = self.cleanup(binary);
        let mask = MotionMask::from_image(cleaned);

        trace!(foreground = mask.foreground_count(), "Mask extracted");
        Ok(mask)
    }

    fn binarize(&self, current: &GrayImage, reference: &GrayImage) -> GrayImage {
        let policy = self.config.diff_policy;
        let threshold = self.config.pixel_diff_threshold;

        GrayImage::from_fn(current.width(), current.height(), |x, y| {
            let score = policy.score(current.get_pixel(x, y).0[0], reference.get_pixel(x, y).0[0]);
            Luma([if score > threshold { FOREGROUND } else { 0 }])
        })
    }

    fn cleanup(&self, mask: GrayImage) -> GrayImage {
        let cleanup = &self.config.cleanup;

        let mut mask = match radius(cleanup.open_size) {
            0 => mask,
            k => open(&mask, Norm::LInf, k),
        };
        if let Some(k) = cleanup.close_size.map(radius).filter(|&k| k > 0) {
            mask = close(&mask, Norm::LInf, k);
        }
        if let Some(k) = cleanup.dilate_size.map(radius).filter(|&k| k > 0) {
            mask = dilate(&mask, Norm::LInf, k);
        }
        mask
    }
}

/// L-infinity radius of a square structuring element with side `size`.
fn radius(size: u8) -> u8 {
    size / 2
}
