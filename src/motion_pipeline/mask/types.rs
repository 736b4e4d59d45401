//! Motion mask types and extraction settings

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

use crate::motion_pipeline::common::error::{DetectionError, Result};
use crate::motion_pipeline::frame::BlurKernel;

/// Stored value of a foreground pixel. Background pixels are 0.
pub const FOREGROUND: u8 = 255;

/// How the per-pixel difference is turned into a value compared with the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffPolicy {
    /// `|current - reference|`
    Absolute,
    /// `min(|current - reference|^2, 255)`.
    ///
    /// The threshold then applies to the squared value, so a threshold of 25
    /// accepts any absolute difference above 5.
    Squared,
}

impl DiffPolicy {
    #[inline]
    pub fn score(&self, current: u8, reference: u8) -> u8 {
        let diff = current.abs_diff(reference);
        match self {
            DiffPolicy::Absolute => diff,
            DiffPolicy::Squared => (diff as u16 * diff as u16).min(255) as u8,
        }
    }
}

/// Morphological cleanup chain: opening, then optional closing, then optional dilation.
///
/// Sizes are side lengths of square structuring elements and must be odd.
/// A size of 1 is the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupConfig {
    pub open_size: u8,
    pub close_size: Option<u8>,
    pub dilate_size: Option<u8>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            open_size: 3,
            close_size: None,
            dilate_size: None,
        }
    }
}

impl CleanupConfig {
    pub fn validate(&self) -> Result<()> {
        validate_element("open", self.open_size)?;
        if let Some(size) = self.close_size {
            validate_element("close", size)?;
        }
        if let Some(size) = self.dilate_size {
            validate_element("dilate", size)?;
        }
        Ok(())
    }
}

fn validate_element(name: &str, size: u8) -> Result<()> {
    if size % 2 == 1 {
        Ok(())
    } else {
        Err(DetectionError::InvalidConfig(format!(
            "{} structuring element must have an odd size, got {}",
            name, size
        )))
    }
}

/// Everything the extractor needs to turn a frame into a mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskConfig {
    pub pixel_diff_threshold: u8,
    pub diff_policy: DiffPolicy,
    pub blur: BlurKernel,
    pub cleanup: CleanupConfig,
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            pixel_diff_threshold: 25,
            diff_policy: DiffPolicy::Absolute,
            blur: BlurKernel::Size5,
            cleanup: CleanupConfig::default(),
        }
    }
}

/// Binary per-pixel motion map with the dimensions of the frame it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionMask {
    image: GrayImage,
}

impl MotionMask {
    /// Wraps `image`, mapping every non-zero pixel to [`FOREGROUND`].
    pub fn from_image(mut image: GrayImage) -> Self {
        image
            .pixels_mut()
            .filter(|p| p.0[0] != 0)
            .for_each(|p| *p = Luma([FOREGROUND]));
        Self { image }
    }

    pub fn empty(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn is_foreground(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y).0[0] != 0
    }

    pub fn foreground_count(&self) -> u32 {
        self.image.as_raw().iter().filter(|&&p| p != 0).count() as u32
    }

    /// The mask as a displayable image (0 / 255).
    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }
}
