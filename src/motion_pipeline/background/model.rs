//! Reference image of the static scene.
//!
//! The model stores preprocessed (luminance, blurred) frames only. Callers run
//! [`preprocess`](crate::motion_pipeline::frame::preprocess) once per frame and
//! hand the result to both the model and the mask extractor.

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::motion_pipeline::common::error::{DetectionError, Result};

/// Whether the reference is frozen at capture time or tracks slow scene changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundMode {
    Static,
    Adaptive,
}

#[derive(Debug, Clone)]
pub struct BackgroundModel {
    mode: BackgroundMode,
    learning_rate: f32,
    /// Full-precision running estimate, row-major. Only advanced in adaptive mode.
    accumulator: Vec<f32>,
    /// `accumulator` re-quantized to 8 bits; this is what frames are compared against.
    reference: GrayImage,
}

impl BackgroundModel {
    /// Builds a model from already preprocessed frames.
    ///
    /// Static mode keeps the most recent frame. Adaptive mode seeds the estimate
    /// with the per-pixel mean of the whole warm-up window so a single noisy
    /// sample does not become the reference.
    pub fn capture<'a, I>(mode: BackgroundMode, learning_rate: f32, frames: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a GrayImage>,
    {
        validate_learning_rate(learning_rate)?;

        let mut frames = frames.into_iter();
        let first = frames.next().ok_or(DetectionError::EmptyFrame)?;
        let dimensions = first.dimensions();
        if dimensions.0 == 0 || dimensions.1 == 0 {
            return Err(DetectionError::EmptyFrame);
        }

        let model = match mode {
            BackgroundMode::Static => {
                let mut latest = first;
                for frame in frames {
                    ensure_dimensions(dimensions, frame.dimensions())?;
                    latest = frame;
                }
                Self::from_reference(mode, learning_rate, latest.clone())
            }
            BackgroundMode::Adaptive => {
                let mut sum: Vec<f32> = first.as_raw().iter().map(|&p| p as f32).collect();
                let mut count = 1usize;
                for frame in frames {
                    ensure_dimensions(dimensions, frame.dimensions())?;
                    sum.iter_mut()
                        .zip(frame.as_raw())
                        .for_each(|(acc, &p)| *acc += p as f32);
                    count += 1;
                }
                let accumulator: Vec<f32> = sum.into_iter().map(|v| v / count as f32).collect();
                let reference = quantize(dimensions, &accumulator);
                debug!(frames = count, "Averaged warm-up window");
                Self {
                    mode,
                    learning_rate,
                    accumulator,
                    reference,
                }
            }
        };

        info!(
            mode = ?mode,
            width = dimensions.0,
            height = dimensions.1,
            "Background captured"
        );
        Ok(model)
    }

    fn from_reference(mode: BackgroundMode, learning_rate: f32, reference: GrayImage) -> Self {
        let accumulator = reference.as_raw().iter().map(|&p| p as f32).collect();
        Self {
            mode,
            learning_rate,
            accumulator,
            reference,
        }
    }

    /// Blends `current` into the estimate:
    /// `reference = (1 - alpha) * reference + alpha * current`.
    ///
    /// Only valid in adaptive mode.
    pub fn update(&mut self, current: &GrayImage) -> Result<()> {
        if self.mode != BackgroundMode::Adaptive {
            return Err(DetectionError::UnsupportedOperation(
                "background update requires adaptive mode",
            ));
        }
        self.ensure_matches(current)?;

        let alpha = self.learning_rate;
        self.accumulator
            .iter_mut()
            .zip(current.as_raw())
            .for_each(|(acc, &p)| *acc = (1.0 - alpha) * *acc + alpha * p as f32);
        self.reference = quantize(self.reference.dimensions(), &self.accumulator);
        Ok(())
    }

    /// Replaces the reference with `current`, bypassing smoothing.
    ///
    /// This is also the recovery path after a dimension change.
    pub fn reset(&mut self, current: &GrayImage) {
        info!(
            width = current.width(),
            height = current.height(),
            "Background reset"
        );
        *self = Self::from_reference(self.mode, self.learning_rate, current.clone());
    }

    /// Fails with `DimensionMismatch` unless `frame` has the model's dimensions.
    pub fn ensure_matches(&self, frame: &GrayImage) -> Result<()> {
        ensure_dimensions(self.reference.dimensions(), frame.dimensions())
    }

    pub fn reference(&self) -> &GrayImage {
        &self.reference
    }

    pub fn mode(&self) -> BackgroundMode {
        self.mode
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.reference.dimensions()
    }
}

pub(crate) fn validate_learning_rate(learning_rate: f32) -> Result<()> {
    if learning_rate > 0.0 && learning_rate <= 1.0 {
        Ok(())
    } else {
        Err(DetectionError::InvalidConfig(format!(
            "learning rate must be in (0, 1], got {}",
            learning_rate
        )))
    }
}

fn ensure_dimensions(expected: (u32, u32), actual: (u32, u32)) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(DetectionError::DimensionMismatch { expected, actual })
    }
}

fn quantize((width, height): (u32, u32), values: &[f32]) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| {
        let v = values[(y * width + x) as usize];
        Luma([v.round().clamp(0.0, 255.0) as u8])
    })
}
