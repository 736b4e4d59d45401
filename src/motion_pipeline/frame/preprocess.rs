//! Luminance conversion and noise-suppressing blur.
//!
//! Raw per-pixel differencing is dominated by sensor and quantization noise, so
//! every frame is blurred before it is compared with (or folded into) the
//! background reference. Both sides go through the same function.

use image::GrayImage;
use imageproc::filter::separable_filter_equal;
use serde::{Deserialize, Serialize};

use crate::motion_pipeline::frame::Frame;

const BINOMIAL_3: [f32; 3] = [0.25, 0.5, 0.25];
const BINOMIAL_5: [f32; 5] = [0.0625, 0.25, 0.375, 0.25, 0.0625];
const BINOMIAL_7: [f32; 7] = [
    0.015625, 0.09375, 0.234375, 0.3125, 0.234375, 0.09375, 0.015625,
];

/// Square Gaussian-style blur applied before differencing.
///
/// The weights are binomial coefficients, the discrete Gaussian used for small
/// kernels. Every weight is a power-of-two fraction so results are exact in `f32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlurKernel {
    Size3,
    Size5,
    Size7,
}

impl BlurKernel {
    pub fn size(&self) -> u32 {
        self.weights().len() as u32
    }

    pub fn weights(&self) -> &'static [f32] {
        match self {
            BlurKernel::Size3 => &BINOMIAL_3,
            BlurKernel::Size5 => &BINOMIAL_5,
            BlurKernel::Size7 => &BINOMIAL_7,
        }
    }
}

/// Converts `frame` to luminance and blurs it with `kernel`.
pub fn preprocess(frame: &Frame, kernel: BlurKernel) -> GrayImage {
    separable_filter_equal(&frame.luminance(), kernel.weights())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};

    #[test]
    fn test_kernels_are_normalized() {
        for kernel in [BlurKernel::Size3, BlurKernel::Size5, BlurKernel::Size7] {
            let sum: f32 = kernel.weights().iter().sum();
            assert_eq!(sum, 1.0);
            assert_eq!(kernel.size() % 2, 1);
        }
    }

    #[test]
    fn test_uniform_frame_is_unchanged() {
        let frame = Frame::Gray(GrayImage::from_pixel(16, 12, Luma([90])));
        let out = preprocess(&frame, BlurKernel::Size7);
        assert_eq!(out.dimensions(), (16, 12));
        assert!(out.pixels().all(|p| p.0[0] == 90));
    }

    #[test]
    fn test_color_frame_reduces_to_single_channel() {
        let frame = Frame::Color(RgbImage::from_pixel(8, 8, Rgb([255, 255, 255])));
        let out = preprocess(&frame, BlurKernel::Size5);
        assert!(out.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn test_blur_spreads_an_edge_by_half_the_kernel() {
        let mut image = GrayImage::new(20, 1);
        for x in 10..20 {
            image.put_pixel(x, 0, Luma([255]));
        }
        let out = preprocess(&Frame::Gray(image), BlurKernel::Size5);
        assert!(out.get_pixel(7, 0).0[0] == 0);
        assert!(out.get_pixel(8, 0).0[0] > 0);
        assert!(out.get_pixel(9, 0).0[0] > 0);
        assert!(out.get_pixel(9, 0).0[0] < 255);
        assert_eq!(out.get_pixel(12, 0).0[0], 255);
    }
}
