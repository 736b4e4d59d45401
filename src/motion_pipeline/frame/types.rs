//! Frame types

use image::{DynamicImage, GrayImage, RgbImage};

/// A single captured raster, either luminance-only or 8-bit RGB.
///
/// Frames are treated as immutable once captured. Anything retained across
/// frames (the background reference) is derived from a copy.
#[derive(Debug, Clone)]
pub enum Frame {
    Gray(GrayImage),
    Color(RgbImage),
}

impl Frame {
    pub fn width(&self) -> u32 {
        self.dimensions().0
    }

    pub fn height(&self) -> u32 {
        self.dimensions().1
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            Frame::Gray(image) => image.dimensions(),
            Frame::Color(image) => image.dimensions(),
        }
    }

    /// A frame without pixels. Sources use this to signal they ran dry.
    pub fn is_empty(&self) -> bool {
        let (width, height) = self.dimensions();
        width == 0 || height == 0
    }

    /// Single-channel luminance view of the frame.
    pub fn luminance(&self) -> GrayImage {
        match self {
            Frame::Gray(image) => image.clone(),
            Frame::Color(image) => image::imageops::grayscale(image),
        }
    }

    /// RGB copy used as the canvas for overlays and snapshots.
    pub fn to_rgb(&self) -> RgbImage {
        match self {
            Frame::Gray(image) => DynamicImage::ImageLuma8(image.clone()).to_rgb8(),
            Frame::Color(image) => image.clone(),
        }
    }
}

impl From<GrayImage> for Frame {
    fn from(image: GrayImage) -> Self {
        Frame::Gray(image)
    }
}

impl From<RgbImage> for Frame {
    fn from(image: RgbImage) -> Self {
        Frame::Color(image)
    }
}

impl From<DynamicImage> for Frame {
    fn from(image: DynamicImage) -> Self {
        match image {
            DynamicImage::ImageLuma8(gray) => Frame::Gray(gray),
            DynamicImage::ImageRgb8(rgb) => Frame::Color(rgb),
            other => Frame::Color(other.to_rgb8()),
        }
    }
}
