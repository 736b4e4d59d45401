//! Frame annotation and the live-view seam.

use std::path::PathBuf;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::motion_pipeline::common::error::{DetectionError, Result};
use crate::motion_pipeline::frame::Frame;
use crate::motion_pipeline::mask::MotionMask;
use crate::motion_pipeline::regions::{BoundingBox, Region};
use crate::motion_pipeline::sinks::snapshot::{
    SnapshotCompression, SnapshotWriter, TiffSnapshotWriter, into_sink_error,
};

pub const ALARM_LABEL: &str = "ALARM! INTRUSION DETECTED";

const REGION_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const ALARM_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const REGION_THICKNESS: u32 = 3;
const ALARM_BORDER_THICKNESS: u32 = 6;
const ALARM_BANNER_MAX_HEIGHT: u32 = 30;

/// A frame with detection results drawn on it.
#[derive(Debug, Clone)]
pub struct AnnotatedFrame {
    pub image: RgbImage,
    pub regions: Vec<BoundingBox>,
    /// [`ALARM_LABEL`] while the alarm is active.
    pub label: Option<&'static str>,
}

impl AnnotatedFrame {
    pub fn is_alarmed(&self) -> bool {
        self.label.is_some()
    }
}

/// Draws a green box around every region and, when `alarmed`, a red banner
/// across the top plus a red border around the whole frame.
pub fn annotate(frame: &Frame, regions: &[Region], alarmed: bool) -> AnnotatedFrame {
    let mut image = frame.to_rgb();

    for region in regions {
        draw_thick_rect(&mut image, &region.bounds, REGION_THICKNESS, REGION_COLOR);
    }

    if alarmed {
        let whole = BoundingBox {
            x: 0,
            y: 0,
            width: image.width(),
            height: image.height(),
        };
        draw_thick_rect(&mut image, &whole, ALARM_BORDER_THICKNESS, ALARM_COLOR);

        let banner_height = (image.height() / 8).clamp(1, ALARM_BANNER_MAX_HEIGHT);
        let banner = Rect::at(0, 0).of_size(image.width(), banner_height);
        draw_filled_rect_mut(&mut image, banner, ALARM_COLOR);
    }

    AnnotatedFrame {
        image,
        regions: regions.iter().map(|r| r.bounds).collect(),
        label: alarmed.then_some(ALARM_LABEL),
    }
}

/// Nested one-pixel outlines, growing inward from `bounds`.
fn draw_thick_rect(image: &mut RgbImage, bounds: &BoundingBox, thickness: u32, color: Rgb<u8>) {
    for inset in 0..thickness {
        if bounds.width <= 2 * inset || bounds.height <= 2 * inset {
            break;
        }
        let rect = Rect::at((bounds.x + inset) as i32, (bounds.y + inset) as i32)
            .of_size(bounds.width - 2 * inset, bounds.height - 2 * inset);
        draw_hollow_rect_mut(image, rect, color);
    }
}

/// Receives every processed frame, whatever the alarm state.
pub trait OverlaySink {
    fn present(&mut self, frame: &AnnotatedFrame, mask: &MotionMask) -> Result<()>;
}

impl<T: OverlaySink + ?Sized> OverlaySink for Box<T> {
    fn present(&mut self, frame: &AnnotatedFrame, mask: &MotionMask) -> Result<()> {
        (**self).present(frame, mask)
    }
}

/// Headless runs drop the live view.
pub struct NullOverlay;

impl OverlaySink for NullOverlay {
    fn present(&mut self, _frame: &AnnotatedFrame, _mask: &MotionMask) -> Result<()> {
        Ok(())
    }
}

/// Writes every annotated frame to `dir` as `frame_NNNNNN.<ext>`.
pub struct DirectoryOverlay<W: SnapshotWriter = TiffSnapshotWriter> {
    dir: PathBuf,
    writer: W,
    next_index: u64,
}

impl DirectoryOverlay<TiffSnapshotWriter> {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Result<Self> {
        Self::with_writer(dir, TiffSnapshotWriter::new(SnapshotCompression::DeflateFast))
    }
}

impl<W: SnapshotWriter> DirectoryOverlay<W> {
    pub fn with_writer<P: Into<PathBuf>>(dir: P, writer: W) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            DetectionError::SinkUnavailable(format!("{}: {}", dir.display(), e))
        })?;
        Ok(Self {
            dir,
            writer,
            next_index: 0,
        })
    }
}

impl<W: SnapshotWriter> OverlaySink for DirectoryOverlay<W> {
    fn present(&mut self, frame: &AnnotatedFrame, _mask: &MotionMask) -> Result<()> {
        let path = self
            .dir
            .join(format!("frame_{:06}.{}", self.next_index, self.writer.extension()));
        self.next_index += 1;

        let mut encoded = Vec::new();
        self.writer
            .write_snapshot(&frame.image, &mut encoded)
            .map_err(into_sink_error)?;
        std::fs::write(&path, &encoded)
            .map_err(|e| DetectionError::SinkUnavailable(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;

    fn region(x: u32, y: u32, width: u32, height: u32) -> Region {
        Region {
            bounds: BoundingBox {
                x,
                y,
                width,
                height,
            },
            area: width * height,
        }
    }

    #[test]
    fn test_boxes_are_drawn_around_regions() {
        let frame = Frame::Gray(GrayImage::new(50, 50));
        let annotated = annotate(&frame, &[region(10, 10, 20, 20)], false);

        assert_eq!(*annotated.image.get_pixel(10, 10), REGION_COLOR);
        assert_eq!(*annotated.image.get_pixel(12, 20), REGION_COLOR);
        assert_eq!(*annotated.image.get_pixel(13, 20), Rgb([0, 0, 0]));
        assert_eq!(*annotated.image.get_pixel(29, 29), REGION_COLOR);
        assert!(!annotated.is_alarmed());
        assert_eq!(annotated.regions.len(), 1);
    }

    #[test]
    fn test_alarm_adds_label_and_border() {
        let frame = Frame::Gray(GrayImage::new(50, 40));
        let annotated = annotate(&frame, &[], true);

        assert_eq!(annotated.label, Some(ALARM_LABEL));
        assert_eq!(*annotated.image.get_pixel(0, 0), ALARM_COLOR);
        assert_eq!(*annotated.image.get_pixel(49, 39), ALARM_COLOR);
        assert_eq!(*annotated.image.get_pixel(25, 4), ALARM_COLOR);
        assert_eq!(*annotated.image.get_pixel(25, 20), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_tiny_region_does_not_panic() {
        let frame = Frame::Gray(GrayImage::new(5, 5));
        let annotated = annotate(&frame, &[region(4, 4, 1, 1)], false);
        assert_eq!(*annotated.image.get_pixel(4, 4), REGION_COLOR);
    }

    #[test]
    fn test_directory_overlay_numbers_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut overlay = DirectoryOverlay::new(dir.path()).unwrap();
        let annotated = annotate(&Frame::Gray(GrayImage::new(4, 4)), &[], false);
        let mask = MotionMask::empty(4, 4);

        overlay.present(&annotated, &mask).unwrap();
        overlay.present(&annotated, &mask).unwrap();

        assert!(dir.path().join("frame_000000.tiff").exists());
        assert!(dir.path().join("frame_000001.tiff").exists());
    }
}
