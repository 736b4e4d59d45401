//! Frame source backed by a directory of still images.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::motion_pipeline::common::error::{DetectionError, Result};
use crate::motion_pipeline::frame::{Frame, FrameSource};

const SUPPORTED_EXTENSIONS: [&str; 6] = ["png", "jpg", "jpeg", "tif", "tiff", "bmp"];

/// Replays image files from a directory in file-name order, one per frame.
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    cursor: usize,
}

impl ImageSequenceSource {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();

        for entry in std::fs::read_dir(dir).map_err(|e| {
            DetectionError::SourceError(format!("{}: {}", dir.display(), e))
        })? {
            let path = entry?.path();
            let supported = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if path.is_file() && supported {
                paths.push(path);
            }
        }

        paths.sort();
        info!(dir = %dir.display(), frames = paths.len(), "Opened image sequence");

        Ok(Self::from_paths(paths))
    }

    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self { paths, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.paths.get(self.cursor) else {
            return Ok(None);
        };
        self.cursor += 1;

        debug!(path = %path.display(), "Decoding frame");
        let image = image::open(path)
            .map_err(|e| DetectionError::SourceError(format!("{}: {}", path.display(), e)))?;

        Ok(Some(Frame::from(image)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_reads_frames_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for (name, value) in [("b.png", 20u8), ("a.png", 10), ("c.png", 30)] {
            GrayImage::from_pixel(4, 4, Luma([value]))
                .save(dir.path().join(name))
                .unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let mut source = ImageSequenceSource::open(dir.path()).unwrap();
        assert_eq!(source.len(), 3);

        let mut values = Vec::new();
        while let Some(frame) = source.next_frame().unwrap() {
            values.push(frame.luminance().get_pixel(0, 0).0[0]);
        }
        assert_eq!(values, vec![10, 20, 30]);
        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_missing_directory_is_a_source_error() {
        let result = ImageSequenceSource::open("/definitely/not/here");
        assert!(matches!(result, Err(DetectionError::SourceError(_))));
    }

    #[test]
    fn test_undecodable_file_is_a_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"not a png").unwrap();

        let mut source = ImageSequenceSource::from_paths(vec![path]);
        assert!(matches!(
            source.next_frame(),
            Err(DetectionError::SourceError(_))
        ));
    }
}
