//! Snapshot persistence.
//!
//! Annotated frames are encoded by a [`SnapshotWriter`] and stored by
//! [`SnapshotStore`] as `intrusion_YYYYMMDD_HHMMSS.<ext>`. Existing files are
//! never overwritten; a second snapshot within the same second gets a numeric
//! suffix.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::motion_pipeline::common::error::{DetectionError, Result};
use crate::motion_pipeline::sinks::overlay::AnnotatedFrame;

const MAX_NAME_COLLISIONS: u32 = 100;

/// TIFF compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotCompression {
    /// No compression (fastest, largest file)
    None,
    /// LZW compression
    Lzw,
    /// Deflate compression - fast level
    DeflateFast,
    /// Deflate compression - balanced
    DeflateBalanced,
    /// Deflate compression - best compression (slower)
    DeflateBest,
}

pub trait SnapshotWriter {
    /// File extension without the dot.
    fn extension(&self) -> &'static str;

    fn write_snapshot(&self, image: &RgbImage, output: &mut dyn Write) -> Result<()>;
}

pub struct TiffSnapshotWriter {
    compression: SnapshotCompression,
}

impl TiffSnapshotWriter {
    pub fn new(compression: SnapshotCompression) -> Self {
        Self { compression }
    }
}

impl SnapshotWriter for TiffSnapshotWriter {
    fn extension(&self) -> &'static str {
        "tiff"
    }

    fn write_snapshot(&self, image: &RgbImage, output: &mut dyn Write) -> Result<()> {
        debug!("Encoding TIFF snapshot: {}x{}", image.width(), image.height());

        let compression = match self.compression {
            SnapshotCompression::None => tiff::encoder::Compression::Uncompressed,
            SnapshotCompression::Lzw => tiff::encoder::Compression::Lzw,
            SnapshotCompression::DeflateFast => tiff::encoder::Compression::Deflate(
                tiff::encoder::compression::DeflateLevel::Fast,
            ),
            SnapshotCompression::DeflateBalanced => tiff::encoder::Compression::Deflate(
                tiff::encoder::compression::DeflateLevel::Balanced,
            ),
            SnapshotCompression::DeflateBest => tiff::encoder::Compression::Deflate(
                tiff::encoder::compression::DeflateLevel::Best,
            ),
        };

        // The encoder needs `Seek`, so encode into memory first.
        let mut buffer = Vec::new();
        {
            let mut encoder = tiff::encoder::TiffEncoder::new(std::io::Cursor::new(&mut buffer))
                .map_err(|e| DetectionError::EncodeError(e.to_string()))?
                .with_compression(compression);

            encoder
                .write_image::<tiff::encoder::colortype::RGB8>(
                    image.width(),
                    image.height(),
                    image.as_raw(),
                )
                .map_err(|e| DetectionError::EncodeError(e.to_string()))?;
        }

        output.write_all(&buffer)?;
        Ok(())
    }
}

/// Receives annotated frames whenever the snapshot cooldown allows one.
pub trait SnapshotSink {
    fn persist(&mut self, frame: &AnnotatedFrame, at: DateTime<Local>) -> Result<PathBuf>;
}

/// I/O failures inside a sink are sink failures, not loop-ending ones.
pub(crate) fn into_sink_error(error: DetectionError) -> DetectionError {
    match error {
        DetectionError::IoError(e) => DetectionError::SinkUnavailable(e.to_string()),
        other => other,
    }
}

/// `intrusion_YYYYMMDD_HHMMSS` for `at`, in local time.
pub fn snapshot_stem(at: &DateTime<Local>) -> String {
    format!("intrusion_{}", at.format("%Y%m%d_%H%M%S"))
}

pub struct SnapshotStore<W: SnapshotWriter = TiffSnapshotWriter> {
    dir: PathBuf,
    writer: W,
}

impl SnapshotStore<TiffSnapshotWriter> {
    pub fn new<P: Into<PathBuf>>(dir: P, compression: SnapshotCompression) -> Self {
        Self::with_writer(dir, TiffSnapshotWriter::new(compression))
    }
}

impl<W: SnapshotWriter> SnapshotStore<W> {
    pub fn with_writer<P: Into<PathBuf>>(dir: P, writer: W) -> Self {
        Self {
            dir: dir.into(),
            writer,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn create_unique(&self, stem: &str) -> Result<(PathBuf, std::fs::File)> {
        let extension = self.writer.extension();
        for attempt in 0..MAX_NAME_COLLISIONS {
            let name = match attempt {
                0 => format!("{}.{}", stem, extension),
                n => format!("{}_{}.{}", stem, n, extension),
            };
            let path = self.dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(DetectionError::SinkUnavailable(format!(
                        "{}: {}",
                        path.display(),
                        e
                    )));
                }
            }
        }
        Err(DetectionError::SinkUnavailable(format!(
            "too many snapshots named {} in {}",
            stem,
            self.dir.display()
        )))
    }
}

impl<W: SnapshotWriter> SnapshotSink for SnapshotStore<W> {
    fn persist(&mut self, frame: &AnnotatedFrame, at: DateTime<Local>) -> Result<PathBuf> {
        // Recreated every time so a directory removed mid-session recovers.
        std::fs::create_dir_all(&self.dir).map_err(|e| {
            DetectionError::SinkUnavailable(format!("{}: {}", self.dir.display(), e))
        })?;

        // Encode first so a failing encoder never leaves a half-written file behind.
        let mut encoded = Vec::new();
        self.writer
            .write_snapshot(&frame.image, &mut encoded)
            .map_err(into_sink_error)?;

        let (path, mut file) = self.create_unique(&snapshot_stem(&at))?;
        if let Err(e) = file.write_all(&encoded).and_then(|()| file.flush()) {
            drop(file);
            let _ = std::fs::remove_file(&path);
            return Err(DetectionError::SinkUnavailable(format!("{}: {}", path.display(), e)));
        }

        info!(path = %path.display(), "Saved snapshot");
        Ok(path)
    }
}
