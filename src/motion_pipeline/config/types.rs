//! Detector configuration types

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::motion_pipeline::alarm::AlarmPolicy;
use crate::motion_pipeline::background::BackgroundMode;
use crate::motion_pipeline::background::model::validate_learning_rate;
use crate::motion_pipeline::common::error::{DetectionError, Result};
use crate::motion_pipeline::frame::BlurKernel;
use crate::motion_pipeline::mask::{CleanupConfig, DiffPolicy, MaskConfig};
use crate::motion_pipeline::regions::RegionValidator;
use crate::motion_pipeline::sinks::SnapshotCompression;

/// Configuration for a monitoring session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Per-pixel score that must be strictly exceeded to mark foreground
    pub pixel_diff_threshold: u8,
    pub diff_policy: DiffPolicy,
    pub blur_kernel: BlurKernel,
    /// Opening element side length (odd)
    pub open_kernel: u8,
    /// Optional closing after the opening
    pub close_kernel: Option<u8>,
    /// Optional dilation after everything else
    pub dilate_kernel: Option<u8>,
    /// Global motion pixel count that must be strictly exceeded to alarm
    pub alarm_threshold: u32,
    /// Smallest region area kept by validation
    pub min_region_area: u32,
    pub notify_cooldown_secs: f64,
    pub snapshot_cooldown_secs: f64,
    pub background_mode: BackgroundMode,
    /// Adaptive blend factor. Static mode never reads it but it must still be valid.
    pub learning_rate: f32,
    /// Frames captured to seed the background
    pub warm_up_frames: usize,
    pub snapshot_dir: PathBuf,
    pub snapshot_compression: SnapshotCompression,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            pixel_diff_threshold: 25,
            diff_policy: DiffPolicy::Squared,
            blur_kernel: BlurKernel::Size5,
            open_kernel: 3,
            close_kernel: None,
            dilate_kernel: None,
            alarm_threshold: 5000,
            min_region_area: 1000,
            notify_cooldown_secs: 2.0,
            snapshot_cooldown_secs: 3.0,
            background_mode: BackgroundMode::Static,
            learning_rate: 0.005,
            warm_up_frames: 1,
            snapshot_dir: PathBuf::from("snapshots"),
            snapshot_compression: SnapshotCompression::DeflateFast,
        }
    }
}

impl DetectorConfig {
    pub fn builder() -> DetectorConfigBuilder {
        DetectorConfigBuilder::default()
    }

    /// Preset for scenes with slow lighting changes: a learning background
    /// and a heavier cleanup chain.
    pub fn adaptive() -> Self {
        Self {
            pixel_diff_threshold: 45,
            diff_policy: DiffPolicy::Absolute,
            blur_kernel: BlurKernel::Size7,
            open_kernel: 5,
            close_kernel: Some(9),
            dilate_kernel: Some(7),
            alarm_threshold: 20000,
            min_region_area: 4000,
            notify_cooldown_secs: 2.0,
            snapshot_cooldown_secs: 3.0,
            background_mode: BackgroundMode::Adaptive,
            learning_rate: 0.005,
            warm_up_frames: 60,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.cleanup_config().validate()?;
        validate_learning_rate(self.learning_rate)?;
        if self.warm_up_frames == 0 {
            return Err(DetectionError::InvalidConfig(
                "warm_up_frames must be at least 1".into(),
            ));
        }
        validate_cooldown("notify_cooldown_secs", self.notify_cooldown_secs)?;
        validate_cooldown("snapshot_cooldown_secs", self.snapshot_cooldown_secs)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let config: Self = serde_json::from_reader(reader).map_err(|e| {
            DetectionError::InvalidConfig(format!("{}: {}", path.display(), e))
        })?;
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self).map_err(|e| {
            DetectionError::InvalidConfig(format!("{}: {}", path.display(), e))
        })
    }

    pub fn cleanup_config(&self) -> CleanupConfig {
        CleanupConfig {
            open_size: self.open_kernel,
            close_size: self.close_kernel,
            dilate_size: self.dilate_kernel,
        }
    }

    pub fn mask_config(&self) -> MaskConfig {
        MaskConfig {
            pixel_diff_threshold: self.pixel_diff_threshold,
            diff_policy: self.diff_policy,
            blur: self.blur_kernel,
            cleanup: self.cleanup_config(),
        }
    }

    /// Cooldowns are rounded to whole milliseconds.
    pub fn alarm_policy(&self) -> AlarmPolicy {
        AlarmPolicy {
            alarm_threshold: self.alarm_threshold,
            notify_cooldown: secs_to_duration(self.notify_cooldown_secs),
            snapshot_cooldown: secs_to_duration(self.snapshot_cooldown_secs),
        }
    }

    pub fn region_validator(&self) -> RegionValidator {
        RegionValidator::new(self.min_region_area)
    }
}

fn validate_cooldown(name: &str, secs: f64) -> Result<()> {
    if secs.is_finite() && secs >= 0.0 {
        Ok(())
    } else {
        Err(DetectionError::InvalidConfig(format!(
            "{} must be a finite, non-negative number of seconds, got {}",
            name, secs
        )))
    }
}

fn secs_to_duration(secs: f64) -> chrono::Duration {
    chrono::Duration::milliseconds((secs * 1000.0).round() as i64)
}

/// Builder for DetectorConfig
#[derive(Default)]
pub struct DetectorConfigBuilder {
    base: Option<DetectorConfig>,
    pixel_diff_threshold: Option<u8>,
    diff_policy: Option<DiffPolicy>,
    blur_kernel: Option<BlurKernel>,
    open_kernel: Option<u8>,
    close_kernel: Option<Option<u8>>,
    dilate_kernel: Option<Option<u8>>,
    alarm_threshold: Option<u32>,
    min_region_area: Option<u32>,
    notify_cooldown_secs: Option<f64>,
    snapshot_cooldown_secs: Option<f64>,
    background_mode: Option<BackgroundMode>,
    learning_rate: Option<f32>,
    warm_up_frames: Option<usize>,
    snapshot_dir: Option<PathBuf>,
    snapshot_compression: Option<SnapshotCompression>,
}

impl DetectorConfigBuilder {
    /// Unset fields fall back to `base` instead of [`DetectorConfig::default`].
    pub fn from_base(base: DetectorConfig) -> Self {
        Self {
            base: Some(base),
            ..Self::default()
        }
    }

    pub fn pixel_diff_threshold(mut self, threshold: u8) -> Self {
        self.pixel_diff_threshold = Some(threshold);
        self
    }

    pub fn diff_policy(mut self, policy: DiffPolicy) -> Self {
        self.diff_policy = Some(policy);
        self
    }

    pub fn blur_kernel(mut self, kernel: BlurKernel) -> Self {
        self.blur_kernel = Some(kernel);
        self
    }

    pub fn open_kernel(mut self, size: u8) -> Self {
        self.open_kernel = Some(size);
        self
    }

    pub fn close_kernel(mut self, size: Option<u8>) -> Self {
        self.close_kernel = Some(size);
        self
    }

    pub fn dilate_kernel(mut self, size: Option<u8>) -> Self {
        self.dilate_kernel = Some(size);
        self
    }

    pub fn alarm_threshold(mut self, pixels: u32) -> Self {
        self.alarm_threshold = Some(pixels);
        self
    }

    pub fn min_region_area(mut self, area: u32) -> Self {
        self.min_region_area = Some(area);
        self
    }

    pub fn notify_cooldown_secs(mut self, secs: f64) -> Self {
        self.notify_cooldown_secs = Some(secs);
        self
    }

    pub fn snapshot_cooldown_secs(mut self, secs: f64) -> Self {
        self.snapshot_cooldown_secs = Some(secs);
        self
    }

    pub fn background_mode(mut self, mode: BackgroundMode) -> Self {
        self.background_mode = Some(mode);
        self
    }

    pub fn learning_rate(mut self, rate: f32) -> Self {
        self.learning_rate = Some(rate);
        self
    }

    pub fn warm_up_frames(mut self, frames: usize) -> Self {
        self.warm_up_frames = Some(frames);
        self
    }

    pub fn snapshot_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.snapshot_dir = Some(dir.into());
        self
    }

    pub fn snapshot_compression(mut self, compression: SnapshotCompression) -> Self {
        self.snapshot_compression = Some(compression);
        self
    }

    pub fn build(self) -> DetectorConfig {
        let default = self.base.unwrap_or_default();
        DetectorConfig {
            pixel_diff_threshold: self.pixel_diff_threshold.unwrap_or(default.pixel_diff_threshold),
            diff_policy: self.diff_policy.unwrap_or(default.diff_policy),
            blur_kernel: self.blur_kernel.unwrap_or(default.blur_kernel),
            open_kernel: self.open_kernel.unwrap_or(default.open_kernel),
            close_kernel: self.close_kernel.unwrap_or(default.close_kernel),
            dilate_kernel: self.dilate_kernel.unwrap_or(default.dilate_kernel),
            alarm_threshold: self.alarm_threshold.unwrap_or(default.alarm_threshold),
            min_region_area: self.min_region_area.unwrap_or(default.min_region_area),
            notify_cooldown_secs: self.notify_cooldown_secs.unwrap_or(default.notify_cooldown_secs),
            snapshot_cooldown_secs: self
                .snapshot_cooldown_secs
                .unwrap_or(default.snapshot_cooldown_secs),
            background_mode: self.background_mode.unwrap_or(default.background_mode),
            learning_rate: self.learning_rate.unwrap_or(default.learning_rate),
            warm_up_frames: self.warm_up_frames.unwrap_or(default.warm_up_frames),
            snapshot_dir: self.snapshot_dir.unwrap_or(default.snapshot_dir),
            snapshot_compression: self.snapshot_compression.unwrap_or(default.snapshot_compression),
        }
    }
}
