use std::path::PathBuf;

use tracing::{info, info_span, warn};

use crate::motion_pipeline::alarm::{
    AlarmDebouncer, AlarmEffects, AlarmPhase, AlarmState, Clock, MotionSignals, SystemClock,
};
use crate::motion_pipeline::background::{BackgroundMode, BackgroundModel};
use crate::motion_pipeline::common::error::{DetectionError, Result};
use crate::motion_pipeline::config::DetectorConfig;
use crate::motion_pipeline::frame::{Frame, FrameSource, preprocess};
use crate::motion_pipeline::mask::MotionExtractor;
use crate::motion_pipeline::regions::{Region, RegionValidator};
use crate::motion_pipeline::session::commands::{CommandReceiver, OperatorCommand};
use crate::motion_pipeline::session::timing::{PipelineTimings, Timer};
use crate::motion_pipeline::sinks::{
    CommandNotifier, Dispatch, Notifier, NullOverlay, OverlaySink, SnapshotSink, SnapshotStore,
    annotate,
};

/// Outcome of one processed frame.
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub regions: Vec<Region>,
    /// Raw foreground pixel count of the cleaned mask
    pub total_motion_pixels: u32,
    pub phase: AlarmPhase,
    /// Effects the debouncer scheduled, whether or not the sinks succeeded
    pub effects: AlarmEffects,
    /// Path of the snapshot written for this frame, if any
    pub snapshot: Option<PathBuf>,
}

/// Counters reported when a session ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames_processed: u64,
    pub alarm_episodes: u64,
    /// Notifications handed to the notifier backend
    pub notifications: u64,
    /// Notifications the backend discarded because it was still busy
    pub notifications_dropped: u64,
    pub snapshots: u64,
    pub sink_failures: u64,
    pub final_state: AlarmState,
}

/// One monitoring session: configuration, background model and alarm state
/// plus the sinks they drive.
pub struct MonitorSession<N: Notifier, S: SnapshotSink, O: OverlaySink> {
    config: DetectorConfig,
    extractor: MotionExtractor,
    validator: RegionValidator,
    debouncer: AlarmDebouncer,
    background: Option<BackgroundModel>,
    notifier: N,
    snapshots: S,
    overlay: O,
    clock: Box<dyn Clock>,
    timings: PipelineTimings,
    frames_processed: u64,
    notifications: u64,
    notifications_dropped: u64,
    snapshots_written: u64,
    sink_failures: u64,
}

impl MonitorSession<CommandNotifier, SnapshotStore, NullOverlay> {
    /// Session with the stock audio notifier, TIFF snapshots in
    /// `config.snapshot_dir`, no live view and the system clock.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        let snapshots = SnapshotStore::new(config.snapshot_dir.clone(), config.snapshot_compression);
        Self::with_custom(
            config,
            CommandNotifier::system_default()?,
            snapshots,
            NullOverlay,
            Box::new(SystemClock),
        )
    }
}

impl<N: Notifier, S: SnapshotSink, O: OverlaySink> MonitorSession<N, S, O> {
    pub fn with_custom(
        config: DetectorConfig,
        notifier: N,
        snapshots: S,
        overlay: O,
        clock: Box<dyn Clock>,
    ) -> Result<Self> {
        config.validate()?;
        let extractor = MotionExtractor::new(config.mask_config())?;
        let validator = config.region_validator();
        let debouncer = AlarmDebouncer::new(config.alarm_policy());

        info!(
            mode = ?config.background_mode,
            policy = ?config.diff_policy,
            threshold = config.pixel_diff_threshold,
            alarm_threshold = config.alarm_threshold,
            min_region_area = config.min_region_area,
            "Monitoring session created"
        );

        Ok(Self {
            config,
            extractor,
            validator,
            debouncer,
            background: None,
            notifier,
            snapshots,
            overlay,
            clock,
            timings: PipelineTimings::new(),
            frames_processed: 0,
            notifications: 0,
            notifications_dropped: 0,
            snapshots_written: 0,
            sink_failures: 0,
        })
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn background(&self) -> Option<&BackgroundModel> {
        self.background.as_ref()
    }

    pub fn alarm_state(&self) -> &AlarmState {
        self.debouncer.state()
    }

    pub fn timings(&self) -> &PipelineTimings {
        &self.timings
    }

    /// Builds a fresh background model from `frames`, replacing any previous one.
    pub fn capture_background(&mut self, frames: &[Frame]) -> Result<()> {
        if frames.iter().any(Frame::is_empty) {
            return Err(DetectionError::EmptyFrame);
        }
        let blur = self.config.blur_kernel;
        let preprocessed: Vec<_> = frames.iter().map(|f| preprocess(f, blur)).collect();

        let model = BackgroundModel::capture(
            self.config.background_mode,
            self.config.learning_rate,
            &preprocessed,
        )?;
        let (width, height) = model.dimensions();
        info!(
            frames = frames.len(),
            width, height, "Background captured"
        );
        self.background = Some(model);
        Ok(())
    }

    /// Pulls up to `warm_up_frames` frames from `source` and captures them.
    ///
    /// A source that ends early still yields a background from whatever it
    /// delivered. `EmptyFrame` means it delivered nothing.
    pub fn capture_from_source<F: FrameSource + ?Sized>(&mut self, source: &mut F) -> Result<()> {
        let wanted = self.config.warm_up_frames;
        let mut frames = Vec::with_capacity(wanted);
        while frames.len() < wanted {
            match source.next_frame()? {
                Some(frame) if !frame.is_empty() => frames.push(frame),
                _ => break,
            }
        }
        if frames.is_empty() {
            return Err(DetectionError::EmptyFrame);
        }
        if frames.len() < wanted {
            warn!(
                wanted,
                got = frames.len(),
                "Frame source ended during background warm-up"
            );
        }
        self.capture_background(&frames)
    }

    /// Replaces the background with `frame` immediately. The alarm state,
    /// including both cooldown timers, is left untouched.
    pub fn reset_background(&mut self, frame: &Frame) -> Result<()> {
        if frame.is_empty() {
            return Err(DetectionError::EmptyFrame);
        }
        let current = preprocess(frame, self.config.blur_kernel);
        match self.background.as_mut() {
            Some(model) => {
                model.reset(&current);
                Ok(())
            }
            None => self.capture_background(std::slice::from_ref(frame)),
        }
    }

    /// Runs one frame through every stage and carries out the alarm effects.
    ///
    /// Sink failures are logged and counted, never returned. Errors from this
    /// method mean the frame itself could not be evaluated.
    pub fn process_frame(&mut self, frame: &Frame) -> Result<FrameReport> {
        if frame.is_empty() {
            return Err(DetectionError::EmptyFrame);
        }
        let background = self.background.as_mut().ok_or(DetectionError::NoBackground)?;

        let current = {
            let _span = info_span!("preprocess").entered();
            let timer = Timer::start("preprocess");
            let current = preprocess(frame, self.config.blur_kernel);
            let (name, duration) = timer.stop();
            self.timings.add_step(name, duration);
            current
        };
        background.ensure_matches(&current)?;

        if background.mode() == BackgroundMode::Adaptive {
            let _span = info_span!("update_background").entered();
            let timer = Timer::start("update_background");
            background.update(&current)?;
            let (name, duration) = timer.stop();
            self.timings.add_step(name, duration);
        }

        let mask = {
            let _span = info_span!("extract_mask").entered();
            let timer = Timer::start("extract_mask");
            let mask = self.extractor.extract_preprocessed(&current, background)?;
            let (name, duration) = timer.stop();
            self.timings.add_step(name, duration);
            mask
        };

        let report = {
            let _span = info_span!("validate_regions").entered();
            let timer = Timer::start("validate_regions");
            let report = self.validator.validate(&mask);
            let (name, duration) = timer.stop();
            self.timings.add_step(name, duration);
            report
        };

        let now = self.clock.now();
        let effects = {
            let _span = info_span!("debounce").entered();
            let timer = Timer::start("debounce");
            let signals = MotionSignals {
                global_motion_pixels: report.total_motion_pixels,
                valid_region_count: report.valid_region_count(),
            };
            let effects = self.debouncer.observe(signals, now);
            let (name, duration) = timer.stop();
            self.timings.add_step(name, duration);
            effects
        };

        let snapshot = {
            let _span = info_span!("sinks").entered();
            let timer = Timer::start("sinks");
            let annotated = annotate(frame, &report.regions, effects.overlay);

            if let Err(e) = self.overlay.present(&annotated, &mask) {
                self.sink_failures += 1;
                warn!("Overlay sink failed: {}", e);
            }

            if effects.notify {
                match self.notifier.notify() {
                    Ok(Dispatch::Sent) => {
                        self.notifications += 1;
                        info!("Intrusion notification sent");
                    }
                    Ok(Dispatch::Dropped) => self.notifications_dropped += 1,
                    Err(e) => {
                        self.sink_failures += 1;
                        warn!("Notification failed: {}", e);
                    }
                }
            }

            let snapshot = if effects.snapshot {
                match self.snapshots.persist(&annotated, now) {
                    Ok(path) => {
                        self.snapshots_written += 1;
                        Some(path)
                    }
                    Err(e) => {
                        self.sink_failures += 1;
                        warn!("Snapshot failed: {}", e);
                        None
                    }
                }
            } else {
                None
            };

            let (name, duration) = timer.stop();
            self.timings.add_step(name, duration);
            snapshot
        };

        self.frames_processed += 1;
        Ok(FrameReport {
            regions: report.regions,
            total_motion_pixels: report.total_motion_pixels,
            phase: self.debouncer.state().phase,
            effects,
            snapshot,
        })
    }

    /// Processes frames until the source ends or a `Stop` command arrives.
    ///
    /// Captures a background from the source first when none exists. Commands
    /// are applied between frames.
    pub fn run<F: FrameSource + ?Sized>(
        &mut self,
        source: &mut F,
        commands: &CommandReceiver,
    ) -> Result<()> {
        if self.background.is_none() {
            match self.capture_from_source(source) {
                Err(DetectionError::EmptyFrame) => {
                    info!("Frame source ended before a background could be captured");
                    return Ok(());
                }
                other => other?,
            }
        }

        loop {
            let mut reset_pending = false;
            while let Some(command) = commands.try_next() {
                match command {
                    OperatorCommand::Stop => {
                        info!("Stop requested");
                        return Ok(());
                    }
                    OperatorCommand::CaptureBackground => match self.capture_from_source(source) {
                        Err(DetectionError::EmptyFrame) => {
                            info!("End of stream");
                            return Ok(());
                        }
                        other => other?,
                    },
                    OperatorCommand::ResetBackground => reset_pending = true,
                }
            }

            let frame = match source.next_frame()? {
                Some(frame) if !frame.is_empty() => frame,
                _ => {
                    info!("End of stream");
                    return Ok(());
                }
            };

            if reset_pending {
                self.reset_background(&frame)?;
            }
            self.process_frame(&frame)?;
        }
    }

    /// Ends the session and reports what happened during it.
    pub fn finish(self) -> SessionSummary {
        self.timings.log_summary();
        let summary = SessionSummary {
            frames_processed: self.frames_processed,
            alarm_episodes: self.debouncer.episodes(),
            notifications: self.notifications,
            notifications_dropped: self.notifications_dropped,
            snapshots: self.snapshots_written,
            sink_failures: self.sink_failures,
            final_state: *self.debouncer.state(),
        };
        info!(
            frames = summary.frames_processed,
            episodes = summary.alarm_episodes,
            notifications = summary.notifications,
            notifications_dropped = summary.notifications_dropped,
            snapshots = summary.snapshots,
            sink_failures = summary.sink_failures,
            "Session finished"
        );
        summary
    }
}
