//! Motion detection pipeline
//!
//! Each submodule owns one stage of the per-frame pass. The [`session`] module
//! wires them together and owns all state that survives between frames.

pub mod alarm;
pub mod background;
pub mod common;
pub mod config;
pub mod frame;
pub mod mask;
pub mod regions;
pub mod session;
pub mod sinks;

pub use common::{DetectionError, Result};

pub use frame::{BlurKernel, Frame, FrameSource, ImageSequenceSource, preprocess};

pub use background::{BackgroundMode, BackgroundModel};

pub use mask::{CleanupConfig, DiffPolicy, MaskConfig, MotionExtractor, MotionMask};

pub use regions::{BoundingBox, Region, RegionReport, RegionValidator};

pub use alarm::{
    AlarmDebouncer, AlarmEffects, AlarmPhase, AlarmPolicy, AlarmState, Clock, MotionSignals,
    SystemClock,
};

pub use sinks::{
    ALARM_LABEL, AnnotatedFrame, CommandNotifier, DirectoryOverlay, Dispatch, Notifier,
    NullOverlay, OverlaySink, SilentNotifier, SnapshotCompression, SnapshotSink, SnapshotStore,
    SnapshotWriter, TiffSnapshotWriter, annotate,
};

pub use config::{DetectorConfig, DetectorConfigBuilder};

pub use session::{
    CommandReceiver, FrameReport, MonitorSession, OperatorCommand, OperatorHandle,
    PipelineTimings, SessionSummary, command_channel,
};
