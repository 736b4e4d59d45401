//! Output sinks module
//!
//! Overlay rendering, notification dispatch and snapshot persistence. Failures
//! in any of these are reported to the caller but never stop detection.

mod notifier;
mod overlay;
mod snapshot;

pub use notifier::{CommandNotifier, Dispatch, Notifier, SilentNotifier};
pub use overlay::{ALARM_LABEL, AnnotatedFrame, DirectoryOverlay, NullOverlay, OverlaySink, annotate};
pub use snapshot::{
    SnapshotCompression, SnapshotSink, SnapshotStore, SnapshotWriter, TiffSnapshotWriter,
    snapshot_stem,
};
