//! Monitoring session module
//!
//! A [`MonitorSession`] owns the background model, the alarm state and the
//! session configuration, and runs the synchronous per-frame pass over them.

mod commands;
mod monitor;
mod timing;


pub use commands::{CommandReceiver, OperatorCommand, OperatorHandle, command_channel};
pub use monitor::{FrameReport, MonitorSession, SessionSummary};
pub use timing::{PipelineTimings, StageTiming, Timer};
