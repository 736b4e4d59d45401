use crate::motion_pipeline::common::error::Result;
use crate::motion_pipeline::frame::types::Frame;

/// Blocking, ordered supply of frames.
///
/// `Ok(None)` means end of stream. A frame with no pixels is treated the same
/// way by the session. Implementations must keep frame dimensions stable for a
/// session; a change surfaces as `DimensionMismatch` downstream.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}
