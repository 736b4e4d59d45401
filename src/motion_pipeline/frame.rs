//! Frame acquisition module
//!
//! Frames, the luminance/blur preprocessing shared by the background model and
//! the mask extractor, and the [`FrameSource`] seam for camera-like inputs.

mod image_sequence_source;
pub mod preprocess;
mod source;
pub mod types;

pub use image_sequence_source::ImageSequenceSource;
pub use preprocess::{BlurKernel, preprocess};
pub use source::FrameSource;
pub use types::Frame;
