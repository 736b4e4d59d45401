//! Motion mask module
//!
//! Differencing against the background, binarization and morphological cleanup.

mod extractor;
pub mod types;

#[cfg(test)]
mod tests;

pub use extractor::MotionExtractor;
pub use types::{CleanupConfig, DiffPolicy, FOREGROUND, MaskConfig, MotionMask};
