//! Detector configuration module
//!
//! All tuning constants of a session in one serializable value, with two
//! presets and a builder.

mod types;


pub use types::{DetectorConfig, DetectorConfigBuilder};
