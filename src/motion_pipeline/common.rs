//! Shared error type for every pipeline stage.

pub mod error;

pub use error::{DetectionError, Result};
