//! Region validation module
//!
//! Connected foreground regions of a motion mask, filtered by area.

pub mod types;
mod validator;

pub use types::{BoundingBox, Region, RegionReport};
pub use validator::RegionValidator;
