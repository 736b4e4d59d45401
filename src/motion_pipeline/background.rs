//! Background model module
//!
//! Holds the reference image of the empty scene, fixed or continuously adapted.

pub mod model;


pub use model::{BackgroundMode, BackgroundModel};
