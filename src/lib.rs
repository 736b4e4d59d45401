//! Background-subtraction motion detection with a debounced intrusion alarm.
//!
//! Frames flow through a single synchronous pass per frame:
//! background model -> motion mask -> region validation -> alarm debouncer -> sinks.
//! See [`motion_pipeline::MonitorSession`] for the entry point.

pub mod logger;
pub mod motion_pipeline;
