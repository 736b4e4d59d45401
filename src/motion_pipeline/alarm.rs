//! Alarm debouncing module
//!
//! Decides per frame whether an intrusion is active and gates the notification
//! and snapshot side effects behind independent wall-clock cooldowns.

mod clock;
mod debouncer;
pub mod state;

#[cfg(test)]
mod tests;

pub use clock::{Clock, SystemClock};
pub use debouncer::AlarmDebouncer;
pub use state::{AlarmEffects, AlarmPhase, AlarmPolicy, AlarmState, MotionSignals, transition};
