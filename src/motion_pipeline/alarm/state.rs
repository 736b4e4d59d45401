//! Alarm state and its pure transition function.
//!
//! Nothing here touches pixels, sinks or clocks; the caller supplies the
//! per-frame signals and the current time and carries out the returned effects.

use chrono::{DateTime, Duration, Local};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlarmPhase {
    #[default]
    Idle,
    Alarmed,
}

/// State carried from one frame to the next for the life of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlarmState {
    pub phase: AlarmPhase,
    /// `None` until the first notification fires.
    pub last_notify: Option<DateTime<Local>>,
    /// `None` until the first snapshot fires.
    pub last_snapshot: Option<DateTime<Local>>,
}

/// Per-frame detection signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionSignals {
    pub global_motion_pixels: u32,
    pub valid_region_count: usize,
}

/// Session-constant alarm thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmPolicy {
    /// Motion pixel count that must be strictly exceeded.
    pub alarm_threshold: u32,
    pub notify_cooldown: Duration,
    pub snapshot_cooldown: Duration,
}

impl AlarmPolicy {
    /// Both gates must hold: enough changed pixels and at least one coherent region.
    pub fn is_intrusion(&self, signals: &MotionSignals) -> bool {
        signals.global_motion_pixels > self.alarm_threshold && signals.valid_region_count >= 1
    }
}

/// Side effects to run for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlarmEffects {
    /// Draw the alarm label. Set on every alarmed frame, independent of cooldowns.
    pub overlay: bool,
    pub notify: bool,
    pub snapshot: bool,
}

/// Computes the next state and the effects for a frame observed at `now`.
///
/// Cooldown timers are never cleared when the alarm drops back to idle, so
/// flapping between states cannot shorten the debounce window.
pub fn transition(
    state: &AlarmState,
    policy: &AlarmPolicy,
    signals: MotionSignals,
    now: DateTime<Local>,
) -> (AlarmState, AlarmEffects) {
    if !policy.is_intrusion(&signals) {
        let next = AlarmState {
            phase: AlarmPhase::Idle,
            ..*state
        };
        return (next, AlarmEffects::default());
    }

    let notify = cooldown_elapsed(state.last_notify, policy.notify_cooldown, now);
    let snapshot = cooldown_elapsed(state.last_snapshot, policy.snapshot_cooldown, now);

    let next = AlarmState {
        phase: AlarmPhase::Alarmed,
        last_notify: if notify { Some(now) } else { state.last_notify },
        last_snapshot: if snapshot { Some(now) } else { state.last_snapshot },
    };
    let effects = AlarmEffects {
        overlay: true,
        notify,
        snapshot,
    };
    (next, effects)
}

/// Elapsed time is clamped at zero: a clock that jumps backwards delays the next
/// firing instead of being read as "cooldown expired long ago".
fn cooldown_elapsed(last: Option<DateTime<Local>>, cooldown: Duration, now: DateTime<Local>) -> bool {
    match last {
        None => true,
        Some(last) => now.signed_duration_since(last).max(Duration::zero()) >= cooldown,
    }
}
