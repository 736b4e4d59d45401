use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::motion_pipeline::alarm::state::{
    AlarmEffects, AlarmPhase, AlarmPolicy, AlarmState, MotionSignals, transition,
};

/// Owns the [`AlarmState`] of a session and applies [`transition`] once per frame.
pub struct AlarmDebouncer {
    policy: AlarmPolicy,
    state: AlarmState,
    episodes: u64,
}

impl AlarmDebouncer {
    pub fn new(policy: AlarmPolicy) -> Self {
        Self {
            policy,
            state: AlarmState::default(),
            episodes: 0,
        }
    }

    pub fn observe(&mut self, signals: MotionSignals, now: DateTime<Local>) -> AlarmEffects {
        let previous = self.state.phase;
        let (next, effects) = transition(&self.state, &self.policy, signals, now);

        match (previous, next.phase) {
            (AlarmPhase::Idle, AlarmPhase::Alarmed) => {
                self.episodes += 1;
                info!(
                    motion_pixels = signals.global_motion_pixels,
                    regions = signals.valid_region_count,
                    "Intrusion detected"
                );
            }
            (AlarmPhase::Alarmed, AlarmPhase::Idle) => info!("Intrusion cleared"),
            _ => {}
        }
        debug!(
            phase = ?next.phase,
            motion_pixels = signals.global_motion_pixels,
            regions = signals.valid_region_count,
            notify = effects.notify,
            snapshot = effects.snapshot,
            "Alarm evaluated"
        );

        self.state = next;
        effects
    }

    pub fn state(&self) -> &AlarmState {
        &self.state
    }

    pub fn policy(&self) -> &AlarmPolicy {
        &self.policy
    }

    /// Number of idle-to-alarmed transitions so far.
    pub fn episodes(&self) -> u64 {
        self.episodes
    }
}
