use chrono::{DateTime, Duration, Local, TimeZone};

use crate::motion_pipeline::alarm::{
    AlarmDebouncer, AlarmEffects, AlarmPhase, AlarmPolicy, AlarmState, MotionSignals, transition,
};

fn t0() -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
}

fn policy(notify_secs: i64, snapshot_secs: i64) -> AlarmPolicy {
    AlarmPolicy {
        alarm_threshold: 100,
        notify_cooldown: Duration::seconds(notify_secs),
        snapshot_cooldown: Duration::seconds(snapshot_secs),
    }
}

const INTRUSION: MotionSignals = MotionSignals {
    global_motion_pixels: 400,
    valid_region_count: 1,
};

const QUIET: MotionSignals = MotionSignals {
    global_motion_pixels: 0,
    valid_region_count: 0,
};

#[test]
fn test_first_intrusion_fires_everything() {
    let (state, effects) = transition(&AlarmState::default(), &policy(2, 3), INTRUSION, t0());

    assert_eq!(state.phase, AlarmPhase::Alarmed);
    assert_eq!(state.last_notify, Some(t0()));
    assert_eq!(state.last_snapshot, Some(t0()));
    assert_eq!(
        effects,
        AlarmEffects {
            overlay: true,
            notify: true,
            snapshot: true
        }
    );
}

#[test]
fn test_volume_without_region_is_not_an_intrusion() {
    let signals = MotionSignals {
        global_motion_pixels: 10_000,
        valid_region_count: 0,
    };
    let (state, effects) = transition(&AlarmState::default(), &policy(2, 3), signals, t0());

    assert_eq!(state.phase, AlarmPhase::Idle);
    assert_eq!(effects, AlarmEffects::default());
}

#[test]
fn test_region_without_volume_is_not_an_intrusion() {
    let signals = MotionSignals {
        global_motion_pixels: 100,
        valid_region_count: 3,
    };
    let (state, _) = transition(&AlarmState::default(), &policy(2, 3), signals, t0());
    assert_eq!(state.phase, AlarmPhase::Idle);
}

#[test]
fn test_firing_counts_follow_cooldowns_independently() {
    let step = Duration::milliseconds(100);
    let policy = policy(2, 3);

    for duration_secs in [0i64, 1, 2, 5, 6, 7, 12] {
        let mut state = AlarmState::default();
        let mut notifications = 0;
        let mut snapshots = 0;

        let frames = duration_secs * 10;
        for k in 0..=frames {
            let now = t0() + step * k as i32;
            let (next, effects) = transition(&state, &policy, INTRUSION, now);
            assert!(effects.overlay);
            notifications += effects.notify as i64;
            snapshots += effects.snapshot as i64;
            state = next;
        }

        assert_eq!(notifications, duration_secs / 2 + 1, "D = {}s", duration_secs);
        assert_eq!(snapshots, duration_secs / 3 + 1, "D = {}s", duration_secs);
    }
}

#[test]
fn test_idle_frames_do_not_reset_cooldowns() {
    let policy = policy(2, 3);
    let (state, _) = transition(&AlarmState::default(), &policy, INTRUSION, t0());

    let (state, effects) = transition(&state, &policy, QUIET, t0() + Duration::milliseconds(500));
    assert_eq!(state.phase, AlarmPhase::Idle);
    assert_eq!(state.last_notify, Some(t0()));
    assert_eq!(effects, AlarmEffects::default());

    let (state, effects) = transition(&state, &policy, INTRUSION, t0() + Duration::seconds(1));
    assert_eq!(state.phase, AlarmPhase::Alarmed);
    assert!(effects.overlay);
    assert!(!effects.notify);
    assert!(!effects.snapshot);

    let (_, effects) = transition(&state, &policy, INTRUSION, t0() + Duration::seconds(2));
    assert!(effects.notify);
    assert!(!effects.snapshot);
}

#[test]
fn test_backward_clock_jump_does_not_fire() {
    let policy = policy(2, 3);
    let (state, _) = transition(&AlarmState::default(), &policy, INTRUSION, t0());

    let (state, effects) = transition(&state, &policy, INTRUSION, t0() - Duration::hours(1));
    assert!(!effects.notify);
    assert!(!effects.snapshot);
    assert_eq!(state.last_notify, Some(t0()));

    let (state, effects) = transition(&state, &policy, INTRUSION, t0() + Duration::seconds(1));
    assert!(!effects.notify);

    let (_, effects) = transition(&state, &policy, INTRUSION, t0() + Duration::seconds(3));
    assert!(effects.notify);
    assert!(effects.snapshot);
}

#[test]
fn test_zero_cooldown_fires_every_alarmed_frame() {
    let policy = policy(0, 0);
    let mut state = AlarmState::default();
    for k in 0..5 {
        let (next, effects) = transition(&state, &policy, INTRUSION, t0() + Duration::seconds(k));
        assert!(effects.notify && effects.snapshot);
        state = next;
    }
}

#[test]
fn test_debouncer_counts_episodes() {
    let mut debouncer = AlarmDebouncer::new(policy(2, 3));
    let signals = [INTRUSION, INTRUSION, QUIET, INTRUSION, QUIET, QUIET, INTRUSION];

    for (k, signal) in signals.into_iter().enumerate() {
        debouncer.observe(signal, t0() + Duration::seconds(k as i64));
    }

    assert_eq!(debouncer.episodes(), 3);
    assert_eq!(debouncer.state().phase, AlarmPhase::Alarmed);
    assert_eq!(debouncer.policy().alarm_threshold, 100);
}
