use std::time::Duration;

use chrono::{TimeZone, Utc};
use pfwatch_core::services::clock::{DisableState, ReportingClock, ResumeCause, Tick};

#[test]
fn test_starts_active() {
    let mut clock = ReportingClock::new();
    assert_eq!(clock.state(), DisableState::Active);
    assert_eq!(clock.poll(&true), Tick::Active);
    assert_eq!(clock.status_text(), "Enabled");
}

#[test]
fn test_timed_suspension_lifts_on_first_poll_after_deadline() {
    let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let mut clock = ReportingClock::new();
    clock.disable_for_at(t0, Duration::from_secs(5));

    assert_eq!(clock.poll_at(t0, &true), Tick::Suspended);
    assert_eq!(clock.poll_at(t0 + chrono::Duration::seconds(4), &true), Tick::Suspended);
    assert_eq!(
        clock.poll_at(t0 + chrono::Duration::seconds(5), &true),
        Tick::Resumed(ResumeCause::DeadlineReached)
    );
    assert!(clock.is_active());
    assert_eq!(clock.poll_at(t0 + chrono::Duration::seconds(6), &true), Tick::Active);
}

#[test]
fn test_timed_status_text_shows_deadline() {
    let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let mut clock = ReportingClock::new();
    clock.disable_for_at(t0, Duration::from_secs(300));
    assert_eq!(clock.status_text(), "Disabled until 2026-03-01 12:05:00 UTC");
}

#[test]
fn test_session_suspension_lifts_when_session_ends() {
    let mut clock = ReportingClock::new();
    clock.disable_until_session_end();
    assert_eq!(clock.status_text(), "Disabled until logout");

    assert_eq!(clock.poll(&true), Tick::Suspended);
    assert_eq!(clock.poll(&true), Tick::Suspended);
    assert_eq!(clock.poll(&false), Tick::Resumed(ResumeCause::SessionEnded));
    assert_eq!(clock.poll(&false), Tick::Active);
}

#[test]
fn test_restart_suspension_only_clears_on_enable() {
    let far_future = Utc.with_ymd_and_hms(2100, 1, 1, 0, 0, 0).unwrap();
    let mut clock = ReportingClock::new();
    clock.disable_until_restart();
    assert_eq!(clock.poll_at(far_future, &false), Tick::Suspended);
    assert_eq!(clock.status_text(), "Disabled until restart");

    clock.enable();
    assert_eq!(clock.poll(&false), Tick::Active);
}

#[test]
fn test_enable_clears_any_suspension() {
    let mut clock = ReportingClock::new();
    clock.disable_for(Duration::from_secs(3600));
    assert!(!clock.is_active());
    clock.enable();
    assert_eq!(clock.state(), DisableState::Active);
}

#[test]
fn test_out_of_range_duration_suspends_until_restart() {
    let mut clock = ReportingClock::new();
    clock.disable_for(Duration::from_secs(u64::MAX));
    assert_eq!(clock.state(), DisableState::SuspendedUntilRestart);
}

#[test]
fn test_tick_activity() {
    assert!(Tick::Active.is_active());
    assert!(Tick::Resumed(ResumeCause::SessionEnded).is_active());
    assert!(!Tick::Suspended.is_active());
}
