//! Integration tests for the break scheduling workflow.
//!
//! Drives a planner through full notify/start/finish cycles the way an
//! embedding would: periodic ticks, event draining, persistence of the
//! planner snapshot between "process runs" and break history recording.

use breakroom_core::{BreakPlanner, BreakSettings, Database, Event, EventKind, Status};
use chrono::{Duration, Utc};

fn settings() -> BreakSettings {
    let mut settings = BreakSettings::default();
    settings.microbreak.interval_min = 10;
    settings.microbreak.duration_ms = 20_000;
    settings.microbreak.notification_ms = 10_000;
    settings.long_break.interval_min = 30;
    settings.long_break.duration_ms = 300_000;
    settings.long_break.notification_ms = 30_000;
    settings
}

#[test]
fn full_day_cycle_interleaves_micro_and_long_breaks() {
    let mut now = Utc::now();
    let mut planner = BreakPlanner::new(settings());
    planner.next_break(now);

    let mut starts = Vec::new();
    // Tick once a second for a simulated 35 minutes.
    for _ in 0..(35 * 60) {
        now += Duration::seconds(1);
        planner.tick(now);
        for event in planner.drain_events() {
            match event {
                Event::StartMicrobreak { .. } => starts.push("mini"),
                Event::StartBreak { .. } => starts.push("long"),
                _ => {}
            }
        }
    }

    // Two microbreak cycles, then the 30-minute long deadline wins.
    assert_eq!(starts, vec!["mini", "mini", "long"]);
    assert_eq!(planner.break_number(), 3);
}

#[test]
fn planner_snapshot_survives_process_restart() {
    let now = Utc::now();
    let mut planner = BreakPlanner::new(settings());
    planner.next_break(now);

    let db = Database::open_memory().unwrap();
    let json = serde_json::to_string(&planner).unwrap();
    db.kv_set("planner", &json).unwrap();

    // A later invocation loads the snapshot; the deadline is absolute,
    // so remaining time accounts for the elapsed gap.
    let stored = db.kv_get("planner").unwrap().unwrap();
    let restored: BreakPlanner = serde_json::from_str(&stored).unwrap();
    let later = now + Duration::minutes(4);
    assert_eq!(
        restored.scheduler().reference(),
        planner.scheduler().reference()
    );
    assert_eq!(
        restored.scheduler().time_left(later),
        Some((10 * 60_000 - 10_000) - 4 * 60_000)
    );
}

#[test]
fn overdue_snapshot_fires_after_correction() {
    let now = Utc::now();
    let mut planner = BreakPlanner::new(settings());
    planner.next_break(now);

    let json = serde_json::to_string(&planner).unwrap();
    let mut restored: BreakPlanner = serde_json::from_str(&json).unwrap();

    // The machine slept past the deadline.
    let later = now + Duration::hours(2);
    restored.correct_scheduler(later);
    let events = restored.drain_events();
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::StartMicrobreakNotification { .. })));
    assert_eq!(
        restored.scheduler().reference(),
        Some(EventKind::StartMicrobreak)
    );
}

#[test]
fn finish_events_feed_break_history() {
    let db = Database::open_memory().unwrap();
    let mut now = Utc::now();
    let mut planner = BreakPlanner::new(settings());
    planner.skip_to_microbreak(Some(0), now);
    planner.tick(now);
    for event in planner.drain_events() {
        db.record_break_event(&event).unwrap();
    }

    now += Duration::seconds(20);
    planner.tick(now);
    for event in planner.drain_events() {
        db.record_break_event(&event).unwrap();
    }

    let stats = db.stats_all().unwrap();
    assert_eq!(stats.total_microbreaks, 1);
    assert_eq!(stats.total_break_sec, 20);
    let records = db.recent_breaks(10).unwrap();
    assert_eq!(records[0].kind, "mini");
    assert_eq!(records[0].duration_sec, 20);
}

#[test]
fn pause_across_restart_keeps_frozen_plan() {
    let now = Utc::now();
    let mut planner = BreakPlanner::new(settings());
    planner.next_break(now);
    let left_before = planner.scheduler().time_left(now).unwrap();
    planner.pause(1, now);

    let json = serde_json::to_string(&planner).unwrap();
    let mut restored: BreakPlanner = serde_json::from_str(&json).unwrap();
    assert!(restored.is_paused());

    let later = now + Duration::hours(3);
    restored.resume(false, later);
    // The frozen countdown resumes where it stopped, hours later.
    assert_eq!(restored.scheduler().time_left(later), Some(left_before));
}

#[test]
fn status_tracks_the_full_cycle() {
    let mut now = Utc::now();
    let mut planner = BreakPlanner::new(settings());
    planner.next_break(now);
    assert!(Status::capture(&planner, now)
        .message
        .starts_with("next mini break in"));

    now += Duration::minutes(10);
    planner.tick(now); // notification
    planner.tick(now); // not yet due; start is 10s out
    now += Duration::seconds(10);
    planner.tick(now); // break opens
    assert_eq!(
        Status::capture(&planner, now).message,
        "mini break in progress"
    );

    now += Duration::seconds(20);
    planner.tick(now); // break closes, next cycle planned
    planner.drain_events();
    assert!(Status::capture(&planner, now)
        .message
        .starts_with("next mini break in"));
}
