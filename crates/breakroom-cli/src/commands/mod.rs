pub mod breaks;
pub mod config;
pub mod env;
pub mod stats;

use breakroom_core::{BreakPlanner, Config, Database};
use chrono::{DateTime, Utc};

const PLANNER_KEY: &str = "break_planner";

/// Load the persisted planner snapshot, or start a fresh one from the
/// current configuration. Remaining times are corrected for whatever
/// wall-clock time passed since the snapshot was taken.
pub fn load_planner(db: &Database, now: DateTime<Utc>) -> BreakPlanner {
    if let Ok(Some(json)) = db.kv_get(PLANNER_KEY) {
        if let Ok(mut planner) = serde_json::from_str::<BreakPlanner>(&json) {
            planner.correct_scheduler(now);
            return planner;
        }
    }
    let mut planner = BreakPlanner::new(Config::load_or_default().break_settings());
    planner.next_break(now);
    planner
}

pub fn save_planner(
    db: &Database,
    planner: &BreakPlanner,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(planner)?;
    db.kv_set(PLANNER_KEY, &json)?;
    Ok(())
}

/// Drain lifecycle events: print each as a JSON line and feed it into
/// the break history, so completed breaks land in the `breaks` table.
pub fn publish_events(
    db: &Database,
    planner: &mut BreakPlanner,
) -> Result<(), Box<dyn std::error::Error>> {
    for event in planner.drain_events() {
        db.record_break_event(&event)?;
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}
