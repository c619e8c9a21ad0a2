use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every lifecycle transition in the planner produces an Event.
/// The embedding (CLI, tray, break windows) drains and reacts to them;
/// the planner itself never renders anything.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A microbreak starts once the notification lead time elapses.
    StartMicrobreakNotification {
        /// Lead time until the break starts, in milliseconds.
        starts_in_ms: u64,
        at: DateTime<Utc>,
    },
    /// A long break starts once the notification lead time elapses.
    StartBreakNotification {
        starts_in_ms: u64,
        at: DateTime<Utc>,
    },
    /// Open the microbreak surface. Capability flags are computed at
    /// start time; the surface must not offer postpone/skip beyond them.
    StartMicrobreak {
        duration_ms: u64,
        postponable: bool,
        strict: bool,
        at: DateTime<Utc>,
    },
    /// Open the long-break surface.
    StartBreak {
        duration_ms: u64,
        postponable: bool,
        strict: bool,
        at: DateTime<Utc>,
    },
    /// Close the microbreak surface.
    FinishMicrobreak {
        should_play_sound: bool,
        should_plan_next: bool,
        at: DateTime<Utc>,
    },
    /// Close the long-break surface.
    FinishBreak {
        should_play_sound: bool,
        should_plan_next: bool,
        at: DateTime<Utc>,
    },
    /// Scheduling resumed after a pause.
    ResumeBreaks { at: DateTime<Utc> },
    /// Pause/suppression state changed; refresh any status display.
    UpdateStatus { at: DateTime<Utc> },
}
