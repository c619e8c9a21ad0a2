//! Status snapshot for trays and status bars.
//!
//! Pure read-side: turns the planner state into a serializable snapshot
//! and a one-line human message. Time phrases are deliberately rough
//! ("about 5 minutes") since the underlying deadline moves with every
//! suppression and postponement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::planner::BreakPlanner;
use crate::scheduler::EventKind;
use crate::suppression::Suppression;

/// Rough humanized duration, moment.js style.
pub fn humanize_ms(ms: u64) -> String {
    if ms < 60_000 {
        return "less than a minute".to_string();
    }
    if ms < 90_000 {
        return "about a minute".to_string();
    }
    let minutes = (ms + 30_000) / 60_000;
    if minutes < 60 {
        return format!("about {minutes} minutes");
    }
    let hours = (minutes + 30) / 60;
    if hours == 1 {
        "about an hour".to_string()
    } else {
        format!("about {hours} hours")
    }
}

/// Point-in-time view of the planner, for `status` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Status {
    pub message: String,
    pub paused: bool,
    pub suppressions: Vec<Suppression>,
    pub reference: Option<EventKind>,
    pub time_left_ms: Option<u64>,
    pub time_to_next_break_ms: Option<u64>,
    /// Estimated microbreaks before the next long break, when the next
    /// planned break is a microbreak.
    pub microbreaks_until_long: Option<u64>,
    pub break_number: u64,
    pub postpones_number: u32,
}

impl Status {
    pub fn capture(planner: &BreakPlanner, now: DateTime<Utc>) -> Self {
        let microbreaks_until_long = microbreaks_until_long(planner, now);
        Self {
            message: message_for(planner, microbreaks_until_long, now),
            paused: planner.is_paused(),
            suppressions: planner.suppressions().iter().copied().collect(),
            reference: planner.scheduler().reference(),
            time_left_ms: planner.scheduler().time_left(now),
            time_to_next_break_ms: planner.time_to_next_break(now),
            microbreaks_until_long,
            break_number: planner.break_number(),
            postpones_number: planner.postpones_number(),
        }
    }
}

fn microbreaks_until_long(planner: &BreakPlanner, now: DateTime<Utc>) -> Option<u64> {
    match planner.scheduler().reference()? {
        EventKind::StartMicrobreak | EventKind::StartMicrobreakNotification => {}
        _ => return None,
    }
    if !planner.settings().long_break.enabled {
        return None;
    }
    let long_at = planner.next_long_break_at()?;
    let long_remaining = (long_at - now).num_milliseconds().max(0) as u64;
    let micro_interval = planner.settings().microbreak.interval_ms().max(1);
    // How many full microbreak cycles fit before the long deadline.
    Some((long_remaining.max(1) - 1) / micro_interval)
}

fn message_for(
    planner: &BreakPlanner,
    microbreaks_until_long: Option<u64>,
    now: DateTime<Utc>,
) -> String {
    let reference = planner.scheduler().reference();
    match reference {
        Some(EventKind::FinishMicrobreak) => return "mini break in progress".to_string(),
        Some(EventKind::FinishBreak) => return "long break in progress".to_string(),
        _ => {}
    }

    if planner.is_paused() {
        return match (reference, planner.scheduler().time_left(now)) {
            (Some(EventKind::ResumeBreaks), Some(left)) => {
                format!("paused, resuming in {}", humanize_ms(left))
            }
            _ => "paused indefinitely".to_string(),
        };
    }
    if planner.suppressions().contains(&Suppression::Dnd) {
        return "paused in do not disturb mode".to_string();
    }
    if planner.suppressions().contains(&Suppression::AppExclusion) {
        return "paused while an excluded application runs".to_string();
    }
    if planner.suppressions().contains(&Suppression::NaturalBreak) {
        return "paused for a natural break".to_string();
    }

    let Some(until) = planner.time_to_next_break(now) else {
        return "no breaks planned".to_string();
    };
    let kind = match reference {
        Some(EventKind::StartBreak) | Some(EventKind::StartBreakNotification) => "long break",
        _ => "mini break",
    };
    let mut message = format!("next {kind} in {}", humanize_ms(until));
    if let Some(n) = microbreaks_until_long {
        if n > 0 {
            message.push_str(&format!(", {n} more until the long break"));
        }
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::BreakSettings;

    #[test]
    fn humanize_rounds_like_a_human() {
        assert_eq!(humanize_ms(20_000), "less than a minute");
        assert_eq!(humanize_ms(70_000), "about a minute");
        assert_eq!(humanize_ms(5 * 60_000), "about 5 minutes");
        assert_eq!(humanize_ms(59 * 60_000), "about an hour");
        assert_eq!(humanize_ms(3 * 3_600_000), "about 3 hours");
    }

    fn settings() -> BreakSettings {
        let mut settings = BreakSettings::default();
        settings.microbreak.interval_min = 10;
        settings.long_break.interval_min = 30;
        settings
    }

    #[test]
    fn reports_upcoming_microbreak_with_long_countdown() {
        let now = Utc::now();
        let mut planner = BreakPlanner::new(settings());
        planner.next_break(now);
        let status = Status::capture(&planner, now);
        assert!(status.message.starts_with("next mini break in about 10 minutes"));
        assert_eq!(status.microbreaks_until_long, Some(2));
        assert!(!status.paused);
    }

    #[test]
    fn reports_break_in_progress() {
        let now = Utc::now();
        let mut planner = BreakPlanner::new(settings());
        planner.skip_to_microbreak(Some(0), now);
        planner.tick(now);
        let status = Status::capture(&planner, now);
        assert_eq!(status.message, "mini break in progress");
    }

    #[test]
    fn reports_pause_states() {
        let now = Utc::now();
        let mut planner = BreakPlanner::new(settings());
        planner.next_break(now);

        planner.pause(1, now);
        assert_eq!(Status::capture(&planner, now).message, "paused indefinitely");

        planner.pause(5 * 60_000, now);
        let status = Status::capture(&planner, now);
        assert_eq!(status.message, "paused, resuming in about 5 minutes");
    }

    #[test]
    fn reports_dnd_suppression() {
        let now = Utc::now();
        let mut settings = settings();
        settings.monitor_dnd = true;
        let mut planner = BreakPlanner::new(settings);
        planner.next_break(now);
        planner.observe_dnd(true, now);
        let status = Status::capture(&planner, now);
        assert_eq!(status.message, "paused in do not disturb mode");
    }

    #[test]
    fn reports_idle_planner() {
        let now = Utc::now();
        let planner = BreakPlanner::new(settings());
        assert_eq!(Status::capture(&planner, now).message, "no breaks planned");
    }
}
