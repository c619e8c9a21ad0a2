//! Read-only settings view consumed by the planner.
//!
//! The planner never writes settings; the storage layer produces this
//! snapshot from the persisted configuration and the embedding hands a
//! fresh copy to `BreakPlanner::reinitialize` when preferences change.

use serde::{Deserialize, Serialize};

/// The two break kinds. Shared logic is parametrized by this enum and
/// looks per-kind settings up by key instead of subclassing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakKind {
    Mini,
    Long,
}

/// Per-kind scheduling policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakKindSettings {
    pub enabled: bool,
    /// Cadence: time from one break of this kind to the next, minutes.
    pub interval_min: u32,
    /// How long the break surface stays open, milliseconds.
    pub duration_ms: u64,
    /// Notification lead time before the break starts, milliseconds.
    /// 0 disables the pre-break notification.
    pub notification_ms: u64,
    /// Strict mode: the break cannot be skipped or postponed.
    pub strict: bool,
    pub postpone: bool,
    /// Per-cycle postponement count limit. 0 disables postponement.
    pub postpones_limit: u32,
    /// Postponement is allowed only while at most this percentage of
    /// the break duration has elapsed.
    pub postponable_percent: u8,
    /// How far a postponement pushes the break start, milliseconds.
    pub postpone_ms: u64,
}

impl BreakKindSettings {
    pub fn interval_ms(&self) -> u64 {
        u64::from(self.interval_min) * 60_000
    }
}

/// Everything the scheduling engine reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakSettings {
    pub microbreak: BreakKindSettings,
    pub long_break: BreakKindSettings,
    /// Watch the system Do-Not-Disturb state.
    pub monitor_dnd: bool,
    pub app_exclusions_enabled: bool,
    /// Foreground application ids that suppress the schedule. A
    /// trailing `*` matches any suffix.
    pub app_exclusions: Vec<String>,
    pub natural_breaks: bool,
    /// Idle time after which the user counts as naturally resting.
    pub natural_breaks_inactivity_ms: u64,
    pub pause_for_suspend: bool,
    /// Ask the presentation layer to play a sound when a break runs to
    /// completion on its own.
    pub break_sounds: bool,
}

impl BreakSettings {
    pub fn kind(&self, kind: BreakKind) -> &BreakKindSettings {
        match kind {
            BreakKind::Mini => &self.microbreak,
            BreakKind::Long => &self.long_break,
        }
    }
}

impl Default for BreakSettings {
    fn default() -> Self {
        Self {
            microbreak: BreakKindSettings {
                enabled: true,
                interval_min: 10,
                duration_ms: 20_000,
                notification_ms: 10_000,
                strict: false,
                postpone: true,
                postpones_limit: 3,
                postponable_percent: 30,
                postpone_ms: 120_000,
            },
            long_break: BreakKindSettings {
                enabled: true,
                interval_min: 30,
                duration_ms: 300_000,
                notification_ms: 30_000,
                strict: false,
                postpone: true,
                postpones_limit: 1,
                postponable_percent: 30,
                postpone_ms: 300_000,
            },
            monitor_dnd: false,
            app_exclusions_enabled: false,
            app_exclusions: Vec::new(),
            natural_breaks: false,
            natural_breaks_inactivity_ms: 180_000,
            pause_for_suspend: true,
            break_sounds: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_lookup_is_symmetric() {
        let settings = BreakSettings::default();
        assert_eq!(settings.kind(BreakKind::Mini).duration_ms, 20_000);
        assert_eq!(settings.kind(BreakKind::Long).duration_ms, 300_000);
    }

    #[test]
    fn interval_converts_to_milliseconds() {
        let settings = BreakSettings::default();
        assert_eq!(settings.microbreak.interval_ms(), 600_000);
        assert_eq!(settings.long_break.interval_ms(), 1_800_000);
    }
}
