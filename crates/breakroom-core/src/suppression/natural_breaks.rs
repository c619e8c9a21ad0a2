//! Natural-breaks hold.
//!
//! When the user has been idle longer than the configured threshold
//! they are already resting, so firing a scheduled break would be
//! noise. The embedding samples system idle time periodically; the
//! hold releases on the first sample showing activity, and the cadence
//! then restarts from scratch.

use serde::{Deserialize, Serialize};

use crate::settings::BreakSettings;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NaturalBreaksManager {
    enabled: bool,
    inactivity_threshold_ms: u64,
    cleared: bool,
}

impl NaturalBreaksManager {
    pub fn new(settings: &BreakSettings) -> Self {
        Self {
            enabled: settings.natural_breaks,
            inactivity_threshold_ms: settings.natural_breaks_inactivity_ms,
            cleared: false,
        }
    }

    /// True while the idle hold suppresses the schedule.
    pub fn is_scheduler_cleared(&self) -> bool {
        self.cleared
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Apply changed settings. Returns `Some(false)` when an active
    /// hold must be released because the feature was switched off.
    pub fn reinitialize(&mut self, settings: &BreakSettings) -> Option<bool> {
        self.enabled = settings.natural_breaks;
        self.inactivity_threshold_ms = settings.natural_breaks_inactivity_ms;
        if !self.enabled && self.cleared {
            self.cleared = false;
            return Some(false);
        }
        None
    }

    /// Toggle the feature at runtime (preferences checkbox).
    pub fn set_enabled(&mut self, enabled: bool) -> Option<bool> {
        self.enabled = enabled;
        if !enabled && self.cleared {
            self.cleared = false;
            return Some(false);
        }
        None
    }

    /// Feed a system idle-time sample. Returns the new suppression
    /// state when it flips.
    pub fn observe_idle(&mut self, idle_ms: u64) -> Option<bool> {
        if !self.enabled {
            return None;
        }
        let resting = idle_ms >= self.inactivity_threshold_ms;
        if resting == self.cleared {
            return None;
        }
        self.cleared = resting;
        tracing::info!(idle_ms, resting, "natural break state changed");
        Some(resting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(threshold_ms: u64) -> BreakSettings {
        BreakSettings {
            natural_breaks: true,
            natural_breaks_inactivity_ms: threshold_ms,
            ..BreakSettings::default()
        }
    }

    #[test]
    fn holds_after_threshold_and_releases_on_activity() {
        let mut manager = NaturalBreaksManager::new(&settings(60_000));
        assert_eq!(manager.observe_idle(30_000), None);
        assert_eq!(manager.observe_idle(60_000), Some(true));
        assert_eq!(manager.observe_idle(90_000), None);
        assert_eq!(manager.observe_idle(500), Some(false));
    }

    #[test]
    fn disabled_manager_ignores_samples() {
        let mut manager = NaturalBreaksManager::new(&BreakSettings::default());
        assert_eq!(manager.observe_idle(3_600_000), None);
        assert!(!manager.is_scheduler_cleared());
    }

    #[test]
    fn turning_off_releases_active_hold() {
        let mut manager = NaturalBreaksManager::new(&settings(60_000));
        manager.observe_idle(120_000);
        assert_eq!(manager.set_enabled(false), Some(false));
        assert!(!manager.is_scheduler_cleared());
    }
}
