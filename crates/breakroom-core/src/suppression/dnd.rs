//! Do-Not-Disturb watcher.
//!
//! The platform probe (notification-center query, D-Bus signal, ...)
//! lives in the embedding; this manager just tracks the reported state
//! and decides when the suppression edge flips.

use serde::{Deserialize, Serialize};

use crate::settings::BreakSettings;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DndManager {
    monitoring: bool,
    on_dnd: bool,
}

impl DndManager {
    pub fn new(settings: &BreakSettings) -> Self {
        Self {
            monitoring: settings.monitor_dnd,
            on_dnd: false,
        }
    }

    /// Current status, as shown in status displays.
    pub fn is_on_dnd(&self) -> bool {
        self.on_dnd
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring
    }

    /// Apply changed settings. Returns `Some(false)` when monitoring
    /// was switched off while DND held the schedule, so the planner can
    /// release the suppression.
    pub fn reinitialize(&mut self, settings: &BreakSettings) -> Option<bool> {
        self.monitoring = settings.monitor_dnd;
        if !self.monitoring && self.on_dnd {
            self.on_dnd = false;
            return Some(false);
        }
        None
    }

    /// Toggle monitoring at runtime (preferences checkbox).
    pub fn set_monitoring(&mut self, enabled: bool) -> Option<bool> {
        self.monitoring = enabled;
        if !enabled && self.on_dnd {
            self.on_dnd = false;
            return Some(false);
        }
        None
    }

    /// Feed an observed DND state. Returns the new suppression state
    /// when it flips, `None` when nothing changed.
    pub fn observe(&mut self, dnd_active: bool) -> Option<bool> {
        if !self.monitoring {
            return None;
        }
        if dnd_active == self.on_dnd {
            return None;
        }
        self.on_dnd = dnd_active;
        tracing::info!(on_dnd = dnd_active, "do not disturb changed");
        Some(dnd_active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitoring_settings() -> BreakSettings {
        BreakSettings {
            monitor_dnd: true,
            ..BreakSettings::default()
        }
    }

    #[test]
    fn reports_only_edges() {
        let mut dnd = DndManager::new(&monitoring_settings());
        assert_eq!(dnd.observe(true), Some(true));
        assert_eq!(dnd.observe(true), None);
        assert_eq!(dnd.observe(false), Some(false));
        assert_eq!(dnd.observe(false), None);
    }

    #[test]
    fn ignores_observations_when_not_monitoring() {
        let mut dnd = DndManager::new(&BreakSettings::default());
        assert_eq!(dnd.observe(true), None);
        assert!(!dnd.is_on_dnd());
    }

    #[test]
    fn disabling_monitoring_releases_active_dnd() {
        let mut dnd = DndManager::new(&monitoring_settings());
        dnd.observe(true);
        assert_eq!(dnd.set_monitoring(false), Some(false));
        assert!(!dnd.is_on_dnd());
    }
}
