//! Foreground-application exclusions.
//!
//! The embedding polls the platform for the foreground application id
//! and feeds it here. While an excluded application is active the
//! schedule is held; when focus moves elsewhere the normal cadence is
//! recomputed from scratch (the cleared countdown is not resumed).

use serde::{Deserialize, Serialize};

use crate::settings::BreakSettings;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppExclusionsManager {
    enabled: bool,
    exclusions: Vec<String>,
    active_exclusion: Option<String>,
}

impl AppExclusionsManager {
    pub fn new(settings: &BreakSettings) -> Self {
        let mut manager = Self::default();
        manager.apply(settings);
        manager
    }

    fn apply(&mut self, settings: &BreakSettings) {
        self.enabled = settings.app_exclusions_enabled;
        self.exclusions = settings
            .app_exclusions
            .iter()
            .map(|e| e.to_lowercase())
            .collect();
    }

    /// True while an excluded application holds the schedule.
    pub fn is_scheduler_cleared(&self) -> bool {
        self.active_exclusion.is_some()
    }

    /// The exclusion entry currently matched, if any.
    pub fn active_exclusion(&self) -> Option<&str> {
        self.active_exclusion.as_deref()
    }

    /// Apply changed settings. Returns `Some(false)` when the held
    /// schedule must be released because the matching rule is gone.
    pub fn reinitialize(&mut self, settings: &BreakSettings) -> Option<bool> {
        self.apply(settings);
        if let Some(active) = self.active_exclusion.clone() {
            if !self.enabled || !self.matches(&active) {
                self.active_exclusion = None;
                return Some(false);
            }
        }
        None
    }

    fn matches(&self, app_id: &str) -> bool {
        let app_id = app_id.to_lowercase();
        self.exclusions.iter().any(|rule| {
            match rule.strip_suffix('*') {
                Some(prefix) => app_id.starts_with(prefix),
                None => app_id == *rule,
            }
        })
    }

    /// Feed the observed foreground application id. Returns the new
    /// suppression state when it flips.
    pub fn observe_foreground_app(&mut self, app_id: &str) -> Option<bool> {
        if !self.enabled {
            return None;
        }
        let excluded = self.matches(app_id);
        match (&self.active_exclusion, excluded) {
            (None, true) => {
                tracing::info!(app = app_id, "excluded application in foreground");
                self.active_exclusion = Some(app_id.to_lowercase());
                Some(true)
            }
            (Some(_), false) => {
                self.active_exclusion = None;
                Some(false)
            }
            (Some(_), true) => {
                // Focus moved between two excluded applications.
                self.active_exclusion = Some(app_id.to_lowercase());
                None
            }
            (None, false) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(exclusions: &[&str]) -> BreakSettings {
        BreakSettings {
            app_exclusions_enabled: true,
            app_exclusions: exclusions.iter().map(|s| s.to_string()).collect(),
            ..BreakSettings::default()
        }
    }

    #[test]
    fn exact_match_is_case_insensitive() {
        let mut manager = AppExclusionsManager::new(&settings(&["Zoom"]));
        assert_eq!(manager.observe_foreground_app("zoom"), Some(true));
        assert!(manager.is_scheduler_cleared());
        assert_eq!(manager.observe_foreground_app("editor"), Some(false));
        assert!(!manager.is_scheduler_cleared());
    }

    #[test]
    fn trailing_star_matches_prefix() {
        let mut manager = AppExclusionsManager::new(&settings(&["obs*"]));
        assert_eq!(manager.observe_foreground_app("obs-studio"), Some(true));
        assert_eq!(manager.observe_foreground_app("obs64"), None);
        assert_eq!(manager.observe_foreground_app("browser"), Some(false));
    }

    #[test]
    fn disabled_manager_never_asserts() {
        let mut manager = AppExclusionsManager::new(&BreakSettings::default());
        assert_eq!(manager.observe_foreground_app("zoom"), None);
    }

    #[test]
    fn reinitialize_releases_removed_rule() {
        let mut manager = AppExclusionsManager::new(&settings(&["zoom"]));
        manager.observe_foreground_app("zoom");
        assert_eq!(manager.reinitialize(&settings(&["slack"])), Some(false));
        assert!(!manager.is_scheduler_cleared());
    }
}
