//! TOML-based application configuration.
//!
//! Stores user preferences including:
//! - Microbreak and long-break cadence, duration and notification lead
//! - Strictness and postponement policy per break kind
//! - Suppression sources (DND, app exclusions, natural breaks)
//! - Suspend behavior
//!
//! Configuration is stored at `~/.config/breakroom/config.toml`.
//! Values users edit by hand use friendly units (minutes, seconds);
//! [`Config::break_settings`] converts them to the milliseconds the
//! planner works in.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;
use crate::settings::{BreakKindSettings, BreakSettings};

/// `[microbreak]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicrobreakConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Minutes from one microbreak to the next.
    #[serde(default = "default_micro_interval_min")]
    pub interval_min: u32,
    #[serde(default = "default_micro_duration_sec")]
    pub duration_sec: u32,
    /// Pre-break notification lead, seconds. 0 disables it.
    #[serde(default = "default_micro_notification_sec")]
    pub notification_sec: u32,
    #[serde(default)]
    pub strict: bool,
    #[serde(default = "default_true")]
    pub postpone: bool,
    #[serde(default = "default_micro_postpones_limit")]
    pub postpones_limit: u32,
    #[serde(default = "default_postponable_percent")]
    pub postponable_percent: u8,
    /// How far one postponement pushes the break, minutes.
    #[serde(default = "default_micro_postpone_min")]
    pub postpone_min: u32,
}

/// `[long_break]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongBreakConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_long_interval_min")]
    pub interval_min: u32,
    #[serde(default = "default_long_duration_sec")]
    pub duration_sec: u32,
    #[serde(default = "default_long_notification_sec")]
    pub notification_sec: u32,
    #[serde(default)]
    pub strict: bool,
    #[serde(default = "default_true")]
    pub postpone: bool,
    #[serde(default = "default_long_postpones_limit")]
    pub postpones_limit: u32,
    #[serde(default = "default_postponable_percent")]
    pub postponable_percent: u8,
    #[serde(default = "default_long_postpone_min")]
    pub postpone_min: u32,
}

/// `[suppressions]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuppressionsConfig {
    #[serde(default)]
    pub monitor_dnd: bool,
    #[serde(default)]
    pub app_exclusions_enabled: bool,
    /// Foreground application ids; a trailing `*` matches any suffix.
    #[serde(default)]
    pub app_exclusions: Vec<String>,
    #[serde(default)]
    pub natural_breaks: bool,
    /// Idle seconds after which the user counts as naturally resting.
    #[serde(default = "default_natural_breaks_inactivity_sec")]
    pub natural_breaks_inactivity_sec: u32,
    #[serde(default = "default_true")]
    pub pause_for_suspend: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/breakroom/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub microbreak: MicrobreakConfig,
    #[serde(default)]
    pub long_break: LongBreakConfig,
    #[serde(default)]
    pub suppressions: SuppressionsConfig,
    /// Play a sound when a break finishes on its own.
    #[serde(default = "default_true")]
    pub break_sounds: bool,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_micro_interval_min() -> u32 {
    10
}
fn default_micro_duration_sec() -> u32 {
    20
}
fn default_micro_notification_sec() -> u32 {
    10
}
fn default_micro_postpones_limit() -> u32 {
    3
}
fn default_micro_postpone_min() -> u32 {
    2
}
fn default_long_interval_min() -> u32 {
    30
}
fn default_long_duration_sec() -> u32 {
    300
}
fn default_long_notification_sec() -> u32 {
    30
}
fn default_long_postpones_limit() -> u32 {
    1
}
fn default_long_postpone_min() -> u32 {
    5
}
fn default_postponable_percent() -> u8 {
    30
}
fn default_natural_breaks_inactivity_sec() -> u32 {
    180
}

impl Default for MicrobreakConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_min: default_micro_interval_min(),
            duration_sec: default_micro_duration_sec(),
            notification_sec: default_micro_notification_sec(),
            strict: false,
            postpone: true,
            postpones_limit: default_micro_postpones_limit(),
            postponable_percent: default_postponable_percent(),
            postpone_min: default_micro_postpone_min(),
        }
    }
}

impl Default for LongBreakConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_min: default_long_interval_min(),
            duration_sec: default_long_duration_sec(),
            notification_sec: default_long_notification_sec(),
            strict: false,
            postpone: true,
            postpones_limit: default_long_postpones_limit(),
            postponable_percent: default_postponable_percent(),
            postpone_min: default_long_postpone_min(),
        }
    }
}

impl Default for SuppressionsConfig {
    fn default() -> Self {
        Self {
            monitor_dnd: false,
            app_exclusions_enabled: false,
            app_exclusions: Vec::new(),
            natural_breaks: false,
            natural_breaks_inactivity_sec: default_natural_breaks_inactivity_sec(),
            pause_for_suspend: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            microbreak: MicrobreakConfig::default(),
            long_break: LongBreakConfig::default(),
            suppressions: SuppressionsConfig::default(),
            break_sounds: true,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let unknown = || invalid("unknown config key".to_string());

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() {
            return Err(invalid("config key is empty".to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| {
                                    invalid(format!("cannot parse '{value}' as number"))
                                })?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key. Returns error if key is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the config cannot be saved.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self =
            serde_json::from_value(json).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        self.save()?;
        Ok(())
    }

    /// The planner-facing settings snapshot, with everything in
    /// milliseconds.
    pub fn break_settings(&self) -> BreakSettings {
        BreakSettings {
            microbreak: BreakKindSettings {
                enabled: self.microbreak.enabled,
                interval_min: self.microbreak.interval_min,
                duration_ms: u64::from(self.microbreak.duration_sec) * 1_000,
                notification_ms: u64::from(self.microbreak.notification_sec) * 1_000,
                strict: self.microbreak.strict,
                postpone: self.microbreak.postpone,
                postpones_limit: self.microbreak.postpones_limit,
                postponable_percent: self.microbreak.postponable_percent,
                postpone_ms: u64::from(self.microbreak.postpone_min) * 60_000,
            },
            long_break: BreakKindSettings {
                enabled: self.long_break.enabled,
                interval_min: self.long_break.interval_min,
                duration_ms: u64::from(self.long_break.duration_sec) * 1_000,
                notification_ms: u64::from(self.long_break.notification_sec) * 1_000,
                strict: self.long_break.strict,
                postpone: self.long_break.postpone,
                postpones_limit: self.long_break.postpones_limit,
                postponable_percent: self.long_break.postponable_percent,
                postpone_ms: u64::from(self.long_break.postpone_min) * 60_000,
            },
            monitor_dnd: self.suppressions.monitor_dnd,
            app_exclusions_enabled: self.suppressions.app_exclusions_enabled,
            app_exclusions: self.suppressions.app_exclusions.clone(),
            natural_breaks: self.suppressions.natural_breaks,
            natural_breaks_inactivity_ms: u64::from(
                self.suppressions.natural_breaks_inactivity_sec,
            ) * 1_000,
            pause_for_suspend: self.suppressions.pause_for_suspend,
            break_sounds: self.break_sounds,
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let parsed: Config = toml::from_str("[microbreak]\ninterval_min = 25\n").unwrap();
        assert_eq!(parsed.microbreak.interval_min, 25);
        assert_eq!(parsed.microbreak.duration_sec, 20);
        assert_eq!(parsed.long_break.interval_min, 30);
        assert!(parsed.suppressions.pause_for_suspend);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("microbreak.interval_min").as_deref(), Some("10"));
        assert_eq!(cfg.get("suppressions.monitor_dnd").as_deref(), Some("false"));
        assert!(cfg.get("microbreak.missing_key").is_none());
    }

    #[test]
    fn set_json_value_by_path_updates_nested_bool() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(&mut json, "microbreak.strict", "true").unwrap();
        assert_eq!(
            Config::get_json_value_by_path(&json, "microbreak.strict").unwrap(),
            &serde_json::Value::Bool(true)
        );
    }

    #[test]
    fn set_json_value_by_path_updates_exclusion_list() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        Config::set_json_value_by_path(
            &mut json,
            "suppressions.app_exclusions",
            r#"["zoom", "obs*"]"#,
        )
        .unwrap();
        let list = Config::get_json_value_by_path(&json, "suppressions.app_exclusions").unwrap();
        assert_eq!(list.as_array().unwrap().len(), 2);
    }

    #[test]
    fn set_json_value_by_path_rejects_unknown_key() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "microbreak.nonexistent", "1");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "microbreak.nonexistent"
        ));
    }

    #[test]
    fn set_json_value_by_path_rejects_invalid_type() {
        let mut json = serde_json::to_value(Config::default()).unwrap();
        let result = Config::set_json_value_by_path(&mut json, "microbreak.strict", "not_a_bool");
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn break_settings_converts_units() {
        let cfg = Config::default();
        let settings = cfg.break_settings();
        assert_eq!(settings.microbreak.interval_ms(), 600_000);
        assert_eq!(settings.microbreak.duration_ms, 20_000);
        assert_eq!(settings.microbreak.postpone_ms, 120_000);
        assert_eq!(settings.long_break.duration_ms, 300_000);
        assert_eq!(settings.natural_breaks_inactivity_ms, 180_000);
    }
}
