use crate::calendar::{WorkCalendar, WorkCalendarConfig};
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard working-week load per resource, in person-days.
pub const DEFAULT_MAX_WEEKLY_DAYS: f64 = 4.5;

/// Environment variable that overrides [`CapacityConfig::max_weekly_days`].
pub const MAX_WEEKLY_DAYS_ENV: &str = "RELEASE_CAPACITY_MAX_WEEKLY_DAYS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("weekly capacity must be a finite, non-negative number of days (got {0})")]
    InvalidCapacity(f64),
    #[error("work calendar requires at least one working day")]
    NoWorkingDays,
    #[error("environment variable {name} has invalid value '{value}'")]
    InvalidEnvValue { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CapacityConfig {
    pub max_weekly_days: f64,
    pub week_start: Weekday,
    pub calendar: WorkCalendarConfig,
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            max_weekly_days: DEFAULT_MAX_WEEKLY_DAYS,
            week_start: Weekday::Mon,
            calendar: WorkCalendarConfig::default(),
        }
    }
}

impl CapacityConfig {
    pub fn with_max_weekly_days(mut self, days: f64) -> Self {
        self.max_weekly_days = days;
        self
    }

    pub fn with_week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_capacity(self.max_weekly_days)?;
        if self.calendar.working_days().is_empty() {
            return Err(ConfigError::NoWorkingDays);
        }
        Ok(())
    }

    pub fn work_calendar(&self) -> Result<WorkCalendar, ConfigError> {
        WorkCalendar::from_config(&self.calendar)
    }

    /// Apply overrides from the process environment. Unset variables leave the
    /// config untouched.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(raw) = std::env::var(MAX_WEEKLY_DAYS_ENV) {
            self.max_weekly_days = parse_capacity(&raw).ok_or(ConfigError::InvalidEnvValue {
                name: MAX_WEEKLY_DAYS_ENV,
                value: raw,
            })?;
        }
        Ok(())
    }
}

pub fn validate_capacity(days: f64) -> Result<(), ConfigError> {
    if !days.is_finite() || days < 0.0 {
        return Err(ConfigError::InvalidCapacity(days));
    }
    Ok(())
}

fn parse_capacity(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|days| validate_capacity(*days).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_standard_week() {
        let config = CapacityConfig::default();
        assert_eq!(config.max_weekly_days, 4.5);
        assert_eq!(config.week_start, Weekday::Mon);
        assert_eq!(
            config.calendar.working_days(),
            &[Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: CapacityConfig = serde_json::from_str(r#"{ "maxWeeklyDays": 4.0 }"#).unwrap();
        assert_eq!(config.max_weekly_days, 4.0);
        assert_eq!(config.week_start, Weekday::Mon);
        assert_eq!(config.calendar, WorkCalendarConfig::default());
    }

    #[test]
    fn rejects_negative_and_non_finite_capacity() {
        assert!(matches!(
            CapacityConfig::default().with_max_weekly_days(-1.0).validate(),
            Err(ConfigError::InvalidCapacity(_))
        ));
        assert!(CapacityConfig::default()
            .with_max_weekly_days(f64::NAN)
            .validate()
            .is_err());
        assert!(CapacityConfig::default().with_max_weekly_days(0.0).validate().is_ok());
    }

    #[test]
    fn parse_capacity_filters_invalid_values() {
        assert_eq!(parse_capacity(" 5.5 "), Some(5.5));
        assert_eq!(parse_capacity("-2"), None);
        assert_eq!(parse_capacity("lots"), None);
    }
}
