use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use bookwell_core::settings::{
    parse_hhmm, parse_timezone, parse_work_days, CalendarSettings, DEFAULT_TIMEZONE,
};
use bookwell_db::DEFAULT_MAX_CONNECTIONS;
use chrono_tz::Tz;

/// Error raised while reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// Calendar timezone used when the settings table has no `timezone` row.
    pub timezone: Tz,
    pub hold_sweep_interval: Duration,
    pub break_expansion_interval: Duration,
    pub reminder_interval: Duration,
    pub completion_interval: Duration,
    /// Where notifications are POSTed. Without it they are only logged.
    pub notify_webhook_url: Option<String>,
    /// Values inserted into the `settings` table for missing keys.
    pub settings_defaults: CalendarSettings,
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default              |
    /// |---------------------------------|----------------------|
    /// | `DATABASE_URL`                  | required             |
    /// | `DATABASE_MAX_CONNECTIONS`      | `20`                 |
    /// | `TIMEZONE`                      | `Europe/Amsterdam`   |
    /// | `HOLD_SWEEP_INTERVAL_SECS`      | `60`                 |
    /// | `BREAK_EXPANSION_INTERVAL_SECS` | `3600`               |
    /// | `REMINDER_INTERVAL_SECS`        | `60`                 |
    /// | `COMPLETION_INTERVAL_SECS`      | `60`                 |
    /// | `NOTIFY_WEBHOOK_URL`            | unset                |
    /// | `SLOT_STEP_MIN`                 | `30`                 |
    /// | `BUFFER_MIN`                    | `10`                 |
    /// | `MIN_LEAD_TIME_MIN`             | `0`                  |
    /// | `BOOKING_HORIZON_DAYS`          | `30`                 |
    /// | `HOLD_TTL_MIN`                  | `720`                |
    /// | `CANCEL_LIMIT_HOURS`            | `2`                  |
    /// | `WORK_START`                    | `09:00`              |
    /// | `WORK_END`                      | `20:45`              |
    /// | `WORK_DAYS`                     | `0,1,2,3,4,5`        |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let timezone = match lookup("TIMEZONE") {
            Some(name) => parse_timezone(&name).map_err(|e| invalid("TIMEZONE", e))?,
            None => DEFAULT_TIMEZONE,
        };

        let base = CalendarSettings::default();
        let settings_defaults = CalendarSettings {
            slot_step_min: parsed(&lookup, "SLOT_STEP_MIN", base.slot_step_min)?,
            buffer_min: parsed(&lookup, "BUFFER_MIN", base.buffer_min)?,
            min_lead_time_min: parsed(&lookup, "MIN_LEAD_TIME_MIN", base.min_lead_time_min)?,
            booking_horizon_days: parsed(&lookup, "BOOKING_HORIZON_DAYS", base.booking_horizon_days)?,
            hold_ttl_min: parsed(&lookup, "HOLD_TTL_MIN", base.hold_ttl_min)?,
            cancel_limit_hours: parsed(&lookup, "CANCEL_LIMIT_HOURS", base.cancel_limit_hours)?,
            work_start: match lookup("WORK_START") {
                Some(raw) => parse_hhmm(&raw).map_err(|e| invalid("WORK_START", e))?,
                None => base.work_start,
            },
            work_end: match lookup("WORK_END") {
                Some(raw) => parse_hhmm(&raw).map_err(|e| invalid("WORK_END", e))?,
                None => base.work_end,
            },
            work_days: match lookup("WORK_DAYS") {
                Some(raw) => parse_work_days(&raw).map_err(|e| invalid("WORK_DAYS", e))?,
                None => base.work_days,
            },
            timezone,
        };
        if settings_defaults.slot_step_min == 0 {
            return Err(invalid("SLOT_STEP_MIN", "must be greater than zero"));
        }
        if settings_defaults.work_start >= settings_defaults.work_end {
            return Err(invalid(
                "WORK_END",
                format!("must be after WORK_START {}", settings_defaults.work_start),
            ));
        }

        Ok(Self {
            database_url,
            max_connections: parsed(&lookup, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            timezone,
            hold_sweep_interval: secs(&lookup, "HOLD_SWEEP_INTERVAL_SECS", 60)?,
            break_expansion_interval: secs(&lookup, "BREAK_EXPANSION_INTERVAL_SECS", 3600)?,
            reminder_interval: secs(&lookup, "REMINDER_INTERVAL_SECS", 60)?,
            completion_interval: secs(&lookup, "COMPLETION_INTERVAL_SECS", 60)?,
            notify_webhook_url: lookup("NOTIFY_WEBHOOK_URL").filter(|v| !v.trim().is_empty()),
            settings_defaults,
        })
    }

    /// Convenience for tests and tools holding a plain map.
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }
}

fn invalid(var: &'static str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::Invalid {
        var,
        message: err.to_string(),
    }
}

fn parsed<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|e| invalid(var, e)),
        None => Ok(default),
    }
}

fn secs<F>(lookup: &F, var: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value: u64 = parsed(lookup, var, default)?;
    if value == 0 {
        return Err(invalid(var, "must be greater than zero"));
    }
    Ok(Duration::from_secs(value))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::NaiveTime;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config = EngineConfig::from_map(&vars(&[("DATABASE_URL", "postgres://x")])).unwrap();
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.timezone, DEFAULT_TIMEZONE);
        assert_eq!(config.hold_sweep_interval, Duration::from_secs(60));
        assert_eq!(config.break_expansion_interval, Duration::from_secs(3600));
        assert!(config.notify_webhook_url.is_none());
        assert_eq!(config.settings_defaults.slot_step_min, 30);
        assert_eq!(config.settings_defaults.hold_ttl_min, 720);
        assert_eq!(
            config.settings_defaults.work_end,
            NaiveTime::from_hms_opt(20, 45, 0).unwrap()
        );
    }

    #[test]
    fn database_url_is_required() {
        assert_matches!(
            EngineConfig::from_map(&vars(&[])),
            Err(ConfigError::Missing("DATABASE_URL"))
        );
    }

    #[test]
    fn overrides_are_parsed() {
        let config = EngineConfig::from_map(&vars(&[
            ("DATABASE_URL", "postgres://x"),
            ("TIMEZONE", "UTC"),
            ("SLOT_STEP_MIN", "15"),
            ("WORK_DAYS", "0,2,4"),
            ("REMINDER_INTERVAL_SECS", "30"),
            ("NOTIFY_WEBHOOK_URL", "http://localhost:9000/hook"),
        ]))
        .unwrap();
        assert_eq!(config.timezone, chrono_tz::UTC);
        assert_eq!(config.settings_defaults.timezone, chrono_tz::UTC);
        assert_eq!(config.settings_defaults.slot_step_min, 15);
        assert_eq!(
            config.settings_defaults.work_days.iter().copied().collect::<Vec<_>>(),
            vec![0, 2, 4]
        );
        assert_eq!(config.reminder_interval, Duration::from_secs(30));
        assert_eq!(
            config.notify_webhook_url.as_deref(),
            Some("http://localhost:9000/hook")
        );
    }

    #[test]
    fn malformed_values_name_the_variable() {
        let err = EngineConfig::from_map(&vars(&[
            ("DATABASE_URL", "postgres://x"),
            ("HOLD_TTL_MIN", "soon"),
        ]))
        .unwrap_err();
        assert_matches!(err, ConfigError::Invalid { var: "HOLD_TTL_MIN", .. });
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = EngineConfig::from_map(&vars(&[
            ("DATABASE_URL", "postgres://x"),
            ("HOLD_SWEEP_INTERVAL_SECS", "0"),
        ]))
        .unwrap_err();
        assert_matches!(err, ConfigError::Invalid { var: "HOLD_SWEEP_INTERVAL_SECS", .. });
    }

    #[test]
    fn inverted_work_hours_are_rejected() {
        let err = EngineConfig::from_map(&vars(&[
            ("DATABASE_URL", "postgres://x"),
            ("WORK_START", "18:00"),
            ("WORK_END", "09:00"),
        ]))
        .unwrap_err();
        assert_matches!(err, ConfigError::Invalid { var: "WORK_END", .. });
    }

    #[test]
    fn zero_slot_step_names_its_variable() {
        let err = EngineConfig::from_map(&vars(&[
            ("DATABASE_URL", "postgres://x"),
            ("SLOT_STEP_MIN", "0"),
        ]))
        .unwrap_err();
        assert_matches!(err, ConfigError::Invalid { var: "SLOT_STEP_MIN", .. });
    }
}
