//! Calendar settings snapshot.
//!
//! Settings live in the key-value `settings` table and are loaded into a
//! [`CalendarSettings`] value once per operation. Nothing here is cached:
//! callers reload whenever they start a new operation so that operator
//! edits take effect immediately.

use std::collections::{BTreeSet, HashMap};

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
};
use chrono_tz::Tz;

use crate::error::CoreError;
use crate::interval::Interval;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Setting keys
// ---------------------------------------------------------------------------

pub const KEY_SLOT_STEP_MIN: &str = "slot_step_min";
pub const KEY_BUFFER_MIN: &str = "buffer_min";
pub const KEY_MIN_LEAD_TIME_MIN: &str = "min_lead_time_min";
pub const KEY_BOOKING_HORIZON_DAYS: &str = "booking_horizon_days";
pub const KEY_HOLD_TTL_MIN: &str = "hold_ttl_min";
pub const KEY_CANCEL_LIMIT_HOURS: &str = "cancel_limit_hours";
pub const KEY_WORK_START: &str = "work_start";
pub const KEY_WORK_END: &str = "work_end";
pub const KEY_WORK_DAYS: &str = "work_days";
/// Optional; falls back to the process-wide default timezone when absent.
pub const KEY_TIMEZONE: &str = "timezone";

/// Default timezone when neither the settings table nor the environment
/// names one.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Amsterdam;

// ---------------------------------------------------------------------------
// CalendarSettings
// ---------------------------------------------------------------------------

/// Scheduling parameters for a single operation.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarSettings {
    /// Distance between candidate slot starts, in minutes. Always > 0.
    pub slot_step_min: u32,
    /// Global buffer added after every appointment, in minutes.
    pub buffer_min: u32,
    /// Earliest bookable start relative to now, in minutes.
    pub min_lead_time_min: u32,
    /// Rolling booking window, in days.
    pub booking_horizon_days: u32,
    /// Lifetime of an unconfirmed hold, in minutes.
    pub hold_ttl_min: u32,
    /// Clients may cancel up to this many hours before start.
    pub cancel_limit_hours: u32,
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
    /// Work weekdays, 0 = Monday.
    pub work_days: BTreeSet<u8>,
    pub timezone: Tz,
}

impl Default for CalendarSettings {
    fn default() -> Self {
        Self {
            slot_step_min: 30,
            buffer_min: 10,
            min_lead_time_min: 0,
            booking_horizon_days: 30,
            hold_ttl_min: 720,
            cancel_limit_hours: 2,
            work_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            work_end: NaiveTime::from_hms_opt(20, 45, 0).unwrap_or(NaiveTime::MIN),
            work_days: (0..=5).collect(),
            timezone: DEFAULT_TIMEZONE,
        }
    }
}

impl CalendarSettings {
    /// Parse settings from `(key, value)` rows.
    ///
    /// Every key except [`KEY_TIMEZONE`] is required. A missing or malformed
    /// row is an integrity error: the settings table is expected to be seeded
    /// at startup.
    pub fn from_entries<I, K, V>(entries: I, fallback_tz: Tz) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: HashMap<String, String> = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let timezone = match map.get(KEY_TIMEZONE).map(|v| v.trim()) {
            Some(name) if !name.is_empty() => parse_timezone(name)?,
            _ => fallback_tz,
        };

        let settings = Self {
            slot_step_min: required_u32(&map, KEY_SLOT_STEP_MIN)?,
            buffer_min: required_u32(&map, KEY_BUFFER_MIN)?,
            min_lead_time_min: required_u32(&map, KEY_MIN_LEAD_TIME_MIN)?,
            booking_horizon_days: required_u32(&map, KEY_BOOKING_HORIZON_DAYS)?,
            hold_ttl_min: required_u32(&map, KEY_HOLD_TTL_MIN)?,
            cancel_limit_hours: required_u32(&map, KEY_CANCEL_LIMIT_HOURS)?,
            work_start: parse_hhmm(required(&map, KEY_WORK_START)?)?,
            work_end: parse_hhmm(required(&map, KEY_WORK_END)?)?,
            work_days: parse_work_days(required(&map, KEY_WORK_DAYS)?)?,
            timezone,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Serialize into `(key, value)` rows, the inverse of
    /// [`from_entries`](Self::from_entries).
    pub fn to_entries(&self) -> Vec<(&'static str, String)> {
        let work_days = self
            .work_days
            .iter()
            .map(|d| d.to_string())
            .collect::<Vec<_>>()
            .join(",");
        vec![
            (KEY_SLOT_STEP_MIN, self.slot_step_min.to_string()),
            (KEY_BUFFER_MIN, self.buffer_min.to_string()),
            (KEY_MIN_LEAD_TIME_MIN, self.min_lead_time_min.to_string()),
            (KEY_BOOKING_HORIZON_DAYS, self.booking_horizon_days.to_string()),
            (KEY_HOLD_TTL_MIN, self.hold_ttl_min.to_string()),
            (KEY_CANCEL_LIMIT_HOURS, self.cancel_limit_hours.to_string()),
            (KEY_WORK_START, self.work_start.format("%H:%M").to_string()),
            (KEY_WORK_END, self.work_end.format("%H:%M").to_string()),
            (KEY_WORK_DAYS, work_days),
            (KEY_TIMEZONE, self.timezone.name().to_string()),
        ]
    }

    /// Check the structural invariants.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.slot_step_min == 0 {
            return Err(CoreError::Integrity("slot_step_min must be > 0".into()));
        }
        if self.work_start >= self.work_end {
            return Err(CoreError::Integrity(format!(
                "work_start {} must be before work_end {}",
                self.work_start, self.work_end
            )));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Durations
    // -----------------------------------------------------------------------

    pub fn slot_step(&self) -> Duration {
        Duration::minutes(i64::from(self.slot_step_min))
    }

    pub fn min_lead_time(&self) -> Duration {
        Duration::minutes(i64::from(self.min_lead_time_min))
    }

    pub fn hold_ttl(&self) -> Duration {
        Duration::minutes(i64::from(self.hold_ttl_min))
    }

    pub fn cancel_limit(&self) -> Duration {
        Duration::hours(i64::from(self.cancel_limit_hours))
    }

    /// When a hold created at `now` expires.
    pub fn hold_expiry(&self, now: Timestamp) -> Timestamp {
        now + self.hold_ttl()
    }

    /// Last instant at which a client may still cancel or move an
    /// appointment starting at `start`.
    pub fn cancel_deadline(&self, start: Timestamp) -> Timestamp {
        start - self.cancel_limit()
    }

    // -----------------------------------------------------------------------
    // Calendar
    // -----------------------------------------------------------------------

    pub fn is_work_day(&self, day: NaiveDate) -> bool {
        self.work_days.contains(&weekday_index(day))
    }

    /// The local calendar date at `now`.
    pub fn today(&self, now: Timestamp) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }

    /// Last local date inside the booking horizon.
    pub fn horizon_end(&self, now: Timestamp) -> NaiveDate {
        self.today(now) + Duration::days(i64::from(self.booking_horizon_days))
    }

    /// Convert a local wall-clock time to an absolute instant.
    ///
    /// Ambiguous times (DST fall-back) resolve to the earlier instant; times
    /// inside a DST gap are shifted forward by one hour.
    pub fn localize(&self, naive: NaiveDateTime) -> DateTime<Tz> {
        match self.timezone.from_local_datetime(&naive) {
            LocalResult::Single(dt) => dt,
            LocalResult::Ambiguous(earliest, _) => earliest,
            LocalResult::None => self
                .timezone
                .from_local_datetime(&(naive + Duration::hours(1)))
                .earliest()
                .unwrap_or_else(|| self.timezone.from_utc_datetime(&naive)),
        }
    }

    /// [`localize`](Self::localize), returned as UTC.
    pub fn to_utc(&self, naive: NaiveDateTime) -> Timestamp {
        self.localize(naive).with_timezone(&chrono::Utc)
    }

    /// The working hours of `day` as an absolute interval.
    pub fn work_window(&self, day: NaiveDate) -> Result<Interval, CoreError> {
        Interval::new(
            self.to_utc(day.and_time(self.work_start)),
            self.to_utc(day.and_time(self.work_end)),
        )
    }

    /// Local midnight to the following local midnight.
    pub fn day_bounds(&self, day: NaiveDate) -> Result<Interval, CoreError> {
        let next = day + Duration::days(1);
        Interval::new(
            self.to_utc(day.and_time(NaiveTime::MIN)),
            self.to_utc(next.and_time(NaiveTime::MIN)),
        )
    }
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Weekday index with Monday = 0.
pub fn weekday_index(day: NaiveDate) -> u8 {
    // num_days_from_monday is always in 0..=6.
    day.weekday().num_days_from_monday() as u8
}

/// Parse an `HH:MM` time of day.
pub fn parse_hhmm(raw: &str) -> Result<NaiveTime, CoreError> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| CoreError::Integrity(format!("Invalid time of day '{raw}', expected HH:MM")))
}

/// Parse a comma-separated weekday list (`"0,1,2"`, Monday = 0).
pub fn parse_work_days(raw: &str) -> Result<BTreeSet<u8>, CoreError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| match s.parse::<u8>() {
            Ok(d) if d <= 6 => Ok(d),
            _ => Err(CoreError::Integrity(format!(
                "Invalid weekday '{s}' in work_days, expected 0-6"
            ))),
        })
        .collect()
}

/// Parse an IANA timezone name.
pub fn parse_timezone(name: &str) -> Result<Tz, CoreError> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| CoreError::Integrity(format!("Unknown timezone '{name}'")))
}

fn required<'a>(map: &'a HashMap<String, String>, key: &'static str) -> Result<&'a str, CoreError> {
    map.get(key)
        .map(String::as_str)
        .ok_or_else(|| CoreError::Integrity(format!("Missing setting '{key}'")))
}

fn required_u32(map: &HashMap<String, String>, key: &'static str) -> Result<u32, CoreError> {
    let raw = required(map, key)?;
    raw.trim().parse::<u32>().map_err(|_| {
        CoreError::Integrity(format!("Setting '{key}' must be a non-negative integer, got '{raw}'"))
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
