//! Slot availability.
//!
//! Candidate starts are laid on a grid of `slot_step_min` minutes measured
//! from local midnight. A candidate survives when it respects the lead
//! time, its occupied span ends no later than the close of the work day,
//! and it does not overlap any busy interval (active appointment or blocked
//! interval) fetched for the day's lookup window.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Timelike};
use chrono_tz::Tz;

use crate::error::CoreError;
use crate::interval::Interval;
use crate::settings::CalendarSettings;
use crate::types::Timestamp;

/// Busy intervals are fetched up to this many hours past the close of the
/// work day so that long bookings straddling closing time are seen.
pub const LOOKUP_EXTENSION_HOURS: i64 = 6;

/// Minutes an appointment occupies on the calendar.
pub fn occupied_minutes(duration_min: i64, service_buffer_min: i64, global_buffer_min: i64) -> i64 {
    duration_min + service_buffer_min + global_buffer_min
}

/// Range of the calendar that must be consulted for `day`.
pub fn lookup_window(settings: &CalendarSettings, day: NaiveDate) -> Result<Interval, CoreError> {
    let work = settings.work_window(day)?;
    Ok(Interval {
        start: work.start,
        end: work.end + Duration::hours(LOOKUP_EXTENSION_HOURS),
    })
}

/// Work days from today through the end of the booking horizon, inclusive.
pub fn list_work_dates(settings: &CalendarSettings, now: Timestamp) -> Vec<NaiveDate> {
    let today = settings.today(now);
    let last = settings.horizon_end(now);
    today
        .iter_days()
        .take_while(|d| *d <= last)
        .filter(|d| settings.is_work_day(*d))
        .collect()
}

/// First grid point at or after the start of the work day.
///
/// The grid is anchored at local midnight, so with a 30 minute step a
/// 09:10 opening yields 09:30.
pub fn first_grid_time(settings: &CalendarSettings) -> Option<NaiveTime> {
    let step = settings.slot_step_min;
    if step == 0 {
        return None;
    }
    let open = settings.work_start.num_seconds_from_midnight().div_ceil(60);
    let rounded = open.div_ceil(step) * step;
    NaiveTime::from_num_seconds_from_midnight_opt(rounded * 60, 0)
}

// ---------------------------------------------------------------------------
// AvailableSlots
// ---------------------------------------------------------------------------

/// The free slots of one day for one occupied span.
///
/// Holds everything needed to enumerate the slots; [`iter`](Self::iter) can
/// be called any number of times and yields ascending local start times.
#[derive(Debug, Clone)]
pub struct AvailableSlots {
    /// `None` when the day is not bookable at all.
    window: Option<Interval>,
    first: Option<Timestamp>,
    step: Duration,
    span: Duration,
    earliest: Timestamp,
    busy: Vec<Interval>,
    timezone: Tz,
}

impl AvailableSlots {
    /// Prepare slot enumeration for `day`.
    ///
    /// `busy` must contain every active appointment and blocked interval
    /// intersecting [`lookup_window`] for the day.
    pub fn new(
        settings: &CalendarSettings,
        day: NaiveDate,
        occupied_min: i64,
        now: Timestamp,
        busy: Vec<Interval>,
    ) -> Result<Self, CoreError> {
        if occupied_min <= 0 {
            return Err(CoreError::Validation(format!(
                "Occupied span must be positive, got {occupied_min} minutes"
            )));
        }
        settings.validate()?;

        let (window, first) = if settings.is_work_day(day) {
            let window = settings.work_window(day)?;
            let first = first_grid_time(settings).map(|t| settings.to_utc(day.and_time(t)));
            (Some(window), first)
        } else {
            (None, None)
        };

        Ok(Self {
            window,
            first,
            step: settings.slot_step(),
            span: Duration::minutes(occupied_min),
            earliest: now + settings.min_lead_time(),
            busy,
            timezone: settings.timezone,
        })
    }

    pub fn iter(&self) -> SlotIter<'_> {
        SlotIter {
            slots: self,
            cursor: self.first,
        }
    }

    /// Whether a slot starting at `start` passes every filter except grid
    /// alignment.
    pub fn accepts(&self, start: Timestamp) -> bool {
        let Some(window) = self.window else {
            return false;
        };
        let candidate = Interval {
            start,
            end: start + self.span,
        };
        start >= window.start
            && candidate.end <= window.end
            && start >= self.earliest
            && !self.busy.iter().any(|b| b.overlaps(&candidate))
    }
}

/// Iterator over [`AvailableSlots`].
#[derive(Debug, Clone)]
pub struct SlotIter<'a> {
    slots: &'a AvailableSlots,
    cursor: Option<Timestamp>,
}

impl Iterator for SlotIter<'_> {
    type Item = DateTime<Tz>;

    fn next(&mut self) -> Option<Self::Item> {
        let window = self.slots.window?;
        loop {
            let start = self.cursor?;
            // Candidates only grow, so once one overruns closing time the
            // rest do as well.
            if start + self.slots.span > window.end {
                self.cursor = None;
                return None;
            }
            self.cursor = Some(start + self.slots.step);
            if self.slots.accepts(start) {
                return Some(start.with_timezone(&self.slots.timezone));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
