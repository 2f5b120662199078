use crate::errors::{AppError, AppResult};
use crate::models::event_type::Category;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use super::intervals::Interval;

/// Shifts crossing midnight are captured by widening the fetch window
/// this much on each side of the local day.
pub const FETCH_MARGIN_HOURS: i64 = 12;

/// Minutes per category after clipping to one local day.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DayMinutes {
    pub shift: i64,
    pub breaks: i64,
    pub drive: i64,
}

impl DayMinutes {
    pub fn is_empty(&self) -> bool {
        self.shift == 0 && self.breaks == 0 && self.drive == 0
    }
}

/// `[start, end)` of one local calendar day, as UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub day: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// First instant of `day` in `tz`. If local midnight does not exist
/// (DST gap), step forward until a valid local time is found.
fn local_day_start(tz: &Tz, day: NaiveDate) -> Option<DateTime<Utc>> {
    let midnight = day.and_hms_opt(0, 0, 0)?;

    (0..=24 * 4).find_map(|step| {
        let local = midnight + Duration::minutes(15 * step);
        tz.from_local_datetime(&local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

impl DayWindow {
    pub fn new(tz: Tz, day: NaiveDate) -> AppResult<Self> {
        let next = day
            .succ_opt()
            .ok_or_else(|| AppError::InvalidDate(day.to_string()))?;

        let start = local_day_start(&tz, day).ok_or_else(|| AppError::InvalidDate(day.to_string()))?;
        let end = local_day_start(&tz, next).ok_or_else(|| AppError::InvalidDate(next.to_string()))?;

        Ok(Self { day, start, end })
    }

    /// Range of event timestamps to load for this day.
    pub fn fetch_range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let margin = Duration::hours(FETCH_MARGIN_HOURS);
        (self.start - margin, self.end + margin)
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }

    /// Part of `iv` inside `[start, end)`, if any.
    pub fn clip(&self, iv: &Interval) -> Option<Interval> {
        let start = iv.start.max(self.start);
        let end = iv.end.min(self.end);
        (start < end).then_some(Interval {
            category: iv.category,
            start,
            end,
        })
    }

    /// Clip every interval and total it per category. Seconds are summed
    /// first so that sub-minute fragments are not lost to truncation.
    pub fn sum_minutes(&self, intervals: &[Interval]) -> DayMinutes {
        let (mut shift, mut breaks, mut drive) = (0i64, 0i64, 0i64);

        for iv in intervals.iter().filter_map(|iv| self.clip(iv)) {
            let secs = (iv.end - iv.start).num_seconds();
            match iv.category {
                Category::Clock => shift += secs,
                Category::Break => breaks += secs,
                Category::Drive => drive += secs,
            }
        }

        DayMinutes {
            shift: shift / 60,
            breaks: breaks / 60,
            drive: drive / 60,
        }
    }
}
