use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("range ends ({end}) before it starts ({start})")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("invalid month {year}-{month:02}")]
    InvalidMonth { year: i32, month: u32 },
}

/// Closed calendar-day interval. Both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawRange")]
pub struct DateRange {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRange {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl TryFrom<RawRange> for DateRange {
    type Error = RangeError;

    fn try_from(raw: RawRange) -> Result<Self, Self::Error> {
        DateRange::new(raw.start_date, raw.end_date)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RangeError> {
        if end < start {
            return Err(RangeError::EndBeforeStart { start, end });
        }
        Ok(Self {
            start_date: start,
            end_date: end,
        })
    }

    pub fn day(date: NaiveDate) -> Self {
        Self {
            start_date: date,
            end_date: date,
        }
    }

    pub fn month(year: i32, month: u32) -> Result<Self, RangeError> {
        let invalid = RangeError::InvalidMonth { year, month };
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or(invalid.clone())?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        };
        let end = next.and_then(|d| d.pred_opt()).ok_or(invalid)?;

        Ok(Self {
            start_date: start,
            end_date: end,
        })
    }

    /// Month window containing `date`.
    pub fn month_of(date: NaiveDate) -> Result<Self, RangeError> {
        Self::month(date.year(), date.month())
    }

    pub fn start(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end(&self) -> NaiveDate {
        self.end_date
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start_date <= other.end_date && other.start_date <= self.end_date
    }

    /// Day difference between the ends. Zero for a single-day range.
    pub fn nights(&self) -> i64 {
        (self.end_date - self.start_date).num_days()
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let start = self.start_date;
        (0..=self.nights()).map(move |i| start + Duration::days(i))
    }
}

pub fn contains(range: &DateRange, date: NaiveDate) -> bool {
    range.contains(date)
}

pub fn overlaps_any<'a, I>(ranges: I, date: NaiveDate) -> bool
where
    I: IntoIterator<Item = &'a DateRange>,
{
    ranges.into_iter().any(|r| r.contains(date))
}

/// True if any day in `start..=end` falls inside a blocked or booked range.
///
/// Walks day by day, so the cost is linear in the length of the span. Callers
/// only ever pass spans picked by hand on a calendar.
pub fn range_overlaps_unavailable(
    start: NaiveDate,
    end: NaiveDate,
    blocked: &[DateRange],
    booked: &[DateRange],
) -> bool {
    let mut day = start;
    while day <= end {
        if overlaps_any(blocked, day) || overlaps_any(booked, day) {
            return true;
        }
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    false
}
