use crate::domain::{AvailabilitySnapshot, DateRange};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who is picking dates. Owners block dates, guests request a stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Owner,
    Guest,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Owner => write!(f, "owner"),
            Mode::Guest => write!(f, "guest"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(Mode::Owner),
            "guest" => Ok(Mode::Guest),
            other => Err(format!("unknown mode '{other}' (expected owner or guest)")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl Selection {
    pub fn empty() -> Self {
        Self::default()
    }

    fn starting_at(date: NaiveDate) -> Self {
        Self {
            start: Some(date),
            end: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Start picked, end still open.
    pub fn in_progress(&self) -> Option<NaiveDate> {
        match (self.start, self.end) {
            (Some(start), None) => Some(start),
            _ => None,
        }
    }

    pub fn committed(&self) -> Option<DateRange> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => DateRange::new(start, end).ok(),
            _ => None,
        }
    }

    /// Applies a click on an available day.
    ///
    /// Callers filter out clicks on unavailable, past, or out-of-month days
    /// before they get here.
    pub fn click(self, mode: Mode, date: NaiveDate, availability: &AvailabilitySnapshot) -> Self {
        let start = match self.in_progress() {
            Some(start) => start,
            None => return Self::starting_at(date),
        };

        let completes = match mode {
            // Owners may block a single day, so the end can equal the start.
            Mode::Owner => date >= start,
            // Guests need at least one night.
            Mode::Guest => date > start,
        };

        if !completes || availability.range_overlaps_unavailable(start, date) {
            return Self::starting_at(date);
        }

        Self {
            start: Some(start),
            end: Some(date),
        }
    }
}
