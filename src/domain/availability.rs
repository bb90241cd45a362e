use crate::domain::DateRange;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub i64);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dates an owner took off the market by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityBlock {
    pub id: BlockId,
    #[serde(flatten)]
    pub range: DateRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AvailabilityBlock {
    pub fn new(id: BlockId, range: DateRange, reason: Option<String>) -> Self {
        Self { id, range, reason }
    }
}

/// Dates held by a confirmed reservation. Only ever observed here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookedRange {
    pub range: DateRange,
}

impl BookedRange {
    pub fn new(range: DateRange) -> Self {
        Self { range }
    }
}

/// Body of a block request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlock {
    #[serde(flatten)]
    pub range: DateRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl NewBlock {
    pub fn new(range: DateRange, reason: Option<String>) -> Self {
        let reason = reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        Self { range, reason }
    }
}

/// Blocked and booked ranges for one property over one window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailabilitySnapshot {
    #[serde(default)]
    pub blocked: Vec<AvailabilityBlock>,
    #[serde(default)]
    pub booked: Vec<BookedRange>,
}

impl AvailabilitySnapshot {
    pub fn new(blocked: Vec<AvailabilityBlock>, booked: Vec<BookedRange>) -> Self {
        Self { blocked, booked }
    }

    pub fn blocked_ranges(&self) -> Vec<DateRange> {
        self.blocked.iter().map(|b| b.range).collect()
    }

    pub fn booked_ranges(&self) -> Vec<DateRange> {
        self.booked.iter().map(|b| b.range).collect()
    }

    pub fn is_blocked(&self, date: NaiveDate) -> bool {
        self.blocked.iter().any(|b| b.range.contains(date))
    }

    pub fn is_booked(&self, date: NaiveDate) -> bool {
        self.booked.iter().any(|b| b.range.contains(date))
    }

    pub fn is_unavailable(&self, date: NaiveDate) -> bool {
        self.is_blocked(date) || self.is_booked(date)
    }

    /// The block covering `date`, if any. Used to pick a block to remove.
    pub fn block_at(&self, date: NaiveDate) -> Option<&AvailabilityBlock> {
        self.blocked.iter().find(|b| b.range.contains(date))
    }

    pub fn range_overlaps_unavailable(&self, start: NaiveDate, end: NaiveDate) -> bool {
        crate::domain::range_overlaps_unavailable(
            start,
            end,
            &self.blocked_ranges(),
            &self.booked_ranges(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn sample() -> AvailabilitySnapshot {
        AvailabilitySnapshot::new(
            vec![AvailabilityBlock::new(
                BlockId(7),
                DateRange::new(d(2025, 1, 5), d(2025, 1, 8)).unwrap(),
                Some("maintenance".to_string()),
            )],
            vec![BookedRange::new(
                DateRange::new(d(2025, 1, 15), d(2025, 1, 17)).unwrap(),
            )],
        )
    }

    #[test]
    fn test_snapshot_lookups() {
        let snapshot = sample();

        assert!(snapshot.is_blocked(d(2025, 1, 5)));
        assert!(!snapshot.is_booked(d(2025, 1, 5)));
        assert!(snapshot.is_booked(d(2025, 1, 17)));
        assert!(snapshot.is_unavailable(d(2025, 1, 16)));
        assert!(!snapshot.is_unavailable(d(2025, 1, 10)));
        assert_eq!(snapshot.block_at(d(2025, 1, 6)).map(|b| b.id), Some(BlockId(7)));
        assert!(snapshot.block_at(d(2025, 1, 16)).is_none());
    }

    #[test]
    fn test_snapshot_span_check() {
        let snapshot = sample();

        assert!(snapshot.range_overlaps_unavailable(d(2025, 1, 3), d(2025, 1, 7)));
        assert!(snapshot.range_overlaps_unavailable(d(2025, 1, 10), d(2025, 1, 15)));
        assert!(!snapshot.range_overlaps_unavailable(d(2025, 1, 9), d(2025, 1, 14)));
    }

    #[test]
    fn test_availability_wire_shape() {
        let json = serde_json::to_value(sample()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "blocked": [{
                    "id": 7,
                    "startDate": "2025-01-05",
                    "endDate": "2025-01-08",
                    "reason": "maintenance"
                }],
                "booked": [{ "startDate": "2025-01-15", "endDate": "2025-01-17" }]
            })
        );

        let parsed: AvailabilitySnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn test_new_block_drops_blank_reason() {
        let range = DateRange::day(d(2025, 1, 10));

        assert_eq!(NewBlock::new(range, Some("   ".to_string())).reason, None);
        assert_eq!(
            NewBlock::new(range, Some(" painting ".to_string())).reason.as_deref(),
            Some("painting")
        );
    }
}
