use crate::domain::{BookingIntent, DateRange};
use crate::infrastructure::{DuckDbStorage, SubmissionHook};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Stands in for the payment flow when running locally: every intent is
/// confirmed on the spot and written to the bookings table.
pub struct DuckDbConfirmHook {
    storage: Arc<DuckDbStorage>,
}

impl DuckDbConfirmHook {
    pub fn new(storage: Arc<DuckDbStorage>) -> Self {
        Self { storage }
    }
}

impl SubmissionHook for DuckDbConfirmHook {
    fn on_booking_intent(&self, property_id: &str, intent: &BookingIntent) -> Result<()> {
        let stay = DateRange::new(intent.check_in, intent.check_out)?;
        self.storage
            .record_booking(property_id, stay, Some(intent.total_price))
            .context("Failed to confirm booking in DuckDB")
    }

    fn name(&self) -> &str {
        "DuckDB Confirm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::AvailabilityRepository;
    use chrono::NaiveDate;

    #[test]
    fn test_confirmed_stay_shows_up_as_booked() {
        let storage = Arc::new(DuckDbStorage::in_memory().unwrap());
        let hook = DuckDbConfirmHook::new(Arc::clone(&storage));
        let intent = BookingIntent {
            check_in: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            check_out: NaiveDate::from_ymd_opt(2025, 1, 13).unwrap(),
            nights: 3,
            total_price: 554_000,
        };

        hook.on_booking_intent("villa-1", &intent).unwrap();

        let snapshot = storage
            .availability("villa-1", DateRange::month(2025, 1).unwrap())
            .unwrap();
        assert!(snapshot.is_booked(NaiveDate::from_ymd_opt(2025, 1, 12).unwrap()));
        assert!(hook.required());
    }
}
