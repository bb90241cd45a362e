use crate::domain::{AvailabilityBlock, AvailabilitySnapshot, BlockId, DateRange, NewBlock};
use anyhow::Result;

/// The remote side of the calendar: where availability is read from and
/// where owner blocks are written to.
pub trait AvailabilityRepository: Send + Sync {
    /// Blocked and booked ranges touching `window` (inclusive).
    fn availability(&self, property_id: &str, window: DateRange) -> Result<AvailabilitySnapshot>;

    /// Owner only.
    fn block_dates(&self, property_id: &str, block: NewBlock) -> Result<AvailabilityBlock>;

    /// Owner only.
    fn unblock_dates(&self, property_id: &str, block_id: BlockId) -> Result<()>;
}
