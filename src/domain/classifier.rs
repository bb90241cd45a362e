use crate::domain::{AvailabilitySnapshot, GridDay, Mode, Selection, build_grid};
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayStatus {
    Available,
    Blocked,
    Booked,
    Selected,
    SelectedRange,
    /// An available day strictly before today.
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarCell {
    pub date: NaiveDate,
    pub in_current_month: bool,
    pub status: DayStatus,
}

impl CalendarCell {
    pub fn is_clickable(&self) -> bool {
        self.in_current_month
            && !matches!(
                self.status,
                DayStatus::Blocked | DayStatus::Booked | DayStatus::Disabled
            )
    }
}

/// Everything a cell's status depends on. `hover` is the guest's pointer,
/// used for the preview and never stored anywhere.
#[derive(Debug, Clone, Copy)]
pub struct ClassifyContext<'a> {
    pub mode: Mode,
    pub today: NaiveDate,
    pub selection: Selection,
    pub availability: &'a AvailabilitySnapshot,
    pub hover: Option<NaiveDate>,
}

impl ClassifyContext<'_> {
    fn selection_status(&self, date: NaiveDate) -> Option<DayStatus> {
        if let Some(range) = self.selection.committed() {
            if date == range.start() || date == range.end() {
                return Some(DayStatus::Selected);
            }
            if range.contains(date) {
                return Some(DayStatus::SelectedRange);
            }
            return None;
        }

        let start = self.selection.in_progress()?;
        if date == start {
            return Some(DayStatus::Selected);
        }
        if self.in_preview(start, date) {
            return Some(DayStatus::SelectedRange);
        }
        None
    }

    fn in_preview(&self, start: NaiveDate, date: NaiveDate) -> bool {
        let Some(hover) = self.hover else {
            return false;
        };
        self.mode == Mode::Guest
            && hover > start
            && date > start
            && date <= hover
            && !self.availability.range_overlaps_unavailable(start, hover)
    }
}

pub fn classify(date: NaiveDate, ctx: &ClassifyContext<'_>) -> DayStatus {
    if let Some(status) = ctx.selection_status(date) {
        return status;
    }
    if ctx.availability.is_blocked(date) {
        return DayStatus::Blocked;
    }
    if ctx.availability.is_booked(date) {
        return DayStatus::Booked;
    }
    if date < ctx.today {
        return DayStatus::Disabled;
    }
    DayStatus::Available
}

pub fn classify_cell(day: GridDay, ctx: &ClassifyContext<'_>) -> CalendarCell {
    CalendarCell {
        date: day.date,
        in_current_month: day.in_current_month,
        status: classify(day.date, ctx),
    }
}

pub fn classify_grid(current_month: NaiveDate, ctx: &ClassifyContext<'_>) -> Vec<CalendarCell> {
    build_grid(current_month)
        .into_iter()
        .map(|day| classify_cell(day, ctx))
        .collect()
}
