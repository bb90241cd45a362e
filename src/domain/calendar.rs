use crate::domain::{
    AvailabilitySnapshot, AvailabilityStore, CalendarCell, ClassifyContext, DateRange,
    FetchRequest, Mode, Selection, classify_grid, first_of_month, month_bounds,
};
use chrono::NaiveDate;
use log::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum CalendarEvent {
    DayClicked(NaiveDate),
    MonthChanged(NaiveDate),
    AvailabilityLoaded {
        request: FetchRequest,
        result: Result<AvailabilitySnapshot, String>,
    },
    BlockReasonEdited(String),
    Cleared,
    SubmissionSucceeded,
    RetryRequested,
    Detached,
}

/// Interactive calendar state for one property and one actor.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarState {
    pub mode: Mode,
    pub today: NaiveDate,
    pub current_month: NaiveDate,
    pub selection: Selection,
    pub store: AvailabilityStore,
    pub block_reason: String,
}

impl CalendarState {
    /// Fresh state showing the month of `current_month`, with its first
    /// availability request already issued (see [`CalendarState::pending_fetch`]).
    pub fn new(
        property_id: impl Into<String>,
        mode: Mode,
        today: NaiveDate,
        current_month: NaiveDate,
    ) -> Self {
        let mut state = Self {
            mode,
            today,
            current_month: first_of_month(current_month),
            selection: Selection::empty(),
            store: AvailabilityStore::new(property_id),
            block_reason: String::new(),
        };
        state.store.begin_load(state.visible_window());
        state
    }

    pub fn visible_window(&self) -> DateRange {
        let (start, end) = month_bounds(self.current_month);
        DateRange::new(start, end).unwrap_or_else(|_| DateRange::day(start))
    }

    /// The visible month widened to every picked date, so a selection kept
    /// across months is still checked against the days it leaves behind.
    pub fn fetch_window(&self) -> DateRange {
        let (mut start, mut end) = month_bounds(self.current_month);
        for date in [self.selection.start, self.selection.end].into_iter().flatten() {
            start = start.min(date);
            end = end.max(date);
        }
        DateRange::new(start, end).unwrap_or_else(|_| DateRange::day(start))
    }

    pub fn pending_fetch(&self) -> Option<&FetchRequest> {
        self.store.pending()
    }

    pub fn is_loading(&self) -> bool {
        self.store.pending().is_some()
    }

    /// Whether a click on `date` would reach the selection machine.
    pub fn accepts_click(&self, date: NaiveDate) -> bool {
        let Some(snapshot) = self.store.snapshot() else {
            return false;
        };
        let (month_start, month_end) = month_bounds(self.current_month);
        date >= month_start
            && date <= month_end
            && date >= self.today
            && !snapshot.is_unavailable(date)
    }

    pub fn cells(&self, hover: Option<NaiveDate>) -> Vec<CalendarCell> {
        let empty = AvailabilitySnapshot::default();
        let ctx = ClassifyContext {
            mode: self.mode,
            today: self.today,
            selection: self.selection,
            availability: self.store.snapshot().unwrap_or(&empty),
            hover,
        };
        classify_grid(self.current_month, &ctx)
    }

    fn clear_selection(&mut self) {
        self.selection = Selection::empty();
        self.block_reason.clear();
    }
}

/// The calendar's whole transition function.
pub fn reduce(mut state: CalendarState, event: CalendarEvent) -> CalendarState {
    match event {
        CalendarEvent::DayClicked(date) => {
            if !state.accepts_click(date) {
                debug!("ignoring click on {date}");
                return state;
            }
            if let Some(snapshot) = state.store.snapshot() {
                state.selection = state.selection.click(state.mode, date, snapshot);
            }
        }
        CalendarEvent::MonthChanged(date) => {
            state.current_month = first_of_month(date);
            let window = state.fetch_window();
            state.store.begin_load(window);
        }
        CalendarEvent::AvailabilityLoaded { request, result } => {
            state.store.complete(&request, result);
        }
        CalendarEvent::BlockReasonEdited(reason) => {
            state.block_reason = reason;
        }
        CalendarEvent::Cleared => state.clear_selection(),
        CalendarEvent::SubmissionSucceeded => {
            state.clear_selection();
            let window = state.visible_window();
            state.store.begin_load(window);
        }
        CalendarEvent::RetryRequested => {
            let window = state.fetch_window();
            state.store.retry(window);
        }
        CalendarEvent::Detached => state.store.detach(),
    }
    state
}
