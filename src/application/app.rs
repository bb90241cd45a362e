use crate::application::Config;
use crate::domain::{
    AvailabilityBlock, BlockId, BookingIntent, CalendarEvent, CalendarState, DateRange,
    FetchRequest, Mode, NewBlock, PriceCalculator, PriceQuote, Rates, reduce, shift_month,
};
use crate::infrastructure::{
    AvailabilityRepository, DuckDbConfirmHook, DuckDbStorage, HookRegistry, IntentLogHook,
};
use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use log::{debug, info};
use std::sync::Arc;

/// Drives one calendar session: feeds events through the reducer and carries
/// out the side effects (fetches, submissions) the state asks for.
pub struct CalendarApp {
    state: CalendarState,
    repository: Arc<dyn AvailabilityRepository>,
    hooks: HookRegistry,
    pricing: PriceCalculator,
}

impl CalendarApp {
    pub fn new(
        repository: Arc<dyn AvailabilityRepository>,
        hooks: HookRegistry,
        pricing: PriceCalculator,
        state: CalendarState,
    ) -> Self {
        Self {
            state,
            repository,
            hooks,
            pricing,
        }
    }

    /// Local setup: DuckDB availability plus the intent log and local
    /// confirmation hooks.
    pub fn with_default_plugins(
        config: &Config,
        property_id: &str,
        mode: Mode,
        today: NaiveDate,
        month: NaiveDate,
    ) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("Failed to create data dir {}", config.data_dir.display())
        })?;
        let storage = Arc::new(DuckDbStorage::new(&config.db_path)?);

        let mut hooks = HookRegistry::new();
        hooks.register(IntentLogHook::new(&config.intent_log_path));
        hooks.register(DuckDbConfirmHook::new(Arc::clone(&storage)));

        Ok(Self::new(
            storage,
            hooks,
            PriceCalculator::new(config.service_fee_bps),
            CalendarState::new(property_id, mode, today, month),
        ))
    }

    pub fn state(&self) -> &CalendarState {
        &self.state
    }

    pub fn repository(&self) -> Arc<dyn AvailabilityRepository> {
        Arc::clone(&self.repository)
    }

    pub fn pricing(&self) -> &PriceCalculator {
        &self.pricing
    }

    pub fn dispatch(&mut self, event: CalendarEvent) {
        debug!("calendar event {:?}", event);
        self.state = reduce(self.state.clone(), event);
    }

    pub fn pending_fetch(&self) -> Option<FetchRequest> {
        self.state.pending_fetch().cloned()
    }

    /// Runs a fetch against the repository and wraps the outcome as the event
    /// that reports it. Safe to call off the UI thread.
    pub fn fetch(repository: &dyn AvailabilityRepository, request: FetchRequest) -> CalendarEvent {
        let result = repository
            .availability(&request.property_id, request.window)
            .map_err(|e| format!("{:#}", e));
        CalendarEvent::AvailabilityLoaded { request, result }
    }

    /// Fetches the outstanding request, if any, on the current thread.
    pub fn load_pending(&mut self) {
        if let Some(request) = self.pending_fetch() {
            let event = Self::fetch(self.repository.as_ref(), request);
            self.dispatch(event);
        }
    }

    pub fn click(&mut self, date: NaiveDate) {
        self.dispatch(CalendarEvent::DayClicked(date));
    }

    pub fn shift_month(&mut self, delta: i32) {
        let target = shift_month(self.state.current_month, delta);
        self.dispatch(CalendarEvent::MonthChanged(target));
    }

    pub fn clear(&mut self) {
        self.dispatch(CalendarEvent::Cleared);
    }

    pub fn retry(&mut self) {
        self.dispatch(CalendarEvent::RetryRequested);
    }

    pub fn set_block_reason(&mut self, reason: impl Into<String>) {
        self.dispatch(CalendarEvent::BlockReasonEdited(reason.into()));
    }

    pub fn detach(&mut self) {
        self.dispatch(CalendarEvent::Detached);
    }

    /// Price breakdown for the committed guest selection.
    pub fn quote(&self, rates: &Rates) -> Result<PriceQuote> {
        let stay = self
            .state
            .selection
            .committed()
            .ok_or_else(|| anyhow!("No dates selected"))?;
        Ok(self.pricing.quote(stay, rates)?)
    }

    /// Asks the repository once more about every day of `range`. The cached
    /// snapshot may be older than the submission.
    fn ensure_still_free(&self, range: DateRange) -> Result<()> {
        let property_id = self.state.store.property_id();
        let fresh = self
            .repository
            .availability(property_id, range)
            .context("Failed to re-check availability")?;
        if fresh.range_overlaps_unavailable(range.start(), range.end()) {
            bail!(
                "{} to {} overlaps blocked or booked dates",
                range.start(),
                range.end()
            );
        }
        Ok(())
    }

    /// Hands the committed stay to the booking hooks. On failure the
    /// selection stays as it is so the guest can retry.
    pub fn submit_booking(&mut self, rates: &Rates) -> Result<BookingIntent> {
        if self.state.mode != Mode::Guest {
            bail!("Only guests can request a booking");
        }
        let stay = self
            .state
            .selection
            .committed()
            .ok_or_else(|| anyhow!("Pick a check-in and a check-out date first"))?;
        let quote = self.pricing.quote(stay, rates)?;
        let intent = BookingIntent::new(stay, &quote);
        self.ensure_still_free(stay)?;

        self.hooks
            .dispatch(self.state.store.property_id(), &intent)
            .context("Booking submission failed")?;

        info!(
            "booking requested for {} {}..{} ({} nights, total {})",
            self.state.store.property_id(),
            intent.check_in,
            intent.check_out,
            intent.nights,
            intent.total_price
        );
        self.dispatch(CalendarEvent::SubmissionSucceeded);
        Ok(intent)
    }

    /// Blocks the committed owner selection with the current reason text.
    pub fn submit_block(&mut self) -> Result<AvailabilityBlock> {
        if self.state.mode != Mode::Owner {
            bail!("Only owners can block dates");
        }
        let range = self
            .state
            .selection
            .committed()
            .ok_or_else(|| anyhow!("Pick the dates to block first"))?;
        self.ensure_still_free(range)?;
        let request = NewBlock::new(range, Some(self.state.block_reason.clone()));

        let block = self
            .repository
            .block_dates(self.state.store.property_id(), request)
            .context("Failed to block dates")?;

        self.dispatch(CalendarEvent::SubmissionSucceeded);
        Ok(block)
    }

    pub fn unblock(&mut self, block_id: BlockId) -> Result<()> {
        if self.state.mode != Mode::Owner {
            bail!("Only owners can unblock dates");
        }
        self.repository
            .unblock_dates(self.state.store.property_id(), block_id)
            .with_context(|| format!("Failed to remove block {}", block_id))?;

        self.dispatch(CalendarEvent::SubmissionSucceeded);
        Ok(())
    }

    /// Removes the block covering `date` in the loaded month.
    pub fn unblock_at(&mut self, date: NaiveDate) -> Result<BlockId> {
        let block_id = self
            .state
            .store
            .snapshot()
            .and_then(|snapshot| snapshot.block_at(date))
            .map(|block| block.id)
            .ok_or_else(|| anyhow!("No block on {}", date))?;
        self.unblock(block_id)?;
        Ok(block_id)
    }
}

impl Drop for CalendarApp {
    fn drop(&mut self) {
        self.state.store.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LoadState;
    use crate::infrastructure::SubmissionHook;
    use crate::infrastructure::test_utils::test_harness::{ScriptedRepository, TestStorage};
    use std::sync::Mutex;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, day).unwrap()
    }

    struct Capture {
        intents: Arc<Mutex<Vec<BookingIntent>>>,
        fail: bool,
    }

    impl SubmissionHook for Capture {
        fn on_booking_intent(&self, _property_id: &str, intent: &BookingIntent) -> Result<()> {
            if self.fail {
                bail!("payment modal unavailable");
            }
            self.intents.lock().unwrap().push(*intent);
            Ok(())
        }

        fn name(&self) -> &str {
            "Capture"
        }
    }

    fn app(
        repo: Arc<ScriptedRepository>,
        mode: Mode,
        fail: bool,
    ) -> (CalendarApp, Arc<Mutex<Vec<BookingIntent>>>) {
        let intents = Arc::new(Mutex::new(Vec::new()));
        let mut hooks = HookRegistry::new();
        hooks.register(Capture {
            intents: Arc::clone(&intents),
            fail,
        });
        let state = CalendarState::new("villa-1", mode, d(1, 2), d(1, 1));
        let mut app = CalendarApp::new(repo, hooks, PriceCalculator::default(), state);
        app.load_pending();
        (app, intents)
    }

    #[test]
    fn test_guest_books_three_nights() {
        let repo = Arc::new(ScriptedRepository::new());
        let (mut app, intents) = app(Arc::clone(&repo), Mode::Guest, false);

        app.click(d(1, 10));
        app.click(d(1, 13));
        let rates = Rates::new(150_000, 50_000);
        assert_eq!(app.quote(&rates).unwrap().total, 554_000);

        let intent = app.submit_booking(&rates).unwrap();
        assert_eq!(intent.nights, 3);
        assert_eq!(intent.total_price, 554_000);
        assert_eq!(intents.lock().unwrap().len(), 1);

        // Cleared and reloading.
        assert!(app.state().selection.is_empty());
        assert!(app.pending_fetch().is_some());
        app.load_pending();
        // Initial load, the re-check before submitting, the reload after.
        assert_eq!(repo.fetches(), 3);
        assert!(app.state().store.is_interactive());
    }

    #[test]
    fn test_failed_submission_keeps_selection() {
        let repo = Arc::new(ScriptedRepository::new());
        let (mut app, _) = app(repo, Mode::Guest, true);

        app.click(d(1, 10));
        app.click(d(1, 12));
        let before = app.state().selection;

        let err = app.submit_booking(&Rates::new(10_000, 0)).unwrap_err();
        assert!(format!("{:#}", err).contains("payment modal unavailable"));
        assert_eq!(app.state().selection, before);
        assert!(app.pending_fetch().is_none());
    }

    #[test]
    fn test_zero_price_is_not_submitted() {
        let repo = Arc::new(ScriptedRepository::new());
        let (mut app, intents) = app(repo, Mode::Guest, false);

        app.click(d(1, 10));
        app.click(d(1, 12));
        assert!(app.submit_booking(&Rates::new(0, 0)).is_err());
        assert!(intents.lock().unwrap().is_empty());
        assert!(app.state().selection.committed().is_some());
    }

    #[test]
    fn test_owner_blocks_and_unblocks() {
        let repo = Arc::new(ScriptedRepository::new());
        let (mut app, _) = app(Arc::clone(&repo), Mode::Owner, false);

        app.click(d(1, 10));
        app.click(d(1, 10));
        app.set_block_reason("plumbing");
        let block = app.submit_block().unwrap();
        assert_eq!(block.range, DateRange::day(d(1, 10)));
        assert_eq!(block.reason.as_deref(), Some("plumbing"));
        assert!(app.state().block_reason.is_empty());

        app.load_pending();
        assert!(app.state().store.snapshot().unwrap().is_blocked(d(1, 10)));

        // Blocked days no longer accept clicks.
        app.click(d(1, 10));
        assert!(app.state().selection.is_empty());

        assert_eq!(app.unblock_at(d(1, 10)).unwrap(), block.id);
        app.load_pending();
        assert!(repo.blocks().is_empty());
        assert!(!app.state().store.snapshot().unwrap().is_blocked(d(1, 10)));
    }

    #[test]
    fn test_failed_block_keeps_selection_and_reason() {
        let repo = Arc::new(ScriptedRepository::new());
        let (mut app, _) = app(Arc::clone(&repo), Mode::Owner, false);

        app.click(d(1, 10));
        app.click(d(1, 11));
        app.set_block_reason("guests of mine");
        repo.fail_next(1);

        assert!(app.submit_block().is_err());
        assert!(app.state().selection.committed().is_some());
        assert_eq!(app.state().block_reason, "guests of mine");
    }

    #[test]
    fn test_mode_guards() {
        let repo = Arc::new(ScriptedRepository::new());
        let (mut guest, _) = app(Arc::clone(&repo), Mode::Guest, false);
        guest.click(d(1, 10));
        guest.click(d(1, 12));
        assert!(guest.submit_block().is_err());

        let (mut owner, _) = app(repo, Mode::Owner, false);
        owner.click(d(1, 10));
        owner.click(d(1, 12));
        assert!(owner.submit_booking(&Rates::new(100, 0)).is_err());
    }

    #[test]
    fn test_fetch_failure_then_retry() {
        let repo = Arc::new(ScriptedRepository::new());
        repo.fail_next(1);
        let (mut app, _) = app(Arc::clone(&repo), Mode::Guest, false);

        assert!(matches!(app.state().store.state(), LoadState::Unavailable { .. }));
        app.click(d(1, 10));
        assert!(app.state().selection.is_empty());

        app.retry();
        app.load_pending();
        assert!(app.state().store.is_interactive());
        app.click(d(1, 10));
        assert_eq!(app.state().selection.start, Some(d(1, 10)));
    }

    #[test]
    fn test_late_fetch_result_does_not_clobber_new_month() {
        let repo = Arc::new(
            ScriptedRepository::new()
                .with_block(DateRange::day(d(1, 20)))
                .with_block(DateRange::day(d(2, 20))),
        );
        let state = CalendarState::new("villa-1", Mode::Guest, d(1, 2), d(1, 1));
        let mut app = CalendarApp::new(
            Arc::clone(&repo) as Arc<dyn AvailabilityRepository>,
            HookRegistry::new(),
            PriceCalculator::default(),
            state,
        );

        let january = app.pending_fetch().unwrap();
        app.shift_month(1);
        let february = app.pending_fetch().unwrap();

        let feb_event = CalendarApp::fetch(&*repo, february);
        let jan_event = CalendarApp::fetch(&*repo, january);
        app.dispatch(feb_event);
        app.dispatch(jan_event);

        let snapshot = app.state().store.snapshot().unwrap();
        assert!(snapshot.is_blocked(d(2, 20)));
        assert!(!snapshot.is_blocked(d(1, 20)));
    }

    #[test]
    fn test_stay_across_month_edge_cannot_cover_earlier_block() {
        let repo = Arc::new(ScriptedRepository::new().with_block(DateRange::day(d(1, 31))));
        let (mut app, intents) = app(Arc::clone(&repo), Mode::Guest, false);

        app.click(d(1, 30));
        app.shift_month(1);
        app.load_pending();
        app.click(d(2, 3));

        assert!(app.state().selection.committed().is_none());
        assert_eq!(app.state().selection.start, Some(d(2, 3)));
        assert!(app.submit_booking(&Rates::new(10_000, 0)).is_err());
        assert!(intents.lock().unwrap().is_empty());
    }

    #[test]
    fn test_submission_rechecks_dates_taken_since_the_last_load() {
        let repo = Arc::new(ScriptedRepository::new());
        let (mut app, intents) = app(Arc::clone(&repo), Mode::Guest, false);
        app.click(d(1, 10));
        app.click(d(1, 14));

        // The owner takes Jan 12 after this snapshot was loaded.
        let owner_block = NewBlock::new(DateRange::day(d(1, 12)), None);
        repo.block_dates("villa-1", owner_block).unwrap();

        let err = app.submit_booking(&Rates::new(10_000, 0)).unwrap_err();
        assert!(format!("{:#}", err).contains("overlaps blocked or booked"));
        assert!(intents.lock().unwrap().is_empty());
        assert!(app.state().selection.committed().is_some());
    }

    #[test]
    fn test_owner_block_rechecks_bookings() {
        let repo = Arc::new(ScriptedRepository::new());
        let (mut app, _) = app(Arc::clone(&repo), Mode::Owner, false);
        app.click(d(1, 10));
        app.click(d(1, 12));
        repo.block_dates("villa-1", NewBlock::new(DateRange::day(d(1, 11)), None)).unwrap();

        assert!(app.submit_block().is_err());
        assert_eq!(repo.blocks().len(), 1);
    }

    #[test]
    fn test_default_plugins_confirm_bookings_locally() {
        let test_storage = TestStorage::new();
        let dir = test_storage.dir().join("app");
        let config = Config::from_lookup(|key| {
            (key == "STAYCAL_DIR").then(|| dir.to_string_lossy().into_owned())
        });

        let mut app =
            CalendarApp::with_default_plugins(&config, "villa-1", Mode::Guest, d(1, 2), d(1, 1))
                .unwrap();
        app.load_pending();
        app.click(d(1, 10));
        app.click(d(1, 12));
        app.submit_booking(&Rates::new(10_000, 1_000)).unwrap();
        app.load_pending();

        assert!(app.state().store.snapshot().unwrap().is_booked(d(1, 11)));
        assert!(config.intent_log_path.exists());
    }
}
