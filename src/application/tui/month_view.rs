use super::theme::Theme;
use crate::application::CalendarApp;
use crate::domain::{
    CalendarCell, CalendarState, DayStatus, LoadState, Mode, PriceQuote, Rates, first_of_month,
    weeks,
};
use chrono::{Datelike, Duration, NaiveDate};
use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers, poll};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use crossterm::tty::IsTty;
use log::debug;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};
use std::io::{self, Stdout, stdout};
use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug, Clone, PartialEq)]
pub enum Flash {
    Info(String),
    Error(String),
}

/// Everything the month view tracks on top of the calendar state. Kept apart
/// from the terminal so key handling can be driven without a TTY.
#[derive(Debug, Clone)]
pub struct MonthViewState {
    /// Doubles as the hover date for the guest preview.
    pub cursor: NaiveDate,
    pub rates: Option<Rates>,
    pub show_help: bool,
    pub editing_reason: bool,
    pub should_exit: bool,
    pub flash: Option<Flash>,
}

impl MonthViewState {
    pub fn new(cursor: NaiveDate, rates: Option<Rates>) -> Self {
        Self {
            cursor,
            rates,
            show_help: false,
            editing_reason: false,
            should_exit: false,
            flash: None,
        }
    }

    fn move_cursor(&mut self, app: &mut CalendarApp, days: i64) {
        let target = self.cursor + Duration::days(days);
        self.move_cursor_to(app, target);
    }

    /// Moves the cursor, following it into the neighbouring month if needed.
    fn move_cursor_to(&mut self, app: &mut CalendarApp, target: NaiveDate) {
        let shown = app.state().current_month;
        let target_month = first_of_month(target);
        if target_month != shown {
            let delta = (target_month.year() - shown.year()) * 12 + target_month.month() as i32
                - shown.month() as i32;
            app.shift_month(delta);
        }
        self.cursor = target;
    }

    fn jump_month(&mut self, app: &mut CalendarApp, delta: i32) {
        app.shift_month(delta);
        let month = app.state().current_month;
        self.cursor = month.with_day(self.cursor.day()).unwrap_or(month);
    }

    fn submit(&mut self, app: &mut CalendarApp) {
        let outcome = match app.state().mode {
            Mode::Guest => match self.rates {
                Some(rates) => app.submit_booking(&rates).map(|intent| {
                    format!(
                        "Requested {} → {} ({} nights, total {})",
                        intent.check_in, intent.check_out, intent.nights, intent.total_price
                    )
                }),
                None => Err(anyhow::anyhow!("No nightly rate configured for this property")),
            },
            Mode::Owner => app.submit_block().map(|block| {
                format!(
                    "Blocked {} → {} (block {})",
                    block.range.start(),
                    block.range.end(),
                    block.id
                )
            }),
        };
        self.flash = Some(match outcome {
            Ok(message) => Flash::Info(message),
            Err(e) => Flash::Error(format!("{:#}", e)),
        });
    }

    fn unblock(&mut self, app: &mut CalendarApp) {
        self.flash = Some(match app.unblock_at(self.cursor) {
            Ok(id) => Flash::Info(format!("Removed block {}", id)),
            Err(e) => Flash::Error(format!("{:#}", e)),
        });
    }

    fn handle_reason_key(&mut self, app: &mut CalendarApp, key: KeyEvent) {
        let mut reason = app.state().block_reason.clone();
        match key.code {
            KeyCode::Enter | KeyCode::Esc => self.editing_reason = false,
            KeyCode::Backspace => {
                reason.pop();
            }
            KeyCode::Char(c) => reason.push(c),
            _ => {}
        }
        if reason != app.state().block_reason {
            app.set_block_reason(reason);
        }
    }

    pub fn handle_key_event(&mut self, app: &mut CalendarApp, key: KeyEvent) {
        if self.editing_reason {
            self.handle_reason_key(app, key);
            return;
        }

        match (key.code, key.modifiers) {
            // Exit
            (KeyCode::Char('c'), KeyModifiers::CONTROL)
            | (KeyCode::Char('d'), KeyModifiers::CONTROL)
            | (KeyCode::Char('q'), _)
            | (KeyCode::Esc, _) => {
                self.should_exit = true;
            }

            // Cursor
            (KeyCode::Left, _) | (KeyCode::Char('h'), _) => self.move_cursor(app, -1),
            (KeyCode::Right, _) | (KeyCode::Char('l'), _) => self.move_cursor(app, 1),
            (KeyCode::Up, _) | (KeyCode::Char('k'), _) => self.move_cursor(app, -7),
            (KeyCode::Down, _) | (KeyCode::Char('j'), _) => self.move_cursor(app, 7),
            (KeyCode::Char('t'), _) => {
                let today = app.state().today;
                self.move_cursor_to(app, today);
            }

            // Months
            (KeyCode::PageUp, _) | (KeyCode::Char('p'), _) => self.jump_month(app, -1),
            (KeyCode::PageDown, _) | (KeyCode::Char('n'), _) => self.jump_month(app, 1),

            // Selection
            (KeyCode::Enter, _) | (KeyCode::Char(' '), _) => {
                self.flash = None;
                app.click(self.cursor);
            }
            (KeyCode::Char('c'), _) => {
                self.flash = None;
                app.clear();
            }
            (KeyCode::Char('s'), _) => self.submit(app),
            (KeyCode::Char('r'), _) => {
                if matches!(app.state().store.state(), LoadState::Unavailable { .. }) {
                    self.flash = None;
                    app.retry();
                }
            }

            // Owner only
            (KeyCode::Char('e'), _) if app.state().mode == Mode::Owner => {
                self.editing_reason = true;
            }
            (KeyCode::Char('u'), _) if app.state().mode == Mode::Owner => self.unblock(app),

            (KeyCode::Char('?'), _) => {
                self.show_help = !self.show_help;
            }

            _ => {}
        }
    }
}

pub struct MonthView<'a> {
    app: &'a mut CalendarApp,
    view: MonthViewState,
    terminal: Terminal<CrosstermBackend<Stdout>>,
    theme: Theme,
    events_tx: Sender<crate::domain::CalendarEvent>,
    events_rx: Receiver<crate::domain::CalendarEvent>,
    last_dispatched: Option<u64>,
}

impl<'a> MonthView<'a> {
    pub fn new(app: &'a mut CalendarApp, rates: Option<Rates>, theme: Theme) -> io::Result<Self> {
        // First check if we're in a proper terminal
        if !IsTty::is_tty(&std::io::stdout()) {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "Not running in a TTY, cannot initialize terminal interface",
            ));
        }

        enable_raw_mode()
            .map_err(|e| io::Error::other(format!("Failed to enable raw mode: {}", e)))?;

        stdout().execute(EnterAlternateScreen).map_err(|e| {
            let _ = disable_raw_mode(); // Clean up on failure
            io::Error::other(format!("Failed to enter alternate screen: {}", e))
        })?;

        let backend = CrosstermBackend::new(stdout());
        let terminal = Terminal::new(backend).map_err(|e| {
            let _ = disable_raw_mode();
            let _ = stdout().execute(LeaveAlternateScreen);
            io::Error::other(format!("Failed to create terminal: {}", e))
        })?;

        let state = app.state();
        let cursor = if first_of_month(state.today) == state.current_month {
            state.today
        } else {
            state.current_month
        };
        let (events_tx, events_rx) = mpsc::channel();

        Ok(Self {
            app,
            view: MonthViewState::new(cursor, rates),
            terminal,
            theme,
            events_tx,
            events_rx,
            last_dispatched: None,
        })
    }

    /// Starts a background fetch for a request the view has not sent yet.
    fn dispatch_pending_fetch(&mut self) {
        let Some(request) = self.app.pending_fetch() else {
            return;
        };
        if self.last_dispatched == Some(request.seq) {
            return;
        }
        self.last_dispatched = Some(request.seq);
        debug!("fetching availability #{} in background", request.seq);

        let repository = self.app.repository();
        let tx = self.events_tx.clone();
        std::thread::spawn(move || {
            let event = CalendarApp::fetch(repository.as_ref(), request);
            // The view may be gone by now; nothing to do then.
            let _ = tx.send(event);
        });
    }

    fn drain_fetch_results(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.app.dispatch(event);
        }
    }

    /// While availability is loading or unavailable the whole grid, cursor
    /// included, renders dimmed.
    fn cell_style(
        cell: &CalendarCell,
        cursor: NaiveDate,
        interactive: bool,
        theme: &Theme,
    ) -> Style {
        match (interactive, cell.date == cursor) {
            (true, true) => theme.colors.cursor.to_ratatui_with_modifier(Modifier::BOLD),
            (true, false) => theme.day_style(cell.status, cell.in_current_month),
            (false, true) => theme
                .colors
                .padding
                .to_ratatui_with_modifier(Modifier::DIM | Modifier::UNDERLINED),
            (false, false) => theme.colors.padding.to_ratatui(),
        }
    }

    fn create_month_table(
        state: &CalendarState,
        cells: &[CalendarCell],
        cursor: NaiveDate,
        theme: &Theme,
    ) -> Table<'static> {
        let header = Row::new(
            ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"]
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let color = if i >= 5 {
                        &theme.colors.weekend
                    } else {
                        &theme.colors.header
                    };
                    Cell::from(*name).style(color.to_ratatui())
                })
                .collect::<Vec<_>>(),
        )
        .height(1);

        let interactive = state.store.is_interactive();
        let rows: Vec<Row> = weeks(cells)
            .map(|week| {
                Row::new(
                    week.iter()
                        .map(|cell| {
                            let marker = match cell.status {
                                DayStatus::Blocked if cell.in_current_month => "x",
                                DayStatus::Booked if cell.in_current_month => "•",
                                _ => " ",
                            };
                            let style = Self::cell_style(cell, cursor, interactive, theme);
                            Cell::from(format!("{:>3}{}", cell.date.day(), marker)).style(style)
                        })
                        .collect::<Vec<_>>(),
                )
                .height(1)
            })
            .collect();

        Table::new(rows, [Constraint::Length(5); 7])
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::NONE)
                    .title(format!(
                        "{} · {}",
                        state.current_month.format("%B %Y"),
                        state.mode
                    ))
                    .title_style(theme.colors.header.to_ratatui())
                    .title_alignment(Alignment::Center),
            )
            .column_spacing(1)
    }

    fn quote_lines(quote: &PriceQuote, theme: &Theme) -> Vec<Line<'static>> {
        let style = theme.colors.normal_text.to_ratatui();
        vec![
            Line::from(Span::styled(
                format!("{} nights        {:>10}", quote.nights, quote.accommodation_cost),
                style,
            )),
            Line::from(Span::styled(
                format!("Cleaning fee    {:>10}", quote.cleaning_fee),
                style,
            )),
            Line::from(Span::styled(
                format!("Service fee     {:>10}", quote.service_fee),
                style,
            )),
            Line::from(Span::styled(
                format!("Total           {:>10}", quote.total),
                style.add_modifier(Modifier::BOLD),
            )),
        ]
    }

    fn create_side_panel(
        app: &CalendarApp,
        view: &MonthViewState,
        theme: &Theme,
    ) -> Paragraph<'static> {
        let state = app.state();
        let text = theme.colors.normal_text.to_ratatui();
        let error = theme.colors.error_text.to_ratatui();
        let mut lines = Vec::new();

        match state.store.state() {
            LoadState::Loading { .. } | LoadState::Idle => {
                lines.push(Line::from(Span::styled("Loading availability…", text)));
            }
            LoadState::Unavailable { message, .. } => {
                lines.push(Line::from(Span::styled(
                    format!("Availability unavailable: {}", message),
                    error,
                )));
                lines.push(Line::from(Span::styled("Press r to retry", text)));
            }
            LoadState::Ready => {}
        }

        let selection = state.selection;
        let label = match state.mode {
            Mode::Guest => ("Check-in", "Check-out"),
            Mode::Owner => ("From", "To"),
        };
        let show = |d: Option<NaiveDate>| {
            d.map_or("-".to_string(), |d| d.format("%a %b %d").to_string())
        };
        lines.push(Line::from(Span::styled(
            format!("{:<10}{}", label.0, show(selection.start)),
            text,
        )));
        lines.push(Line::from(Span::styled(
            format!("{:<10}{}", label.1, show(selection.end)),
            text,
        )));

        match state.mode {
            Mode::Guest => match (view.rates, selection.committed()) {
                (Some(rates), Some(stay)) => match app.pricing().quote(stay, &rates) {
                    Ok(quote) => lines.extend(Self::quote_lines(&quote, theme)),
                    Err(e) => lines.push(Line::from(Span::styled(e.to_string(), error))),
                },
                (None, Some(_)) => {
                    lines.push(Line::from(Span::styled("Price unavailable", error)));
                }
                _ => {}
            },
            Mode::Owner => {
                let cursor_marker = if view.editing_reason { "▏" } else { "" };
                lines.push(Line::from(Span::styled(
                    format!("Reason    {}{}", state.block_reason, cursor_marker),
                    text,
                )));
            }
        }

        match &view.flash {
            Some(Flash::Info(message)) => {
                lines.push(Line::from(Span::styled(message.clone(), text)))
            }
            Some(Flash::Error(message)) => {
                lines.push(Line::from(Span::styled(message.clone(), error)))
            }
            None => {}
        }

        Paragraph::new(lines)
            .block(Block::default().borders(Borders::NONE))
            .alignment(Alignment::Left)
    }

    fn create_help_text(mode: Mode, theme: &Theme) -> Paragraph<'static> {
        let extra = match mode {
            Mode::Guest => "s=Request booking",
            Mode::Owner => "s=Block • e=Reason • u=Unblock",
        };
        Paragraph::new(vec![
            Line::from(Span::styled(
                "←→↑↓/hjkl=Move • n/p=Month • t=Today • Enter=Pick • c=Clear • r=Retry • q=Quit",
                theme.colors.help_text.to_ratatui(),
            )),
            Line::from(Span::styled(extra, theme.colors.help_text.to_ratatui())),
        ])
        .alignment(Alignment::Center)
    }

    fn centered(area: Rect, width: u16, height: u16) -> Rect {
        let width = area.width.min(width);
        let height = area.height.min(height);
        Rect {
            x: area.x + (area.width - width) / 2,
            y: area.y + (area.height - height) / 2,
            width,
            height,
        }
    }

    /// Run the month view loop until the user quits.
    pub fn run(&mut self) -> io::Result<()> {
        while !self.view.should_exit {
            self.dispatch_pending_fetch();
            self.drain_fetch_results();

            let cells = self.app.state().cells(Some(self.view.cursor));
            let table =
                Self::create_month_table(self.app.state(), &cells, self.view.cursor, &self.theme);
            let panel = Self::create_side_panel(&*self.app, &self.view, &self.theme);
            let help = self
                .view
                .show_help
                .then(|| Self::create_help_text(self.app.state().mode, &self.theme));

            self.terminal.draw(|frame| {
                const CALENDAR_WIDTH: u16 = 42;
                const CALENDAR_HEIGHT: u16 = 9;
                const PANEL_HEIGHT: u16 = 9;
                const HELP_HEIGHT: u16 = 2;

                let help_height = if help.is_some() { HELP_HEIGHT } else { 0 };
                let height = CALENDAR_HEIGHT + PANEL_HEIGHT + help_height;
                let area = Self::centered(frame.area(), CALENDAR_WIDTH + 8, height);

                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([
                        Constraint::Length(CALENDAR_HEIGHT),
                        Constraint::Length(PANEL_HEIGHT),
                        Constraint::Length(help_height),
                    ])
                    .split(area);

                frame.render_widget(table, chunks[0]);
                frame.render_widget(panel, chunks[1]);
                if let Some(help) = help {
                    frame.render_widget(help, chunks[2]);
                }
            })?;

            if poll(std::time::Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    self.view.handle_key_event(self.app, key);
                }
            }
        }

        self.app.detach();
        self.cleanup()
    }

    fn cleanup(&mut self) -> io::Result<()> {
        disable_raw_mode()?;
        self.terminal.backend_mut().execute(LeaveAlternateScreen)?;
        Ok(())
    }
}

impl Drop for MonthView<'_> {
    fn drop(&mut self) {
        // Fallback cleanup if run() bailed out early
        let _ = self.cleanup();
    }
}
