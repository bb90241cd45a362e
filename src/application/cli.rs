use crate::application::{CalendarApp, Config, MonthView, Theme};
use crate::domain::{
    AvailabilityBlock, BlockId, BookingIntent, CalendarCell, CalendarEvent, DateRange, DayStatus,
    DepositKind, LoadState, Mode, PriceCalculator, PriceQuote, Rates, first_of_month, weeks,
};
use crate::infrastructure::{AvailabilityRepository, DuckDbStorage};
use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use log::debug;

#[derive(Parser)]
#[command(name = "staycal")]
#[command(about = "Availability and booking calendar for a rental property")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Nightly pricing, in minor currency units (cents).
#[derive(Args, Debug, Clone, Copy)]
pub struct RateArgs {
    /// Price per night
    #[arg(long)]
    pub nightly: Option<i64>,
    /// One-off cleaning fee
    #[arg(long, default_value_t = 0)]
    pub cleaning: i64,
    /// Flat service fee; defaults to a percentage of the nightly cost
    #[arg(long)]
    pub service_fee: Option<i64>,
}

impl RateArgs {
    pub fn rates(&self) -> Option<Rates> {
        let rates = Rates::new(self.nightly?, self.cleaning);
        Some(match self.service_fee {
            Some(fee) => rates.with_service_fee(fee),
            None => rates,
        })
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive month calendar
    View {
        #[arg(short, long, default_value = "default")]
        property: String,
        /// Month to open (YYYY-MM, defaults to the current month)
        #[arg(short, long)]
        month: Option<String>,
        #[arg(long, default_value_t = Mode::Guest)]
        mode: Mode,
        #[command(flatten)]
        rates: RateArgs,
    },
    /// Print one month as a text grid
    Grid {
        #[arg(short, long, default_value = "default")]
        property: String,
        #[arg(short, long)]
        month: Option<String>,
        #[arg(long, default_value_t = Mode::Guest)]
        mode: Mode,
    },
    /// Print blocked and booked ranges overlapping a window as JSON
    Availability {
        #[arg(short, long, default_value = "default")]
        property: String,
        /// First day (YYYY-MM-DD)
        #[arg(long)]
        from: String,
        /// Last day, inclusive (YYYY-MM-DD)
        #[arg(long)]
        to: String,
    },
    /// Take a date range off the market
    Block {
        #[arg(short, long, default_value = "default")]
        property: String,
        #[arg(long)]
        start: String,
        /// Last blocked day, inclusive
        #[arg(long)]
        end: String,
        #[arg(short, long)]
        reason: Option<String>,
    },
    /// Remove a block by id
    Unblock {
        #[arg(short, long, default_value = "default")]
        property: String,
        id: i64,
    },
    /// Price a stay without touching availability
    Quote {
        #[arg(long)]
        check_in: String,
        #[arg(long)]
        check_out: String,
        /// Show the deposit for a long-term lease instead of a short stay
        #[arg(long)]
        lease: bool,
        #[command(flatten)]
        rates: RateArgs,
    },
    /// Request a booking for a stay
    Book {
        #[arg(short, long, default_value = "default")]
        property: String,
        #[arg(long)]
        check_in: String,
        #[arg(long)]
        check_out: String,
        #[command(flatten)]
        rates: RateArgs,
    },
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", raw))
}

/// Parses `YYYY-MM` into the first day of that month.
pub fn parse_month(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{}-01", raw.trim()), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{}', expected YYYY-MM", raw))
}

pub fn format_money(amount: i64) -> String {
    let sign = if amount < 0 { "-" } else { "" };
    let amount = amount.unsigned_abs();
    format!("{}{}.{:02}", sign, amount / 100, amount % 100)
}

fn status_marker(status: DayStatus) -> char {
    match status {
        DayStatus::Available => ' ',
        DayStatus::Blocked => 'x',
        DayStatus::Booked => '#',
        DayStatus::Selected => '*',
        DayStatus::SelectedRange => '+',
        DayStatus::Disabled => '.',
    }
}

/// Renders classified cells as a Monday-first text grid. Days outside the
/// shown month are left blank.
pub fn render_grid(month: NaiveDate, cells: &[CalendarCell]) -> String {
    let mut out = format!("{:^28}\n", month.format("%B %Y").to_string());
    out.push_str(" Mo  Tu  We  Th  Fr  Sa  Su\n");
    for week in weeks(cells) {
        let line: Vec<String> = week
            .iter()
            .map(|cell| {
                if cell.in_current_month {
                    format!("{:>3}{}", cell.date.day(), status_marker(cell.status))
                } else {
                    "    ".to_string()
                }
            })
            .collect();
        out.push_str(line.concat().trim_end());
        out.push('\n');
    }
    out
}

pub fn render_quote(quote: &PriceQuote, deposit: DepositKind) -> String {
    [
        format!("{} nights     {:>12}", quote.nights, format_money(quote.accommodation_cost)),
        format!("Cleaning fee {:>12}", format_money(quote.cleaning_fee)),
        format!("Service fee  {:>12}", format_money(quote.service_fee)),
        format!("Total        {:>12}", format_money(quote.total)),
        format!(
            "Deposit ({}%) {:>11}",
            deposit.percent(),
            format_money(deposit.amount(quote.total))
        ),
    ]
    .join("\n")
}

fn today() -> NaiveDate {
    Local::now().naive_local().date()
}

fn open_app(
    config: &Config,
    property: &str,
    mode: Mode,
    month: Option<NaiveDate>,
) -> Result<CalendarApp> {
    let today = today();
    CalendarApp::with_default_plugins(config, property, mode, today, month.unwrap_or(today))
}

fn open_storage(config: &Config) -> Result<DuckDbStorage> {
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("Failed to create data dir {}", config.data_dir.display()))?;
    DuckDbStorage::new(&config.db_path)
}

/// Fetches whatever the calendar is waiting on and fails if it could not.
fn load(app: &mut CalendarApp) -> Result<()> {
    app.load_pending();
    match app.state().store.state() {
        LoadState::Unavailable { message, .. } => {
            Err(anyhow!("Availability unavailable: {}", message))
        }
        _ => Ok(()),
    }
}

fn show_month_of(app: &mut CalendarApp, date: NaiveDate) -> Result<()> {
    let month = first_of_month(date);
    if month != app.state().current_month {
        app.dispatch(CalendarEvent::MonthChanged(month));
    }
    load(app)
}

/// Clicks `first` then `last` the way a user would, paging to each date's
/// month, and returns the range the calendar committed.
pub fn select_range(app: &mut CalendarApp, first: NaiveDate, last: NaiveDate) -> Result<DateRange> {
    let wanted = DateRange::new(first, last)?;
    app.clear();
    show_month_of(app, first)?;
    app.click(first);
    show_month_of(app, last)?;
    app.click(last);

    match app.state().selection.committed() {
        Some(range) if range == wanted => Ok(range),
        _ => Err(anyhow!(
            "{} to {} cannot be selected (past, blocked or booked dates)",
            first,
            last
        )),
    }
}

pub fn block_range(
    app: &mut CalendarApp,
    range: DateRange,
    reason: Option<String>,
) -> Result<AvailabilityBlock> {
    select_range(app, range.start(), range.end())?;
    if let Some(reason) = reason {
        app.set_block_reason(reason);
    }
    app.submit_block()
}

pub fn book_stay(
    app: &mut CalendarApp,
    stay: DateRange,
    rates: &Rates,
) -> Result<(PriceQuote, BookingIntent)> {
    select_range(app, stay.start(), stay.end())?;
    let quote = app.quote(rates)?;
    let intent = app.submit_booking(rates)?;
    Ok((quote, intent))
}

impl Cli {
    pub fn run() -> anyhow::Result<()> {
        let cli = Self::parse();
        let config = Config::from_env();
        debug!("data dir {}", config.data_dir.display());

        match cli.command {
            Some(Commands::View {
                property,
                month,
                mode,
                rates,
            }) => {
                let month = month.as_deref().map(parse_month).transpose()?;
                let mut app = open_app(&config, &property, mode, month)?;
                let theme = Theme::by_name(&config.theme);
                let mut view = MonthView::new(&mut app, rates.rates(), theme)?;
                view.run()?;
            }
            Some(Commands::Grid {
                property,
                month,
                mode,
            }) => {
                let month = month.as_deref().map(parse_month).transpose()?;
                let mut app = open_app(&config, &property, mode, month)?;
                load(&mut app)?;
                let state = app.state();
                print!("{}", render_grid(state.current_month, &state.cells(None)));
            }
            Some(Commands::Availability { property, from, to }) => {
                let window = DateRange::new(parse_date(&from)?, parse_date(&to)?)?;
                let storage = open_storage(&config)?;
                let snapshot = storage.availability(&property, window)?;
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
            Some(Commands::Block {
                property,
                start,
                end,
                reason,
            }) => {
                let range = DateRange::new(parse_date(&start)?, parse_date(&end)?)?;
                let mut app = open_app(&config, &property, Mode::Owner, Some(range.start()))?;
                let block = block_range(&mut app, range, reason)?;
                println!("{}", serde_json::to_string_pretty(&block)?);
            }
            Some(Commands::Unblock { property, id }) => {
                let storage = open_storage(&config)?;
                storage.unblock_dates(&property, BlockId(id))?;
                println!("Removed block {}", id);
            }
            Some(Commands::Quote {
                check_in,
                check_out,
                lease,
                rates,
            }) => {
                let stay = DateRange::new(parse_date(&check_in)?, parse_date(&check_out)?)?;
                let rates = rates.rates().ok_or_else(|| anyhow!("--nightly is required"))?;
                let quote = PriceCalculator::new(config.service_fee_bps).quote(stay, &rates)?;
                let deposit = if lease {
                    DepositKind::Lease
                } else {
                    DepositKind::Stay
                };
                println!("{}", render_quote(&quote, deposit));
            }
            Some(Commands::Book {
                property,
                check_in,
                check_out,
                rates,
            }) => {
                let stay = DateRange::new(parse_date(&check_in)?, parse_date(&check_out)?)?;
                let rates = rates.rates().ok_or_else(|| anyhow!("--nightly is required"))?;
                let mut app = open_app(&config, &property, Mode::Guest, Some(stay.start()))?;
                let (quote, intent) = book_stay(&mut app, stay, &rates)?;
                println!("{}", render_quote(&quote, DepositKind::Stay));
                println!("{}", serde_json::to_string_pretty(&intent)?);
            }
            None => {
                let mut app = open_app(&config, "default", Mode::Guest, None)?;
                let mut view = MonthView::new(&mut app, None, Theme::by_name(&config.theme))?;
                view.run()?;
            }
        }

        Ok(())
    }
}
