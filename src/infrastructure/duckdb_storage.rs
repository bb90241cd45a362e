use crate::domain::{
    AvailabilityBlock, AvailabilitySnapshot, BlockId, BookedRange, DateRange, Money, NewBlock,
};
use crate::infrastructure::AvailabilityRepository;
use anyhow::{Context, Result, anyhow, bail};
use chrono::NaiveDate;
use duckdb::{Connection, params};
use log::{debug, info};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const DATE_FORMAT: &str = "%Y-%m-%d";

const MIGRATIONS: &[(i32, &str, &str)] = &[
    (
        1,
        "001_availability",
        include_str!("../../migrations/001_availability.sql"),
    ),
    (
        2,
        "002_bookings",
        include_str!("../../migrations/002_bookings.sql"),
    ),
];

/// Local availability backend. Dates are stored as `YYYY-MM-DD` text, which
/// sorts the same way the dates do.
pub struct DuckDbStorage {
    conn: Mutex<Connection>,
}

// Shared with the month view's fetch thread; every access goes through the Mutex
unsafe impl Send for DuckDbStorage {}
unsafe impl Sync for DuckDbStorage {}

impl DuckDbStorage {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path).context("Failed to open DuckDB connection")?;

        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.initialize()?;
        Ok(storage)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .context("Failed to create in-memory DuckDB connection")?;

        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.initialize()?;
        Ok(storage)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("DuckDB connection lock poisoned"))
    }

    fn initialize(&self) -> Result<()> {
        self.setup_migration_system()?;
        self.run_migrations()
    }

    /// Stores a confirmed reservation. Only the local confirmation hook calls
    /// this; the calendar itself never creates bookings.
    pub fn record_booking(
        &self,
        property_id: &str,
        stay: DateRange,
        total_price: Option<Money>,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO bookings (property_id, start_date, end_date, total_price)
             VALUES (?, ?, ?, ?)",
            params![
                property_id,
                format_date(stay.start()),
                format_date(stay.end()),
                total_price
            ],
        )
        .context("Failed to record booking")?;
        Ok(())
    }

    fn load_blocks(
        &self,
        conn: &Connection,
        property_id: &str,
        window: DateRange,
    ) -> Result<Vec<AvailabilityBlock>> {
        let mut stmt = conn
            .prepare(
                "SELECT id, start_date, end_date, reason FROM blocks
                 WHERE property_id = ? AND start_date <= ? AND end_date >= ?
                 ORDER BY start_date, id",
            )
            .context("Failed to prepare block query")?;

        let rows = stmt.query_map(
            params![property_id, format_date(window.end()), format_date(window.start())],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            },
        )?;

        let mut blocks = Vec::new();
        for row in rows {
            let (id, start, end, reason) = row?;
            let range = parse_range(&start, &end)
                .with_context(|| format!("Corrupt block {} in database", id))?;
            blocks.push(AvailabilityBlock::new(BlockId(id), range, reason));
        }
        Ok(blocks)
    }

    fn load_bookings(
        &self,
        conn: &Connection,
        property_id: &str,
        window: DateRange,
    ) -> Result<Vec<BookedRange>> {
        let mut stmt = conn
            .prepare(
                "SELECT start_date, end_date FROM bookings
                 WHERE property_id = ? AND start_date <= ? AND end_date >= ?
                 ORDER BY start_date",
            )
            .context("Failed to prepare booking query")?;

        let rows = stmt.query_map(
            params![property_id, format_date(window.end()), format_date(window.start())],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )?;

        let mut booked = Vec::new();
        for row in rows {
            let (start, end) = row?;
            booked.push(BookedRange::new(parse_range(&start, &end)?));
        }
        Ok(booked)
    }

    fn setup_migration_system(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            );
        "#,
        )
        .context("Failed to create migrations table")?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        let applied = self.get_applied_migrations()?;

        for (version, name, sql) in MIGRATIONS {
            if !applied.contains(version) {
                self.apply_migration(*version, name, sql)
                    .with_context(|| format!("Failed to apply migration {}: {}", version, name))?;
            }
        }

        Ok(())
    }

    fn get_applied_migrations(&self) -> Result<HashSet<i32>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT version FROM migrations ORDER BY version")
            .context("Failed to prepare migration query")?;

        let rows = stmt.query_map([], |row| row.get::<_, i32>(0))?;

        let mut applied = HashSet::new();
        for version in rows {
            applied.insert(version?);
        }

        Ok(applied)
    }

    fn apply_migration(&self, version: i32, name: &str, sql: &str) -> Result<()> {
        let conn = self.conn()?;
        debug!("applying migration {}", name);

        conn.execute_batch(sql)
            .with_context(|| format!("Failed to execute migration SQL for {}", name))?;

        conn.execute(
            "INSERT INTO migrations (version, name) VALUES (?, ?)",
            params![version, name],
        )
        .with_context(|| format!("Failed to record migration {} as applied", name))?;

        Ok(())
    }
}

impl AvailabilityRepository for DuckDbStorage {
    fn availability(&self, property_id: &str, window: DateRange) -> Result<AvailabilitySnapshot> {
        let conn = self.conn()?;
        let blocked = self.load_blocks(&conn, property_id, window)?;
        let booked = self.load_bookings(&conn, property_id, window)?;
        Ok(AvailabilitySnapshot::new(blocked, booked))
    }

    fn block_dates(&self, property_id: &str, block: NewBlock) -> Result<AvailabilityBlock> {
        let conn = self.conn()?;
        let id: i64 = conn
            .query_row("SELECT nextval('blocks_id_seq')", [], |row| row.get(0))
            .context("Failed to allocate block id")?;

        conn.execute(
            "INSERT INTO blocks (id, property_id, start_date, end_date, reason)
             VALUES (?, ?, ?, ?, ?)",
            params![
                id,
                property_id,
                format_date(block.range.start()),
                format_date(block.range.end()),
                block.reason.as_deref()
            ],
        )
        .context("Failed to save block")?;

        info!(
            "blocked {}..{} for {} (block {})",
            block.range.start(),
            block.range.end(),
            property_id,
            id
        );
        Ok(AvailabilityBlock::new(BlockId(id), block.range, block.reason))
    }

    fn unblock_dates(&self, property_id: &str, block_id: BlockId) -> Result<()> {
        let conn = self.conn()?;
        let deleted = conn
            .execute(
                "DELETE FROM blocks WHERE id = ? AND property_id = ?",
                params![block_id.0, property_id],
            )
            .context("Failed to delete block")?;

        if deleted == 0 {
            bail!("Block {} not found for property {}", block_id, property_id);
        }
        info!("removed block {} from {}", block_id, property_id);
        Ok(())
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_range(start: &str, end: &str) -> Result<DateRange> {
    let start = NaiveDate::parse_from_str(start, DATE_FORMAT)
        .context("Failed to parse start date from database")?;
    let end = NaiveDate::parse_from_str(end, DATE_FORMAT)
        .context("Failed to parse end date from database")?;
    Ok(DateRange::new(start, end)?)
}
