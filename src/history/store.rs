//! Durable daily summary store
//!
//! A single SQLite table with one row per local calendar day, keyed by the
//! day-start timestamp. Writes are idempotent upserts performed by the
//! poller on day rollover; reads are the three history query modes. Absent
//! extremes round-trip as SQL NULL, distinguishable from zero.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::history::query::HistoryQuery;

/// Errors from the summary store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite failure
    #[error("summary store error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Could not create the directory holding the database
    #[error("failed to prepare store directory: {0}")]
    Io(#[from] std::io::Error),
}

/// The values of one daily summary row (everything but the key).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailySummaryRecord {
    pub temp_high_c: Option<f64>,
    pub temp_low_c: Option<f64>,
    pub humidity_high: Option<f64>,
    pub humidity_low: Option<f64>,
    pub rain_in: Option<f64>,
}

/// One stored row: day-start key plus values.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub day_ts: i64,
    pub record: DailySummaryRecord,
}

/// SQLite-backed store of one summary row per calendar day.
///
/// The connection is mutex-wrapped: the poller is the only writer and the
/// query handlers read concurrently, so contention is a single short
/// statement at a time.
pub struct SummaryStore {
    conn: Mutex<Connection>,
}

impl SummaryStore {
    /// Opens (or creates) the store at the given path and ensures the
    /// schema exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS daily_weather (
               day_ts INTEGER PRIMARY KEY,
               temp_high_c REAL,
               temp_low_c REAL,
               humidity_high REAL,
               humidity_low REAL,
               rain_in REAL
             );",
        )?;
        Ok(())
    }

    /// Idempotently writes the row for one day, overwriting any previous
    /// row under the same key.
    pub fn upsert_day(&self, day_ts: i64, record: &DailySummaryRecord) -> Result<(), StoreError> {
        let conn = self.conn.lock().expect("store lock poisoned");
        conn.execute(
            "INSERT OR REPLACE INTO daily_weather
               (day_ts, temp_high_c, temp_low_c, humidity_high, humidity_low, rain_in)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                day_ts,
                record.temp_high_c,
                record.temp_low_c,
                record.humidity_high,
                record.humidity_low,
                record.rain_in,
            ],
        )?;
        Ok(())
    }

    /// Reads one day's row, if present.
    pub fn get_day(&self, day_ts: i64) -> Result<Option<DailySummary>, StoreError> {
        let conn = self.conn.lock().expect("store lock poisoned");
        let row = conn
            .query_row(
                "SELECT day_ts, temp_high_c, temp_low_c, humidity_high, humidity_low, rain_in
                 FROM daily_weather WHERE day_ts = ?1",
                params![day_ts],
                Self::map_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Runs a history query, returning rows ordered by day key ascending.
    ///
    /// `now` anchors the `days` filter; passing it in keeps the dispatch a
    /// pure function of its inputs.
    pub fn query_days(&self, query: &HistoryQuery, now: i64) -> Result<Vec<DailySummary>, StoreError> {
        let conn = self.conn.lock().expect("store lock poisoned");

        let since = query.since_ts(now);
        let page = query.page();

        let sql = match (since.is_some(), page.is_some()) {
            (false, false) => {
                "SELECT day_ts, temp_high_c, temp_low_c, humidity_high, humidity_low, rain_in
                 FROM daily_weather ORDER BY day_ts"
            }
            (true, false) => {
                "SELECT day_ts, temp_high_c, temp_low_c, humidity_high, humidity_low, rain_in
                 FROM daily_weather WHERE day_ts >= ?1 ORDER BY day_ts"
            }
            (true, true) => {
                "SELECT day_ts, temp_high_c, temp_low_c, humidity_high, humidity_low, rain_in
                 FROM daily_weather WHERE day_ts >= ?1 ORDER BY day_ts LIMIT ?2 OFFSET ?3"
            }
            (false, true) => {
                "SELECT day_ts, temp_high_c, temp_low_c, humidity_high, humidity_low, rain_in
                 FROM daily_weather ORDER BY day_ts LIMIT ?1 OFFSET ?2"
            }
        };

        let mut stmt = conn.prepare(sql)?;
        let rows = match (since, page) {
            (None, None) => stmt.query_map([], Self::map_row)?,
            (Some(since), None) => stmt.query_map(params![since], Self::map_row)?,
            (Some(since), Some((limit, offset))) => {
                stmt.query_map(params![since, limit, offset], Self::map_row)?
            }
            (None, Some((limit, offset))) => stmt.query_map(params![limit, offset], Self::map_row)?,
        };

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<DailySummary> {
        Ok(DailySummary {
            day_ts: row.get(0)?,
            record: DailySummaryRecord {
                temp_high_c: row.get(1)?,
                temp_low_c: row.get(2)?,
                humidity_high: row.get(3)?,
                humidity_low: row.get(4)?,
                rain_in: row.get(5)?,
            },
        })
    }
}
