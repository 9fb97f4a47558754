//! History query modes, parameter clamping, and per-metric projections
//!
//! The query mode is decided by which parameters are *present*, not by their
//! values, and is modeled as a tagged variant built once at the API boundary.
//! Clamping is uniform across modes; an unparseable value takes the default.

use serde::Serialize;

use crate::history::store::DailySummary;
use crate::units::c_to_f;

const DAYS_DEFAULT: u32 = 0; // 0 means "no time filter"
const DAYS_MAX: u32 = 3650;
const LIMIT_DEFAULT: u32 = 100;
const LIMIT_MIN: u32 = 1;
const LIMIT_MAX: u32 = 365;
const OFFSET_DEFAULT: u32 = 0;
const OFFSET_MAX: u32 = 1_000_000;

/// One of the three fixed history query modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryQuery {
    /// No parameters: full table, no filter, no cap
    Simple,
    /// `days` only: time filter, no cap (`days = 0` behaves like `Simple`)
    TimeOnly { days: u32 },
    /// Any `limit`/`offset` present: paging, time filter only when `days > 0`
    Paged { days: u32, limit: u32, offset: u32 },
}

impl HistoryQuery {
    /// Builds the query mode from the raw optional parameter strings.
    ///
    /// Presence decides the mode; values are clamped to
    /// `days ∈ [0, 3650]`, `limit ∈ [1, 365]`, `offset ∈ [0, 1000000]`.
    pub fn from_params(
        days: Option<&str>,
        limit: Option<&str>,
        offset: Option<&str>,
    ) -> Self {
        let has = |p: Option<&str>| p.is_some_and(|v| !v.is_empty());

        if !has(days) && !has(limit) && !has(offset) {
            HistoryQuery::Simple
        } else if has(days) && !has(limit) && !has(offset) {
            HistoryQuery::TimeOnly {
                days: clamped(days, DAYS_DEFAULT, 0, DAYS_MAX),
            }
        } else {
            HistoryQuery::Paged {
                days: clamped(days, DAYS_DEFAULT, 0, DAYS_MAX),
                limit: clamped(limit, LIMIT_DEFAULT, LIMIT_MIN, LIMIT_MAX),
                offset: clamped(offset, OFFSET_DEFAULT, 0, OFFSET_MAX),
            }
        }
    }

    /// The `day_ts >= since` threshold implied by this query, when one
    /// applies.
    pub fn since_ts(&self, now: i64) -> Option<i64> {
        let days = match self {
            HistoryQuery::Simple => 0,
            HistoryQuery::TimeOnly { days } => *days,
            HistoryQuery::Paged { days, .. } => *days,
        };
        (days > 0).then(|| now - i64::from(days) * 86400)
    }

    /// The `LIMIT`/`OFFSET` pair, present only in paged mode.
    pub fn page(&self) -> Option<(u32, u32)> {
        match self {
            HistoryQuery::Paged { limit, offset, .. } => Some((*limit, *offset)),
            _ => None,
        }
    }
}

fn clamped(raw: Option<&str>, default: u32, min: u32, max: u32) -> u32 {
    let Some(raw) = raw else { return default };
    match raw.trim().parse::<i64>() {
        Ok(v) => v.clamp(i64::from(min), i64::from(max)) as u32,
        Err(_) => default,
    }
}

/// One day of temperature history; nulls mean the day had no readings.
#[derive(Debug, Clone, Serialize)]
pub struct TemperatureDay {
    pub day: i64,
    #[serde(rename = "temp_high_F")]
    pub temp_high_f: Option<f64>,
    #[serde(rename = "temp_low_F")]
    pub temp_low_f: Option<f64>,
}

/// One day of humidity history; nulls mean the day had no readings.
#[derive(Debug, Clone, Serialize)]
pub struct HumidityDay {
    pub day: i64,
    pub humidity_high: Option<f64>,
    pub humidity_low: Option<f64>,
}

/// One day of rain history. Days without a rain value are omitted
/// entirely, so this row is never null.
#[derive(Debug, Clone, Serialize)]
pub struct RainDay {
    pub day: i64,
    pub rain_in: f64,
}

/// Projects summary rows to the temperature metric, converting to °F at
/// the edge. A day with a partial pair reports both sides as null.
pub fn project_temperature(rows: &[DailySummary]) -> Vec<TemperatureDay> {
    rows.iter()
        .map(|r| {
            let (high, low) = match (r.record.temp_high_c, r.record.temp_low_c) {
                (Some(hi), Some(lo)) => (Some(c_to_f(hi)), Some(c_to_f(lo))),
                _ => (None, None),
            };
            TemperatureDay {
                day: r.day_ts,
                temp_high_f: high,
                temp_low_f: low,
            }
        })
        .collect()
}

/// Projects summary rows to the humidity metric.
pub fn project_humidity(rows: &[DailySummary]) -> Vec<HumidityDay> {
    rows.iter()
        .map(|r| {
            let (high, low) = match (r.record.humidity_high, r.record.humidity_low) {
                (Some(hi), Some(lo)) => (Some(hi), Some(lo)),
                _ => (None, None),
            };
            HumidityDay {
                day: r.day_ts,
                humidity_high: high,
                humidity_low: low,
            }
        })
        .collect()
}

/// Projects summary rows to the rain metric, skipping NULL-rain days —
/// rain history is sparse by design.
pub fn project_rain(rows: &[DailySummary]) -> Vec<RainDay> {
    rows.iter()
        .filter_map(|r| {
            r.record.rain_in.map(|rain_in| RainDay {
                day: r.day_ts,
                rain_in,
            })
        })
        .collect()
}
