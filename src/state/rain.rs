//! Rain rollover engine
//!
//! Converts the station's monotonic cumulative rain counter into delta-based
//! accumulation across six horizons (event, hourly, daily, weekly, monthly,
//! yearly) and performs the calendar rollovers. The hourly figure is derived
//! from a sliding window of individual deltas; the other horizons are plain
//! accumulators zeroed when their calendar period elapses.

use crate::calendar::Calendar;
use crate::history::store::DailySummaryRecord;
use crate::state::{DailyFlush, RainDelta, WeatherState};
use crate::units::mm_to_in;

/// Gap after which a new shower counts as a new rain event.
const EVENT_GAP_SECS: i64 = 30 * 60;
/// Sliding window backing the hourly figure.
const HOURLY_WINDOW_SECS: i64 = 3600;
/// Minimum observed span within a day before its summary is trusted.
const MIN_COVERAGE_SECS: i64 = 12 * 3600;

/// A raw cumulative reading outside this range is sensor garbage and is
/// rejected for rain purposes entirely.
const RAW_MAX_MM: f64 = 20000.0;
/// Delta bounds: below the floor is jitter, above the ceiling is a counter
/// glitch or reset.
const DELTA_MIN_MM: f64 = 0.0001;
const DELTA_MAX_MM: f64 = 5000.0;

impl WeatherState {
    /// Drops window entries older than one hour and recomputes the hourly
    /// sum. Safe to call on every ingest.
    pub(crate) fn prune_hourly(&mut self, now: i64) {
        self.deltas.retain(|d| now - d.ts < HOURLY_WINDOW_SECS);
        self.rain_hourly_in = self.deltas.iter().map(|d| d.inches).sum();
    }

    /// Folds one raw cumulative reading into the accumulators.
    ///
    /// Must run after [`WeatherState::rollover_if_needed`] so the delta is
    /// attributed to the correct bucket.
    pub(crate) fn accumulate_rain(&mut self, raw_mm: f64, now: i64) {
        if !(0.0..=RAW_MAX_MM).contains(&raw_mm) {
            return;
        }

        // First valid reading since boot or counter reset: seed only.
        if self.last_rain_mm == 0.0 {
            self.last_rain_mm = raw_mm;
            return;
        }

        let delta_mm = raw_mm - self.last_rain_mm;
        if delta_mm > DELTA_MIN_MM && delta_mm < DELTA_MAX_MM {
            let inches = mm_to_in(delta_mm);

            self.rain_daily_in += inches;
            self.rain_monthly_in += inches;
            self.rain_yearly_in += inches;
            self.rain_weekly_in += inches;

            self.deltas.push(RainDelta { ts: now, inches });
            self.prune_hourly(now);

            // A long dry gap starts a new event.
            if self.last_rain_event_ts == 0 || now - self.last_rain_event_ts > EVENT_GAP_SECS {
                self.rain_event_in = 0.0;
            }
            self.rain_event_in += inches;
            self.last_rain_event_ts = now;
        }

        // A negative or absurd delta adopts the new counter baseline.
        self.last_rain_mm = raw_mm;
    }

    /// Runs the four independent calendar rollover checks.
    ///
    /// Uninitialized (zero) keys adopt the current key without firing. The
    /// checks may all fire on the same ingest. Returns the summary row for
    /// the elapsed day when the day rollover passed the coverage gate.
    pub(crate) fn rollover_if_needed(&mut self, now: i64, cal: &Calendar) -> Option<DailyFlush> {
        let d = cal.day_key(now);
        let m = cal.month_key(now);
        let y = cal.year_key(now);

        if self.daily_key == 0 {
            self.daily_key = d;
        }
        if self.month_key == 0 {
            self.month_key = m;
        }
        if self.year_key == 0 {
            self.year_key = y;
        }
        if self.week_start_key == 0 {
            self.week_start_key = d;
        }

        let mut flush = None;

        if d != self.daily_key {
            let elapsed_day_ts = cal.day_start_ts(if self.day_first_ts != 0 {
                self.day_first_ts
            } else {
                now - 86400
            });

            let covered = self.day_first_ts != 0
                && self.day_last_ts != 0
                && self.day_last_ts - self.day_first_ts >= MIN_COVERAGE_SECS;

            if covered {
                flush = Some(DailyFlush {
                    day_ts: elapsed_day_ts,
                    record: DailySummaryRecord {
                        temp_high_c: self.extremes.have_temp.then_some(self.extremes.temp_high_c),
                        temp_low_c: self.extremes.have_temp.then_some(self.extremes.temp_low_c),
                        humidity_high: self.extremes.have_hum.then_some(self.extremes.hum_high),
                        humidity_low: self.extremes.have_hum.then_some(self.extremes.hum_low),
                        rain_in: Some(self.rain_daily_in),
                    },
                });
            }

            self.rain_daily_in = 0.0;
            self.daily_key = d;
            self.day_first_ts = now;
            self.day_last_ts = now;
            self.extremes.reset();
        }

        if m != self.month_key {
            self.rain_monthly_in = 0.0;
            self.month_key = m;
        }

        if y != self.year_key {
            self.rain_yearly_in = 0.0;
            self.year_key = y;
        }

        // Week rollover fires once at least 7 days have elapsed since the
        // recorded week start's local midnight. An unparseable stored key
        // re-adopts today.
        match cal.day_start_of_key(self.week_start_key) {
            Some(week_start) => {
                if cal.day_start_ts(now) - week_start >= 7 * 86400 {
                    self.rain_weekly_in = 0.0;
                    self.week_start_key = d;
                }
            }
            None => {
                self.week_start_key = d;
            }
        }

        flush
    }
}
