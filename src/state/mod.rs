//! Live aggregation state for the station
//!
//! One `WeatherState` exists per process. It holds the latest instantaneous
//! telemetry, the rain accumulators across six time horizons, the calendar
//! keys used for rollover detection, and the daily extremes. All access is
//! serialized by the owning lock in [`crate::app::App`]; nothing in this
//! module touches I/O.

pub mod extremes;
pub mod rain;
pub mod snapshot;

use serde::{Deserialize, Serialize};

use crate::astro;
use crate::calendar::Calendar;
use crate::history::store::DailySummaryRecord;
use crate::poller::BridgeHealth;
use crate::sample::StationReading;
use crate::units::{c_to_f, M_S_TO_MPH};

pub use extremes::DailyExtremes;

// Totals accumulated before this system existed, folded into the lifetime
// figure reported by the snapshot. Captured at migration time.
pub const HISTORICAL_TOTAL_IN: f64 = 62.77;
pub const HISTORICAL_YEARLY_IN: f64 = 62.77;
pub const HISTORICAL_MONTHLY_IN: f64 = 4.27;
pub const HISTORICAL_WEEKLY_IN: f64 = 1.96;

/// One accepted rain delta, retained while inside the 1-hour window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RainDelta {
    pub ts: i64,
    pub inches: f64,
}

/// A daily summary row produced by a day rollover that met the coverage
/// gate, ready to be written to the summary store.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyFlush {
    /// Day-start timestamp keying the row
    pub day_ts: i64,
    pub record: DailySummaryRecord,
}

/// The single mutable aggregate for the station.
///
/// Serialized in full to the snapshot file on every accepted ingest; the
/// `#[serde(default)]` lets older snapshot files restore with new fields
/// taking their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherState {
    // --- instantaneous telemetry ---
    pub battery_mv: f64,
    pub battery_ok: f64,
    pub station_id: i64,
    pub model: String,
    pub firmware: i64,
    pub humidity: f64,
    pub temperature_c: f64,
    pub wind_dir_deg: f64,
    pub wind_avg_m_s: f64,
    pub wind_max_m_s: f64,
    pub light_lux: f64,
    pub uvi: f64,
    pub rain_mm: f64,
    pub supercap_v: f64,
    pub last_time_iso: String,

    // --- rain accounting ---
    /// Last accepted cumulative reading; 0.0 means "no prior sample"
    pub last_rain_mm: f64,
    pub last_update: i64,
    pub rain_daily_in: f64,
    pub rain_monthly_in: f64,
    pub rain_yearly_in: f64,
    pub rain_weekly_in: f64,
    pub rain_hourly_in: f64,
    pub rain_event_in: f64,
    /// Deltas inside the sliding 1-hour window; `rain_hourly_in` is their sum
    pub deltas: Vec<RainDelta>,
    pub last_rain_event_ts: i64,

    // --- calendar keys (change detection only) ---
    pub daily_key: i32,
    pub month_key: i32,
    pub year_key: i32,
    pub week_start_key: i32,

    // --- historical baseline offsets ---
    pub historical_total_in: f64,
    pub historical_yearly_in: f64,
    pub historical_monthly_in: f64,
    pub historical_weekly_in: f64,
    pub historical_seeded: bool,

    // --- daily extremes + coverage ---
    #[serde(flatten)]
    pub extremes: DailyExtremes,
    pub day_first_ts: i64,
    pub day_last_ts: i64,
}

impl Default for WeatherState {
    fn default() -> Self {
        Self {
            battery_mv: 0.0,
            battery_ok: 0.0,
            station_id: 0,
            model: String::new(),
            firmware: 0,
            humidity: 0.0,
            temperature_c: 0.0,
            wind_dir_deg: 0.0,
            wind_avg_m_s: 0.0,
            wind_max_m_s: 0.0,
            light_lux: 0.0,
            uvi: 0.0,
            rain_mm: 0.0,
            supercap_v: 0.0,
            last_time_iso: String::new(),
            last_rain_mm: 0.0,
            last_update: 0,
            rain_daily_in: 0.0,
            rain_monthly_in: 0.0,
            rain_yearly_in: 0.0,
            rain_weekly_in: 0.0,
            rain_hourly_in: 0.0,
            rain_event_in: 0.0,
            deltas: Vec::new(),
            last_rain_event_ts: 0,
            daily_key: 0,
            month_key: 0,
            year_key: 0,
            week_start_key: 0,
            historical_total_in: HISTORICAL_TOTAL_IN,
            historical_yearly_in: HISTORICAL_YEARLY_IN,
            historical_monthly_in: HISTORICAL_MONTHLY_IN,
            historical_weekly_in: HISTORICAL_WEEKLY_IN,
            historical_seeded: true,
            extremes: DailyExtremes::default(),
            day_first_ts: 0,
            day_last_ts: 0,
        }
    }
}

impl WeatherState {
    /// Freshly-initialized state for a process with no usable snapshot file:
    /// today's calendar keys, zeroed accumulators, historical offsets seeded.
    pub fn fresh(now: i64, cal: &Calendar) -> Self {
        let mut st = Self::default();
        st.last_update = now;
        st.daily_key = cal.day_key(now);
        st.month_key = cal.month_key(now);
        st.year_key = cal.year_key(now);
        st.week_start_key = st.daily_key;
        st
    }

    /// Feeds one normalized sample into the aggregate.
    ///
    /// Runs the rollover check first so the sample lands in the already
    /// rolled-over buckets, then applies instantaneous fields, coverage,
    /// rain accounting, and extremes. Returns the daily summary row to
    /// persist when a day rollover passed the coverage gate.
    pub fn ingest(
        &mut self,
        reading: &StationReading,
        now: i64,
        cal: &Calendar,
    ) -> Option<DailyFlush> {
        let flush = self.rollover_if_needed(now, cal);

        self.apply_instantaneous(reading);

        // Coverage of the current local day spans all accepted samples.
        if self.day_first_ts == 0 {
            self.day_first_ts = now;
        }
        self.day_last_ts = now;

        // Keep the hourly window invariant even between rain deltas.
        self.prune_hourly(now);

        if let Some(raw_mm) = reading.rain_mm {
            self.accumulate_rain(raw_mm, now);
        }

        if let Some(t) = reading.temperature_c {
            self.extremes.observe_temperature(t);
        }
        if let Some(h) = reading.humidity {
            self.extremes.observe_humidity(h);
        }
        if let (Some(avg), Some(gust)) = (reading.wind_avg_m_s, reading.wind_max_m_s) {
            self.extremes.observe_wind(avg, gust);
        }

        self.last_update = now;
        flush
    }

    fn apply_instantaneous(&mut self, reading: &StationReading) {
        if let Some(v) = reading.battery_mv {
            self.battery_mv = v;
        }
        if let Some(v) = reading.battery_ok {
            self.battery_ok = v;
        }
        if let Some(v) = reading.id {
            self.station_id = v;
        }
        if let Some(v) = &reading.model {
            self.model = v.clone();
        }
        if let Some(v) = reading.firmware {
            self.firmware = v;
        }
        if let Some(v) = reading.humidity {
            self.humidity = v;
        }
        if let Some(v) = reading.temperature_c {
            self.temperature_c = v;
        }
        if let Some(v) = reading.wind_dir_deg {
            self.wind_dir_deg = v;
        }
        if let Some(v) = reading.wind_avg_m_s {
            self.wind_avg_m_s = v;
        }
        if let Some(v) = reading.wind_max_m_s {
            self.wind_max_m_s = v;
        }
        if let Some(v) = reading.light_lux {
            self.light_lux = v;
        }
        if let Some(v) = reading.uvi {
            self.uvi = v;
        }
        if let Some(v) = reading.rain_mm {
            self.rain_mm = v;
        }
        if let Some(v) = reading.supercap_v {
            self.supercap_v = v;
        }
        if let Some(v) = &reading.time {
            self.last_time_iso = v.clone();
        }
    }

    /// Lifetime rain total: the historical baseline plus whatever the
    /// current year has accumulated beyond the baseline year.
    pub fn lifetime_total_in(&self) -> f64 {
        let mut total = self.historical_total_in;
        if self.rain_yearly_in > self.historical_yearly_in {
            total += self.rain_yearly_in - self.historical_yearly_in;
        }
        total
    }

    /// Builds the current-state snapshot consumed by the API and feeders.
    pub fn build_current_json(
        &self,
        bridge: &BridgeHealth,
        now: i64,
        latitude: f64,
        longitude: f64,
    ) -> serde_json::Value {
        let age_sec = if self.last_update != 0 {
            now - self.last_update
        } else {
            -1
        };
        let stale = self.last_update != 0 && age_sec > 60;

        let daily = &self.extremes;

        serde_json::json!({
            "api_version": env!("CARGO_PKG_VERSION"),
            "battery_mV": self.battery_mv,
            "battery_ok": self.battery_ok,
            "id": self.station_id,
            "model": self.model,
            "firmware": self.firmware,
            "humidity": self.humidity,
            "temperature_F": c_to_f(self.temperature_c),
            "wind_dir_deg": self.wind_dir_deg,
            "wind_avg_m_s": self.wind_avg_m_s,
            "wind_max_m_s": self.wind_max_m_s,
            "light_lux": self.light_lux,
            "uvi": self.uvi,
            "supercap_V": self.supercap_v,
            "time": self.last_time_iso,
            "astro": astro::solar_and_moon(now, latitude, longitude),
            "rain": {
                "hourly_in": self.rain_hourly_in,
                "event_in": self.rain_event_in,
                "daily_in": self.rain_daily_in,
                "weekly_in": self.rain_weekly_in,
                "monthly_in": self.rain_monthly_in,
                "yearly_in": self.rain_yearly_in,
                "total_in": self.lifetime_total_in(),
            },
            "daily": {
                "temp_high_F": daily.have_temp.then(|| c_to_f(daily.temp_high_c)),
                "temp_low_F": daily.have_temp.then(|| c_to_f(daily.temp_low_c)),
                "humidity_high": daily.have_hum.then_some(daily.hum_high),
                "humidity_low": daily.have_hum.then_some(daily.hum_low),
                "wind_mean_mph": daily.have_wind.then(|| daily.wind_mean_m_s * M_S_TO_MPH),
                "wind_gust_max_mph": daily.have_wind.then(|| daily.wind_max_gust_m_s * M_S_TO_MPH),
                "meaningful": daily.meaningful(),
            },
            "bridge": {
                "bridge_reachable": bridge.reachable,
                "stream_healthy": bridge.stream_healthy,
                "last_poll_ts": bridge.last_poll_ts,
                "last_update_ts": self.last_update,
                "age_sec": age_sec,
                "stale": stale,
                "error_code": bridge.error_code,
                "error_message": bridge.error_message,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cal() -> Calendar {
        Calendar::from_offset_hours(0)
    }

    // 2024-07-15 10:00:00 UTC
    const NOW: i64 = 1721037600;

    fn reading(rain_mm: Option<f64>) -> StationReading {
        StationReading {
            temperature_c: Some(21.0),
            humidity: Some(60.0),
            wind_avg_m_s: Some(2.0),
            wind_max_m_s: Some(4.0),
            rain_mm,
            ..StationReading::default()
        }
    }

    #[test]
    fn test_fresh_state_adopts_todays_keys() {
        let st = WeatherState::fresh(NOW, &cal());
        assert_eq!(st.daily_key, 20240715);
        assert_eq!(st.month_key, 202407);
        assert_eq!(st.year_key, 2024);
        assert_eq!(st.week_start_key, 20240715);
        assert!(st.historical_seeded);
        assert_eq!(st.rain_daily_in, 0.0);
    }

    #[test]
    fn test_ingest_updates_instantaneous_and_coverage() {
        let c = cal();
        let mut st = WeatherState::fresh(NOW, &c);
        let flush = st.ingest(&reading(None), NOW, &c);
        assert!(flush.is_none());
        assert_eq!(st.temperature_c, 21.0);
        assert_eq!(st.day_first_ts, NOW);
        assert_eq!(st.day_last_ts, NOW);
        assert_eq!(st.last_update, NOW);
        // No rain field: accounting untouched.
        assert_eq!(st.last_rain_mm, 0.0);
        assert_eq!(st.rain_daily_in, 0.0);
    }

    #[test]
    fn test_ingest_feeds_extremes() {
        let c = cal();
        let mut st = WeatherState::fresh(NOW, &c);
        st.ingest(&reading(None), NOW, &c);
        assert!(st.extremes.have_temp);
        assert_eq!(st.extremes.temp_high_c, 21.0);
        assert!(st.extremes.have_hum);
        assert!(st.extremes.have_wind);
    }

    #[test]
    fn test_lifetime_total_below_baseline() {
        let mut st = WeatherState::default();
        st.rain_yearly_in = 10.0;
        assert!((st.lifetime_total_in() - HISTORICAL_TOTAL_IN).abs() < 1e-9);
    }

    #[test]
    fn test_lifetime_total_above_baseline() {
        let mut st = WeatherState::default();
        st.rain_yearly_in = HISTORICAL_YEARLY_IN + 3.5;
        assert!((st.lifetime_total_in() - (HISTORICAL_TOTAL_IN + 3.5)).abs() < 1e-9);
    }

    #[test]
    fn test_snapshot_daily_nulls_when_no_data() {
        let st = WeatherState::fresh(NOW, &cal());
        let json = st.build_current_json(&BridgeHealth::default(), NOW, 0.0, 0.0);
        assert!(json["daily"]["temp_high_F"].is_null());
        assert!(json["daily"]["humidity_high"].is_null());
        assert!(json["daily"]["wind_mean_mph"].is_null());
        assert_eq!(json["daily"]["meaningful"], false);
    }

    #[test]
    fn test_snapshot_reports_fahrenheit_and_staleness() {
        let c = cal();
        let mut st = WeatherState::fresh(NOW, &c);
        st.ingest(&reading(None), NOW, &c);

        let json = st.build_current_json(&BridgeHealth::default(), NOW + 30, 0.0, 0.0);
        assert!((json["temperature_F"].as_f64().unwrap() - 69.8).abs() < 0.01);
        assert_eq!(json["bridge"]["age_sec"], 30);
        assert_eq!(json["bridge"]["stale"], false);

        let json = st.build_current_json(&BridgeHealth::default(), NOW + 120, 0.0, 0.0);
        assert_eq!(json["bridge"]["stale"], true);
    }

    #[test]
    fn test_snapshot_rain_block_has_all_horizons() {
        let st = WeatherState::fresh(NOW, &cal());
        let json = st.build_current_json(&BridgeHealth::default(), NOW, 0.0, 0.0);
        let rain = &json["rain"];
        for key in [
            "hourly_in",
            "event_in",
            "daily_in",
            "weekly_in",
            "monthly_in",
            "yearly_in",
            "total_in",
        ] {
            assert!(rain[key].is_number(), "missing rain key {key}");
        }
    }

    #[test]
    fn test_state_serialization_roundtrip_keeps_window() {
        let c = cal();
        let mut st = WeatherState::fresh(NOW, &c);
        st.ingest(&reading(Some(10.0)), NOW, &c);
        st.ingest(&reading(Some(12.5)), NOW + 60, &c);
        assert_eq!(st.deltas.len(), 1);

        let json = serde_json::to_string(&st).expect("state serializes");
        let back: WeatherState = serde_json::from_str(&json).expect("state deserializes");
        assert_eq!(back.deltas.len(), 1);
        assert!((back.rain_hourly_in - st.rain_hourly_in).abs() < 1e-12);
        assert_eq!(back.daily_key, st.daily_key);
        assert!(back.extremes.have_temp);
    }

    #[test]
    fn test_state_deserializes_from_partial_json() {
        // Old snapshot files may miss newer fields.
        let back: WeatherState =
            serde_json::from_str(r#"{"rain_daily_in": 1.25, "daily_key": 20240101}"#)
                .expect("partial state restores onto defaults");
        assert_eq!(back.rain_daily_in, 1.25);
        assert_eq!(back.daily_key, 20240101);
        assert!(back.historical_seeded);
        assert_eq!(back.historical_total_in, HISTORICAL_TOTAL_IN);
    }
}
