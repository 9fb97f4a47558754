//! Daily extremes tracker
//!
//! Running high/low for temperature and humidity, plus a running mean and
//! max gust for wind, all scoped to the current local day. Each metric is
//! tracked independently: a day can have temperature extremes but no wind
//! data. "No observations" is reported as absent, never as zero.

use serde::{Deserialize, Serialize};

/// Per-day extremes, reset on day rollover.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyExtremes {
    pub have_temp: bool,
    pub temp_high_c: f64,
    pub temp_low_c: f64,

    pub have_hum: bool,
    pub hum_high: f64,
    pub hum_low: f64,

    pub have_wind: bool,
    /// Running mean of the per-sample average wind speed
    pub wind_mean_m_s: f64,
    /// Max of the per-sample gust speed
    pub wind_max_gust_m_s: f64,
    pub wind_sample_count: u64,
}

impl DailyExtremes {
    /// Folds a temperature observation into the day's high/low.
    pub fn observe_temperature(&mut self, c: f64) {
        if !self.have_temp {
            self.temp_high_c = c;
            self.temp_low_c = c;
            self.have_temp = true;
        } else {
            self.temp_high_c = self.temp_high_c.max(c);
            self.temp_low_c = self.temp_low_c.min(c);
        }
    }

    /// Folds a humidity observation into the day's high/low.
    pub fn observe_humidity(&mut self, h: f64) {
        if !self.have_hum {
            self.hum_high = h;
            self.hum_low = h;
            self.have_hum = true;
        } else {
            self.hum_high = self.hum_high.max(h);
            self.hum_low = self.hum_low.min(h);
        }
    }

    /// Folds a wind observation (average + gust) into the day's mean/max.
    pub fn observe_wind(&mut self, avg_m_s: f64, gust_m_s: f64) {
        if !self.have_wind {
            self.have_wind = true;
            self.wind_mean_m_s = avg_m_s;
            self.wind_max_gust_m_s = gust_m_s;
            self.wind_sample_count = 1;
        } else {
            let n = self.wind_sample_count as f64;
            self.wind_mean_m_s = (self.wind_mean_m_s * n + avg_m_s) / (n + 1.0);
            self.wind_sample_count += 1;
            if gust_m_s > self.wind_max_gust_m_s {
                self.wind_max_gust_m_s = gust_m_s;
            }
        }
    }

    /// Clears all three trackers at day rollover.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True when at least one metric has data for the day.
    pub fn meaningful(&self) -> bool {
        self.have_temp || self.have_hum || self.have_wind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_temperature_seeds_high_and_low() {
        let mut ex = DailyExtremes::default();
        ex.observe_temperature(21.5);
        assert!(ex.have_temp);
        assert_eq!(ex.temp_high_c, 21.5);
        assert_eq!(ex.temp_low_c, 21.5);
    }

    #[test]
    fn test_lower_sample_updates_low_only() {
        let mut ex = DailyExtremes::default();
        ex.observe_temperature(21.5);
        ex.observe_temperature(18.0);
        assert_eq!(ex.temp_high_c, 21.5);
        assert_eq!(ex.temp_low_c, 18.0);
    }

    #[test]
    fn test_higher_sample_updates_high_only() {
        let mut ex = DailyExtremes::default();
        ex.observe_temperature(21.5);
        ex.observe_temperature(25.0);
        assert_eq!(ex.temp_high_c, 25.0);
        assert_eq!(ex.temp_low_c, 21.5);
    }

    #[test]
    fn test_humidity_tracked_independently_of_temperature() {
        let mut ex = DailyExtremes::default();
        ex.observe_humidity(60.0);
        assert!(ex.have_hum);
        assert!(!ex.have_temp);
        assert_eq!(ex.hum_high, 60.0);
        assert_eq!(ex.hum_low, 60.0);
    }

    #[test]
    fn test_wind_running_mean_and_gust() {
        let mut ex = DailyExtremes::default();
        ex.observe_wind(2.0, 5.0);
        assert_eq!(ex.wind_mean_m_s, 2.0);
        assert_eq!(ex.wind_max_gust_m_s, 5.0);
        assert_eq!(ex.wind_sample_count, 1);

        ex.observe_wind(4.0, 3.0);
        assert!((ex.wind_mean_m_s - 3.0).abs() < 1e-9);
        // A weaker gust does not lower the max.
        assert_eq!(ex.wind_max_gust_m_s, 5.0);
        assert_eq!(ex.wind_sample_count, 2);

        ex.observe_wind(6.0, 9.0);
        assert!((ex.wind_mean_m_s - 4.0).abs() < 1e-9);
        assert_eq!(ex.wind_max_gust_m_s, 9.0);
        assert_eq!(ex.wind_sample_count, 3);
    }

    #[test]
    fn test_reset_clears_flags_and_values() {
        let mut ex = DailyExtremes::default();
        ex.observe_temperature(20.0);
        ex.observe_humidity(50.0);
        ex.observe_wind(3.0, 7.0);
        assert!(ex.meaningful());

        ex.reset();
        assert!(!ex.have_temp);
        assert!(!ex.have_hum);
        assert!(!ex.have_wind);
        assert_eq!(ex.wind_sample_count, 0);
        assert!(!ex.meaningful());
    }

    #[test]
    fn test_no_data_reports_not_meaningful() {
        assert!(!DailyExtremes::default().meaningful());
    }
}
