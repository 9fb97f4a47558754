//! Solar and lunar decoration for the current-state snapshot
//!
//! Sunrise/sunset (official and civil) plus the moon phase, computed as a
//! pure function of date and configured location. Everything is in UTC; no
//! aggregation state is involved.

use chrono::{DateTime, Datelike, Utc};

/// Zenith for the official sunrise/sunset (sun's upper limb + refraction).
const ZENITH_OFFICIAL: f64 = 90.833;
/// Zenith for civil twilight.
const ZENITH_CIVIL: f64 = 96.0;

/// Mean length of the synodic month, in days.
const SYNODIC_MONTH_DAYS: f64 = 29.530588853;
/// A known new moon: 2000-01-06 18:14 UTC.
const NEW_MOON_EPOCH_TS: i64 = 947182440;

const MOON_SEGMENTS: [&str; 8] = [
    "New Moon",
    "Waxing Crescent",
    "First Quarter",
    "Waxing Gibbous",
    "Full Moon",
    "Waning Gibbous",
    "Last Quarter",
    "Waning Crescent",
];

fn sin_deg(d: f64) -> f64 {
    d.to_radians().sin()
}

fn cos_deg(d: f64) -> f64 {
    d.to_radians().cos()
}

fn norm_degrees(mut d: f64) -> f64 {
    d %= 360.0;
    if d < 0.0 {
        d += 360.0;
    }
    d
}

fn norm_hours(mut h: f64) -> f64 {
    h %= 24.0;
    if h < 0.0 {
        h += 24.0;
    }
    h
}

/// UTC hour of a solar event on the given day, or `None` when the sun
/// never crosses the zenith (polar day/night).
///
/// The classic almanac algorithm: solar mean anomaly from the day number,
/// true longitude, right ascension, then the local hour angle for the
/// requested zenith.
fn solar_event_utc_hours(
    ts: i64,
    latitude: f64,
    longitude: f64,
    zenith: f64,
    sunrise: bool,
) -> Option<f64> {
    let day_of_year = DateTime::<Utc>::from_timestamp(ts, 0)?.ordinal() as f64;

    let lng_hour = longitude / 15.0;
    let t = if sunrise {
        day_of_year + (6.0 - lng_hour) / 24.0
    } else {
        day_of_year + (18.0 - lng_hour) / 24.0
    };

    let mean_anomaly = 0.9856 * t - 3.289;
    let true_longitude = norm_degrees(
        mean_anomaly + 1.916 * sin_deg(mean_anomaly) + 0.020 * sin_deg(2.0 * mean_anomaly)
            + 282.634,
    );

    let mut right_ascension = norm_degrees(
        (0.91764 * true_longitude.to_radians().tan())
            .atan()
            .to_degrees(),
    );
    // Shift into the same quadrant as the true longitude.
    let l_quadrant = (true_longitude / 90.0).floor() * 90.0;
    let ra_quadrant = (right_ascension / 90.0).floor() * 90.0;
    right_ascension = (right_ascension + (l_quadrant - ra_quadrant)) / 15.0;

    let sin_dec = 0.39782 * sin_deg(true_longitude);
    let cos_dec = sin_dec.asin().cos();

    let cos_h = (cos_deg(zenith) - sin_dec * sin_deg(latitude)) / (cos_dec * cos_deg(latitude));
    if !(-1.0..=1.0).contains(&cos_h) {
        return None;
    }

    let hour_angle = if sunrise {
        (360.0 - cos_h.acos().to_degrees()) / 15.0
    } else {
        cos_h.acos().to_degrees() / 15.0
    };

    let local_mean_time = hour_angle + right_ascension - 0.06571 * t - 6.622;
    Some(norm_hours(local_mean_time - lng_hour))
}

fn utc_midnight_ts(ts: i64) -> i64 {
    ts - ts.rem_euclid(86400)
}

fn event_ts(ts: i64, latitude: f64, longitude: f64, zenith: f64, sunrise: bool) -> Option<i64> {
    let hours = solar_event_utc_hours(ts, latitude, longitude, zenith, sunrise)?;
    Some(utc_midnight_ts(ts) + (hours * 3600.0) as i64)
}

/// Moon age in days since the last new moon.
fn moon_age_days(ts: i64) -> f64 {
    let days = (ts - NEW_MOON_EPOCH_TS) as f64 / 86400.0;
    days.rem_euclid(SYNODIC_MONTH_DAYS)
}

/// Pushes a set that wrapped past UTC midnight onto the following day, so
/// the pair always reads rise-then-set for the station's local day.
fn order_pair(rise: Option<i64>, set: Option<i64>) -> (Option<i64>, Option<i64>) {
    match (rise, set) {
        (Some(r), Some(s)) if s < r => (Some(r), Some(s + 86400)),
        other => other,
    }
}

/// Builds the astro block decorating the current-state snapshot.
pub fn solar_and_moon(now: i64, latitude: f64, longitude: f64) -> serde_json::Value {
    let (sunrise_ts, sunset_ts) = order_pair(
        event_ts(now, latitude, longitude, ZENITH_OFFICIAL, true),
        event_ts(now, latitude, longitude, ZENITH_OFFICIAL, false),
    );
    let (civil_sunrise_ts, civil_sunset_ts) = order_pair(
        event_ts(now, latitude, longitude, ZENITH_CIVIL, true),
        event_ts(now, latitude, longitude, ZENITH_CIVIL, false),
    );

    let day_len = match (sunrise_ts, sunset_ts) {
        (Some(rise), Some(set)) if set > rise => set - rise,
        _ => 0,
    };
    let visible_len = match (civil_sunrise_ts, civil_sunset_ts) {
        (Some(rise), Some(set)) if set > rise => set - rise,
        _ => 0,
    };

    let age = moon_age_days(now);
    let phase = age / SYNODIC_MONTH_DAYS;
    let segment = MOON_SEGMENTS[((phase * 8.0 + 0.5).floor() as usize) % 8];
    let illumination = (1.0 - (2.0 * std::f64::consts::PI * phase).cos()) / 2.0;

    serde_json::json!({
        "gmt_offset": 0,
        "time_zone": "UTC",
        "midnight_ts": utc_midnight_ts(now),
        "sun": {
            "sunrise_ts": sunrise_ts,
            "sunset_ts": sunset_ts,
            "civil_sunrise_ts": civil_sunrise_ts,
            "civil_sunset_ts": civil_sunset_ts,
            "length_of_day_sec": day_len,
            "length_of_visible_sec": visible_len,
        },
        "moon": {
            "age_days": age,
            "phase": phase,
            "segment": segment,
            "illumination": illumination,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-03-20 12:00:00 UTC, the March equinox.
    const EQUINOX_NOON: i64 = 1710936000;

    #[test]
    fn test_equator_equinox_sunrise_near_six() {
        let hours = solar_event_utc_hours(EQUINOX_NOON, 0.0, 0.0, ZENITH_OFFICIAL, true)
            .expect("sun rises at the equator");
        // Within a quarter hour of 06:00 UTC.
        assert!((hours - 6.0).abs() < 0.25, "sunrise hour was {hours}");
    }

    #[test]
    fn test_equator_equinox_day_length_near_twelve_hours() {
        let block = solar_and_moon(EQUINOX_NOON, 0.0, 0.0);
        let len = block["sun"]["length_of_day_sec"].as_i64().unwrap();
        assert!(
            (len - 12 * 3600).abs() < 30 * 60,
            "day length was {len} seconds"
        );
    }

    #[test]
    fn test_polar_night_has_no_sunrise() {
        // Late December well above the arctic circle.
        let dec_21 = 1703160000; // 2023-12-21 12:00 UTC
        assert!(solar_event_utc_hours(dec_21, 80.0, 0.0, ZENITH_OFFICIAL, true).is_none());

        let block = solar_and_moon(dec_21, 80.0, 0.0);
        assert!(block["sun"]["sunrise_ts"].is_null());
        assert_eq!(block["sun"]["length_of_day_sec"], 0);
    }

    #[test]
    fn test_sunset_follows_sunrise_mid_latitude() {
        let block = solar_and_moon(EQUINOX_NOON, 45.0, -93.0);
        let rise = block["sun"]["sunrise_ts"].as_i64().unwrap();
        let set = block["sun"]["sunset_ts"].as_i64().unwrap();
        assert!(set > rise);
        // Civil twilight brackets the official day.
        let civil_rise = block["sun"]["civil_sunrise_ts"].as_i64().unwrap();
        let civil_set = block["sun"]["civil_sunset_ts"].as_i64().unwrap();
        assert!(civil_rise < rise);
        assert!(civil_set > set);
    }

    #[test]
    fn test_known_full_moon() {
        // 2024-01-25 was a full moon.
        let ts = 1706184000; // 2024-01-25 12:00 UTC
        let block = solar_and_moon(ts, 0.0, 0.0);
        assert_eq!(block["moon"]["segment"], "Full Moon");
        assert!(block["moon"]["illumination"].as_f64().unwrap() > 0.97);
    }

    #[test]
    fn test_known_new_moon() {
        // 2024-01-11 was a new moon.
        let ts = 1704974400; // 2024-01-11 12:00 UTC
        let block = solar_and_moon(ts, 0.0, 0.0);
        assert_eq!(block["moon"]["segment"], "New Moon");
        assert!(block["moon"]["illumination"].as_f64().unwrap() < 0.03);
    }

    #[test]
    fn test_moon_age_in_range() {
        for ts in [0, EQUINOX_NOON, 1706184000] {
            let age = moon_age_days(ts);
            assert!((0.0..SYNODIC_MONTH_DAYS).contains(&age));
        }
    }
}
