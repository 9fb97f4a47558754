//! Local-calendar key computation for rollover detection
//!
//! The rollover state machine compares integer calendar keys (YYYYMMDD,
//! YYYYMM, YYYY) computed from a timestamp under a fixed UTC offset. Keys are
//! used purely for change detection, never for arithmetic, so everything in
//! this module is a pure function of `(timestamp, offset)` and can be tested
//! without touching the aggregation state.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone};

/// Fixed time zone policy for calendar boundaries.
///
/// A plain UTC offset in hours, loaded from config. Daylight saving shifts
/// are deliberately not modeled: the station reports from one location and
/// the original deployment ran on a fixed offset year-round.
#[derive(Debug, Clone, Copy)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::from_offset_hours(0)
    }
}

impl Calendar {
    /// Creates a calendar policy from a whole-hour UTC offset.
    ///
    /// Offsets outside the valid range (±23 h) fall back to UTC.
    pub fn from_offset_hours(hours: i32) -> Self {
        let seconds = if (-23..=23).contains(&hours) {
            hours * 3600
        } else {
            0
        };
        // Always valid after the clamp above.
        let offset = FixedOffset::east_opt(seconds).expect("offset within ±23h");
        Self { offset }
    }

    fn local(&self, ts: i64) -> DateTime<FixedOffset> {
        DateTime::from_timestamp(ts, 0)
            .unwrap_or_default()
            .with_timezone(&self.offset)
    }

    /// YYYYMMDD key of the local calendar day containing `ts`.
    pub fn day_key(&self, ts: i64) -> i32 {
        let lt = self.local(ts);
        lt.year() * 10000 + lt.month() as i32 * 100 + lt.day() as i32
    }

    /// YYYYMM key of the local calendar month containing `ts`.
    pub fn month_key(&self, ts: i64) -> i32 {
        let lt = self.local(ts);
        lt.year() * 100 + lt.month() as i32
    }

    /// YYYY key of the local calendar year containing `ts`.
    pub fn year_key(&self, ts: i64) -> i32 {
        self.local(ts).year()
    }

    /// Unix timestamp of local midnight for the day containing `ts`.
    pub fn day_start_ts(&self, ts: i64) -> i64 {
        let date = self.local(ts).date_naive();
        self.midnight_ts(date)
    }

    /// Unix timestamp of local midnight for a YYYYMMDD key.
    ///
    /// Returns `None` for a key that does not encode a real date (including
    /// the zero sentinel for "uninitialized").
    pub fn day_start_of_key(&self, key: i32) -> Option<i64> {
        let year = key / 10000;
        let month = (key / 100 % 100) as u32;
        let day = (key % 100) as u32;
        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        Some(self.midnight_ts(date))
    }

    fn midnight_ts(&self, date: NaiveDate) -> i64 {
        let Some(midnight) = date.and_hms_opt(0, 0, 0) else {
            return 0;
        };
        self.offset
            .from_local_datetime(&midnight)
            .single()
            .map(|dt| dt.timestamp())
            // Unreachable for a fixed offset, which never has ambiguous times.
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2024-07-15 14:30:00 UTC
    const TS: i64 = 1721053800;

    #[test]
    fn test_day_key_utc() {
        let cal = Calendar::from_offset_hours(0);
        assert_eq!(cal.day_key(TS), 20240715);
        assert_eq!(cal.month_key(TS), 202407);
        assert_eq!(cal.year_key(TS), 2024);
    }

    #[test]
    fn test_day_key_respects_offset() {
        // 14:30 UTC is already July 16 at UTC+10.
        let cal = Calendar::from_offset_hours(10);
        assert_eq!(cal.day_key(TS), 20240716);

        // And still July 15 at UTC-6.
        let cal = Calendar::from_offset_hours(-6);
        assert_eq!(cal.day_key(TS), 20240715);
    }

    #[test]
    fn test_day_start_ts_is_local_midnight() {
        let cal = Calendar::from_offset_hours(0);
        let start = cal.day_start_ts(TS);
        // 2024-07-15 00:00:00 UTC
        assert_eq!(start, 1721001600);
        // Midnight of the same day maps to itself.
        assert_eq!(cal.day_start_ts(start), start);
    }

    #[test]
    fn test_day_start_ts_negative_offset() {
        let cal = Calendar::from_offset_hours(-6);
        let start = cal.day_start_ts(TS);
        // Local midnight at UTC-6 is 06:00 UTC.
        assert_eq!(start, 1721001600 + 6 * 3600);
    }

    #[test]
    fn test_day_start_of_key_roundtrip() {
        let cal = Calendar::from_offset_hours(0);
        let key = cal.day_key(TS);
        let start = cal.day_start_of_key(key).expect("valid key");
        assert_eq!(cal.day_key(start), key);
        assert_eq!(start, cal.day_start_ts(TS));
    }

    #[test]
    fn test_day_start_of_key_rejects_invalid() {
        let cal = Calendar::from_offset_hours(0);
        assert_eq!(cal.day_start_of_key(0), None);
        assert_eq!(cal.day_start_of_key(20240000), None);
        assert_eq!(cal.day_start_of_key(20240231), None);
    }

    #[test]
    fn test_year_boundary_changes_all_keys() {
        let cal = Calendar::from_offset_hours(0);
        // 2023-12-31 23:59:30 UTC and 30 seconds later.
        let before = 1704067170;
        let after = before + 60;
        assert_ne!(cal.day_key(before), cal.day_key(after));
        assert_ne!(cal.month_key(before), cal.month_key(after));
        assert_ne!(cal.year_key(before), cal.year_key(after));
    }

    #[test]
    fn test_out_of_range_offset_falls_back_to_utc() {
        let cal = Calendar::from_offset_hours(99);
        assert_eq!(cal.day_key(TS), 20240715);
    }
}
