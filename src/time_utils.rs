// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting and streak day math.

use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Calendar day of `now` in the app's fixed timezone offset.
///
/// Streak day boundaries are defined in one fixed offset for all users so that
/// a device timezone change cannot replay or skip a day.
pub fn local_day(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}

/// Signed number of calendar days from `from` to `to`.
///
/// Positive when `to` is later; 1 means "the very next day".
pub fn day_gap(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_local_day_crosses_midnight_with_offset() {
        // 2024-01-15 23:30 UTC is already Jan 16 at +09:00
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 23, 30, 0).unwrap();
        let kst = FixedOffset::east_opt(9 * 3600).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();

        assert_eq!(
            local_day(now, kst),
            NaiveDate::from_ymd_opt(2024, 1, 16).unwrap()
        );
        assert_eq!(
            local_day(now, utc),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_day_gap_signed() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        assert_eq!(day_gap(d(10), d(10)), 0);
        assert_eq!(day_gap(d(10), d(11)), 1);
        assert_eq!(day_gap(d(10), d(14)), 4);
        assert_eq!(day_gap(d(10), d(9)), -1);
    }

    #[test]
    fn test_day_gap_across_month_boundary() {
        let from = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(day_gap(from, to), 1);
    }
}
