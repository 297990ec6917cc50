// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! UTC calendar primitives.
//!
//! Every grid in Arcadia is laid out in __UTC calendar days__. The contribution
//! graph that GitHub renders attributes commits to days, so the grid must agree
//! with itself on what a "day" is no matter which timezone the caller happens to
//! live in. All helpers here convert their input to UTC _before_ extracting a
//! calendar day. Never use local time to compute grid positions, or users east
//! or west of Greenwich will see their pattern shifted by one cell.
//!
//! Cell dates are stored as [`NaiveDate`] values that are always interpreted as
//! UTC calendar days.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};

/// Number of weeks a grid always spans at minimum.
pub const MIN_WEEKS: usize = 53;

/// Number of days in a grid column.
pub const DAYS_PER_WEEK: usize = 7;

/// Extract the UTC calendar day of an instant.
pub fn utc_day<Tz: TimeZone>(instant: &DateTime<Tz>) -> NaiveDate {
    instant.with_timezone(&Utc).date_naive()
}

/// Truncate an instant to `00:00:00 UTC` of its UTC calendar day.
pub fn truncate_to_utc_midnight<Tz: TimeZone>(instant: &DateTime<Tz>) -> DateTime<Utc> {
    utc_midnight(utc_day(instant))
}

/// Day of week of an instant in UTC, where Sunday is zero.
pub fn day_of_week_utc<Tz: TimeZone>(instant: &DateTime<Tz>) -> u32 {
    day_of_week(utc_day(instant))
}

/// Most recent Sunday on or before an instant, at `00:00:00 UTC`.
pub fn most_recent_sunday<Tz: TimeZone>(instant: &DateTime<Tz>) -> DateTime<Utc> {
    utc_midnight(sunday_on_or_before(utc_day(instant)))
}

/// Day of week of a UTC calendar day, where Sunday is zero.
pub fn day_of_week(day: NaiveDate) -> u32 {
    day.weekday().num_days_from_sunday()
}

/// Sunday that starts the grid column containing the given day.
pub fn sunday_on_or_before(day: NaiveDate) -> NaiveDate {
    day.week(Weekday::Sun).first_day()
}

/// Midnight UTC at the start of a calendar day.
pub fn utc_midnight(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

/// Signed number of whole days from `start` to `end`.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    end.signed_duration_since(start).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;
    use simple_test_case::test_case;

    fn day(text: &str) -> NaiveDate {
        text.parse().unwrap()
    }

    #[test_case("2024-03-16T05:00:00+09:00", "2024-03-15"; "tokyo morning is previous utc day")]
    #[test_case("2024-03-15T20:00:00-07:00", "2024-03-16"; "pacific evening is next utc day")]
    #[test_case("2024-03-15T00:00:00+00:00", "2024-03-15"; "utc midnight stays put")]
    #[test_case("2024-03-15T23:59:59+00:00", "2024-03-15"; "last second of utc day")]
    #[test]
    fn utc_day_ignores_caller_timezone(instant: &str, expect: &str) {
        let instant: DateTime<FixedOffset> = DateTime::parse_from_rfc3339(instant).unwrap();
        assert_eq!(utc_day(&instant), day(expect));
    }

    #[test]
    fn truncate_drops_time_of_day() {
        let instant = DateTime::parse_from_rfc3339("2024-03-16T05:30:12+09:00").unwrap();
        let result = truncate_to_utc_midnight(&instant);
        assert_eq!(result.to_rfc3339(), "2024-03-15T00:00:00+00:00");
    }

    #[test_case("2024-03-10T12:00:00+00:00", 0; "sunday")]
    #[test_case("2024-03-15T12:00:00+00:00", 5; "friday")]
    #[test_case("2024-03-16T12:00:00+00:00", 6; "saturday")]
    #[test_case("2024-03-17T01:00:00+02:00", 6; "sunday locally but saturday in utc")]
    #[test]
    fn day_of_week_counts_from_sunday(instant: &str, expect: u32) {
        let instant = DateTime::parse_from_rfc3339(instant).unwrap();
        assert_eq!(day_of_week_utc(&instant), expect);
    }

    #[test_case("2024-03-15", "2024-03-10"; "friday rolls back five days")]
    #[test_case("2024-03-10", "2024-03-10"; "sunday is its own start")]
    #[test_case("2024-01-01", "2023-12-31"; "crosses year boundary")]
    #[test_case("2022-01-01", "2021-12-26"; "saturday rolls back six days")]
    #[test]
    fn sunday_on_or_before_starts_column(input: &str, expect: &str) {
        assert_eq!(sunday_on_or_before(day(input)), day(expect));
    }

    #[test]
    fn most_recent_sunday_agrees_with_day_helpers() {
        let instant = DateTime::parse_from_rfc3339("2024-03-11T03:00:00+05:00").unwrap();
        let sunday = most_recent_sunday(&instant);
        assert_eq!(sunday.to_rfc3339(), "2024-03-10T00:00:00+00:00");
        assert_eq!(day_of_week_utc(&sunday), 0);
    }

    #[test]
    fn days_between_is_signed() {
        assert_eq!(days_between(day("2024-01-01"), day("2024-12-31")), 365);
        assert_eq!(days_between(day("2024-12-31"), day("2024-01-01")), -365);
    }
}
