//! Week numbering for report dates.

use chrono::{Datelike, Duration, NaiveDate};

use crate::models::config::WeekNumbering;

/// Week-of-year for `date` under the given numbering scheme.
pub fn week_of_year(date: NaiveDate, numbering: WeekNumbering) -> u32 {
    match numbering {
        WeekNumbering::Iso => date.iso_week().week(),
        WeekNumbering::Sunday => sunday_week(date),
    }
}

/// Sunday-start weeks where week 1 is the week containing January 1st.
/// The last days of December can therefore belong to week 1 of the next year.
fn sunday_week(date: NaiveDate) -> u32 {
    let week_start = start_of_sunday_week(date);

    if let Some(next_jan1) = NaiveDate::from_ymd_opt(date.year() + 1, 1, 1) {
        if week_start >= start_of_sunday_week(next_jan1) {
            return 1;
        }
    }

    let first_week = NaiveDate::from_ymd_opt(date.year(), 1, 1)
        .map(start_of_sunday_week)
        .unwrap_or(week_start);
    ((week_start - first_week).num_days() / 7 + 1) as u32
}

fn start_of_sunday_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_iso_weeks() {
        assert_eq!(week_of_year(ymd(2024, 1, 1), WeekNumbering::Iso), 1);
        assert_eq!(week_of_year(ymd(2024, 2, 5), WeekNumbering::Iso), 6);
        assert_eq!(week_of_year(ymd(2023, 12, 31), WeekNumbering::Iso), 52);
        assert_eq!(week_of_year(ymd(2020, 12, 31), WeekNumbering::Iso), 53);
    }

    #[test]
    fn test_sunday_weeks() {
        assert_eq!(week_of_year(ymd(2024, 1, 1), WeekNumbering::Sunday), 1);
        assert_eq!(week_of_year(ymd(2024, 2, 5), WeekNumbering::Sunday), 6);
        assert_eq!(week_of_year(ymd(2024, 2, 4), WeekNumbering::Sunday), 6);
        assert_eq!(week_of_year(ymd(2024, 2, 3), WeekNumbering::Sunday), 5);
    }

    #[test]
    fn test_sunday_weeks_roll_into_next_year() {
        // 2024-01-01 is a Monday, so its week starts on Sunday 2023-12-31.
        assert_eq!(week_of_year(ymd(2023, 12, 31), WeekNumbering::Sunday), 1);
        assert_eq!(week_of_year(ymd(2023, 12, 30), WeekNumbering::Sunday), 52);
    }
}
