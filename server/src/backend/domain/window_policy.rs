//! Calendar windows that gate gift requests and the yearly reset.
//!
//! - Christmas window: Dec 11 00:00:00 through Dec 25 23:59:59, local time.
//! - Yearly reset: opens Dec 26 00:00:00 and stays open until the year ends.
//!
//! All functions are pure; callers pass the current time from a `Clock`.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::backend::domain::errors::{LedgerError, LedgerResult};

const WINDOW_MONTH: u32 = 12;
const WINDOW_FIRST_DAY: u32 = 11;
const WINDOW_LAST_DAY: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChristmasWindow {
    pub year: i32,
    pub starts_at: NaiveDateTime,
    /// Last second inside the window
    pub ends_at: NaiveDateTime,
    /// First instant after the window
    closes_at: NaiveDateTime,
}

fn midnight(year: i32, month: u32, day: u32) -> LedgerResult<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| LedgerError::Validation(format!("Year {} is out of range", year)))
}

impl ChristmasWindow {
    pub fn for_year(year: i32) -> LedgerResult<Self> {
        let starts_at = midnight(year, WINDOW_MONTH, WINDOW_FIRST_DAY)?;
        let closes_at = midnight(year, WINDOW_MONTH, WINDOW_LAST_DAY + 1)?;
        let ends_at = closes_at - chrono::Duration::seconds(1);

        Ok(Self { year, starts_at, ends_at, closes_at })
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.starts_at && at < self.closes_at
    }

    pub fn describe(&self) -> String {
        format!(
            "Christmas gift requests are accepted from {} through {}",
            self.starts_at.format("%b %-d, %Y %H:%M"),
            self.ends_at.format("%b %-d, %Y %H:%M:%S")
        )
    }
}

/// True iff `now` falls inside the Christmas window of its own year
pub fn is_christmas_window(now: NaiveDateTime) -> bool {
    ChristmasWindow::for_year(now.year())
        .map(|window| window.contains(now))
        .unwrap_or(false)
}

/// True once Christmas of the current year has passed
pub fn is_yearly_reset_open(now: NaiveDateTime) -> bool {
    ChristmasWindow::for_year(now.year())
        .map(|window| now >= window.closes_at)
        .unwrap_or(false)
}

/// Calendar year whose reward quota applies at `now`
pub fn reward_year(now: NaiveDateTime) -> i32 {
    now.year()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(month: u32, day: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn test_window_boundaries() {
        assert!(is_christmas_window(at(12, 11, 0, 0, 0)));
        assert!(is_christmas_window(at(12, 25, 23, 59, 59)));
        assert!(!is_christmas_window(at(12, 10, 23, 59, 59)));
        assert!(!is_christmas_window(at(12, 26, 0, 0, 0)));
    }

    #[test]
    fn test_last_second_fraction_still_inside() {
        let late = NaiveDate::from_ymd_opt(2025, 12, 25)
            .unwrap()
            .and_hms_milli_opt(23, 59, 59, 900)
            .unwrap();
        assert!(is_christmas_window(late));
    }

    #[test]
    fn test_window_outside_december() {
        assert!(!is_christmas_window(at(6, 15, 12, 0, 0)));
        assert!(!is_christmas_window(at(1, 1, 0, 0, 0)));
    }

    #[test]
    fn test_window_bounds_for_year() {
        let window = ChristmasWindow::for_year(2030).unwrap();
        assert_eq!(window.starts_at.to_string(), "2030-12-11 00:00:00");
        assert_eq!(window.ends_at.to_string(), "2030-12-25 23:59:59");
    }

    #[test]
    fn test_yearly_reset_opens_after_christmas() {
        assert!(!is_yearly_reset_open(at(12, 25, 23, 59, 59)));
        assert!(is_yearly_reset_open(at(12, 26, 0, 0, 0)));
        assert!(is_yearly_reset_open(at(12, 31, 18, 0, 0)));
        assert!(!is_yearly_reset_open(at(1, 5, 9, 0, 0)));
    }
}
