//! Week and month boundary lookups used by the grid builder.
//!
//! Weeks start on Monday. "End" lookups return the last day of the period,
//! so walking up to an end is inclusive of that day.

use chrono::{Datelike, NaiveDate, TimeDelta};

use crate::labels::Locale;

pub trait CalendarDate: Copy + Ord {
    fn start_of_week(self) -> Self;
    fn end_of_week(self) -> Self;
    fn start_of_month(self) -> Self;
    fn end_of_month(self) -> Self;
    fn day_of_month(self) -> u32;
    fn days_in_month(self) -> u32;
    fn month_number(self) -> u32;
    fn calendar_year(self) -> i32;
    fn month_label(self, locale: Locale) -> &'static str;
    /// Saturates at the representable range instead of wrapping.
    fn plus_days(self, days: i64) -> Self;
    fn checked_plus_days(self, days: i64) -> Option<Self>;
    /// `None` when the week's Monday is not representable.
    fn checked_start_of_week(self) -> Option<Self>;
    /// `None` when the week's Sunday is not representable.
    fn checked_end_of_week(self) -> Option<Self>;
    /// Whole weeks from `origin` to `self`, rounded toward negative infinity.
    fn weeks_since(self, origin: Self) -> i64;
    fn to_iso(self) -> String;

    fn is_last_day_of_month(self) -> bool {
        self.day_of_month() == self.days_in_month()
    }

    fn same_month_as(self, other: Self) -> bool {
        self.calendar_year() == other.calendar_year()
            && self.month_number() == other.month_number()
    }
}

impl CalendarDate for NaiveDate {
    fn start_of_week(self) -> Self {
        self.checked_start_of_week().unwrap_or(NaiveDate::MIN)
    }

    fn end_of_week(self) -> Self {
        self.checked_end_of_week().unwrap_or(NaiveDate::MAX)
    }

    fn start_of_month(self) -> Self {
        NaiveDate::from_ymd_opt(self.year(), self.month(), 1).unwrap_or(self)
    }

    fn end_of_month(self) -> Self {
        let (next_year, next_month) = if self.month() >= 12 {
            (self.year().saturating_add(1), 1)
        } else {
            (self.year(), self.month() + 1)
        };

        NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .and_then(|first| first.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    fn day_of_month(self) -> u32 {
        self.day()
    }

    fn days_in_month(self) -> u32 {
        self.end_of_month().day()
    }

    fn month_number(self) -> u32 {
        self.month()
    }

    fn calendar_year(self) -> i32 {
        self.year()
    }

    fn month_label(self, locale: Locale) -> &'static str {
        locale.month_name(self.month())
    }

    fn plus_days(self, days: i64) -> Self {
        self.checked_plus_days(days).unwrap_or(if days < 0 {
            NaiveDate::MIN
        } else {
            NaiveDate::MAX
        })
    }

    fn checked_plus_days(self, days: i64) -> Option<Self> {
        TimeDelta::try_days(days).and_then(|delta| self.checked_add_signed(delta))
    }

    fn checked_start_of_week(self) -> Option<Self> {
        let offset = self.weekday().num_days_from_monday();
        self.checked_plus_days(-i64::from(offset))
    }

    fn checked_end_of_week(self) -> Option<Self> {
        let offset = self.weekday().num_days_from_monday();
        self.checked_plus_days(6 - i64::from(offset))
    }

    fn weeks_since(self, origin: Self) -> i64 {
        self.signed_duration_since(origin)
            .num_days()
            .div_euclid(7)
    }

    fn to_iso(self) -> String {
        self.format("%Y-%m-%d").to_string()
    }
}
