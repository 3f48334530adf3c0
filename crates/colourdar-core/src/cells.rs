use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar_date::CalendarDate;
use crate::grid::Month;

/// Alternating background for in-month days, counted in whole weeks from
/// the Monday of today's week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekShade {
    Even,
    Odd,
}

impl WeekShade {
    pub fn for_day(day: NaiveDate, today: NaiveDate) -> Self {
        if day.weeks_since(today.start_of_week()).rem_euclid(2) == 0 {
            Self::Even
        } else {
            Self::Odd
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCell {
    pub date: NaiveDate,
    pub in_month: bool,
    pub is_today: bool,
    pub is_target: bool,
    pub shade: WeekShade,
    pub is_month_start: bool,
    pub is_month_end: bool,
}

impl DayCell {
    /// Day number as displayed in the grid.
    pub fn label(&self) -> u32 {
        self.date.day_of_month()
    }
}

/// Display facts for every day of `month`.
///
/// A day belongs to the month when it carries the month's label, so the
/// shared first and last weeks show the neighbouring month's days as
/// outside. `target` is only highlighted when one was asked for.
pub fn annotate(month: &Month, today: NaiveDate, target: Option<NaiveDate>) -> Vec<DayCell> {
    let anchor = month
        .days
        .iter()
        .copied()
        .find(|day| day.calendar_year() == month.year && day.day_of_month() == 1);

    month
        .days
        .iter()
        .map(|&date| {
            let in_month = anchor.is_some_and(|first| date.same_month_as(first));
            DayCell {
                date,
                in_month,
                is_today: date == today,
                is_target: target == Some(date),
                shade: WeekShade::for_day(date, today),
                is_month_start: date.day_of_month() == 1,
                is_month_end: date.is_last_day_of_month(),
            }
        })
        .collect()
}
