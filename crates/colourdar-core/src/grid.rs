use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::calendar_date::CalendarDate;
use crate::labels::Locale;
use crate::window::day_range;

/// How the range between today and the target is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Today's month and the target's month, nothing in between.
    #[default]
    Compact,
    /// Every month from today's through the target's.
    Full,
}

impl Mode {
    pub fn as_key(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Full => "full",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "full" => Ok(Self::Full),
            other => Err(anyhow!("unknown mode: {other} (expected compact or full)")),
        }
    }
}

/// One month block: complete Monday-to-Sunday rows, including the days of
/// neighbouring months that share its first and last week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Month {
    pub year: i32,
    pub name: String,
    pub days: Vec<NaiveDate>,
    pub is_overflow_month: bool,
}

impl Month {
    fn snapshot(anchor: NaiveDate, locale: Locale) -> Self {
        let start = anchor.start_of_month().start_of_week();
        let last = anchor.end_of_month().end_of_week();

        Self {
            year: anchor.calendar_year(),
            name: anchor.month_label(locale).to_string(),
            days: day_range(start, last.plus_days(1)),
            is_overflow_month: false,
        }
    }
}

/// Month being accumulated during the full-mode walk.
#[derive(Debug)]
struct MonthDraft {
    year: i32,
    name: &'static str,
    days: Vec<NaiveDate>,
    is_overflow_month: bool,
}

impl MonthDraft {
    /// Opens a month at the first walked `day`, back-filling the week row
    /// from its Monday.
    fn open(day: NaiveDate, target: NaiveDate, locale: Locale) -> Self {
        let mut days = day_range(day.start_of_week(), day);
        days.reserve(42);

        Self {
            year: day.calendar_year(),
            name: day.month_label(locale),
            days,
            is_overflow_month: day > target,
        }
    }

    fn push(&mut self, day: NaiveDate) {
        self.days.push(day);
        if day.is_last_day_of_month() {
            self.days
                .extend(day_range(day.plus_days(1), day.end_of_week().plus_days(1)));
        }
    }

    /// Pads the trailing row out to the Sunday closing the last recorded
    /// day's month.
    fn close_last_row(&mut self) {
        let Some(&last) = self.days.last() else {
            return;
        };
        let boundary = last.end_of_month().end_of_week();
        if last < boundary {
            self.days
                .extend(day_range(last.plus_days(1), boundary.plus_days(1)));
        }
    }

    fn finish(self) -> Month {
        Month {
            year: self.year,
            name: self.name.to_string(),
            days: self.days,
            is_overflow_month: self.is_overflow_month,
        }
    }
}

/// Builds the month blocks shown for `today` through `target`.
///
/// `target` is expected to be on or after `today`; an earlier target is
/// clamped to `today`.
#[tracing::instrument(level = "debug", skip(locale))]
pub fn build_months(today: NaiveDate, target: NaiveDate, mode: Mode, locale: Locale) -> Vec<Month> {
    let target = if target < today {
        warn!(
            today = %today,
            target = %target,
            "target before today; clamping to today"
        );
        today
    } else {
        target
    };

    if let Err(err) = check_grid_range(today, target) {
        warn!(error = %err, "calendar range not representable; building no months");
        return Vec::new();
    }

    let months = match mode {
        Mode::Compact => compact_months(today, target, locale),
        Mode::Full => full_months(today, target, locale),
    };

    let before = months.len();
    let months: Vec<Month> = months
        .into_iter()
        .filter(|month| !month.is_overflow_month)
        .collect();

    debug!(
        mode = %mode,
        months = months.len(),
        overflow_dropped = before - months.len(),
        "built calendar months"
    );
    months
}

/// Fails, naming the crossed bound, when some day a grid for `today`
/// through `target` can touch lies outside the representable dates.
pub(crate) fn check_grid_range(today: NaiveDate, target: NaiveDate) -> anyhow::Result<()> {
    today
        .start_of_month()
        .checked_start_of_week()
        .ok_or_else(|| anyhow!("calendar for {today} would start before {}", NaiveDate::MIN))?;

    // Full mode may pad through the month holding target's Sunday.
    target
        .checked_end_of_week()
        .and_then(|sunday| sunday.end_of_month().checked_end_of_week())
        .and_then(|sunday| sunday.checked_plus_days(1))
        .ok_or_else(|| anyhow!("calendar for {target} would end after {}", NaiveDate::MAX))?;

    Ok(())
}

fn compact_months(today: NaiveDate, target: NaiveDate, locale: Locale) -> Vec<Month> {
    let first = Month::snapshot(today, locale);
    let last = Month::snapshot(target, locale);

    if first.name == last.name && first.year == last.year {
        vec![first]
    } else {
        vec![first, last]
    }
}

fn full_months(today: NaiveDate, target: NaiveDate, locale: Locale) -> Vec<Month> {
    let walk = day_range(today.start_of_month(), target.end_of_week().plus_days(1));
    trace!(days = walk.len(), "walking full range");

    let mut drafts = walk.into_iter().fold(
        BTreeMap::<(i32, u32), MonthDraft>::new(),
        |mut acc, day| {
            acc.entry((day.calendar_year(), day.month_number()))
                .or_insert_with(|| {
                    trace!(day = %day, "opening month");
                    MonthDraft::open(day, target, locale)
                })
                .push(day);
            acc
        },
    );

    if let Some(mut last) = drafts.last_entry() {
        last.get_mut().close_last_row();
    }

    drafts.into_values().map(MonthDraft::finish).collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Days, NaiveDate, Weekday};

    use super::{Mode, Month, build_months, check_grid_range};
    use crate::labels::Locale;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn assert_well_formed(month: &Month) {
        assert!(!month.days.is_empty(), "{} has no days", month.name);
        assert_eq!(month.days.len() % 7, 0, "{} {} rows incomplete", month.name, month.year);
        assert_eq!(month.days[0].weekday(), Weekday::Mon);
        for pair in month.days.windows(2) {
            assert_eq!(pair[0].succ_opt(), Some(pair[1]), "gap in {}", month.name);
        }
        assert!(!month.is_overflow_month);
    }

    #[test]
    fn compact_same_month_yields_one_grid() {
        let today = ymd(2024, 3, 15);
        let months = build_months(today, today, Mode::Compact, Locale::En);

        assert_eq!(months.len(), 1);
        let march = &months[0];
        assert_eq!(march.name, "March");
        assert_eq!(march.year, 2024);
        assert_eq!(march.days.first(), Some(&ymd(2024, 2, 26)));
        assert_eq!(march.days.last(), Some(&ymd(2024, 3, 31)));
        assert_well_formed(march);
    }

    #[test]
    fn compact_skips_months_in_between() {
        let months = build_months(ymd(2024, 1, 10), ymd(2024, 5, 2), Mode::Compact, Locale::Fr);

        assert_eq!(months.len(), 2);
        assert_eq!(months[0].name, "janvier");
        assert_eq!(months[1].name, "mai");
        months.iter().for_each(assert_well_formed);
    }

    #[test]
    fn compact_same_month_different_year_yields_two() {
        let months = build_months(ymd(2024, 7, 1), ymd(2025, 7, 1), Mode::Compact, Locale::En);
        assert_eq!(months.len(), 2);
        assert_eq!((months[0].year, months[1].year), (2024, 2025));
    }

    #[test]
    fn full_single_month() {
        let today = ymd(2024, 6, 10);
        let months = build_months(today, today, Mode::Full, Locale::En);

        assert_eq!(months.len(), 1);
        assert_eq!(months[0].name, "June");
        assert_eq!(months[0].days.first(), Some(&ymd(2024, 5, 27)));
        assert_eq!(months[0].days.last(), Some(&ymd(2024, 6, 30)));
        assert_well_formed(&months[0]);
    }

    #[test]
    fn full_month_end_forward_fills_shared_week() {
        let months = build_months(ymd(2024, 1, 31), ymd(2024, 2, 2), Mode::Full, Locale::En);

        assert_eq!(months.len(), 2);
        let (jan, feb) = (&months[0], &months[1]);
        assert_eq!(jan.name, "January");
        assert_eq!(jan.days.first(), Some(&ymd(2024, 1, 1)));
        assert_eq!(jan.days.last(), Some(&ymd(2024, 2, 4)));
        assert_eq!(feb.name, "February");
        assert_eq!(feb.days.first(), Some(&ymd(2024, 1, 29)));
        assert_eq!(feb.days.last(), Some(&ymd(2024, 3, 3)));
        months.iter().for_each(assert_well_formed);
    }

    #[test]
    fn full_drops_month_only_reached_to_finish_the_week() {
        // 2024-01-31 is a Wednesday; its week runs into February.
        let months = build_months(ymd(2024, 1, 15), ymd(2024, 1, 31), Mode::Full, Locale::En);

        assert_eq!(months.len(), 1);
        assert_eq!(months[0].name, "January");
        assert_eq!(months[0].days.last(), Some(&ymd(2024, 2, 4)));
    }

    #[test]
    fn full_month_ending_on_sunday_is_not_padded_into_next_month() {
        // 2021-01-31 is a Sunday.
        let months = build_months(ymd(2021, 1, 4), ymd(2021, 1, 28), Mode::Full, Locale::En);

        assert_eq!(months.len(), 1);
        assert_eq!(months[0].days.last(), Some(&ymd(2021, 1, 31)));
        assert_well_formed(&months[0]);
    }

    #[test]
    fn full_spans_year_boundary_in_order() {
        let months = build_months(ymd(2024, 11, 20), ymd(2025, 2, 14), Mode::Full, Locale::Fr);

        let labels: Vec<(i32, &str)> = months.iter().map(|m| (m.year, m.name.as_str())).collect();
        assert_eq!(
            labels,
            vec![
                (2024, "novembre"),
                (2024, "décembre"),
                (2025, "janvier"),
                (2025, "février")
            ]
        );
        months.iter().for_each(assert_well_formed);
    }

    #[test]
    fn target_before_today_is_clamped() {
        let today = ymd(2024, 6, 10);
        let clamped = build_months(today, ymd(2023, 1, 1), Mode::Compact, Locale::En);
        assert_eq!(clamped, build_months(today, today, Mode::Compact, Locale::En));
    }

    #[test]
    fn mode_round_trips_through_str() {
        assert_eq!("FULL".parse::<Mode>().expect("parse mode"), Mode::Full);
        assert_eq!(Mode::Compact.to_string(), "compact");
        assert!("weekly".parse::<Mode>().is_err());
    }

    #[test]
    fn month_serializes_days_as_iso_strings() {
        let month = &build_months(ymd(2024, 6, 10), ymd(2024, 6, 10), Mode::Compact, Locale::En)[0];
        let json = serde_json::to_value(month).expect("serialize month");

        assert_eq!(json["name"], "June");
        assert_eq!(json["isOverflowMonth"], false);
        assert_eq!(json["days"][0], "2024-05-27");
        assert_eq!(json["days"].as_array().map(Vec::len), Some(35));
    }

    #[test]
    fn grids_past_the_date_range_are_not_built() {
        let near_max = NaiveDate::MAX.checked_sub_days(Days::new(2)).expect("representable");
        for mode in [Mode::Compact, Mode::Full] {
            assert!(build_months(NaiveDate::MIN, NaiveDate::MIN, mode, Locale::Fr).is_empty());
            assert!(build_months(near_max, NaiveDate::MAX, mode, Locale::Fr).is_empty());
        }
    }

    #[test]
    fn range_check_names_the_crossed_bound() {
        let err = check_grid_range(NaiveDate::MIN, NaiveDate::MIN).expect_err("before MIN");
        assert!(err.to_string().contains(&NaiveDate::MIN.to_string()));

        let err = check_grid_range(ymd(2024, 6, 10), NaiveDate::MAX).expect_err("after MAX");
        assert!(err.to_string().contains(&NaiveDate::MAX.to_string()));

        assert!(check_grid_range(ymd(2024, 6, 10), ymd(2030, 12, 31)).is_ok());
    }
}
