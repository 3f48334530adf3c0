use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::calendar_date::CalendarDate;
use crate::grid::{Mode, Month, build_months, check_grid_range};
use crate::labels::Locale;

/// A calendar query with its target already clamped into
/// `[today, today + max_span_days]` and a grid known to fit the
/// representable date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarRequest {
    pub today: NaiveDate,
    pub target: NaiveDate,
    /// Target as given by the user, before clamping.
    pub requested_target: Option<NaiveDate>,
    pub mode: Mode,
}

/// Serializable payload handed to renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarView {
    pub months: Vec<Month>,
    pub iso_today: String,
    pub iso_target_date: Option<String>,
    pub mode: Mode,
    pub locale: Locale,
}

impl CalendarRequest {
    #[tracing::instrument(level = "debug")]
    pub fn resolve(
        today: NaiveDate,
        requested_target: Option<NaiveDate>,
        mode: Mode,
        max_span_days: u32,
    ) -> anyhow::Result<Self> {
        let mut target = requested_target.unwrap_or(today);

        if target < today {
            debug!(target = %target, today = %today, "target in the past; using today");
            target = today;
        }

        let horizon = today.plus_days(i64::from(max_span_days));
        if target > horizon {
            warn!(
                target = %target,
                horizon = %horizon,
                max_span_days,
                "target beyond allowed span; clamping"
            );
            target = horizon;
        }

        check_grid_range(today, target)?;

        Ok(Self {
            today,
            target,
            requested_target,
            mode,
        })
    }

    pub fn months(&self, locale: Locale) -> Vec<Month> {
        build_months(self.today, self.target, self.mode, locale)
    }

    pub fn view(&self, locale: Locale) -> CalendarView {
        CalendarView {
            months: self.months(locale),
            iso_today: self.today.to_iso(),
            iso_target_date: self.requested_target.map(CalendarDate::to_iso),
            mode: self.mode,
            locale,
        }
    }
}
