use std::ops::Add;

use chrono::{Days, NaiveDate};

/// Half-open run of dates `[start, end)` advanced by a fixed step.
///
/// Knows nothing about weeks or months; callers pick the bounds. An empty
/// window (`start >= end`) simply produces nothing. The step must move the
/// date forward, a zero step never terminates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow<D, S> {
    pub start: D,
    pub end: D,
    pub step: S,
}

impl<D, S> DateWindow<D, S>
where
    D: Copy + PartialOrd + Add<S, Output = D>,
    S: Copy,
{
    pub fn new(start: D, end: D, step: S) -> Self {
        Self { start, end, step }
    }

    /// Eagerly maps every date in the window through `transform`, which
    /// receives `(current, index, start, end)`.
    pub fn produce<T, F>(&self, mut transform: F) -> Vec<T>
    where
        F: FnMut(D, usize, D, D) -> T,
    {
        let mut out = Vec::new();
        let mut current = self.start;
        let mut index = 0usize;

        while current < self.end {
            out.push(transform(current, index, self.start, self.end));
            index += 1;
            current = current + self.step;
        }

        out
    }
}

/// Every calendar day in `[start, end)`.
pub fn day_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    DateWindow::new(start, end, Days::new(1)).produce(|date, _, _, _| date)
}

#[cfg(test)]
mod tests {
    use chrono::{Days, NaiveDate, TimeDelta};

    use super::{DateWindow, day_range};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn empty_when_start_equals_end() {
        let day = ymd(2024, 1, 1);
        assert!(day_range(day, day).is_empty());
    }

    #[test]
    fn empty_when_start_after_end() {
        assert!(day_range(ymd(2024, 1, 5), ymd(2024, 1, 1)).is_empty());
    }

    #[test]
    fn excludes_the_end_date() {
        let iso = DateWindow::new(ymd(2024, 1, 1), ymd(2024, 1, 4), Days::new(1))
            .produce(|date, _, _, _| date.format("%Y-%m-%d").to_string());
        assert_eq!(iso, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
    }

    #[test]
    fn passes_index_and_bounds_to_transform() {
        let start = ymd(2024, 2, 27);
        let end = ymd(2024, 3, 2);
        let seen = DateWindow::new(start, end, Days::new(1)).produce(|date, idx, s, e| {
            assert_eq!(s, start);
            assert_eq!(e, end);
            (idx, date)
        });

        assert_eq!(seen.len(), 4);
        assert_eq!(seen[2], (2, ymd(2024, 2, 29)));
        assert_eq!(seen[3], (3, ymd(2024, 3, 1)));
    }

    #[test]
    fn multi_day_step_stops_at_first_value_past_end() {
        let weeks = DateWindow::new(ymd(2024, 1, 1), ymd(2024, 1, 29), TimeDelta::days(7))
            .produce(|date, _, _, _| date);
        assert_eq!(
            weeks,
            vec![
                ymd(2024, 1, 1),
                ymd(2024, 1, 8),
                ymd(2024, 1, 15),
                ymd(2024, 1, 22)
            ]
        );

        let uneven = DateWindow::new(ymd(2024, 1, 1), ymd(2024, 1, 10), Days::new(4))
            .produce(|date, _, _, _| date);
        assert_eq!(uneven.len(), 3);
    }

    #[test]
    fn produce_is_restartable() {
        let window = DateWindow::new(ymd(2023, 12, 30), ymd(2024, 1, 2), Days::new(1));
        let first = window.produce(|date, _, _, _| date);
        let second = window.produce(|date, _, _, _| date);
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }
}
