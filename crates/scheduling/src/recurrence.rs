//! Occurrence expansion for recurring schedules.
//!
//! Pure calendar math, no IO and no storage. Walking is anchored at the
//! schedule's period start and advances one interval at a time, so cost is
//! O(occurrences up to the window end) and never O(days); multi-year
//! horizons with monthly intervals stay cheap.
//!
//! Callers must guarantee a non-zero interval; the registry rejects zero
//! intervals at creation, so everything reachable from a stored schedule is
//! safe.

use chrono::{Days, Months, NaiveDate};

use medtrack_core::DoseQuantity;

use crate::schedule::{DoseInterval, Schedule};

/// Advance a date by one interval.
///
/// Calendar addition: years first, then months, then days. Month steps
/// normalize to the last valid day (Jan 31 + 1 month = Feb 28/29).
/// Returns `None` when the result leaves chrono's representable range.
pub fn advance(date: NaiveDate, interval: DoseInterval) -> Option<NaiveDate> {
    let year_months = interval.years.checked_mul(12)?;
    let date = date.checked_add_months(Months::new(year_months))?;
    let date = date.checked_add_months(Months::new(interval.months))?;
    date.checked_add_days(Days::new(u64::from(interval.days)))
}

/// Iterator over a schedule's occurrence dates within a query window.
///
/// Yields dates in the intersection of the schedule's period and
/// `[window_start, window_end]` (all bounds inclusive), in ascending order.
#[derive(Debug)]
pub struct Occurrences {
    interval: DoseInterval,
    cursor: Option<NaiveDate>,
    lower: NaiveDate,
    upper: Option<NaiveDate>,
}

impl Iterator for Occurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let upper = self.upper?;
        loop {
            let date = self.cursor?;
            if date > upper {
                self.cursor = None;
                return None;
            }
            self.cursor = advance(date, self.interval);
            if date >= self.lower {
                return Some(date);
            }
        }
    }
}

/// Occurrence dates of `schedule` within `[window_start, window_end]`.
///
/// An inverted window, or a bounded period that misses the window entirely,
/// yields nothing. `window_start` equal to the schedule's start date is
/// included.
pub fn occurrences(schedule: &Schedule, window_start: NaiveDate, window_end: NaiveDate) -> Occurrences {
    let period = schedule.period();

    let lower = period.start().max(window_start);
    let upper = match period.end() {
        Some(end) => end.min(window_end),
        None => window_end,
    };

    Occurrences {
        interval: schedule.interval(),
        cursor: Some(period.start()),
        lower,
        upper: (window_end >= window_start && upper >= lower).then_some(upper),
    }
}

/// Number of occurrences of `schedule` within `[window_start, window_end]`.
pub fn occurrence_count(schedule: &Schedule, window_start: NaiveDate, window_end: NaiveDate) -> u64 {
    occurrences(schedule, window_start, window_end).count() as u64
}

/// Whether `date` is produced by the schedule's recurrence.
///
/// Used by the intake ledger to reject completions for dates the schedule
/// never reaches.
pub fn is_occurrence(schedule: &Schedule, date: NaiveDate) -> bool {
    if !schedule.period().contains(date) {
        return false;
    }

    let mut cursor = schedule.period().start();
    while cursor < date {
        match advance(cursor, schedule.interval()) {
            Some(next) => cursor = next,
            None => return false,
        }
    }
    cursor == date
}

/// Total doses the schedule requires within `[window_start, window_end]`:
/// occurrence count times the per-occurrence dose.
pub fn required_doses(
    schedule: &Schedule,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> DoseQuantity {
    schedule
        .dose()
        .saturating_mul_count(occurrence_count(schedule, window_start, window_end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use proptest::prelude::*;

    use medtrack_core::{AggregateId, UserId};
    use medtrack_medications::MedicationId;

    use crate::schedule::{NewSchedule, ScheduleId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn schedule(
        interval: DoseInterval,
        start: NaiveDate,
        end: Option<NaiveDate>,
        dose: DoseQuantity,
    ) -> Schedule {
        Schedule::try_new(
            ScheduleId::new(AggregateId::new()),
            UserId::new(),
            NewSchedule {
                medication_id: MedicationId::new(AggregateId::new()),
                interval,
                start,
                end,
                time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                dose,
                description: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn monthly_schedule_example() {
        // Anchored 2025-01-01, monthly, dose 2: Jan 1, Feb 1, Mar 1 → 3 × 2 = 6.
        let s = schedule(
            DoseInterval::months(1),
            date(2025, 1, 1),
            None,
            DoseQuantity::from_whole(2),
        );

        let dates: Vec<NaiveDate> = occurrences(&s, date(2025, 1, 1), date(2025, 3, 1)).collect();
        assert_eq!(
            dates,
            vec![date(2025, 1, 1), date(2025, 2, 1), date(2025, 3, 1)]
        );
        assert_eq!(
            required_doses(&s, date(2025, 1, 1), date(2025, 3, 1)),
            DoseQuantity::from_whole(6)
        );
    }

    #[test]
    fn month_end_normalizes_to_last_valid_day() {
        assert_eq!(
            advance(date(2025, 1, 31), DoseInterval::months(1)),
            Some(date(2025, 2, 28))
        );
        assert_eq!(
            advance(date(2024, 1, 31), DoseInterval::months(1)),
            Some(date(2024, 2, 29))
        );
        // Years step before months, then days.
        assert_eq!(
            advance(date(2024, 2, 29), DoseInterval::new(1, 0, 1)),
            Some(date(2025, 3, 1))
        );
    }

    #[test]
    fn inverted_window_counts_zero() {
        let s = schedule(
            DoseInterval::days(1),
            date(2025, 1, 1),
            None,
            DoseQuantity::from_whole(1),
        );
        assert_eq!(occurrence_count(&s, date(2025, 2, 1), date(2025, 1, 1)), 0);
    }

    #[test]
    fn window_before_start_or_after_end_counts_zero() {
        let s = schedule(
            DoseInterval::days(1),
            date(2025, 6, 1),
            Some(date(2025, 6, 30)),
            DoseQuantity::from_whole(1),
        );
        assert_eq!(occurrence_count(&s, date(2025, 1, 1), date(2025, 5, 31)), 0);
        assert_eq!(occurrence_count(&s, date(2025, 7, 1), date(2025, 12, 31)), 0);
    }

    #[test]
    fn window_start_on_schedule_start_is_included() {
        let s = schedule(
            DoseInterval::days(7),
            date(2025, 3, 10),
            None,
            DoseQuantity::from_whole(1),
        );
        let dates: Vec<NaiveDate> = occurrences(&s, date(2025, 3, 10), date(2025, 3, 24)).collect();
        assert_eq!(
            dates,
            vec![date(2025, 3, 10), date(2025, 3, 17), date(2025, 3, 24)]
        );
    }

    #[test]
    fn bounded_end_caps_the_window() {
        let s = schedule(
            DoseInterval::days(1),
            date(2025, 1, 1),
            Some(date(2025, 1, 3)),
            DoseQuantity::from_whole(1),
        );
        assert_eq!(occurrence_count(&s, date(2025, 1, 1), date(2025, 12, 31)), 3);
    }

    #[test]
    fn is_occurrence_matches_enumeration() {
        let s = schedule(
            DoseInterval::months(1),
            date(2025, 1, 31),
            None,
            DoseQuantity::from_whole(1),
        );
        // Iterated month steps: Jan 31 → Feb 28 → Mar 28 → ...
        assert!(is_occurrence(&s, date(2025, 1, 31)));
        assert!(is_occurrence(&s, date(2025, 2, 28)));
        assert!(is_occurrence(&s, date(2025, 3, 28)));
        assert!(!is_occurrence(&s, date(2025, 3, 31)));
        assert!(!is_occurrence(&s, date(2024, 12, 31)));
    }

    proptest! {
        /// Property: counts are additive across adjacent disjoint windows.
        #[test]
        fn count_is_additive_across_windows(
            start_offset in 0i64..400,
            split in 0i64..600,
            tail in 1i64..600,
            years in 0u32..2,
            months in 0u32..4,
            days in 0u32..20,
        ) {
            prop_assume!(years + months + days > 0);

            let anchor = date(2024, 1, 1);
            let s = schedule(
                DoseInterval::new(years, months, days),
                anchor,
                None,
                DoseQuantity::from_whole(1),
            );

            let a = anchor + chrono::Duration::days(start_offset);
            let b = a + chrono::Duration::days(split);
            let c = b + chrono::Duration::days(tail);

            let left = occurrence_count(&s, a, b);
            let right = occurrence_count(&s, b + chrono::Duration::days(1), c);
            let whole = occurrence_count(&s, a, c);

            prop_assert_eq!(left + right, whole);
        }

        /// Property: every enumerated occurrence passes the membership test.
        #[test]
        fn enumerated_dates_are_occurrences(
            years in 0u32..2,
            months in 0u32..4,
            days in 0u32..20,
            horizon in 30i64..500,
        ) {
            prop_assume!(years + months + days > 0);

            let anchor = date(2024, 1, 1);
            let s = schedule(
                DoseInterval::new(years, months, days),
                anchor,
                None,
                DoseQuantity::from_whole(1),
            );
            let end = anchor + chrono::Duration::days(horizon);

            for d in occurrences(&s, anchor, end) {
                prop_assert!(is_occurrence(&s, d));
            }
        }
    }
}
