use crate::allocation::Allocation;
use chrono::{Datelike, Days, NaiveDate, Weekday};
use std::collections::BTreeSet;
use tracing::debug;

/// Derives the ordered, distinct week-start dates spanned by a set of allocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekEnumerator {
    week_start: Weekday,
}

impl Default for WeekEnumerator {
    fn default() -> Self {
        Self::new(Weekday::Mon)
    }
}

impl WeekEnumerator {
    pub fn new(week_start: Weekday) -> Self {
        Self { week_start }
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    /// The most recent week boundary on or before `date`, or `None` when that
    /// boundary precedes the first representable date.
    pub fn week_of(&self, date: NaiveDate) -> Option<NaiveDate> {
        let offset = (date.weekday().num_days_from_monday() + 7
            - self.week_start.num_days_from_monday())
            % 7;
        date.checked_sub_days(Days::new(u64::from(offset)))
    }

    /// Ascending, de-duplicated week starts touched by any allocation span.
    /// Inverted spans (`end_date < start_date`) touch no week.
    pub fn weeks(&self, allocations: &[Allocation]) -> Vec<NaiveDate> {
        let mut weeks = BTreeSet::new();
        for allocation in allocations {
            if allocation.is_inverted() {
                continue;
            }
            let Some(last) = self.week_of(allocation.end_date) else {
                continue;
            };
            // Weeks before the representable range start from the first full week.
            let mut current = match self.week_of(allocation.start_date) {
                Some(week) => week,
                None => match self.first_week() {
                    Some(week) => week,
                    None => continue,
                },
            };
            while current <= last {
                weeks.insert(current);
                match current.checked_add_days(Days::new(7)) {
                    Some(next) => current = next,
                    None => break,
                }
            }
        }
        debug!(
            allocations = allocations.len(),
            weeks = weeks.len(),
            "enumerated allocation weeks"
        );
        weeks.into_iter().collect()
    }

    fn first_week(&self) -> Option<NaiveDate> {
        NaiveDate::MIN
            .iter_days()
            .take(7)
            .find(|day| day.weekday() == self.week_start)
    }
}

/// Last calendar day of the seven-day bucket starting at `week`.
pub fn week_end(week: NaiveDate) -> NaiveDate {
    week.checked_add_days(Days::new(6)).unwrap_or(NaiveDate::MAX)
}

/// Monday-based week enumeration.
pub fn enumerate_weeks(allocations: &[Allocation]) -> Vec<NaiveDate> {
    WeekEnumerator::default().weeks(allocations)
}
