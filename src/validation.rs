use crate::allocation::{Allocation, ResourceId};
use crate::calendar::WorkCalendar;
use serde::Serialize;
use std::fmt;

/// Allowed gap between a stored `allocation_days` and the value derived from the
/// calendar before it is reported.
const DAYS_TOLERANCE: f64 = 0.05;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum IssueKind {
    InvertedRange,
    NonPositiveFactor,
    FactorAboveOne,
    NonFiniteFactor,
    BlankResourceId,
    AllocationDaysMismatch { stored: f64, derived: f64 },
}

/// Advisory finding for one input row. The engine accepts every row regardless.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationIssue {
    /// Position in the input list.
    pub index: usize,
    pub resource_id: ResourceId,
    #[serde(flatten)]
    pub kind: IssueKind,
}

impl fmt::Display for AllocationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "allocation #{} (resource {}): ", self.index, self.resource_id)?;
        match &self.kind {
            IssueKind::InvertedRange => write!(f, "end date is before start date"),
            IssueKind::NonPositiveFactor => write!(f, "allocation factor is not positive"),
            IssueKind::FactorAboveOne => write!(f, "allocation factor exceeds 1.0"),
            IssueKind::NonFiniteFactor => write!(f, "allocation factor is not a finite number"),
            IssueKind::BlankResourceId => write!(f, "resource id is blank"),
            IssueKind::AllocationDaysMismatch { stored, derived } => write!(
                f,
                "allocation_days {stored} disagrees with derived {derived:.2}"
            ),
        }
    }
}

/// Lint allocations against the default Monday–Friday calendar.
pub fn check_allocations(allocations: &[Allocation]) -> Vec<AllocationIssue> {
    check_allocations_with(allocations, &WorkCalendar::default())
}

pub fn check_allocations_with(
    allocations: &[Allocation],
    calendar: &WorkCalendar,
) -> Vec<AllocationIssue> {
    let mut issues = Vec::new();
    for (index, allocation) in allocations.iter().enumerate() {
        let mut report = |kind| {
            issues.push(AllocationIssue {
                index,
                resource_id: allocation.resource_id.clone(),
                kind,
            })
        };

        if allocation.resource_id.is_blank() {
            report(IssueKind::BlankResourceId);
        }
        if allocation.is_inverted() {
            report(IssueKind::InvertedRange);
        }

        let factor = allocation.allocation_factor;
        if !factor.is_finite() {
            report(IssueKind::NonFiniteFactor);
            continue;
        }
        if factor <= 0.0 {
            report(IssueKind::NonPositiveFactor);
        } else if factor > 1.0 {
            report(IssueKind::FactorAboveOne);
        }

        if let Some(stored) = allocation.allocation_days {
            let derived = calendar.count_available_days(allocation.start_date, allocation.end_date)
                as f64
                * factor;
            if (stored - derived).abs() > DAYS_TOLERANCE {
                report(IssueKind::AllocationDaysMismatch { stored, derived });
            }
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn clean_allocations_have_no_issues() {
        let allocations = vec![
            Allocation::new(1, "A", d(2025, 1, 6), d(2025, 1, 10), 0.5).with_allocation_days(2.5),
            Allocation::new("ops", "Ops", d(2025, 1, 6), d(2025, 1, 6), 1.0),
        ];
        assert!(check_allocations(&allocations).is_empty());
    }

    #[test]
    fn flags_each_problem_with_its_index() {
        let allocations = vec![
            Allocation::new(1, "A", d(2025, 1, 10), d(2025, 1, 6), 1.0),
            Allocation::new(2, "B", d(2025, 1, 6), d(2025, 1, 10), 0.0),
            Allocation::new(3, "C", d(2025, 1, 6), d(2025, 1, 10), 1.5),
            Allocation::new("  ", "D", d(2025, 1, 6), d(2025, 1, 10), f64::NAN),
            Allocation::new(5, "E", d(2025, 1, 6), d(2025, 1, 17), 1.0).with_allocation_days(5.0),
        ];
        let issues = check_allocations(&allocations);
        let kinds: Vec<(usize, &IssueKind)> = issues.iter().map(|i| (i.index, &i.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                (0, &IssueKind::InvertedRange),
                (1, &IssueKind::NonPositiveFactor),
                (2, &IssueKind::FactorAboveOne),
                (3, &IssueKind::BlankResourceId),
                (3, &IssueKind::NonFiniteFactor),
                (
                    4,
                    &IssueKind::AllocationDaysMismatch {
                        stored: 5.0,
                        derived: 10.0
                    }
                ),
            ]
        );
        assert_eq!(
            issues[0].to_string(),
            "allocation #0 (resource 1): end date is before start date"
        );
    }
}
