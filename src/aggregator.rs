use crate::allocation::{Allocation, resources_of};
use crate::calculations::{
    ConflictPass, ConflictRecord, WeekLoads, WeeklyLoadPass, conflicts_from_loads,
};
use crate::calendar::WorkCalendar;
use crate::config::{CapacityConfig, ConfigError, DEFAULT_MAX_WEEKLY_DAYS, validate_capacity};
use crate::grid::WeeklyGrid;
use crate::report::{CapacityReport, ConflictSummary};
use crate::weeks::WeekEnumerator;
use chrono::{NaiveDate, Weekday};
use tracing::{debug, trace};

/// Weekly load and conflict computation over an allocation list.
///
/// Holds only configuration; every call works on the slice it is given and
/// returns fresh values, so one aggregator can be shared across threads.
#[derive(Debug, Clone)]
pub struct CapacityAggregator {
    calendar: WorkCalendar,
    weeks: WeekEnumerator,
    max_weekly_days: f64,
}

impl Default for CapacityAggregator {
    fn default() -> Self {
        Self::new(WorkCalendar::default(), Weekday::Mon, DEFAULT_MAX_WEEKLY_DAYS)
    }
}

impl CapacityAggregator {
    pub fn new(calendar: WorkCalendar, week_start: Weekday, max_weekly_days: f64) -> Self {
        Self {
            calendar,
            weeks: WeekEnumerator::new(week_start),
            max_weekly_days,
        }
    }

    pub fn from_config(config: &CapacityConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(
            config.work_calendar()?,
            config.week_start,
            config.max_weekly_days,
        ))
    }

    pub fn with_max_weekly_days(mut self, max_weekly_days: f64) -> Result<Self, ConfigError> {
        validate_capacity(max_weekly_days)?;
        self.max_weekly_days = max_weekly_days;
        Ok(self)
    }

    pub fn max_weekly_days(&self) -> f64 {
        self.max_weekly_days
    }

    pub fn calendar(&self) -> &WorkCalendar {
        &self.calendar
    }

    pub fn weeks(&self, allocations: &[Allocation]) -> Vec<NaiveDate> {
        self.weeks.weeks(allocations)
    }

    /// Each resource's prorated days for the seven days starting at `week`.
    pub fn weekly_loads(&self, week: NaiveDate, allocations: &[Allocation]) -> WeekLoads {
        let loads = WeeklyLoadPass::new(&self.calendar).execute(week, allocations);
        trace!(%week, resources = loads.len(), "computed weekly loads");
        loads
    }

    pub fn conflicts(&self, allocations: &[Allocation]) -> Vec<ConflictRecord> {
        let weeks = self.weeks(allocations);
        let pass = WeeklyLoadPass::new(&self.calendar);
        let conflicts = ConflictPass::new(&pass, self.max_weekly_days).execute(&weeks, allocations);
        debug!(
            weeks = weeks.len(),
            conflicted_resources = conflicts.len(),
            capacity = self.max_weekly_days,
            "detected capacity conflicts"
        );
        conflicts
    }

    pub fn grid(&self, allocations: &[Allocation]) -> WeeklyGrid {
        let weeks = self.weeks(allocations);
        let per_week = WeeklyLoadPass::new(&self.calendar).execute_all(&weeks, allocations);
        WeeklyGrid::from_loads(&resources_of(allocations), &per_week)
    }

    /// Grid, conflicts and summary derived from a single set of weekly loads.
    pub fn report(&self, allocations: &[Allocation]) -> CapacityReport {
        let weeks = self.weeks(allocations);
        let per_week = WeeklyLoadPass::new(&self.calendar).execute_all(&weeks, allocations);
        let resources = resources_of(allocations);

        let grid = WeeklyGrid::from_loads(&resources, &per_week);
        let conflicts = conflicts_from_loads(&per_week, self.max_weekly_days);
        let summary =
            ConflictSummary::from_parts(resources.len(), &per_week, &conflicts, self.max_weekly_days);
        debug!(summary = %summary.to_cli_summary(), "built capacity report");

        CapacityReport {
            weeks,
            grid,
            conflicts,
            summary,
        }
    }
}

/// Per-week loads with the default Monday–Friday calendar.
pub fn weekly_allocation(week: NaiveDate, allocations: &[Allocation]) -> WeekLoads {
    CapacityAggregator::default().weekly_loads(week, allocations)
}

/// Conflicts with the default calendar and the given weekly capacity.
pub fn detect_conflicts(allocations: &[Allocation], max_weekly_days: f64) -> Vec<ConflictRecord> {
    CapacityAggregator::new(WorkCalendar::default(), Weekday::Mon, max_weekly_days)
        .conflicts(allocations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::ResourceId;

    fn d(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn report_views_agree_with_weekly_loads() {
        let aggregator = CapacityAggregator::default();
        let allocations = vec![
            Allocation::new(1, "A", d(2025, 1, 6), d(2025, 1, 17), 1.0),
            Allocation::new(1, "A", d(2025, 1, 13), d(2025, 1, 14), 0.5),
            Allocation::new(2, "B", d(2025, 1, 8), d(2025, 1, 9), 1.0),
        ];
        let report = aggregator.report(&allocations);
        assert_eq!(report.weeks, vec![d(2025, 1, 6), d(2025, 1, 13)]);

        for conflict in &report.conflicts {
            for weekly in &conflict.weekly_conflicts {
                let loads = aggregator.weekly_loads(weekly.week_starting, &allocations);
                assert_eq!(loads[&conflict.resource_id].allocated, weekly.total_allocation);
            }
        }
        assert_eq!(report.conflicts, aggregator.conflicts(&allocations));
        assert_eq!(report.grid, aggregator.grid(&allocations));
        assert_eq!(report.grid.cell(&ResourceId::Number(1), d(2025, 1, 13)), Some(6.0));
        assert_eq!(report.summary.conflict_count, 2);
    }

    #[test]
    fn from_config_rejects_invalid_capacity() {
        let config = CapacityConfig::default().with_max_weekly_days(-0.5);
        assert!(CapacityAggregator::from_config(&config).is_err());
        assert!(CapacityAggregator::default().with_max_weekly_days(f64::INFINITY).is_err());
    }

    #[test]
    fn holidays_in_config_reduce_load() {
        let mut config = CapacityConfig::default();
        config.calendar = crate::calendar::WorkCalendarConfig::new(
            [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri],
            [d(2025, 1, 8)],
        );
        let aggregator = CapacityAggregator::from_config(&config).unwrap();
        let allocations = vec![Allocation::new(7, "John Doe", d(2025, 1, 6), d(2025, 1, 10), 1.0)];
        let loads = aggregator.weekly_loads(d(2025, 1, 6), &allocations);
        assert_eq!(loads[&ResourceId::Number(7)].allocated, 4.0);
        assert!(aggregator.conflicts(&allocations).is_empty());
    }
}
