use crate::allocation::{Allocation, ResourceId};
use crate::calendar::WorkCalendar;
use crate::report::round_tenth;
use crate::weeks::week_end;
use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One resource's prorated load for one week, at full precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyLoad {
    pub resource_id: ResourceId,
    pub resource_name: String,
    pub week: NaiveDate,
    pub allocated: f64,
}

impl WeeklyLoad {
    pub fn display_allocated(&self) -> f64 {
        round_tenth(self.allocated)
    }
}

/// Loads for a single week keyed by resource. Resources without overlap are absent.
pub type WeekLoads = BTreeMap<ResourceId, WeeklyLoad>;

/// The per-week accumulation. This is the only place overlap is turned into days.
pub struct WeeklyLoadPass<'a> {
    calendar: &'a WorkCalendar,
}

impl<'a> WeeklyLoadPass<'a> {
    pub fn new(calendar: &'a WorkCalendar) -> Self {
        Self { calendar }
    }

    /// Working days of `allocation` inside `[week, week + 6]`, in `[0, 7]`.
    pub fn overlap_days(&self, allocation: &Allocation, week: NaiveDate) -> i64 {
        let from = allocation.start_date.max(week);
        let to = allocation.end_date.min(week_end(week));
        self.calendar.count_available_days(from, to).clamp(0, 7)
    }

    /// Prorated days `allocation` adds to `week`. A non-finite factor adds nothing.
    pub fn contribution(&self, allocation: &Allocation, week: NaiveDate) -> f64 {
        prorate(self.overlap_days(allocation, week), allocation.allocation_factor)
    }

    pub fn execute(&self, week: NaiveDate, allocations: &[Allocation]) -> WeekLoads {
        let mut loads = WeekLoads::new();
        for allocation in allocations {
            let days = self.overlap_days(allocation, week);
            if days == 0 {
                continue;
            }
            let contribution = prorate(days, allocation.allocation_factor);
            loads
                .entry(allocation.resource_id.clone())
                .or_insert_with(|| WeeklyLoad {
                    resource_id: allocation.resource_id.clone(),
                    resource_name: first_name_for(&allocation.resource_id, allocations).to_string(),
                    week,
                    allocated: 0.0,
                })
                .allocated += contribution;
        }
        loads
    }

    /// Run [`execute`](Self::execute) for every week. Weeks are independent, so they
    /// are processed in parallel; output order follows `weeks`.
    pub fn execute_all(
        &self,
        weeks: &[NaiveDate],
        allocations: &[Allocation],
    ) -> Vec<(NaiveDate, WeekLoads)> {
        weeks
            .par_iter()
            .map(|week| (*week, self.execute(*week, allocations)))
            .collect()
    }
}

fn prorate(days: i64, factor: f64) -> f64 {
    if !factor.is_finite() {
        return 0.0;
    }
    days as f64 * factor
}

/// Display label for a resource: the name on its first allocation in input order,
/// regardless of which week that allocation falls in.
fn first_name_for<'a>(resource_id: &ResourceId, allocations: &'a [Allocation]) -> &'a str {
    allocations
        .iter()
        .find(|allocation| &allocation.resource_id == resource_id)
        .map_or("", |allocation| allocation.resource_name.as_str())
}
