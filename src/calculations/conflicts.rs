use super::weekly_load::{WeekLoads, WeeklyLoadPass};
use crate::allocation::{Allocation, ResourceId};
use crate::report::serialize_tenth;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One over-capacity week for one resource.
///
/// `total_allocation` and `over_allocation` hold exact values; only the serialised
/// `overAllocation` is rounded to one decimal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyConflict {
    pub week_starting: NaiveDate,
    pub total_allocation: f64,
    pub max_allocation: f64,
    #[serde(serialize_with = "serialize_tenth")]
    pub over_allocation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictRecord {
    pub resource_id: ResourceId,
    pub resource_name: String,
    pub weekly_conflicts: Vec<WeeklyConflict>,
}

/// Flags (resource, week) pairs whose load strictly exceeds the weekly capacity.
pub struct ConflictPass<'a> {
    loads: &'a WeeklyLoadPass<'a>,
    max_weekly_days: f64,
}

impl<'a> ConflictPass<'a> {
    pub fn new(loads: &'a WeeklyLoadPass<'a>, max_weekly_days: f64) -> Self {
        Self {
            loads,
            max_weekly_days,
        }
    }

    pub fn execute(&self, weeks: &[NaiveDate], allocations: &[Allocation]) -> Vec<ConflictRecord> {
        let per_week = self.loads.execute_all(weeks, allocations);
        conflicts_from_loads(&per_week, self.max_weekly_days)
    }
}

/// Build conflict groups from already computed weekly loads. Groups are ordered by
/// resource id; each group's weeks are ascending.
pub fn conflicts_from_loads(
    per_week: &[(NaiveDate, WeekLoads)],
    max_weekly_days: f64,
) -> Vec<ConflictRecord> {
    let mut grouped: BTreeMap<&ResourceId, ConflictRecord> = BTreeMap::new();

    for (week, loads) in per_week {
        for (resource_id, load) in loads {
            let over_allocation = load.allocated - max_weekly_days;
            // Strict: a week exactly at capacity is not a conflict.
            let is_conflict = load.allocated > 0.0 && over_allocation > 0.0;
            if !is_conflict {
                continue;
            }
            grouped
                .entry(resource_id)
                .or_insert_with(|| ConflictRecord {
                    resource_id: resource_id.clone(),
                    resource_name: load.resource_name.clone(),
                    weekly_conflicts: Vec::new(),
                })
                .weekly_conflicts
                .push(WeeklyConflict {
                    week_starting: *week,
                    total_allocation: load.allocated,
                    max_allocation: max_weekly_days,
                    over_allocation,
                });
        }
    }

    grouped
        .into_values()
        .map(|mut record| {
            record.weekly_conflicts.sort_by_key(|conflict| conflict.week_starting);
            record
        })
        .collect()
}
