use crate::allocation::ResourceId;
use crate::calculations::{ConflictRecord, WeekLoads};
use crate::grid::WeeklyGrid;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};

/// Round to one decimal place. Presentation only; never feed the result back into
/// accumulation.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub(crate) fn serialize_tenth<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(round_tenth(*value))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeakLoad {
    pub resource_id: ResourceId,
    pub resource_name: String,
    pub week: NaiveDate,
    pub allocated: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictSummary {
    pub resource_count: usize,
    pub week_count: usize,
    /// Number of over-capacity (resource, week) pairs.
    pub conflict_count: usize,
    pub conflicted_resource_count: usize,
    pub max_weekly_days: f64,
    pub peak: Option<PeakLoad>,
}

impl ConflictSummary {
    pub fn from_parts(
        resource_count: usize,
        per_week: &[(NaiveDate, WeekLoads)],
        conflicts: &[ConflictRecord],
        max_weekly_days: f64,
    ) -> Self {
        let mut peak: Option<PeakLoad> = None;
        for (week, loads) in per_week {
            for load in loads.values() {
                let is_higher = peak
                    .as_ref()
                    .map_or(true, |current| load.allocated > current.allocated);
                if is_higher {
                    peak = Some(PeakLoad {
                        resource_id: load.resource_id.clone(),
                        resource_name: load.resource_name.clone(),
                        week: *week,
                        allocated: load.allocated,
                    });
                }
            }
        }

        Self {
            resource_count,
            week_count: per_week.len(),
            conflict_count: conflicts.iter().map(|c| c.weekly_conflicts.len()).sum(),
            conflicted_resource_count: conflicts.len(),
            max_weekly_days,
            peak,
        }
    }

    pub fn has_conflicts(&self) -> bool {
        self.conflict_count > 0
    }

    pub fn to_cli_summary(&self) -> String {
        let mut parts = Vec::new();
        parts.push(format!("resources={}", self.resource_count));
        parts.push(format!("weeks={}", self.week_count));
        parts.push(format!("capacity={}", self.max_weekly_days));
        parts.push(format!("conflicts={}", self.conflict_count));
        if self.conflicted_resource_count > 0 {
            parts.push(format!("over_capacity={}", self.conflicted_resource_count));
        }
        if let Some(peak) = &self.peak {
            parts.push(format!(
                "peak={}@{}:{:.1}",
                peak.resource_id,
                peak.week,
                round_tenth(peak.allocated)
            ));
        }
        parts.join(", ")
    }
}

/// Everything a capacity page needs, computed from one pass over the weeks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityReport {
    pub weeks: Vec<NaiveDate>,
    pub grid: WeeklyGrid,
    pub conflicts: Vec<ConflictRecord>,
    pub summary: ConflictSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::WeeklyLoad;

    #[test]
    fn round_tenth_handles_float_noise() {
        assert_eq!(round_tenth(4.6 - 4.5), 0.1);
        assert_eq!(round_tenth(2.449_999), 2.4);
        assert_eq!(round_tenth(2.25), 2.3);
        assert_eq!(round_tenth(0.0), 0.0);
    }

    #[test]
    fn summary_reports_peak_and_counts() {
        let week = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let mut loads = WeekLoads::new();
        for (id, allocated) in [(1, 3.0), (2, 5.3)] {
            loads.insert(
                ResourceId::Number(id),
                WeeklyLoad {
                    resource_id: ResourceId::Number(id),
                    resource_name: format!("R{id}"),
                    week,
                    allocated,
                },
            );
        }
        let per_week = vec![(week, loads)];
        let conflicts = crate::calculations::conflicts_from_loads(&per_week, 4.5);
        let summary = ConflictSummary::from_parts(2, &per_week, &conflicts, 4.5);

        assert_eq!(summary.conflict_count, 1);
        assert!(summary.has_conflicts());
        let peak = summary.peak.as_ref().unwrap();
        assert_eq!(peak.resource_id, ResourceId::Number(2));
        assert_eq!(
            summary.to_cli_summary(),
            "resources=2, weeks=1, capacity=4.5, conflicts=1, over_capacity=1, peak=2@2025-01-06:5.3"
        );
    }
}
