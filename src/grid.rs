use crate::allocation::{ResourceId, ResourceRef};
use crate::calculations::WeekLoads;
use crate::report::round_tenth;
use chrono::NaiveDate;
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GridExportError {
    #[error("dataframe conversion error: {0}")]
    DataFrame(#[from] PolarsError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRow {
    pub resource_id: ResourceId,
    pub resource_name: String,
    /// One value per grid week, rounded to one decimal. `0.0` where nothing overlaps.
    pub cells: Vec<f64>,
}

/// Chart/table view of weekly loads: one row per resource, one column per week.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyGrid {
    pub weeks: Vec<NaiveDate>,
    pub rows: Vec<GridRow>,
}

impl WeeklyGrid {
    /// Lay out precomputed weekly loads. Every resource gets a row even if it has no
    /// load in any listed week.
    pub fn from_loads(resources: &[ResourceRef], per_week: &[(NaiveDate, WeekLoads)]) -> Self {
        let weeks = per_week.iter().map(|(week, _)| *week).collect();
        let rows = resources
            .iter()
            .map(|resource| GridRow {
                resource_id: resource.resource_id.clone(),
                resource_name: resource.resource_name.clone(),
                cells: per_week
                    .iter()
                    .map(|(_, loads)| {
                        loads
                            .get(&resource.resource_id)
                            .map_or(0.0, |load| round_tenth(load.allocated))
                    })
                    .collect(),
            })
            .collect();
        Self { weeks, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The displayed value for a cell, or `None` when the resource or week is not
    /// part of the grid.
    pub fn cell(&self, resource_id: &ResourceId, week: NaiveDate) -> Option<f64> {
        let column = self.weeks.iter().position(|w| *w == week)?;
        self.rows
            .iter()
            .find(|row| &row.resource_id == resource_id)
            .and_then(|row| row.cells.get(column).copied())
    }

    pub fn week_labels(&self) -> Vec<String> {
        self.weeks
            .iter()
            .map(|week| week.format("%Y-%m-%d").to_string())
            .collect()
    }

    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.weeks.len() + 2);

        let ids: Vec<String> = self.rows.iter().map(|row| row.resource_id.to_string()).collect();
        columns.push(Series::new(PlSmallStr::from_static("resource_id"), ids).into_column());

        let names: Vec<&str> = self.rows.iter().map(|row| row.resource_name.as_str()).collect();
        columns.push(Series::new(PlSmallStr::from_static("resource_name"), names).into_column());

        for (idx, label) in self.week_labels().into_iter().enumerate() {
            let values: Vec<f64> = self
                .rows
                .iter()
                .map(|row| row.cells.get(idx).copied().unwrap_or(0.0))
                .collect();
            columns.push(Series::new(label.into(), values).into_column());
        }

        DataFrame::new(columns)
    }

    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<(), GridExportError> {
        let mut writer = csv::Writer::from_writer(writer);
        let mut header = vec!["resource_id".to_string(), "resource_name".to_string()];
        header.extend(self.week_labels());
        writer.write_record(&header)?;

        for row in &self.rows {
            let mut record = vec![row.resource_id.to_string(), row.resource_name.clone()];
            record.extend(row.cells.iter().map(|value| format!("{value:.1}")));
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}
