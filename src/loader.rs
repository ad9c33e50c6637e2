use crate::allocation::{Allocation, AllocationSet, ResourceId};
use crate::config::{CapacityConfig, ConfigError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid data: {0}")]
    InvalidData(String),
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
}

pub type LoadResult<T> = Result<T, LoadError>;

/// Read allocations from a JSON file holding either a bare array or an object with
/// an `allocations` array. Anything else yields an empty set.
pub fn load_allocations_from_json<P: AsRef<Path>>(path: P) -> LoadResult<AllocationSet> {
    let file = File::open(path.as_ref())?;
    let value: Value = serde_json::from_reader(io::BufReader::new(file))?;
    let payload = match value {
        Value::Object(mut map) => map.remove("allocations").unwrap_or(Value::Null),
        other => other,
    };
    let set = AllocationSet::from_json_value(&payload);
    debug!(path = %path.as_ref().display(), allocations = set.len(), "loaded allocations from json");
    Ok(set)
}

#[derive(Debug, Serialize, Deserialize)]
struct AllocationCsvRecord {
    resource_id: String,
    resource_name: String,
    #[serde(default)]
    phase: String,
    start_date: String,
    end_date: String,
    allocation_factor: String,
    #[serde(default)]
    allocation_days: String,
}

impl From<&Allocation> for AllocationCsvRecord {
    fn from(allocation: &Allocation) -> Self {
        Self {
            resource_id: allocation.resource_id.to_string(),
            resource_name: allocation.resource_name.clone(),
            phase: allocation.phase.clone().unwrap_or_default(),
            start_date: format_date(allocation.start_date),
            end_date: format_date(allocation.end_date),
            allocation_factor: allocation.allocation_factor.to_string(),
            allocation_days: allocation
                .allocation_days
                .map(|days| days.to_string())
                .unwrap_or_default(),
        }
    }
}

impl AllocationCsvRecord {
    fn into_allocation(self) -> LoadResult<Allocation> {
        if self.resource_id.trim().is_empty() {
            return Err(LoadError::InvalidData("resource_id is empty".into()));
        }
        let factor = parse_f64(&self.allocation_factor)?
            .ok_or_else(|| LoadError::InvalidData("allocation_factor is empty".into()))?;
        let mut allocation = Allocation::new(
            ResourceId::parse(&self.resource_id),
            self.resource_name,
            parse_date(&self.start_date)?,
            parse_date(&self.end_date)?,
            factor,
        );
        if !self.phase.trim().is_empty() {
            allocation.phase = Some(self.phase.trim().to_string());
        }
        allocation.allocation_days = parse_f64(&self.allocation_days)?;
        Ok(allocation)
    }
}

/// Read allocations from a CSV file with the header
/// `resource_id,resource_name,phase,start_date,end_date,allocation_factor,allocation_days`.
/// `phase` and `allocation_days` may be blank. A malformed row fails the whole load.
pub fn load_allocations_from_csv<P: AsRef<Path>>(path: P) -> LoadResult<AllocationSet> {
    let file = File::open(path.as_ref())?;
    let mut reader = csv::Reader::from_reader(file);
    let mut allocations = Vec::new();
    for (index, record) in reader.deserialize::<AllocationCsvRecord>().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let allocation = record?
            .into_allocation()
            .map_err(|err| match err {
                LoadError::InvalidData(msg) => LoadError::InvalidData(format!("line {line}: {msg}")),
                other => other,
            })?;
        allocations.push(allocation);
    }
    debug!(path = %path.as_ref().display(), allocations = allocations.len(), "loaded allocations from csv");
    Ok(AllocationSet::new(allocations))
}

pub fn save_allocations_to_csv<P: AsRef<Path>>(allocations: &[Allocation], path: P) -> LoadResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for allocation in allocations {
        writer.serialize(AllocationCsvRecord::from(allocation))?;
    }
    writer.flush()?;
    Ok(())
}

/// Read and validate a [`CapacityConfig`]. Missing keys take their defaults.
pub fn load_config_from_json<P: AsRef<Path>>(path: P) -> LoadResult<CapacityConfig> {
    let file = File::open(path)?;
    let config: CapacityConfig = serde_json::from_reader(io::BufReader::new(file))?;
    config.validate()?;
    Ok(config)
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(input: &str) -> LoadResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| LoadError::InvalidData(format!("invalid date '{input}': {e}")))
}

fn parse_f64(input: &str) -> LoadResult<Option<f64>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    let value = input
        .trim()
        .parse::<f64>()
        .map_err(|e| LoadError::InvalidData(format!("invalid float '{input}': {e}")))?;
    if !value.is_finite() {
        return Err(LoadError::InvalidData(format!("non-finite number '{input}'")));
    }
    Ok(Some(value))
}
