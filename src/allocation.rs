use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;
use tracing::{debug, warn};

/// Opaque resource identifier. Upstream services hand out either numeric ids or
/// string keys, so both are accepted. Numeric ids sort before string ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Number(i64),
    Text(String),
}

impl ResourceId {
    /// Parse a raw cell (CSV, CLI argument) into an id, preferring the numeric form.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(number) => ResourceId::Number(number),
            Err(_) => ResourceId::Text(trimmed.to_string()),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, ResourceId::Text(text) if text.trim().is_empty())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Number(number) => write!(f, "{number}"),
            ResourceId::Text(text) => write!(f, "{text}"),
        }
    }
}

impl From<i64> for ResourceId {
    fn from(value: i64) -> Self {
        ResourceId::Number(value)
    }
}

impl From<i32> for ResourceId {
    fn from(value: i32) -> Self {
        ResourceId::Number(i64::from(value))
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        ResourceId::Text(value.to_string())
    }
}

impl From<String> for ResourceId {
    fn from(value: String) -> Self {
        ResourceId::Text(value)
    }
}

/// A commitment of one resource to one release phase over an inclusive date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Allocation {
    #[serde(alias = "resource_id")]
    pub resource_id: ResourceId,
    /// Display name. Used for report grouping labels only, never for identity.
    #[serde(default, alias = "resource_name", deserialize_with = "null_as_empty")]
    pub resource_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(alias = "start_date")]
    pub start_date: NaiveDate,
    #[serde(alias = "end_date")]
    pub end_date: NaiveDate,
    /// Fraction of a working day committed per working day. Not range-checked here.
    #[serde(alias = "allocation_factor")]
    pub allocation_factor: f64,
    /// Precomputed total for the whole span. Informational; weekly math re-derives it.
    #[serde(default, alias = "allocation_days", skip_serializing_if = "Option::is_none")]
    pub allocation_days: Option<f64>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Allocation {
    pub fn new(
        resource_id: impl Into<ResourceId>,
        resource_name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        allocation_factor: f64,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            resource_name: resource_name.into(),
            phase: None,
            start_date,
            end_date,
            allocation_factor,
            allocation_days: None,
        }
    }

    pub fn with_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }

    pub fn with_allocation_days(mut self, days: f64) -> Self {
        self.allocation_days = Some(days);
        self
    }

    pub fn is_inverted(&self) -> bool {
        self.end_date < self.start_date
    }
}

/// A resource as it appears in an allocation list: its id and the first display
/// name seen for that id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    pub resource_id: ResourceId,
    pub resource_name: String,
}

/// Normalised allocation input.
///
/// Every engine entry point works on `&[Allocation]`; this type is where loosely
/// shaped input (a JSON `null`, a string, an object, a missing fetch result) is
/// coerced into a possibly empty list exactly once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AllocationSet {
    allocations: Vec<Allocation>,
}

impl AllocationSet {
    pub fn new(allocations: Vec<Allocation>) -> Self {
        Self { allocations }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Anything that is not a JSON array becomes an empty set. Array elements that
    /// cannot be decoded as an allocation are dropped with a warning.
    pub fn from_json_value(value: &Value) -> Self {
        let Some(items) = value.as_array() else {
            if !value.is_null() {
                debug!(kind = json_kind(value), "allocation input is not a list; treating as empty");
            }
            return Self::empty();
        };

        let mut allocations = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match Allocation::deserialize(item) {
                Ok(allocation) => allocations.push(allocation),
                Err(err) => warn!(index, error = %err, "dropping undecodable allocation record"),
            }
        }
        Self { allocations }
    }

    /// Parse raw JSON text. Unparseable text is treated like any other non-list input.
    pub fn from_json_str(input: &str) -> Self {
        match serde_json::from_str::<Value>(input) {
            Ok(value) => Self::from_json_value(&value),
            Err(err) => {
                warn!(error = %err, "allocation input is not valid JSON; treating as empty");
                Self::empty()
            }
        }
    }

    pub fn from_option(allocations: Option<Vec<Allocation>>) -> Self {
        Self::new(allocations.unwrap_or_default())
    }

    pub fn allocations(&self) -> &[Allocation] {
        &self.allocations
    }

    pub fn push(&mut self, allocation: Allocation) {
        self.allocations.push(allocation);
    }

    /// Distinct resources ordered by id, each labelled with its first-seen name.
    pub fn resources(&self) -> Vec<ResourceRef> {
        resources_of(&self.allocations)
    }

    pub fn for_phase(&self, phase: &str) -> AllocationSet {
        self.allocations
            .iter()
            .filter(|allocation| allocation.phase.as_deref() == Some(phase))
            .cloned()
            .collect()
    }
}

pub fn resources_of(allocations: &[Allocation]) -> Vec<ResourceRef> {
    let mut names: BTreeMap<&ResourceId, &str> = BTreeMap::new();
    for allocation in allocations {
        names
            .entry(&allocation.resource_id)
            .or_insert(allocation.resource_name.as_str());
    }
    names
        .into_iter()
        .map(|(id, name)| ResourceRef {
            resource_id: id.clone(),
            resource_name: name.to_string(),
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Deref for AllocationSet {
    type Target = [Allocation];

    fn deref(&self) -> &Self::Target {
        &self.allocations
    }
}

impl From<Vec<Allocation>> for AllocationSet {
    fn from(value: Vec<Allocation>) -> Self {
        Self::new(value)
    }
}

impl FromIterator<Allocation> for AllocationSet {
    fn from_iter<T: IntoIterator<Item = Allocation>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
