use crate::registry::CallIdentifier;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Response of one call in one region
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub err: Option<String>,
}

impl RegionResponse {
    pub fn data(data: Value) -> Self {
        RegionResponse { data: Some(data), err: None }
    }

    pub fn error(err: impl Into<String>) -> Self {
        RegionResponse { data: None, err: Some(err.into()) }
    }
}

/// Collected remote data of one scan run, keyed by call and region.
///
/// Built by a collector, then published behind an `Arc` and only read from
/// that point on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    calls: HashMap<CallIdentifier, BTreeMap<String, RegionResponse>>,
}

/// service -> operation -> region -> response
type SnapshotDocument = BTreeMap<String, BTreeMap<String, BTreeMap<String, RegionResponse>>>;

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, call: CallIdentifier, region: impl Into<String>, response: RegionResponse) {
        self.calls.entry(call).or_default().insert(region.into(), response);
    }

    /// Per-region responses of a call
    pub fn regions(&self, call: &CallIdentifier) -> Option<&BTreeMap<String, RegionResponse>> {
        self.calls.get(call)
    }

    pub fn response(&self, call: &CallIdentifier, region: &str) -> Option<&RegionResponse> {
        self.calls.get(call)?.get(region)
    }

    /// Successful payload of a call in a region
    pub fn data(&self, call: &CallIdentifier, region: &str) -> Option<&Value> {
        self.response(call, region)?.data.as_ref()
    }

    /// Calls present in the snapshot, sorted
    pub fn call_ids(&self) -> Vec<&CallIdentifier> {
        let mut ids: Vec<_> = self.calls.keys().collect();
        ids.sort();
        ids
    }

    pub fn contains(&self, call: &CallIdentifier) -> bool {
        self.calls.contains_key(call)
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Drops every call not in `calls`
    pub fn retain_calls(&mut self, calls: &[CallIdentifier]) {
        let wanted: HashSet<&CallIdentifier> = calls.iter().collect();
        self.calls.retain(|call, _| wanted.contains(call));
    }

    /// Drops the responses of skipped regions
    pub fn remove_regions(&mut self, skip_regions: &[String]) {
        if skip_regions.is_empty() {
            return;
        }
        for regions in self.calls.values_mut() {
            regions.retain(|region, _| !skip_regions.iter().any(|s| s == region));
        }
    }

    /// Parst ein Snapshot-Dokument
    pub fn from_json(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(anyhow!("snapshot document must be a JSON object"));
        }
        let document: SnapshotDocument = serde_json::from_value(value)?;
        let mut snapshot = Snapshot::new();
        for (service, operations) in document {
            for (operation, regions) in operations {
                snapshot
                    .calls
                    .insert(CallIdentifier::new(service.clone(), operation), regions);
            }
        }
        Ok(snapshot)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_json(value)
    }

    pub fn to_json(&self) -> Value {
        let mut document = SnapshotDocument::new();
        for (call, regions) in &self.calls {
            document
                .entry(call.service.clone())
                .or_default()
                .insert(call.operation.clone(), regions.clone());
        }
        serde_json::to_value(document).unwrap_or(Value::Null)
    }
}
