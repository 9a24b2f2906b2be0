//! Built-in checks.
//!
//! Each check module exposes `descriptor()`; `builtin_registry` collects them
//! in a fixed order so console output is stable between runs.

pub mod cloudtrail_enabled;
pub mod open_ssh;
pub mod password_policy;
pub mod root_access_keys;

use crate::error::ScanError;
use crate::normalize::RawResult;
use crate::registry::{CallIdentifier, CheckRegistry};
use crate::snapshot::{RegionResponse, Snapshot};
use serde_json::Value;

/// Registry with every built-in check
pub fn builtin_registry() -> Result<CheckRegistry, ScanError> {
    let mut registry = CheckRegistry::new();
    registry.register(cloudtrail_enabled::descriptor())?;
    registry.register(password_policy::descriptor())?;
    registry.register(open_ssh::descriptor())?;
    registry.register(root_access_keys::descriptor())?;
    Ok(registry)
}

/// Calls `f` for every region that returned data for `call`.
///
/// Regions whose call failed produce an UNKNOWN result instead; a call
/// missing from the snapshot produces a single global UNKNOWN result.
pub(crate) fn for_each_region<F>(snapshot: &Snapshot, call: &CallIdentifier, mut f: F) -> Vec<RawResult>
where
    F: FnMut(&str, &Value, &mut Vec<RawResult>),
{
    let mut results = Vec::new();
    let Some(regions) = snapshot.regions(call) else {
        results.push(RawResult::unknown(format!("No data collected for {}", call)));
        return results;
    };

    for (region, response) in regions {
        match response {
            RegionResponse { data: Some(data), err: None } => f(region.as_str(), data, &mut results),
            RegionResponse { err: Some(err), .. } => {
                results.push(RawResult::unknown(format!("Unable to query {}: {}", call, err)).with_region(region.as_str()))
            }
            RegionResponse { data: None, err: None } => {
                results.push(RawResult::unknown(format!("Empty response for {}", call)).with_region(region.as_str()))
            }
        }
    }
    results
}

/// First region that returned data for a global call
pub(crate) fn global_data<'a>(snapshot: &'a Snapshot, call: &CallIdentifier) -> Result<&'a Value, RawResult> {
    let regions = snapshot
        .regions(call)
        .ok_or_else(|| RawResult::unknown(format!("No data collected for {}", call)))?;

    if let Some(data) = regions.values().find_map(|r| r.data.as_ref()) {
        return Ok(data);
    }
    let err = regions
        .values()
        .find_map(|r| r.err.clone())
        .unwrap_or_else(|| "empty response".to_string());
    Err(RawResult::unknown(format!("Unable to query {}: {}", call, err)))
}
