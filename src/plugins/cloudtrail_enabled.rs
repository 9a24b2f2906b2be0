use super::for_each_region;
use crate::normalize::RawResult;
use crate::registry::{CallIdentifier, CheckDescriptor};
use crate::snapshot::Snapshot;
use serde_json::Value;

fn describe_trails() -> CallIdentifier {
    CallIdentifier::new("cloudtrail", "describeTrails")
}

pub fn descriptor() -> CheckDescriptor {
    CheckDescriptor::new(
        "cloudtrailEnabled",
        "CloudTrail",
        "CloudTrail Enabled",
        vec![describe_trails()],
        run,
    )
}

/// FAIL for every region without a trail
fn run(snapshot: &Snapshot, _settings: &Value) -> anyhow::Result<Vec<RawResult>> {
    Ok(for_each_region(snapshot, &describe_trails(), |region, data, out| {
        let trails = data.as_array().map(Vec::len).unwrap_or(0);
        let result = if trails == 0 {
            RawResult::fail("CloudTrail is not enabled")
        } else {
            RawResult::ok(format!("CloudTrail is enabled ({} trail(s))", trails))
        };
        out.push(result.with_region(region));
    }))
}
