use super::global_data;
use crate::normalize::RawResult;
use crate::registry::{CallIdentifier, CheckDescriptor};
use crate::snapshot::Snapshot;
use serde_json::Value;

/// Below this length the policy fails regardless of settings
const HARD_MINIMUM: u64 = 10;
const DEFAULT_MINIMUM: u64 = 14;

fn password_policy() -> CallIdentifier {
    CallIdentifier::new("iam", "getAccountPasswordPolicy")
}

pub fn descriptor() -> CheckDescriptor {
    CheckDescriptor::new(
        "passwordPolicyLength",
        "IAM",
        "Password Policy Length",
        vec![password_policy()],
        run,
    )
}

fn run(snapshot: &Snapshot, settings: &Value) -> anyhow::Result<Vec<RawResult>> {
    let wanted = settings
        .get("minimum_length")
        .and_then(Value::as_u64)
        .unwrap_or(DEFAULT_MINIMUM);

    let policy = match global_data(snapshot, &password_policy()) {
        Ok(policy) => policy,
        Err(unknown) => return Ok(vec![unknown]),
    };

    let result = match policy.get("MinimumPasswordLength").and_then(Value::as_u64) {
        None => RawResult::fail("Account does not have a password policy"),
        Some(length) if length < HARD_MINIMUM => RawResult::fail(format!(
            "Minimum password length of {} is less than {} characters",
            length, HARD_MINIMUM
        )),
        Some(length) if length < wanted => RawResult::warn(format!(
            "Minimum password length of {} is less than {} characters",
            length, wanted
        )),
        Some(length) => RawResult::ok(format!(
            "Minimum password length of {} meets the required {} characters",
            length, wanted
        )),
    };
    Ok(vec![result])
}
