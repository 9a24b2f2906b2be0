use super::global_data;
use crate::normalize::RawResult;
use crate::registry::{CallIdentifier, CheckDescriptor};
use crate::snapshot::Snapshot;
use serde_json::Value;

const ROOT_USER: &str = "<root_account>";

fn credential_report() -> CallIdentifier {
    CallIdentifier::new("iam", "generateCredentialReport")
}

pub fn descriptor() -> CheckDescriptor {
    CheckDescriptor::new(
        "rootAccessKeys",
        "IAM",
        "Root Access Keys",
        vec![credential_report()],
        run,
    )
}

fn run(snapshot: &Snapshot, _settings: &Value) -> anyhow::Result<Vec<RawResult>> {
    let report = match global_data(snapshot, &credential_report()) {
        Ok(report) => report,
        Err(unknown) => return Ok(vec![unknown]),
    };

    let root = report
        .as_array()
        .and_then(|rows| rows.iter().find(|r| r.get("user").and_then(Value::as_str) == Some(ROOT_USER)));
    let Some(root) = root else {
        return Ok(vec![RawResult::unknown("Unable to find root account in credential report")]);
    };

    let active = ["access_key_1_active", "access_key_2_active"]
        .iter()
        .filter(|key| is_true(root.get(**key)))
        .count();

    let result = if active > 0 {
        RawResult::fail(format!("Root account has {} active access key(s)", active))
    } else {
        RawResult::ok("No root access keys found")
    };
    Ok(vec![result.with_resource(
        root.get("arn").and_then(Value::as_str).unwrap_or(ROOT_USER),
    )])
}

// Credential reports carry booleans as "true"/"false" strings.
fn is_true(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}
