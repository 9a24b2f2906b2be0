use super::for_each_region;
use crate::normalize::RawResult;
use crate::registry::{CallIdentifier, CheckDescriptor};
use crate::snapshot::Snapshot;
use serde_json::Value;

const SSH_PORT: u64 = 22;

fn describe_security_groups() -> CallIdentifier {
    CallIdentifier::new("ec2", "describeSecurityGroups")
}

pub fn descriptor() -> CheckDescriptor {
    CheckDescriptor::new(
        "openSsh",
        "EC2",
        "Open SSH",
        vec![describe_security_groups()],
        run,
    )
}

fn run(snapshot: &Snapshot, _settings: &Value) -> anyhow::Result<Vec<RawResult>> {
    Ok(for_each_region(snapshot, &describe_security_groups(), |region, data, out| {
        let groups = data.as_array().map(Vec::as_slice).unwrap_or_default();
        let mut found = false;

        for group in groups.iter().filter(|g| exposes_ssh(g)) {
            found = true;
            let id = group.get("GroupId").and_then(Value::as_str).unwrap_or("unknown");
            out.push(
                RawResult::fail(format!("Security group {} has TCP port 22 open to 0.0.0.0/0", id))
                    .with_resource(id)
                    .with_region(region),
            );
        }

        if !found {
            out.push(RawResult::ok("No public open ports found").with_region(region));
        }
    }))
}

/// A rule covers port 22 for 0.0.0.0/0 over TCP or all protocols
fn exposes_ssh(group: &Value) -> bool {
    let Some(permissions) = group.get("IpPermissions").and_then(Value::as_array) else {
        return false;
    };

    permissions.iter().any(|perm| {
        let protocol = perm.get("IpProtocol").and_then(Value::as_str).unwrap_or("");
        if protocol != "tcp" && protocol != "-1" {
            return false;
        }
        let covers_port = match (
            perm.get("FromPort").and_then(Value::as_u64),
            perm.get("ToPort").and_then(Value::as_u64),
        ) {
            (Some(from), Some(to)) => from <= SSH_PORT && SSH_PORT <= to,
            // "-1" carries no ports and means every port
            _ => protocol == "-1",
        };
        let open_to_world = perm
            .get("IpRanges")
            .and_then(Value::as_array)
            .map(|ranges| {
                ranges
                    .iter()
                    .any(|r| r.get("CidrIp").and_then(Value::as_str) == Some("0.0.0.0/0"))
            })
            .unwrap_or(false);
        covers_port && open_to_world
    })
}
