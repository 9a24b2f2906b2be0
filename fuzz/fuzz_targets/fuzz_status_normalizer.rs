#![no_main]
use arbitrary::Arbitrary;
use audit_ng::normalize::{normalize, RawResult, Status};
use audit_ng::snapshot::Snapshot;
use audit_ng::CheckDescriptor;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    status: Option<i64>,
    resource: Option<String>,
    region: Option<String>,
    message: String,
}

fn noop(_: &Snapshot, _: &serde_json::Value) -> anyhow::Result<Vec<RawResult>> {
    Ok(vec![])
}

fuzz_target!(|input: Input| {
    let check = CheckDescriptor::new("fuzz", "Fuzz", "Fuzz", vec![], noop);
    let raw = RawResult {
        status: input.status,
        resource: input.resource,
        region: input.region,
        message: input.message,
    };
    let row = normalize(&check, &raw);

    // normalization is total and never leaves labels empty
    assert!(!row.resource.is_empty());
    assert!(!row.region.is_empty());
    if !matches!(raw.status, Some(0..=2)) {
        assert_eq!(row.status, Status::Unknown);
    }
});
