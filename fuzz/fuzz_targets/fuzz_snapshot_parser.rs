#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Try to parse as snapshot document
    // We don't care about the result, just that it doesn't crash
    if let Ok(mut snapshot) = audit_ng::snapshot::Snapshot::from_slice(data) {
        let calls: Vec<_> = snapshot.call_ids().into_iter().cloned().collect();
        let _ = snapshot.to_json();
        snapshot.remove_regions(&["us-east-1".to_string()]);
        snapshot.retain_calls(&calls[..calls.len() / 2]);
    }
});
