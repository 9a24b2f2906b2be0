#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        if let Ok(config) = audit_ng::config::ScanConfig::parse(content) {
            assert!(config.concurrency >= 1);
        }
    }
});
