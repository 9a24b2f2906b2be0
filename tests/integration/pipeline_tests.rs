use crate::helpers::{call, test_credentials, StampedCheck, RecordingCollector};
use audit_ng::config::ScanConfig;
use audit_ng::normalize::{RawResult, Status};
use audit_ng::report::{CsvExporter, Reporter};
use audit_ng::scheduler::CheckState;
use audit_ng::{CheckDescriptor, CheckRegistry, ScanError, Scanner};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn stamped_registry(count: usize, failing: &[usize], started: &Arc<Mutex<Vec<std::time::Instant>>>) -> CheckRegistry {
    let mut registry = CheckRegistry::new();
    for i in 0..count {
        registry
            .register(CheckDescriptor::new(
                format!("stamped{}", i),
                "Stamped",
                format!("Stamped {}", i),
                vec![call("svc", &format!("op{}", i % 3))],
                StampedCheck {
                    started: started.clone(),
                    results: vec![RawResult::ok(format!("check {} fine", i)).with_resource(format!("r{}", i))],
                    fail: failing.contains(&i),
                },
            ))
            .unwrap();
    }
    registry
}

#[tokio::test]
async fn test_no_check_starts_before_snapshot() {
    let started = Arc::new(Mutex::new(Vec::new()));
    let collector = RecordingCollector::new(false);
    let resolved_at = collector.resolved_at.clone();

    let scanner = Scanner::new(
        stamped_registry(6, &[], &started),
        Box::new(collector),
        test_credentials(),
        ScanConfig::default(),
    );
    let (report, _) = scanner.run(Reporter::new(Vec::new(), false, None)).await.unwrap();

    let resolved = resolved_at.lock().unwrap().expect("collector resolved");
    let started = started.lock().unwrap();
    assert_eq!(started.len(), 6);
    assert!(started.iter().all(|s| *s >= resolved));
    assert_eq!(report.outcome.completed(), 6);
}

#[tokio::test]
async fn test_collection_failure_dispatches_nothing() {
    let started = Arc::new(Mutex::new(Vec::new()));

    let scanner = Scanner::new(
        stamped_registry(3, &[], &started),
        Box::new(RecordingCollector::new(true)),
        test_credentials(),
        ScanConfig::default(),
    );
    let request = scanner.request();
    let err = scanner.collect(&request).await.unwrap_err();

    assert!(matches!(err, ScanError::Collection(_)));
    assert_eq!(err.exit_code(), 3);
    assert!(started.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_one_failing_check_among_five() {
    let started = Arc::new(Mutex::new(Vec::new()));
    let scanner = Scanner::new(
        stamped_registry(5, &[3], &started),
        Box::new(RecordingCollector::new(false)),
        test_credentials(),
        ScanConfig::default(),
    );

    let (report, console) = scanner.run(Reporter::new(Vec::new(), false, None)).await.unwrap();
    let console = String::from_utf8(console).unwrap();

    assert_eq!(started.lock().unwrap().len(), 5);
    assert_eq!(console.lines().count(), 4);
    assert!(!console.contains("check 3 fine"));
    assert_eq!(report.outcome.errors.len(), 1);
    assert!(report
        .outcome
        .checks
        .iter()
        .all(|c| matches!(c.state, CheckState::Completed | CheckState::Failed)));
    assert_eq!(report.outcome.checks[3].state, CheckState::Failed);
    assert_eq!(report.outcome.last_error().unwrap().exit_code(), 1);
}

#[tokio::test]
async fn test_collector_invoked_once_with_deduplicated_calls() {
    let started = Arc::new(Mutex::new(Vec::new()));
    let collector = Arc::new(RecordingCollector::new(false));

    let mut config = ScanConfig::default();
    config.skip_regions = vec!["eu-west-1".to_string()];
    let scanner = Scanner::new(
        stamped_registry(7, &[], &started),
        Box::new(collector.clone()),
        test_credentials(),
        config,
    );
    scanner.run(Reporter::new(Vec::new(), false, None)).await.unwrap();

    assert_eq!(collector.calls.load(Ordering::SeqCst), 1);
    let request = collector.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(request.api_calls, vec![call("svc", "op0"), call("svc", "op1"), call("svc", "op2")]);
    assert_eq!(request.skip_regions, vec!["eu-west-1".to_string()]);
}

#[tokio::test]
async fn test_export_written_in_emission_order() {
    let started = Arc::new(Mutex::new(Vec::new()));
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("results.csv");

    let mut config = ScanConfig::default();
    config.concurrency = 1;
    let scanner = Scanner::new(
        stamped_registry(4, &[], &started),
        Box::new(RecordingCollector::new(false)),
        test_credentials(),
        config,
    );
    let reporter = Reporter::new(Vec::new(), false, Some(CsvExporter::create(&path).unwrap()));
    let (report, console) = scanner.run(reporter).await.unwrap();

    let csv = std::fs::read_to_string(&path).unwrap();
    let csv_lines: Vec<&str> = csv.lines().collect();
    assert_eq!(csv_lines[0], "category,title,resource,region,statusWord,message");
    assert_eq!(csv_lines.len(), 1 + report.totals.rows);

    // same order as the console
    let console = String::from_utf8(console).unwrap();
    let console_resources: Vec<&str> = console.lines().map(|l| l.split('\t').nth(2).unwrap()).collect();
    let csv_resources: Vec<&str> = csv_lines[1..].iter().map(|l| l.split(',').nth(2).unwrap()).collect();
    assert_eq!(console_resources, csv_resources);
    assert_eq!(report.totals.count(Status::Ok), 4);
}
