use crate::helpers::write_scan_fixture;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn audit_ng(dir: &Path, config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_audit-ng"))
        .args(args)
        .current_dir(dir)
        .env("AUDIT_NG_CONFIG", config)
        .env("NO_COLOR", "1")
        .env_remove("AWS_ACCESS_KEY_ID")
        .env_remove("AWS_SECRET_ACCESS_KEY")
        .env_remove("AWS_SESSION_TOKEN")
        .env_remove("AWS_DEFAULT_REGION")
        .env_remove("AUDIT_NG_GENERATE_COMPLETIONS")
        .output()
        .expect("run audit-ng")
}

#[test]
fn test_export_csv_writes_results() {
    let dir = TempDir::new().unwrap();
    let config = write_scan_fixture(dir.path());

    let output = audit_ng(dir.path(), &config, &["--export", "csv"]);
    assert_eq!(output.status.code(), Some(0), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let csv = std::fs::read_to_string(dir.path().join("results.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "category,title,resource,region,statusWord,message");
    assert!(lines.contains(&"EC2,Open SSH,sg-0123,us-east-1,FAIL,Security group sg-0123 has TCP port 22 open to 0.0.0.0/0"));
    assert!(lines.contains(&"CloudTrail,CloudTrail Enabled,N/A,eu-west-1,FAIL,CloudTrail is not enabled"));
    assert!(lines.iter().any(|l| l.starts_with("IAM,Password Policy Length,N/A,Global,WARN,")));
    assert!(lines.iter().any(|l| l.starts_with("EC2,Open SSH,N/A,eu-west-1,UNKNOWN,")));

    // every exported row was also printed
    let stdout = String::from_utf8_lossy(&output.stdout);
    let console_rows = stdout.lines().filter(|l| l.contains("\t\t")).count();
    assert_eq!(console_rows, lines.len() - 1);
    assert!(stdout.contains("Results available at results.csv."));
}

#[test]
fn test_export_flag_is_case_insensitive() {
    let dir = TempDir::new().unwrap();
    let config = write_scan_fixture(dir.path());

    let output = audit_ng(dir.path(), &config, &["--export", "CSV"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(dir.path().join("results.csv").exists());
}

#[test]
fn test_no_export_without_flag_or_with_other_format() {
    let dir = TempDir::new().unwrap();
    let config = write_scan_fixture(dir.path());

    let output = audit_ng(dir.path(), &config, &[]);
    assert_eq!(output.status.code(), Some(0));
    assert!(!dir.path().join("results.csv").exists());

    let output = audit_ng(dir.path(), &config, &["--export", "json"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(!dir.path().join("results.csv").exists());
}

#[test]
fn test_missing_credentials_exit_code() {
    let dir = TempDir::new().unwrap();
    let config = write_scan_fixture(dir.path());
    std::fs::remove_file(dir.path().join("credentials.json")).unwrap();

    let output = audit_ng(dir.path(), &config, &["--export", "csv"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid AWSConfig"));
    assert!(!dir.path().join("results.csv").exists());
}

#[test]
fn test_collection_failure_exit_code() {
    let dir = TempDir::new().unwrap();
    let config = write_scan_fixture(dir.path());
    std::fs::remove_file(dir.path().join("snapshot.json")).unwrap();

    let output = audit_ng(dir.path(), &config, &["--export", "csv"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unable to obtain API metadata"));
    assert!(!dir.path().join("results.csv").exists());
}

#[test]
fn test_env_credentials_override_missing_file() {
    let dir = TempDir::new().unwrap();
    let config = write_scan_fixture(dir.path());
    std::fs::remove_file(dir.path().join("credentials.json")).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_audit-ng"))
        .current_dir(dir.path())
        .env("AUDIT_NG_CONFIG", &config)
        .env("NO_COLOR", "1")
        .env("AWS_ACCESS_KEY_ID", "AKIAENV")
        .env("AWS_SECRET_ACCESS_KEY", "secret")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
}
