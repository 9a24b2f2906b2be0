use audit_ng::collector::{CollectRequest, Collector};
use audit_ng::credentials::Credentials;
use audit_ng::normalize::RawResult;
use audit_ng::snapshot::{RegionResponse, Snapshot};
use audit_ng::{CallIdentifier, Check};
use futures::future::BoxFuture;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Test credentials; never sent anywhere real
pub fn test_credentials() -> Credentials {
    Credentials {
        access_key_id: "AKIATEST".to_string(),
        secret_access_key: "secret".to_string(),
        session_token: None,
        region: "us-east-1".to_string(),
    }
}

/// Collector answering every requested call with an empty list per region.
///
/// Records when it resolved and how often it was called.
pub struct RecordingCollector {
    pub fail: bool,
    pub delay: Duration,
    pub calls: AtomicUsize,
    pub resolved_at: Arc<Mutex<Option<Instant>>>,
    pub last_request: Mutex<Option<CollectRequest>>,
}

impl RecordingCollector {
    pub fn new(fail: bool) -> Self {
        RecordingCollector {
            fail,
            delay: Duration::from_millis(20),
            calls: AtomicUsize::new(0),
            resolved_at: Arc::new(Mutex::new(None)),
            last_request: Mutex::new(None),
        }
    }
}

impl Collector for RecordingCollector {
    fn collect<'a>(
        &'a self,
        _credentials: &'a Credentials,
        request: &'a CollectRequest,
    ) -> BoxFuture<'a, anyhow::Result<Option<Snapshot>>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            tokio::time::sleep(self.delay).await;

            if self.fail {
                return Err(anyhow::anyhow!("Unable to obtain API metadata"));
            }

            let mut snapshot = Snapshot::new();
            for call in &request.api_calls {
                for region in ["us-east-1", "eu-west-1"] {
                    if !request.skip_regions.iter().any(|s| s == region) {
                        snapshot.insert(call.clone(), region, RegionResponse::data(json!([])));
                    }
                }
            }
            *self.resolved_at.lock().unwrap() = Some(Instant::now());
            Ok(Some(snapshot))
        })
    }
}

/// Check that records when it started and returns fixed results
pub struct StampedCheck {
    pub started: Arc<Mutex<Vec<Instant>>>,
    pub results: Vec<RawResult>,
    pub fail: bool,
}

impl Check for StampedCheck {
    fn evaluate<'a>(
        &'a self,
        _snapshot: &'a Snapshot,
        _settings: &'a Value,
    ) -> BoxFuture<'a, anyhow::Result<Vec<RawResult>>> {
        Box::pin(async move {
            self.started.lock().unwrap().push(Instant::now());
            tokio::time::sleep(Duration::from_millis(5)).await;
            if self.fail {
                anyhow::bail!("stamped check failed");
            }
            Ok(self.results.clone())
        })
    }
}

pub fn call(service: &str, operation: &str) -> CallIdentifier {
    CallIdentifier::new(service, operation)
}

/// Snapshot document understood by the built-in checks
pub fn builtin_snapshot_document() -> Value {
    json!({
        "cloudtrail": { "describeTrails": {
            "us-east-1": { "data": [{ "Name": "org-trail" }] },
            "eu-west-1": { "data": [] }
        }},
        "iam": {
            "getAccountPasswordPolicy": {
                "us-east-1": { "data": { "MinimumPasswordLength": 12 } }
            },
            "generateCredentialReport": {
                "us-east-1": { "data": [
                    { "user": "<root_account>", "arn": "arn:aws:iam::123456789012:root",
                      "access_key_1_active": "false", "access_key_2_active": "false" }
                ]}
            }
        },
        "ec2": { "describeSecurityGroups": {
            "us-east-1": { "data": [{
                "GroupId": "sg-0123",
                "IpPermissions": [{ "IpProtocol": "tcp", "FromPort": 22, "ToPort": 22,
                                    "IpRanges": [{ "CidrIp": "0.0.0.0/0" }] }]
            }]},
            "eu-west-1": { "err": "AuthFailure" }
        }}
    })
}

/// Writes config, credentials and snapshot files into `dir`; returns the config path
pub fn write_scan_fixture(dir: &Path) -> PathBuf {
    let snapshot_path = dir.join("snapshot.json");
    std::fs::write(&snapshot_path, builtin_snapshot_document().to_string()).unwrap();

    std::fs::write(
        dir.join("credentials.json"),
        r#"{"accessKeyId":"AKIAFILE","secretAccessKey":"s","region":"us-east-1"}"#,
    )
    .unwrap();

    let config_path = dir.join("config.toml");
    std::fs::write(
        &config_path,
        format!(
            "concurrency = 2\n\n[collector]\nkind = \"file\"\npath = {:?}\n",
            snapshot_path.display().to_string()
        ),
    )
    .unwrap();
    config_path
}
