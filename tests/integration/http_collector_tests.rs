use crate::helpers::{builtin_snapshot_document, call, test_credentials};
use crate::test_server::TestServer;
use audit_ng::collector::{collect_snapshot, CollectRequest, HttpCollector};
use audit_ng::ScanError;
use hyper::StatusCode;
use std::time::Duration;

fn request() -> CollectRequest {
    CollectRequest {
        api_calls: vec![call("cloudtrail", "describeTrails"), call("ec2", "describeSecurityGroups")],
        skip_regions: vec!["ap-east-1".to_string()],
    }
}

fn collector(server: &TestServer) -> HttpCollector {
    HttpCollector::new(&server.url(), Some(Duration::from_secs(5))).unwrap()
}

#[tokio::test]
async fn test_http_collector_posts_request_and_parses_snapshot() {
    let server = TestServer::new().await.unwrap();
    server
        .respond_with(StatusCode::OK, builtin_snapshot_document().to_string())
        .await;

    let snapshot = collect_snapshot(&collector(&server), &test_credentials(), &request())
        .await
        .unwrap();
    assert!(snapshot.contains(&call("cloudtrail", "describeTrails")));
    assert_eq!(
        snapshot
            .response(&call("ec2", "describeSecurityGroups"), "eu-west-1")
            .and_then(|r| r.err.as_deref()),
        Some("AuthFailure")
    );

    let requests = server.requests().await;
    assert_eq!(requests.len(), 1);
    let body = &requests[0];
    assert_eq!(body["apiCalls"][0]["service"], "cloudtrail");
    assert_eq!(body["apiCalls"][1]["operation"], "describeSecurityGroups");
    assert_eq!(body["skipRegions"][0], "ap-east-1");
    assert_eq!(body["credentials"]["accessKeyId"], "AKIATEST");
}

#[tokio::test]
async fn test_http_error_status_is_collection_error() {
    let server = TestServer::new().await.unwrap();
    server.respond_with(StatusCode::INTERNAL_SERVER_ERROR, "{}").await;

    let err = collect_snapshot(&collector(&server), &test_credentials(), &request())
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::Collection(ref m) if m.contains("500")));
}

#[tokio::test]
async fn test_null_body_means_no_snapshot() {
    let server = TestServer::new().await.unwrap();
    server.respond_with(StatusCode::OK, "null").await;

    let err = collect_snapshot(&collector(&server), &test_credentials(), &request())
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::Collection(ref m) if m.contains("no snapshot")));
}

#[tokio::test]
async fn test_unreachable_collector() {
    // bind and drop to get a port nobody listens on
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let collector = HttpCollector::new(&format!("http://{}/collect", addr), Some(Duration::from_secs(2))).unwrap();
    let result = collect_snapshot(&collector, &test_credentials(), &request()).await;
    assert!(matches!(result, Err(ScanError::Collection(_))));
}
