use crate::config::CollectorConfig;
use crate::credentials::Credentials;
use crate::error::ScanError;
use crate::registry::CallIdentifier;
use crate::snapshot::Snapshot;
use anyhow::{anyhow, Context, Result};
use futures::future::BoxFuture;
use reqwest::Client;
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// What the collector is asked to fetch
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectRequest {
    pub api_calls: Vec<CallIdentifier>,
    pub skip_regions: Vec<String>,
}

/// Source of remote account data.
///
/// `Ok(None)` means the collector finished without producing a snapshot.
pub trait Collector: Send + Sync {
    fn collect<'a>(
        &'a self,
        credentials: &'a Credentials,
        request: &'a CollectRequest,
    ) -> BoxFuture<'a, Result<Option<Snapshot>>>;
}

impl<C: Collector + ?Sized> Collector for std::sync::Arc<C> {
    fn collect<'a>(
        &'a self,
        credentials: &'a Credentials,
        request: &'a CollectRequest,
    ) -> BoxFuture<'a, Result<Option<Snapshot>>> {
        (**self).collect(credentials, request)
    }
}

/// Runs the collector once and returns the snapshot every check will read.
///
/// Any collector error, a missing snapshot, or an empty snapshot although
/// calls were requested is a collection error.
pub async fn collect_snapshot(
    collector: &dyn Collector,
    credentials: &Credentials,
    request: &CollectRequest,
) -> Result<Snapshot, ScanError> {
    let start = Instant::now();
    tracing::info!(calls = request.api_calls.len(), skip_regions = ?request.skip_regions, "collecting snapshot");

    let snapshot = match collector.collect(credentials, request).await {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => {
            return Err(ScanError::Collection("collector returned no snapshot".to_string()))
        }
        Err(e) => return Err(ScanError::Collection(format!("{:#}", e))),
    };

    if snapshot.is_empty() && !request.api_calls.is_empty() {
        return Err(ScanError::Collection("collector returned an empty snapshot".to_string()));
    }

    tracing::info!(calls = snapshot.len(), elapsed_ms = start.elapsed().as_millis() as u64, "snapshot collected");
    Ok(snapshot)
}

/// Builds the collector described by the configuration
pub fn from_config(config: &CollectorConfig) -> Result<Box<dyn Collector>> {
    Ok(match config {
        CollectorConfig::File { path } => Box::new(FileCollector::new(path.clone())),
        CollectorConfig::Http { url, timeout_secs } => Box::new(HttpCollector::new(
            url,
            timeout_secs.map(Duration::from_secs),
        )?),
    })
}

/// Liest einen gespeicherten Snapshot von der Festplatte
pub struct FileCollector {
    path: PathBuf,
}

impl FileCollector {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileCollector { path: path.into() }
    }
}

impl Collector for FileCollector {
    fn collect<'a>(
        &'a self,
        _credentials: &'a Credentials,
        request: &'a CollectRequest,
    ) -> BoxFuture<'a, Result<Option<Snapshot>>> {
        Box::pin(async move {
            let bytes = tokio::fs::read(&self.path)
                .await
                .with_context(|| format!("cannot read snapshot {}", self.path.display()))?;
            let mut snapshot = Snapshot::from_slice(&bytes)
                .with_context(|| format!("invalid snapshot {}", self.path.display()))?;

            // Only what was asked for, minus skipped regions
            snapshot.retain_calls(&request.api_calls);
            snapshot.remove_regions(&request.skip_regions);
            Ok(Some(snapshot))
        })
    }
}

/// Requests the snapshot from a collector service.
///
/// The request body carries the credentials, so the endpoint has to be
/// trusted.
pub struct HttpCollector {
    client: Client,
    url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HttpCollectBody<'a> {
    #[serde(flatten)]
    request: &'a CollectRequest,
    credentials: &'a Credentials,
}

impl HttpCollector {
    /// Collection may take several minutes; the default timeout is generous
    pub fn new(url: &str, timeout: Option<Duration>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout.unwrap_or(Duration::from_secs(30 * 60)))
            .build()?;

        Ok(HttpCollector {
            client,
            url: url.to_string(),
        })
    }
}

impl Collector for HttpCollector {
    fn collect<'a>(
        &'a self,
        credentials: &'a Credentials,
        request: &'a CollectRequest,
    ) -> BoxFuture<'a, Result<Option<Snapshot>>> {
        Box::pin(async move {
            let body = HttpCollectBody { request, credentials };
            let response = self.client.post(&self.url).json(&body).send().await?;

            if !response.status().is_success() {
                return Err(anyhow!("HTTP error: {}", response.status()));
            }

            let bytes = response.bytes().await?;
            if bytes.iter().all(|b| b.is_ascii_whitespace()) {
                return Ok(None);
            }
            let value: serde_json::Value = serde_json::from_slice(&bytes)?;
            if value.is_null() {
                return Ok(None);
            }
            Ok(Some(Snapshot::from_json(value)?))
        })
    }
}
