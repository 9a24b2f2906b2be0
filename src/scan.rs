use crate::callset::{derive_call_set, fingerprint};
use crate::collector::{collect_snapshot, CollectRequest, Collector};
use crate::config::ScanConfig;
use crate::credentials::Credentials;
use crate::error::ScanError;
use crate::normalize::normalize;
use crate::registry::CheckRegistry;
use crate::report::{ReportClose, ReportTotals, Reporter};
use crate::scheduler::{ScanOutcome, Scheduler};
use crate::snapshot::Snapshot;
use std::io::Write;
use std::sync::Arc;

/// Result of a finished scan
#[derive(Debug)]
pub struct ScanReport {
    pub outcome: ScanOutcome,
    pub totals: ReportTotals,
    /// Console or export failures, surfaced after the check errors
    pub output_errors: Vec<ScanError>,
}

impl ScanReport {
    /// Check errors first, then output errors
    pub fn errors(&self) -> impl Iterator<Item = &ScanError> {
        self.outcome.errors.iter().chain(self.output_errors.iter())
    }

    /// Exit code of the error surfaced last; 0 for a clean run
    pub fn exit_code(&self) -> u8 {
        self.output_errors
            .last()
            .or_else(|| self.outcome.last_error())
            .map_or(0, ScanError::exit_code)
    }
}

/// One scan run: registry, collector and run settings.
///
/// The stages can be driven one by one (`collect`, then `evaluate`) or all at
/// once through `run`.
pub struct Scanner {
    registry: Arc<CheckRegistry>,
    collector: Box<dyn Collector>,
    credentials: Credentials,
    config: ScanConfig,
}

impl Scanner {
    pub fn new(
        registry: CheckRegistry,
        collector: Box<dyn Collector>,
        credentials: Credentials,
        config: ScanConfig,
    ) -> Self {
        Scanner {
            registry: Arc::new(registry),
            collector,
            credentials,
            config,
        }
    }

    pub fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// The collection request for this registry
    pub fn request(&self) -> CollectRequest {
        let calls = derive_call_set(&self.registry);
        tracing::info!(calls = calls.len(), fingerprint = %fingerprint(&calls), "api calls determined");
        CollectRequest {
            api_calls: calls,
            skip_regions: self.config.skip_regions.clone(),
        }
    }

    /// Runs the collector once; any failure ends the scan
    pub async fn collect(&self, request: &CollectRequest) -> Result<Snapshot, ScanError> {
        collect_snapshot(self.collector.as_ref(), &self.credentials, request).await
    }

    /// Evaluates every check against `snapshot` and reports each result row.
    ///
    /// Nothing here aborts the run: check failures end up in the outcome,
    /// sink failures in `output_errors`.
    pub async fn evaluate<W: Write>(&self, snapshot: Snapshot, mut reporter: Reporter<W>) -> (ScanReport, W) {
        let scheduler = Scheduler::new(self.config.concurrency);

        let outcome = scheduler
            .run(
                self.registry.all(),
                Arc::new(snapshot),
                |id| self.config.settings_for(id),
                |check, results| {
                    for raw in results {
                        reporter.emit(&normalize(check, raw));
                    }
                },
            )
            .await;

        let ReportClose { totals, console, errors } = reporter.finish();
        let report = ScanReport {
            outcome,
            totals,
            output_errors: errors,
        };
        (report, console)
    }

    /// Derive calls, collect, evaluate
    pub async fn run<W: Write>(&self, reporter: Reporter<W>) -> Result<(ScanReport, W), ScanError> {
        let request = self.request();
        let snapshot = self.collect(&request).await?;
        Ok(self.evaluate(snapshot, reporter).await)
    }
}
