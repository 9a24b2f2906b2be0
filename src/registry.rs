use crate::error::ScanError;
use crate::normalize::RawResult;
use crate::snapshot::Snapshot;
use futures::future::{self, BoxFuture};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// One remote enumeration call, e.g. `ec2.describeSecurityGroups`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CallIdentifier {
    pub service: String,
    pub operation: String,
}

impl CallIdentifier {
    pub fn new(service: impl Into<String>, operation: impl Into<String>) -> Self {
        CallIdentifier {
            service: service.into(),
            operation: operation.into(),
        }
    }
}

impl fmt::Display for CallIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.service, self.operation)
    }
}

/// Evaluation logic of a check.
///
/// A check reads the shared snapshot and its own settings and reports zero or
/// more raw results. It may await I/O of its own; it must not assume it is
/// the only check running.
pub trait Check: Send + Sync {
    fn evaluate<'a>(
        &'a self,
        snapshot: &'a Snapshot,
        settings: &'a Value,
    ) -> BoxFuture<'a, anyhow::Result<Vec<RawResult>>>;
}

/// Plain synchronous functions are checks too
impl<F> Check for F
where
    F: Fn(&Snapshot, &Value) -> anyhow::Result<Vec<RawResult>> + Send + Sync,
{
    fn evaluate<'a>(
        &'a self,
        snapshot: &'a Snapshot,
        settings: &'a Value,
    ) -> BoxFuture<'a, anyhow::Result<Vec<RawResult>>> {
        Box::pin(future::ready(self(snapshot, settings)))
    }
}

/// A registered check: identity, labels, required calls and its logic
pub struct CheckDescriptor {
    pub id: String,
    pub category: String,
    pub title: String,
    pub apis: Vec<CallIdentifier>,
    pub check: Box<dyn Check>,
}

impl CheckDescriptor {
    pub fn new(
        id: impl Into<String>,
        category: impl Into<String>,
        title: impl Into<String>,
        apis: Vec<CallIdentifier>,
        check: impl Check + 'static,
    ) -> Self {
        CheckDescriptor {
            id: id.into(),
            category: category.into(),
            title: title.into(),
            apis,
            check: Box::new(check),
        }
    }
}

impl fmt::Debug for CheckDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckDescriptor")
            .field("id", &self.id)
            .field("category", &self.category)
            .field("title", &self.title)
            .field("apis", &self.apis)
            .finish_non_exhaustive()
    }
}

/// Ordered set of checks, keyed by check id.
///
/// Built once before a scan and handed to the pipeline; the scan only ever
/// sees it through a shared reference.
#[derive(Debug, Default)]
pub struct CheckRegistry {
    checks: Vec<Arc<CheckDescriptor>>,
    index: HashMap<String, usize>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registriert einen Check; doppelte IDs werden abgelehnt
    pub fn register(&mut self, descriptor: CheckDescriptor) -> Result<(), ScanError> {
        if self.index.contains_key(&descriptor.id) {
            return Err(ScanError::DuplicateCheck(descriptor.id));
        }
        self.index.insert(descriptor.id.clone(), self.checks.len());
        self.checks.push(Arc::new(descriptor));
        Ok(())
    }

    /// All checks in registration order
    pub fn all(&self) -> &[Arc<CheckDescriptor>] {
        &self.checks
    }

    pub fn get(&self, id: &str) -> Option<&Arc<CheckDescriptor>> {
        self.index.get(id).map(|&i| &self.checks[i])
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}
