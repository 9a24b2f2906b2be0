use crate::registry::CheckDescriptor;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Resource label used when a result names no resource
pub const NO_RESOURCE: &str = "N/A";
/// Region label used when a result names no region
pub const GLOBAL_REGION: &str = "Global";

/// Result as reported by a check.
///
/// `status` is the raw code: 0 = OK, 1 = WARN, 2 = FAIL, anything else is
/// reported as UNKNOWN.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawResult {
    #[serde(default)]
    pub status: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default)]
    pub message: String,
}

impl RawResult {
    pub fn new(status: i64, message: impl Into<String>) -> Self {
        RawResult {
            status: Some(status),
            resource: None,
            region: None,
            message: message.into(),
        }
    }

    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(0, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(1, message)
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::new(2, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(3, message)
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Warn,
    Fail,
    Unknown,
}

impl Status {
    /// Maps a raw status code; never fails
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(0) => Status::Ok,
            Some(1) => Status::Warn,
            Some(2) => Status::Fail,
            _ => Status::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Warn => "WARN",
            Status::Fail => "FAIL",
            Status::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reporting row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedRow {
    pub category: String,
    pub title: String,
    pub resource: String,
    pub region: String,
    pub status: Status,
    pub message: String,
}

impl NormalizedRow {
    /// Fields in export column order
    pub fn fields(&self) -> [&str; 6] {
        [
            self.category.as_str(),
            self.title.as_str(),
            self.resource.as_str(),
            self.region.as_str(),
            self.status.as_str(),
            self.message.as_str(),
        ]
    }
}

/// Maps a raw result of `check` to its reporting row
pub fn normalize(check: &CheckDescriptor, raw: &RawResult) -> NormalizedRow {
    NormalizedRow {
        category: check.category.clone(),
        title: check.title.clone(),
        resource: non_empty(raw.resource.as_deref()).unwrap_or(NO_RESOURCE).to_string(),
        region: non_empty(raw.region.as_deref()).unwrap_or(GLOBAL_REGION).to_string(),
        status: Status::from_code(raw.status),
        message: raw.message.clone(),
    }
}

// An empty label counts as missing.
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
