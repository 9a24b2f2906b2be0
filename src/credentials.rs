use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

pub const DEFAULT_REGION: &str = "us-east-1";

/// Account credentials handed to the collector
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .field("region", &self.region)
            .finish()
    }
}

impl Credentials {
    /// Resolves credentials from the process environment and the credentials file
    pub fn resolve(file: Option<&Path>) -> Result<Self, ScanError> {
        Self::resolve_with(file, |key| std::env::var(key).ok())
    }

    /// Resolves credentials using `env` for variable lookups.
    ///
    /// `AWS_ACCESS_KEY_ID` together with `AWS_SECRET_ACCESS_KEY` replaces the
    /// file entirely. Without a resolvable access key id this is a
    /// configuration error.
    pub fn resolve_with<F>(file: Option<&Path>, env: F) -> Result<Self, ScanError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| env(key).filter(|v| !v.is_empty());

        let credentials = match (lookup("AWS_ACCESS_KEY_ID"), lookup("AWS_SECRET_ACCESS_KEY")) {
            (Some(access_key_id), Some(secret_access_key)) => Some(Credentials {
                access_key_id,
                secret_access_key,
                session_token: lookup("AWS_SESSION_TOKEN"),
                region: lookup("AWS_DEFAULT_REGION").unwrap_or_else(default_region),
            }),
            _ => match file {
                Some(path) if path.exists() => Some(Self::load_file(path)?),
                _ => None,
            },
        };

        match credentials {
            Some(c) if !c.access_key_id.is_empty() => Ok(c),
            _ => Err(ScanError::Configuration(
                "Invalid AWSConfig: no access key id could be resolved".to_string(),
            )),
        }
    }

    fn load_file(path: &Path) -> Result<Self, ScanError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ScanError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            ScanError::Configuration(format!("invalid credentials file {}: {}", path.display(), e))
        })
    }
}
