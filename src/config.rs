use crate::error::ScanError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default number of checks evaluated at the same time
pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_EXPORT_PATH: &str = "results.csv";

/// Settings of one scan run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Regions the collector must not visit, e.g. `us-east-2`
    pub skip_regions: Vec<String>,
    pub concurrency: usize,
    pub export_path: PathBuf,
    pub credentials_file: Option<PathBuf>,
    pub collector: CollectorConfig,
    /// Check specific settings, keyed by check id
    pub settings: HashMap<String, Value>,
}

/// Where the snapshot comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CollectorConfig {
    /// Replays a snapshot document from disk
    File { path: PathBuf },
    /// Asks a collector service over HTTP
    Http {
        url: String,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
}

impl Default for CollectorConfig {
    fn default() -> Self {
        CollectorConfig::File {
            path: PathBuf::from("snapshot.json"),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            skip_regions: Vec::new(),
            concurrency: DEFAULT_CONCURRENCY,
            export_path: PathBuf::from(DEFAULT_EXPORT_PATH),
            credentials_file: None,
            collector: CollectorConfig::default(),
            settings: HashMap::new(),
        }
    }
}

impl ScanConfig {
    /// Gibt den Standardpfad der Konfigurationsdatei zurück
    ///
    /// `$AUDIT_NG_CONFIG` wins over `<config dir>/audit-ng/config.toml`.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var("AUDIT_NG_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("audit-ng")
            .join("config.toml")
    }

    /// Lädt die Konfiguration aus einer TOML-Datei oder erstellt eine Default-Konfiguration
    pub fn load(config_path: Option<&Path>) -> Result<Self, ScanError> {
        let config_path = config_path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).map_err(|e| {
                ScanError::Configuration(format!("cannot read {}: {}", config_path.display(), e))
            })?;
            Self::parse(&content).map_err(|e| {
                ScanError::Configuration(format!("{}: {}", config_path.display(), e))
            })?
        } else {
            let config = ScanConfig::default();
            // Default-Konfiguration speichern; ein Fehler hier ist nicht fatal
            if let Err(e) = config.write_default(&config_path) {
                tracing::warn!(path = %config_path.display(), error = %e, "could not write default config");
            }
            config
        };

        if config.credentials_file.is_none() {
            config.credentials_file = config_path.parent().map(|dir| dir.join("credentials.json"));
        }
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document
    pub fn parse(content: &str) -> Result<Self, ScanError> {
        let config: ScanConfig =
            toml::from_str(content).map_err(|e| ScanError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ScanError> {
        if self.concurrency == 0 {
            return Err(ScanError::Configuration(
                "concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn write_default(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Settings for a check; an empty object when none are configured
    pub fn settings_for(&self, check_id: &str) -> Value {
        self.settings
            .get(check_id)
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default()))
    }
}
