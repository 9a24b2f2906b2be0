use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by a scan run
#[derive(Debug, Error)]
pub enum ScanError {
    /// No usable credentials or an unreadable/invalid configuration
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("duplicate check identifier: {0}")]
    DuplicateCheck(String),

    /// The collector failed or handed back no snapshot; nothing was evaluated
    #[error("unable to obtain API metadata: {0}")]
    Collection(String),

    /// A single check failed; sibling checks still ran
    #[error("check {check} failed: {message}")]
    CheckEvaluation { check: String, message: String },

    /// Stdout went away during the run; the export is still written
    #[error("console output failed: {0}")]
    Console(#[source] std::io::Error),

    #[error("export to {} failed: {source}", path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Process exit code for this error.
    ///
    /// 1 = scan finished with failed checks, 2 = configuration,
    /// 3 = collection, 4 = console or export output.
    pub fn exit_code(&self) -> u8 {
        match self {
            ScanError::CheckEvaluation { .. } => 1,
            ScanError::Configuration(_) | ScanError::DuplicateCheck(_) => 2,
            ScanError::Collection(_) => 3,
            ScanError::Console(_) | ScanError::Export { .. } => 4,
        }
    }
}
