pub mod callset;
pub mod cli;
pub mod collector;
pub mod config;
pub mod credentials;
pub mod error;
pub mod normalize;
pub mod output;
pub mod plugins;
pub mod registry;
pub mod report;
pub mod scan;
pub mod scheduler;
pub mod snapshot;

pub use error::ScanError;
pub use registry::{CallIdentifier, Check, CheckDescriptor, CheckRegistry};
pub use scan::{ScanReport, Scanner};
