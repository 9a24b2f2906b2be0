use audit_ng::cli::{self, Cli};
use audit_ng::collector;
use audit_ng::config::ScanConfig;
use audit_ng::credentials::Credentials;
use audit_ng::output::Output;
use audit_ng::plugins;
use audit_ng::report::{CsvExporter, ExportFormat, Reporter};
use audit_ng::{ScanError, Scanner};
use clap::CommandFactory;
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize output system
    Output::init();

    // Check for completion generation request
    if let Ok(shell) = std::env::var("AUDIT_NG_GENERATE_COMPLETIONS") {
        let mut app = Cli::command();
        cli::generate_completions(&shell, &mut app);
        return ExitCode::SUCCESS;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let opts = cli::parse();

    match cmd_scan(&opts).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            Output::error(&e.to_string());
            ExitCode::from(e.exit_code())
        }
    }
}

/// Runs one scan; returns the exit code of a completed run
async fn cmd_scan(opts: &Cli) -> Result<u8, ScanError> {
    let started = chrono::Local::now();
    let clock = Instant::now();

    let config = ScanConfig::load(None)?;
    let credentials = Credentials::resolve(config.credentials_file.as_deref())?;
    let registry = plugins::builtin_registry()?;
    let collector = collector::from_config(&config.collector)
        .map_err(|e| ScanError::Configuration(format!("{:#}", e)))?;
    let export = opts.export_format();

    let scanner = Scanner::new(registry, collector, credentials, config);
    let export_path = scanner.config().export_path.clone();

    Output::info(&format!("Loaded {} check(s).", scanner.registry().len()));
    Output::info("Determining API calls to make...");
    let request = scanner.request();
    Output::info(&format!("API calls determined ({} call(s)).", request.api_calls.len()));

    let spinner = Output::spinner("Collecting AWS metadata. This may take several minutes...");
    let collected = scanner.collect(&request).await;
    spinner.finish_and_clear();
    let snapshot = collected?;

    Output::info("Metadata collection complete. Analyzing...");
    Output::info("Analysis complete. Scan report to follow...\n");

    // Export is opened before the first check runs
    let exporter = match export {
        Some(ExportFormat::Csv) => Some(CsvExporter::create(&export_path)?),
        None => None,
    };
    let exported = exporter.is_some();

    let (report, _) = scanner.evaluate(snapshot, Reporter::stdout(exporter)).await;

    for error in report.errors() {
        Output::error(&error.to_string());
    }
    if !report.outcome.is_clean() {
        Output::warning(&format!("{} check(s) could not be evaluated", report.outcome.failed()));
    }
    Output::summary(&report.totals, &report.outcome, started, clock.elapsed());

    let export_failed = report
        .output_errors
        .iter()
        .any(|e| matches!(e, ScanError::Export { .. }));
    if exported && !export_failed {
        Output::success(&format!("Results available at {}.", export_path.display()));
    }

    Ok(report.exit_code())
}
