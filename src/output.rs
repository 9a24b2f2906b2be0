use crate::normalize::Status;
use crate::report::ReportTotals;
use crate::scheduler::ScanOutcome;
use atty::Stream;
use chrono::{DateTime, Local};
use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Formatted output for audit-ng
pub struct Output;

impl Output {
    /// Check if colors should be enabled
    pub fn colors_enabled() -> bool {
        atty::is(Stream::Stdout) && std::env::var("NO_COLOR").is_err()
    }

    /// Initialize output system (call at startup)
    pub fn init() {
        if !Self::colors_enabled() {
            colored::control::set_override(false);
        }
    }

    /// Show a success message
    pub fn success(msg: &str) {
        if Self::colors_enabled() {
            println!("{} {}", "✓".green().bold(), msg.green());
        } else {
            println!("✓ {}", msg);
        }
    }

    /// Show an error message
    pub fn error(msg: &str) {
        if Self::colors_enabled() {
            eprintln!("{} {}", "✗".red().bold(), msg.red());
        } else {
            eprintln!("✗ {}", msg);
        }
    }

    /// Show a warning message
    pub fn warning(msg: &str) {
        if Self::colors_enabled() {
            println!("{} {}", "⚠".yellow().bold(), msg.yellow());
        } else {
            println!("⚠ {}", msg);
        }
    }

    /// Show an info message
    pub fn info(msg: &str) {
        if Self::colors_enabled() {
            println!("{} {}", "ℹ".cyan().bold(), msg.cyan());
        } else {
            println!("ℹ {}", msg);
        }
    }

    /// Show a heading
    pub fn heading(msg: &str) {
        if Self::colors_enabled() {
            println!("\n{}", msg.bold().bright_blue());
        } else {
            println!("\n{}", msg);
        }
    }

    /// Create a table for displaying data
    pub fn table() -> Table {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        // Make table responsive to terminal width
        if term_size::dimensions().is_some() {
            table.set_content_arrangement(ContentArrangement::Dynamic);
        }
        table
    }

    /// Spinner shown while the collector runs
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        let template = if Self::colors_enabled() {
            "{spinner:.green} [{elapsed_precise}] {msg}"
        } else {
            "[{elapsed_precise}] {msg}"
        };
        if let Ok(style) = ProgressStyle::default_spinner().template(template) {
            pb.set_style(style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }

    /// Status counts and check outcome of a finished run
    pub fn summary_table(totals: &ReportTotals, outcome: &ScanOutcome) -> Table {
        let mut table = Self::table();
        table.set_header(vec!["Status", "Results"]);

        for status in [Status::Ok, Status::Warn, Status::Fail, Status::Unknown] {
            let label = if Self::colors_enabled() {
                Cell::new(status.as_str()).fg(status_color(status))
            } else {
                Cell::new(status.as_str())
            };
            table.add_row(vec![label, Cell::new(totals.count(status))]);
        }
        table.add_row(vec![Cell::new("Checks completed"), Cell::new(outcome.completed())]);
        table.add_row(vec![Cell::new("Checks failed"), Cell::new(outcome.failed())]);
        table
    }

    /// Print the summary of a finished run
    pub fn summary(totals: &ReportTotals, outcome: &ScanOutcome, started: DateTime<Local>, elapsed: Duration) {
        Self::heading("Scan summary");
        println!("{}", Self::summary_table(totals, outcome));
        println!(
            "Started {} · took {:.1}s · {} result(s)",
            started.format("%Y-%m-%d %H:%M:%S"),
            elapsed.as_secs_f64(),
            totals.rows
        );
    }
}

fn status_color(status: Status) -> Color {
    match status {
        Status::Ok => Color::Green,
        Status::Warn => Color::Yellow,
        Status::Fail => Color::Red,
        Status::Unknown => Color::Magenta,
    }
}
