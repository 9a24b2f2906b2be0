use crate::error::ScanError;
use crate::normalize::{NormalizedRow, Status};
use colored::*;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Stdout, Write};
use std::path::{Path, PathBuf};

/// Header of the export file
pub const CSV_HEADER: [&str; 6] = ["category", "title", "resource", "region", "statusWord", "message"];

/// Export formats accepted by `--export`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
}

impl ExportFormat {
    /// Only `csv` (any case) enables export; everything else leaves it off
    pub fn parse(value: Option<&str>) -> Option<Self> {
        match value {
            Some(v) if v.eq_ignore_ascii_case("csv") => Some(ExportFormat::Csv),
            _ => None,
        }
    }
}

/// Writes rows as comma separated values
pub struct CsvWriter<W: Write> {
    inner: W,
}

impl<W: Write> CsvWriter<W> {
    /// Writes the header line straight away
    pub fn new(mut inner: W) -> io::Result<Self> {
        write_record(&mut inner, &CSV_HEADER)?;
        Ok(CsvWriter { inner })
    }

    pub fn write_row(&mut self, row: &NormalizedRow) -> io::Result<()> {
        write_record(&mut self.inner, &row.fields())
    }

    /// Flushes and hands back the underlying writer
    pub fn finish(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

fn write_record<W: Write>(out: &mut W, fields: &[&str]) -> io::Result<()> {
    let line: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
    writeln!(out, "{}", line.join(","))
}

/// Quotes a field when it contains a separator, quote or line break
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// The export file of a run
pub struct CsvExporter {
    path: PathBuf,
    writer: CsvWriter<BufWriter<File>>,
}

impl CsvExporter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, ScanError> {
        let path = path.as_ref().to_path_buf();
        let export_error = |source| ScanError::Export {
            path: path.clone(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(export_error)?;
        }
        let file = File::create(&path).map_err(export_error)?;
        let writer = CsvWriter::new(BufWriter::new(file)).map_err(export_error)?;
        tracing::debug!(path = %path.display(), "export opened");

        Ok(CsvExporter { path, writer })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Per-status row counts of a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportTotals {
    pub rows: usize,
    pub by_status: BTreeMap<&'static str, usize>,
}

impl ReportTotals {
    pub fn count(&self, status: Status) -> usize {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }
}

/// Sends every row to the console and, when enabled, to the export file.
///
/// Console lines are flushed one by one. The export file is opened before
/// the first row and closed exactly once by [`Reporter::finish`]. The two
/// sinks fail independently: a broken console does not stop the export and
/// a broken export does not stop the console.
pub struct Reporter<W: Write> {
    console: W,
    colored: bool,
    exporter: Option<CsvExporter>,
    console_error: Option<io::Error>,
    export_error: Option<io::Error>,
    totals: ReportTotals,
}

/// What is left once a reporter is closed
#[derive(Debug)]
pub struct ReportClose<W> {
    pub totals: ReportTotals,
    pub console: W,
    /// Sink failures of the run: console first, then export
    pub errors: Vec<ScanError>,
}

impl Reporter<Stdout> {
    pub fn stdout(exporter: Option<CsvExporter>) -> Self {
        Reporter::new(io::stdout(), crate::output::Output::colors_enabled(), exporter)
    }
}

impl<W: Write> Reporter<W> {
    pub fn new(console: W, colored: bool, exporter: Option<CsvExporter>) -> Self {
        Reporter {
            console,
            colored,
            exporter,
            console_error: None,
            export_error: None,
            totals: ReportTotals::default(),
        }
    }

    /// Reports one row.
    ///
    /// The first error of each sink is kept for [`Reporter::finish`] and
    /// that sink is skipped from then on.
    pub fn emit(&mut self, row: &NormalizedRow) {
        self.totals.rows += 1;
        *self.totals.by_status.entry(row.status.as_str()).or_insert(0) += 1;

        if self.console_error.is_none() {
            if let Err(e) = self.write_console(row) {
                tracing::warn!(error = %e, "console write failed; console output stopped");
                self.console_error = Some(e);
            }
        }

        if self.export_error.is_none() {
            if let Some(exporter) = self.exporter.as_mut() {
                if let Err(e) = exporter.writer.write_row(row) {
                    tracing::warn!(path = %exporter.path.display(), error = %e, "export write failed; export disabled for the rest of the run");
                    self.export_error = Some(e);
                }
            }
        }
    }

    fn write_console(&mut self, row: &NormalizedRow) -> io::Result<()> {
        let status = if self.colored {
            paint(row.status)
        } else {
            row.status.as_str().to_string()
        };
        writeln!(
            self.console,
            "{}\t{}\t{}\t{}\t\t{}\t{}",
            row.category, row.title, row.resource, row.region, status, row.message
        )?;
        self.console.flush()
    }

    pub fn export_path(&self) -> Option<&Path> {
        self.exporter.as_ref().map(|e| e.path())
    }

    /// Closes the export and hands back totals, console and sink errors
    pub fn finish(mut self) -> ReportClose<W> {
        let mut errors = Vec::new();

        if self.console_error.is_none() {
            self.console_error = self.console.flush().err();
        }
        if let Some(e) = self.console_error.take() {
            errors.push(ScanError::Console(e));
        }

        if let Some(exporter) = self.exporter.take() {
            let CsvExporter { path, writer } = exporter;
            let closed = match self.export_error.take() {
                Some(e) => Err(e),
                None => writer.finish().map(drop),
            };
            match closed {
                Ok(()) => tracing::debug!(path = %path.display(), "export closed"),
                Err(source) => errors.push(ScanError::Export { path, source }),
            }
        }

        ReportClose {
            totals: self.totals,
            console: self.console,
            errors,
        }
    }
}

fn paint(status: Status) -> String {
    let word = status.as_str();
    match status {
        Status::Ok => word.green().to_string(),
        Status::Warn => word.yellow().to_string(),
        Status::Fail => word.red().bold().to_string(),
        Status::Unknown => word.magenta().to_string(),
    }
}
