//! Report Module
//! Console diagnostics and the JSON summary written next to the charts.

use crate::data::{CleanReport, DataLoader};
use crate::stats::{format_count, Insights, SnapshotRow};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything the run produced, as persisted in `summary.json`.
#[derive(Debug, Serialize)]
pub struct AnalysisSummary<'a> {
    pub input: &'a Path,
    pub countries: &'a [String],
    pub rows_loaded: usize,
    pub rows_dropped: usize,
    pub rows_analysed: usize,
    pub snapshot: &'a [SnapshotRow],
    pub insights: &'a Insights,
    pub charts: &'a [PathBuf],
}

/// Writes the human-readable parts of the analysis.
pub struct ConsoleReport;

impl ConsoleReport {
    /// Column list, sample rows and missing-value counts of the raw file.
    pub fn write_overview<W: Write>(
        out: &mut W,
        loader: &DataLoader,
        head_rows: usize,
    ) -> io::Result<()> {
        writeln!(out, "Columns: {:?}", loader.get_columns())?;
        if let Some(path) = loader.get_file_path() {
            writeln!(out, "Source: {}", path.display())?;
        }
        writeln!(out, "Rows: {}", loader.get_row_count())?;
        if let Some(head) = loader.head(head_rows) {
            writeln!(out, "\nSample Data:\n{}", head)?;
        }

        writeln!(out, "\nMissing Values:")?;
        let counts = loader.null_counts();
        let width = counts.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
        for (name, count) in &counts {
            writeln!(out, "{:<width$} {:>8}", name, count, width = width)?;
        }
        Ok(())
    }

    pub fn write_cleaning<W: Write>(out: &mut W, report: &CleanReport) -> io::Result<()> {
        writeln!(
            out,
            "\nCleaning: {} rows in, {} dropped for missing date or location",
            report.rows_in, report.rows_dropped
        )?;
        for (column, filled) in &report.filled {
            writeln!(out, "  forward-filled {:>8} values in {}", filled, column)?;
        }
        Ok(())
    }

    /// Latest row per country.
    pub fn write_snapshot<W: Write>(out: &mut W, snapshot: &[SnapshotRow]) -> io::Result<()> {
        writeln!(out, "\nLatest snapshot:")?;
        writeln!(
            out,
            "{:<16} {:<10} {:>14} {:>12} {:>16} {:>10}",
            "location", "date", "total_cases", "total_deaths", "vaccinations", "% vacc"
        )?;
        for row in snapshot {
            let r = &row.record;
            writeln!(
                out,
                "{:<16} {:<10} {:>14} {:>12} {:>16} {:>10}",
                r.location,
                r.date,
                format_count(r.total_cases),
                format_count(r.total_deaths),
                format_count(r.total_vaccinations),
                format_pct(row.vaccinated_pct)
            )?;
        }
        Ok(())
    }

    pub fn write_insights<W: Write>(out: &mut W, insights: &Insights) -> io::Result<()> {
        writeln!(out, "\nKey Insights:")?;
        for (i, line) in insights.lines().iter().enumerate() {
            writeln!(out, "{}. {}", i + 1, line)?;
        }
        Ok(())
    }
}

fn format_pct(value: f64) -> String {
    if value.is_finite() {
        format!("{:.1}%", value)
    } else {
        "n/a".to_string()
    }
}

/// Persist the summary as pretty-printed JSON.
pub fn write_summary(path: &Path, summary: &AnalysisSummary<'_>) -> Result<(), ReportError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    info!(path = %path.display(), "Summary written");
    Ok(())
}
