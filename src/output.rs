use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::data::model::Table;
use crate::model::metrics::MetricsReport;
use crate::preprocess::resample::TimeSeries;

// ---------------------------------------------------------------------------
// Output directory
// ---------------------------------------------------------------------------

/// Create the output directory (and parents) if needed.
pub fn prepare_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))
}

// ---------------------------------------------------------------------------
// Writers
//
// Every writer truncates: a rerun replaces the same named files.
// ---------------------------------------------------------------------------

/// Write a table back to CSV with its header.
pub fn write_table_csv(path: &Path, table: &Table) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(table.column_names())?;
    for row in table.rows() {
        writer.write_record(row.iter().map(|v| v.to_string()))?;
    }
    writer.flush()?;
    log::info!("Saved {} rows to {}", table.n_rows(), path.display());
    Ok(())
}

/// `date,<value_name>` with ISO dates; empty buckets become empty cells.
pub fn write_series_csv(path: &Path, series: &TimeSeries, value_name: &str) -> Result<()> {
    write_wide_series_csv(path, &[(value_name.to_string(), series)])
}

/// One `date` column followed by one column per series, aligned on date.
pub fn write_wide_series_csv(path: &Path, series: &[(String, &TimeSeries)]) -> Result<()> {
    let mut dates: Vec<_> = series
        .iter()
        .flat_map(|(_, s)| s.points.iter().map(|(d, _)| *d))
        .collect();
    dates.sort();
    dates.dedup();

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(std::iter::once("date").chain(series.iter().map(|(n, _)| n.as_str())))?;
    for date in &dates {
        let mut record = vec![date.format("%Y-%m-%d").to_string()];
        for (_, s) in series {
            let cell = s
                .points
                .iter()
                .find(|(d, _)| d == date)
                .and_then(|(_, v)| *v)
                .map(|v| v.to_string())
                .unwrap_or_default();
            record.push(cell);
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    log::info!("Saved {} dated rows to {}", dates.len(), path.display());
    Ok(())
}

pub fn write_metrics(path: &Path, report: &MetricsReport) -> Result<()> {
    std::fs::write(path, report.to_text())
        .with_context(|| format!("writing metrics {}", path.display()))?;
    log::info!("Saved metrics to {}", path.display());
    Ok(())
}

/// Serialize a value (typically a fitted model) as pretty JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serializing to JSON")?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Saved {}", path.display());
    Ok(())
}

/// Read back what [`write_json`] produced.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}
