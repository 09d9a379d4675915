//! CSV export functionality

use std::fs::OpenOptions;
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use ollama_bench_core::{BatchSummary, Outcome, ResultRecord};
use serde::{Deserialize, Serialize};

use crate::error::ReportResult;

/// Column names of the per-request detail file
pub const DETAIL_COLUMNS: [&str; 6] = [
    "latency",
    "outcome",
    "status",
    "error",
    "total_duration",
    "tokens",
];

/// Column names of the sweep summary file
pub const SUMMARY_COLUMNS: [&str; 12] = [
    "timestamp",
    "model",
    "host",
    "concurrency",
    "requests",
    "prompt_len",
    "tokens",
    "p50_latency",
    "p95_latency",
    "rps",
    "error_rate",
    "total_time",
];

/// One row of the detail file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailRow {
    /// Request latency in seconds
    pub latency: f64,
    /// Outcome classification
    pub outcome: Outcome,
    /// HTTP status, empty for transport failures
    pub status: Option<u16>,
    /// Diagnostic text for failures
    pub error: Option<String>,
    /// Server-reported generation time in seconds
    pub total_duration: Option<f64>,
    /// Server-reported output tokens
    pub tokens: Option<u64>,
}

impl From<&ResultRecord> for DetailRow {
    fn from(record: &ResultRecord) -> Self {
        Self {
            latency: record.latency_secs,
            outcome: record.outcome,
            status: record.status,
            error: record.error.clone(),
            total_duration: record.total_duration_secs,
            tokens: record.tokens,
        }
    }
}

/// Write one row per record, replacing any existing file
pub fn write_detail_csv(path: impl AsRef<Path>, records: &[ResultRecord]) -> ReportResult<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new().has_headers(false).from_path(path)?;

    wtr.write_record(DETAIL_COLUMNS)?;
    for record in records {
        wtr.serialize(DetailRow::from(record))?;
    }

    wtr.flush()?;
    tracing::debug!(path = %path.display(), rows = records.len(), "Wrote detail CSV");
    Ok(())
}

/// Read a detail file written by [`write_detail_csv`]
pub fn read_detail_csv(path: impl AsRef<Path>) -> ReportResult<Vec<DetailRow>> {
    let mut rdr = ReaderBuilder::new().from_path(path)?;
    let rows = rdr.deserialize().collect::<Result<Vec<DetailRow>, _>>()?;
    Ok(rows)
}

/// Append summary rows, writing the header only when the file is new or empty
///
/// Returns whether a header was written.
pub fn append_sweep_csv(path: impl AsRef<Path>, summaries: &[BatchSummary]) -> ReportResult<bool> {
    let path = path.as_ref();
    let new_file = match std::fs::metadata(path) {
        Ok(meta) => meta.len() == 0,
        Err(_) => true,
    };

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);

    if new_file {
        wtr.write_record(SUMMARY_COLUMNS)?;
    }
    for summary in summaries {
        wtr.serialize(summary)?;
    }

    wtr.flush()?;
    tracing::debug!(
        path = %path.display(),
        rows = summaries.len(),
        header = new_file,
        "Appended sweep CSV"
    );
    Ok(new_file)
}

/// Read a sweep summary file
pub fn read_sweep_csv(path: impl AsRef<Path>) -> ReportResult<Vec<BatchSummary>> {
    let mut rdr = ReaderBuilder::new().from_path(path)?;
    let rows = rdr.deserialize().collect::<Result<Vec<BatchSummary>, _>>()?;
    Ok(rows)
}
