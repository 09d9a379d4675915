//! Offline analysis of detail files

use ollama_bench_core::LatencyPercentiles;

use crate::csv_export::DetailRow;
use crate::error::{ReportError, ReportResult};

/// Descriptive statistics for each numeric column of a detail file
#[derive(Debug, Clone, PartialEq)]
pub struct DetailAnalysis {
    /// Number of rows read
    pub rows: usize,
    /// Rows with a success outcome
    pub successes: usize,
    /// Per-column statistics, in column order; columns with no values are omitted
    pub columns: Vec<(&'static str, LatencyPercentiles)>,
}

impl DetailAnalysis {
    /// Describe the latency, total_duration and tokens columns
    ///
    /// Latency covers every row; the server-reported columns only exist for
    /// successful requests.
    pub fn from_rows(rows: &[DetailRow]) -> ReportResult<Self> {
        if rows.is_empty() {
            return Err(ReportError::Empty("detail file has no rows".into()));
        }

        let latency: Vec<f64> = rows.iter().map(|r| r.latency).collect();
        let total_duration: Vec<f64> = rows.iter().filter_map(|r| r.total_duration).collect();
        let tokens: Vec<f64> = rows
            .iter()
            .filter_map(|r| r.tokens)
            .map(|t| t as f64)
            .collect();

        let columns = [
            ("latency", latency),
            ("total_duration", total_duration),
            ("tokens", tokens),
        ]
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(name, values)| (name, LatencyPercentiles::from_values(&values)))
        .collect();

        Ok(Self {
            rows: rows.len(),
            successes: rows.iter().filter(|r| r.outcome.is_success()).count(),
            columns,
        })
    }

    /// Latency values of the given rows
    pub fn latencies(rows: &[DetailRow]) -> Vec<f64> {
        rows.iter().map(|r| r.latency).collect()
    }

    /// Render as a statistics-by-column table
    pub fn render(&self) -> String {
        let mut out = format!("{:<8}", "");
        for (name, _) in &self.columns {
            out.push_str(&format!("{name:>16}"));
        }
        out.push('\n');

        let rows: [(&str, fn(&LatencyPercentiles) -> f64); 7] = [
            ("count", |s| s.count as f64),
            ("mean", |s| s.mean),
            ("std", |s| s.stddev),
            ("min", |s| s.min),
            ("50%", |s| s.p50),
            ("95%", |s| s.p95),
            ("max", |s| s.max),
        ];
        for (label, value) in rows {
            out.push_str(&format!("{label:<8}"));
            for (_, stats) in &self.columns {
                out.push_str(&format!("{:>16.6}", value(stats)));
            }
            out.push('\n');
        }

        out.push_str(&format!(
            "\n{} rows, {} successful ({:.1}% errors)\n",
            self.rows,
            self.successes,
            100.0 * (1.0 - self.successes as f64 / self.rows as f64)
        ));
        out
    }
}
