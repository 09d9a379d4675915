//! Statistics aggregation and percentile calculation
//!
//! Everything here is a pure function of a record slice: the input is never
//! mutated and record order does not affect any result.

use crate::config::RequestConfig;
use crate::response::ResultRecord;
use serde::{Deserialize, Serialize};

/// Minimum successful samples before p95 is reported
pub const P95_MIN_SAMPLES: usize = 100;

/// Latency statistics over one batch's records
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Number of records
    pub total_requests: usize,

    /// Number of successful records
    pub successful_requests: usize,

    /// Median latency of successful requests (seconds)
    pub p50_latency: Option<f64>,

    /// 95th percentile latency of successful requests (seconds)
    pub p95_latency: Option<f64>,

    /// Error rate (0.0 - 1.0)
    pub error_rate: f64,

    /// Requests per second over the batch wall-clock time
    pub requests_per_second: f64,
}

impl BatchStats {
    /// Compute statistics from result records and the batch's elapsed seconds
    pub fn from_records(records: &[ResultRecord], elapsed_secs: f64) -> Self {
        let mut latencies: Vec<f64> = records
            .iter()
            .filter(|r| r.is_success())
            .map(|r| r.latency_secs)
            .collect();
        latencies.sort_by(|a, b| a.total_cmp(b));

        let total_requests = records.len();
        let successful_requests = latencies.len();

        let p50_latency = median(&latencies);
        let p95_latency = if successful_requests >= P95_MIN_SAMPLES {
            quantile_exclusive(&latencies, 100, 95)
        } else {
            None
        };

        let error_rate = if total_requests > 0 {
            1.0 - successful_requests as f64 / total_requests as f64
        } else {
            1.0
        };

        let requests_per_second = if elapsed_secs > 0.0 {
            total_requests as f64 / elapsed_secs
        } else {
            0.0
        };

        Self {
            total_requests,
            successful_requests,
            p50_latency,
            p95_latency,
            error_rate,
            requests_per_second,
        }
    }

    /// Number of failed records
    pub fn failed_requests(&self) -> usize {
        self.total_requests - self.successful_requests
    }
}

/// Summary of one batch, one row of the sweep table
///
/// Field names are the column names of the summary CSV and must stay stable
/// so that appended sweep rows line up across invocations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// UTC completion time, ISO-8601 with second precision
    pub timestamp: String,
    /// Model identifier
    pub model: String,
    /// Server base URL
    pub host: String,
    /// Concurrency limit
    pub concurrency: usize,
    /// Configured request count
    pub requests: usize,
    /// Prompt length in characters
    pub prompt_len: usize,
    /// Output token cap
    pub tokens: u32,
    /// Median latency of successful requests (seconds)
    pub p50_latency: Option<f64>,
    /// 95th percentile latency, present only with enough successes (seconds)
    pub p95_latency: Option<f64>,
    /// Requests per second
    pub rps: f64,
    /// Error rate (0.0 - 1.0)
    pub error_rate: f64,
    /// Batch wall-clock duration (seconds)
    pub total_time: f64,
}

impl BatchSummary {
    /// Build a summary stamped with the current UTC time
    pub fn new(config: &RequestConfig, stats: &BatchStats, elapsed_secs: f64) -> Self {
        let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        Self::with_timestamp(config, stats, elapsed_secs, timestamp)
    }

    /// Build a summary with an explicit timestamp
    pub fn with_timestamp(
        config: &RequestConfig,
        stats: &BatchStats,
        elapsed_secs: f64,
        timestamp: String,
    ) -> Self {
        Self {
            timestamp,
            model: config.model.clone(),
            host: config.host.clone(),
            concurrency: config.concurrency,
            requests: config.requests,
            prompt_len: config.prompt_len(),
            tokens: config.max_tokens,
            p50_latency: stats.p50_latency,
            p95_latency: stats.p95_latency,
            rps: stats.requests_per_second,
            error_rate: stats.error_rate,
            total_time: elapsed_secs,
        }
    }
}

/// Median of sorted values; the mean of the middle pair for even lengths
pub fn median(sorted: &[f64]) -> Option<f64> {
    let len = sorted.len();
    if len == 0 {
        return None;
    }
    let mid = len / 2;
    if len % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Cut point `k` of `n` equal-probability divisions, exclusive rank method
///
/// Uses rank `k·(m+1)/n` over the sorted sample of size `m`, interpolating
/// between neighbours with exact integer arithmetic for the position. Returns
/// `None` for fewer than two samples or `k` outside `1..n`.
pub fn quantile_exclusive(sorted: &[f64], n: usize, k: usize) -> Option<f64> {
    let len = sorted.len();
    if len < 2 || n < 2 || k == 0 || k >= n {
        return None;
    }

    let m = len + 1;
    let j = (k * m / n).clamp(1, len - 1);
    // k·m − j·n can go negative or exceed n once j has been clamped
    let delta = (k * m) as f64 - (j * n) as f64;
    let n = n as f64;

    Some((sorted[j - 1] * (n - delta) + sorted[j] * delta) / n)
}

// ============================================================================
// Descriptive statistics (offline analysis of detail files)
// ============================================================================

/// Descriptive statistics of a sample
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct LatencyPercentiles {
    /// Number of values
    pub count: usize,
    /// Mean value
    pub mean: f64,
    /// Sample standard deviation
    pub stddev: f64,
    /// Minimum value
    pub min: f64,
    /// 50th percentile (median)
    pub p50: f64,
    /// 95th percentile
    pub p95: f64,
    /// Maximum value
    pub max: f64,
}

impl LatencyPercentiles {
    /// Calculate descriptive statistics from a slice of values
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let mut sorted: Vec<f64> = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let len = sorted.len();
        let mean = sorted.iter().sum::<f64>() / len as f64;

        let variance = if len > 1 {
            sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (len - 1) as f64
        } else {
            0.0
        };

        Self {
            count: len,
            mean,
            stddev: variance.sqrt(),
            min: sorted[0],
            p50: percentile(&sorted, 0.50),
            p95: percentile(&sorted, 0.95),
            max: sorted[len - 1],
        }
    }
}

/// Calculate percentile from sorted values using linear interpolation
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0];
    }

    let idx = p * (sorted.len() - 1) as f64;
    let lower = idx.floor() as usize;
    let upper = idx.ceil() as usize;
    let frac = idx - lower as f64;

    if upper >= sorted.len() {
        sorted[sorted.len() - 1]
    } else {
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}
