//! Running batch progress

use crate::response::ResultRecord;

/// Counters updated as records arrive in the collection
///
/// This is a live view for progress reporting; the batch summary is always
/// computed from the full record set.
#[derive(Debug, Clone)]
pub struct BatchProgress {
    /// Number of requests the batch will dispatch
    pub expected: usize,

    /// Records with a success outcome
    pub succeeded: usize,

    /// Records with any failure outcome
    pub failed: usize,

    /// Output tokens reported by successful requests
    pub output_tokens: u64,
}

impl BatchProgress {
    /// Start tracking a batch of `expected` requests
    pub fn new(expected: usize) -> Self {
        Self {
            expected,
            succeeded: 0,
            failed: 0,
            output_tokens: 0,
        }
    }

    /// Count one record
    pub fn record(&mut self, record: &ResultRecord) {
        if record.is_success() {
            self.succeeded += 1;
            self.output_tokens += record.tokens.unwrap_or(0);
        } else {
            self.failed += 1;
        }
    }

    /// Number of records seen so far
    pub fn completed(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Error rate over the records seen so far (0.0 - 1.0)
    pub fn error_rate(&self) -> f64 {
        match self.completed() {
            0 => 0.0,
            n => self.failed as f64 / n as f64,
        }
    }
}
