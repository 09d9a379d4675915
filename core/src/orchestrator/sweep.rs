//! Concurrency sweep
//!
//! Runs one batch per concurrency level, strictly in order, and reports the
//! first level at which service quality fell outside the thresholds. Every
//! level runs even after a degradation has been seen.

use serde::Serialize;

use crate::config::{DegradationThresholds, RequestConfig, SweepConfig};
use crate::error::BenchResult;
use crate::metrics::BatchSummary;

use super::executor::BatchRunner;

/// Lifecycle of a sweep
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    /// Waiting to run the level at this index
    Pending {
        /// Index of the next level
        next: usize,
    },
    /// A batch is running at this concurrency
    Running {
        /// Concurrency level
        level: usize,
    },
    /// The batch at this concurrency finished
    LevelComplete {
        /// Concurrency level
        level: usize,
        /// Whether the level stayed within the thresholds
        ok: bool,
    },
    /// Every level has run
    Complete,
}

/// Outcome of a sweep
#[derive(Debug, Clone, Serialize)]
pub struct SweepResult {
    /// One summary per level, in plan order
    pub summaries: Vec<BatchSummary>,

    /// First concurrency level that was not OK
    pub first_degraded: Option<usize>,
}

impl SweepResult {
    /// Human-readable verdict
    pub fn verdict(&self) -> String {
        match self.first_degraded {
            Some(level) => format!(
                "Performance degrades starting from >= {level} concurrent requests."
            ),
            None => "No degradation detected within tested range.".to_string(),
        }
    }
}

/// Whether a batch stayed within the thresholds
///
/// A missing p95 counts as not OK: too few successes to judge the tail.
pub fn level_ok(summary: &BatchSummary, thresholds: &DegradationThresholds) -> bool {
    summary
        .p95_latency
        .is_some_and(|p95| p95 < thresholds.latency_secs)
        && summary.error_rate < thresholds.error_rate
}

/// Drives a [`BatchRunner`] across a sweep plan
#[derive(Debug)]
pub struct SweepController {
    runner: BatchRunner,
    plan: SweepConfig,
    state: SweepState,
}

impl SweepController {
    /// Create a controller for the given plan
    pub fn new(runner: BatchRunner, plan: SweepConfig) -> Self {
        Self {
            runner,
            plan,
            state: SweepState::Pending { next: 0 },
        }
    }

    /// Current state
    pub fn state(&self) -> SweepState {
        self.state
    }

    /// Run every level of the plan
    ///
    /// `base` supplies everything but the concurrency, which each level
    /// overrides. Configuration is validated before the first request.
    pub async fn run(&mut self, base: &RequestConfig) -> BenchResult<SweepResult> {
        self.plan.validate()?;
        base.at_concurrency(self.plan.levels[0]).validate()?;

        let levels = self.plan.levels.clone();
        let mut summaries = Vec::with_capacity(levels.len());
        let mut first_degraded = None;

        tracing::info!(
            levels = ?levels,
            requests = base.requests,
            latency_threshold = self.plan.thresholds.latency_secs,
            error_threshold = self.plan.thresholds.error_rate,
            "Starting sweep"
        );

        for (index, &level) in levels.iter().enumerate() {
            self.state = SweepState::Running { level };

            let report = self.runner.run(&base.at_concurrency(level)).await?;
            let ok = level_ok(&report.summary, &self.plan.thresholds);
            self.state = SweepState::LevelComplete { level, ok };

            if !ok && first_degraded.is_none() {
                tracing::info!(concurrency = level, "First degraded level");
                first_degraded = Some(level);
            }
            if let Some(observer) = self.runner.observer() {
                observer.on_level_complete(&report.summary, ok);
            }
            summaries.push(report.summary);

            if index + 1 < levels.len() {
                self.state = SweepState::Pending { next: index + 1 };
            }
        }

        self.state = SweepState::Complete;
        tracing::info!(first_degraded = ?first_degraded, "Sweep completed");

        Ok(SweepResult {
            summaries,
            first_degraded,
        })
    }
}
