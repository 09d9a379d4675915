//! Batch and sweep orchestration
//!
//! The [`BatchRunner`] coordinates one batch:
//! - Validates the configuration before anything is sent
//! - Builds a batch-scoped client through the [`ClientFactory`](crate::traits::ClientFactory)
//! - Spawns every request at once behind a semaphore admission gate
//! - Drains the record channel and summarizes the records
//!
//! The [`SweepController`] repeats that across ascending concurrency levels
//! and reports where quality first degraded.
//!
//! # Example
//!
//! ```ignore
//! use ollama_bench_core::{BatchRunnerBuilder, SweepConfig, SweepController};
//!
//! let runner = BatchRunnerBuilder::new()
//!     .factory(Arc::new(OllamaClientFactory::new()))
//!     .build()?;
//!
//! let mut sweep = SweepController::new(runner, SweepConfig::default());
//! let result = sweep.run(&config).await?;
//! println!("{}", result.verdict());
//! ```

mod aggregator;
mod builder;
mod executor;
mod sweep;

pub use aggregator::collect_records;
pub use builder::BatchRunnerBuilder;
pub use executor::{BatchReport, BatchRunner};
pub use sweep::{level_ok, SweepController, SweepResult, SweepState};

#[cfg(test)]
mod tests;
