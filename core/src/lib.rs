//! ollama-bench-core: Request dispatch, statistics and sweep logic
//!
//! This crate provides the transport-independent parts of ollama-bench,
//! including:
//!
//! - Configuration and validation
//! - Wire types for the generation endpoint and per-request result records
//! - Core traits (GenerateClient, ClientFactory, BatchObserver)
//! - Request execution behind a semaphore admission gate
//! - Batch statistics and the concurrency sweep
//! - Error handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod config;
pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod request;
pub mod response;
pub mod traits;
pub mod worker;

pub use channel::ChannelConfig;
pub use config::*;
pub use error::*;
pub use metrics::*;
pub use orchestrator::{
    BatchReport, BatchRunner, BatchRunnerBuilder, SweepController, SweepResult, SweepState,
};
pub use request::*;
pub use response::*;
pub use traits::*;
pub use worker::{BatchProgress, RequestExecutor, RequestExecutorBuilder};
