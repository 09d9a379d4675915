//! Error types for ollama-bench-core
//!
//! Per-request failures are never represented here: they are data, carried by
//! [`Outcome`](crate::response::Outcome) inside each result record. `BenchError`
//! covers the conditions that stop a batch or sweep before it starts.

use crate::config::ConfigError;
use crate::traits::ClientError;
use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum BenchError {
    /// Invalid configuration, rejected before any request is sent
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The batch-scoped client could not be created
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    /// Batch or sweep coordination failed
    #[error("orchestration error: {0}")]
    Orchestration(String),

    /// Reading a configuration file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BenchError {
    /// Create an orchestration error
    pub fn orchestration(message: impl Into<String>) -> Self {
        BenchError::Orchestration(message.into())
    }

    /// Check whether this error was caused by invalid configuration
    pub fn is_config(&self) -> bool {
        matches!(self, BenchError::Config(_))
    }
}

/// Result type alias
pub type BenchResult<T> = std::result::Result<T, BenchError>;
