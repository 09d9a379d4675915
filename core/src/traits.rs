//! Core traits for generation clients
//!
//! These traits are defined in core so the executor can be driven by any
//! transport. The HTTP implementation lives in the vendors crate.

use crate::config::RequestConfig;
use crate::metrics::BatchSummary;
use crate::request::GenerateRequest;
use crate::response::ResultRecord;
use crate::worker::BatchProgress;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Generate Client Trait
// ============================================================================

/// Raw HTTP response: status plus the fully read body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// HTTP status code
    pub status: u16,
    /// Response body text
    pub body: String,
}

impl HttpReply {
    /// Create a reply
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Sends one generation request and returns the raw reply
///
/// Implementations only move bytes. Status classification and body parsing
/// happen in the executor, so every transport is judged the same way.
#[async_trait]
pub trait GenerateClient: Send + Sync {
    /// Client identifier (e.g., "ollama")
    fn client_name(&self) -> &str;

    /// Send the request and read the whole response body
    async fn generate(&self, request: &GenerateRequest) -> Result<HttpReply, ClientError>;
}

/// Creates one client per batch
///
/// Connection pools are scoped to a single batch: the runner asks for a fresh
/// client at batch start and drops it when the batch completes.
pub trait ClientFactory: Send + Sync {
    /// Build a client for the given batch configuration
    fn create(&self, config: &RequestConfig) -> Result<Arc<dyn GenerateClient>, ClientError>;
}

// ============================================================================
// Progress Observer Trait
// ============================================================================

/// Receives progress callbacks from the batch runner and sweep controller
///
/// All methods default to no-ops. Callbacks run on the runner's task while it
/// drains the record collection, so implementations must not block.
pub trait BatchObserver: Send + Sync {
    /// A batch is about to dispatch its requests
    fn on_batch_start(&self, _config: &RequestConfig) {}

    /// A record arrived in the collection
    fn on_record(&self, _record: &ResultRecord, _progress: &BatchProgress) {}

    /// A batch finished and was summarized
    fn on_batch_end(&self, _summary: &BatchSummary) {}

    /// A sweep level finished; `ok` is false when the level degraded
    fn on_level_complete(&self, _summary: &BatchSummary, _ok: bool) {}
}

// ============================================================================
// Client Errors
// ============================================================================

/// Transport-level failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Connection refused, DNS failure, reset, protocol error
    #[error("transport error: {0}")]
    Transport(String),

    /// Per-request timeout elapsed
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Response body could not be read
    #[error("failed to read response body: {0}")]
    Body(String),

    /// Client could not be constructed
    #[error("failed to build client: {0}")]
    Build(String),
}
