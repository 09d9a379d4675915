//! Builder pattern for RequestExecutor construction

use crate::config::ConfigError;
use crate::error::BenchResult;
use crate::request::GenerateRequest;
use crate::response::ResultRecord;
use crate::traits::GenerateClient;

use super::executor::RequestExecutor;

use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

/// Builder for creating RequestExecutor instances
///
/// # Example
/// ```ignore
/// let executor = RequestExecutorBuilder::new()
///     .client(client)
///     .gate(Arc::new(Semaphore::new(8)))
///     .request(GenerateRequest::from_config(&config))
///     .records_tx(tx)
///     .build()?;
/// ```
#[derive(Default)]
pub struct RequestExecutorBuilder {
    client: Option<Arc<dyn GenerateClient>>,
    gate: Option<Arc<Semaphore>>,
    request: Option<Arc<GenerateRequest>>,
    records_tx: Option<mpsc::Sender<ResultRecord>>,
}

impl RequestExecutorBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the generation client
    pub fn client(mut self, client: Arc<dyn GenerateClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Set the admission gate
    pub fn gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Set the request body
    pub fn request(mut self, request: GenerateRequest) -> Self {
        self.request = Some(Arc::new(request));
        self
    }

    /// Set the record channel sender
    pub fn records_tx(mut self, tx: mpsc::Sender<ResultRecord>) -> Self {
        self.records_tx = Some(tx);
        self
    }

    /// Build the RequestExecutor
    ///
    /// # Errors
    /// Returns an error if any required field is missing.
    pub fn build(self) -> BenchResult<RequestExecutor> {
        let client = self.client.ok_or(ConfigError::MissingField("client"))?;
        let gate = self.gate.ok_or(ConfigError::MissingField("gate"))?;
        let request = self.request.ok_or(ConfigError::MissingField("request"))?;
        let records_tx = self
            .records_tx
            .ok_or(ConfigError::MissingField("records_tx"))?;

        Ok(RequestExecutor::new(client, gate, request, records_tx))
    }
}
