//! Single-request execution

use crate::error::{BenchError, BenchResult};
use crate::request::{GenerateRequest, RequestId};
use crate::response::{GenerateReply, ResultRecord};
use crate::traits::{ClientError, GenerateClient, HttpReply};

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Semaphore};

/// Executes one generation request under the shared admission gate
///
/// Every request of a batch gets its own clone; all clones share the client,
/// the gate, the request body and the record channel. Each call produces
/// exactly one [`ResultRecord`]: failures are recorded, never raised.
#[derive(Clone)]
pub struct RequestExecutor {
    /// Batch-scoped client
    client: Arc<dyn GenerateClient>,

    /// Admission gate bounding in-flight requests
    gate: Arc<Semaphore>,

    /// Request body, identical for every request of the batch
    request: Arc<GenerateRequest>,

    /// Shared record collection
    records_tx: mpsc::Sender<ResultRecord>,
}

impl RequestExecutor {
    /// Create a new executor
    ///
    /// Use `RequestExecutorBuilder` for a more ergonomic construction.
    pub fn new(
        client: Arc<dyn GenerateClient>,
        gate: Arc<Semaphore>,
        request: Arc<GenerateRequest>,
        records_tx: mpsc::Sender<ResultRecord>,
    ) -> Self {
        Self {
            client,
            gate,
            request,
            records_tx,
        }
    }

    /// Execute the request and append its record to the collection
    ///
    /// Only fails when the record collection has been closed.
    pub async fn run(self, id: RequestId) -> BenchResult<()> {
        let record = self.execute(id).await;
        self.records_tx
            .send(record)
            .await
            .map_err(|_| BenchError::orchestration(format!("record channel closed before request {id}")))
    }

    /// Execute the request and return its record
    ///
    /// The latency clock starts before the gate is acquired, so time spent
    /// queued behind other requests counts toward the measured latency.
    pub async fn execute(&self, id: RequestId) -> ResultRecord {
        let start = Instant::now();

        let _permit = match self.gate.acquire().await {
            Ok(permit) => permit,
            Err(_) => {
                return ResultRecord::exception(
                    id,
                    start.elapsed().as_secs_f64(),
                    "admission gate closed",
                )
            }
        };

        let result = self.client.generate(&self.request).await;
        let latency_secs = start.elapsed().as_secs_f64();

        let record = classify(id, latency_secs, result);
        tracing::trace!(
            request_id = %id,
            outcome = %record.outcome,
            status = ?record.status,
            latency_secs,
            "Request finished"
        );
        record
    }

    /// Get the client identifier
    pub fn client_name(&self) -> &str {
        self.client.client_name()
    }
}

/// Turn a raw client result into a record
///
/// - 200 with a parseable body: success, carrying the server counters
/// - 200 with an unparseable body: exception
/// - any other status: HTTP error with the leading part of the body
/// - transport failure: exception with the error text
pub fn classify(
    id: RequestId,
    latency_secs: f64,
    result: Result<HttpReply, ClientError>,
) -> ResultRecord {
    match result {
        Ok(reply) if reply.status == 200 => match GenerateReply::parse(&reply.body) {
            Ok(parsed) => ResultRecord::success(id, latency_secs, parsed),
            Err(e) => ResultRecord::exception(
                id,
                latency_secs,
                &format!("malformed response body: {e}"),
            ),
        },
        Ok(reply) => ResultRecord::http_error(id, latency_secs, reply.status, &reply.body),
        Err(e) => ResultRecord::exception(id, latency_secs, &e.to_string()),
    }
}

impl std::fmt::Debug for RequestExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("client", &self.client.client_name())
            .field("model", &self.request.model)
            .field("available_permits", &self.gate.available_permits())
            .finish()
    }
}
