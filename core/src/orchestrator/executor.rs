//! Batch execution logic

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::{mpsc, Semaphore};

use crate::channel::ChannelConfig;
use crate::config::RequestConfig;
use crate::error::BenchResult;
use crate::metrics::{BatchStats, BatchSummary};
use crate::request::{GenerateRequest, RequestId};
use crate::response::ResultRecord;
use crate::traits::{BatchObserver, ClientFactory};
use crate::worker::{BatchProgress, RequestExecutorBuilder};

use super::aggregator::collect_records;

/// Everything one batch produced
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Aggregate summary
    pub summary: BatchSummary,

    /// Latency statistics the summary was built from
    pub stats: BatchStats,

    /// One record per dispatched request, in completion order
    pub records: Vec<ResultRecord>,
}

/// Runs one fixed-size batch of requests at a fixed concurrency limit
///
/// All requests are spawned at once; the admission gate keeps at most
/// `concurrency` of them inside the client at any moment.
pub struct BatchRunner {
    /// Builds the batch-scoped client
    pub(crate) factory: Arc<dyn ClientFactory>,

    /// Record channel sizing
    pub(crate) channel_config: ChannelConfig,

    /// Progress callbacks
    pub(crate) observer: Option<Arc<dyn BatchObserver>>,
}

impl BatchRunner {
    /// Create a new runner
    ///
    /// Use `BatchRunnerBuilder` for a more ergonomic construction.
    pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            factory,
            channel_config: ChannelConfig::default(),
            observer: None,
        }
    }

    /// Get the progress observer, if any
    pub fn observer(&self) -> Option<&Arc<dyn BatchObserver>> {
        self.observer.as_ref()
    }

    /// Run one batch
    ///
    /// Fails only on invalid configuration or when the client cannot be
    /// built; individual request failures are recorded and never abort the
    /// batch.
    pub async fn run(&self, config: &RequestConfig) -> BenchResult<BatchReport> {
        config.validate()?;

        let client = self.factory.create(config)?;
        let gate = Arc::new(Semaphore::new(config.concurrency));
        let (records_tx, records_rx) = mpsc::channel(self.channel_config.records_buffer);

        let executor = RequestExecutorBuilder::new()
            .client(client)
            .gate(Arc::clone(&gate))
            .request(GenerateRequest::from_config(config))
            .records_tx(records_tx)
            .build()?;

        tracing::info!(
            client = executor.client_name(),
            model = %config.model,
            concurrency = config.concurrency,
            requests = config.requests,
            "Starting batch"
        );
        if let Some(observer) = &self.observer {
            observer.on_batch_start(config);
        }

        let mut progress = BatchProgress::new(config.requests);
        let start = Instant::now();

        let handles: Vec<_> = (0..config.requests)
            .map(|i| {
                let id = RequestId(i as u64);
                (id, tokio::spawn(executor.clone().run(id)))
            })
            .collect();
        // The collection closes once the last task drops its sender
        drop(executor);

        let mut records = collect_records(records_rx, &mut progress, self.observer.as_ref()).await;

        for (id, handle) in handles {
            let record = match handle.await {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => {
                    tracing::warn!(request_id = %id, error = %e, "Record was not delivered");
                    ResultRecord::exception(id, start.elapsed().as_secs_f64(), &e.to_string())
                }
                Err(e) => {
                    tracing::warn!(request_id = %id, error = %e, "Request task panicked");
                    ResultRecord::exception(
                        id,
                        start.elapsed().as_secs_f64(),
                        &format!("request task failed: {e}"),
                    )
                }
            };
            progress.record(&record);
            if let Some(observer) = &self.observer {
                observer.on_record(&record, &progress);
            }
            records.push(record);
        }

        let elapsed_secs = start.elapsed().as_secs_f64();
        let stats = BatchStats::from_records(&records, elapsed_secs);
        let summary = BatchSummary::new(config, &stats, elapsed_secs);

        tracing::info!(
            elapsed_secs,
            succeeded = stats.successful_requests,
            failed = stats.failed_requests(),
            p50 = ?stats.p50_latency,
            p95 = ?stats.p95_latency,
            rps = stats.requests_per_second,
            "Batch completed"
        );
        if let Some(observer) = &self.observer {
            observer.on_batch_end(&summary);
        }

        Ok(BatchReport {
            summary,
            stats,
            records,
        })
    }
}

impl std::fmt::Debug for BatchRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchRunner")
            .field("channel_config", &self.channel_config)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}
