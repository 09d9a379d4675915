//! Tests for the orchestrator module

use super::*;
use crate::config::{RequestConfig, SweepConfig, DEFAULT_HOST};
use crate::metrics::BatchSummary;
use crate::request::GenerateRequest;
use crate::response::{Outcome, ResultRecord};
use crate::traits::{BatchObserver, ClientError, ClientFactory, GenerateClient, HttpReply};
use crate::worker::BatchProgress;

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Mock client and factory
// ============================================================================

/// Decides the reply for a call, given the call index and the batch concurrency
type Script = Arc<dyn Fn(usize, usize) -> Result<HttpReply, ClientError> + Send + Sync>;

struct ScriptedClient {
    script: Script,
    concurrency: usize,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

#[async_trait]
impl GenerateClient for ScriptedClient {
    fn client_name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, _request: &GenerateRequest) -> Result<HttpReply, ClientError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        (self.script)(call, self.concurrency)
    }
}

struct MockFactory {
    script: Script,
    delay: Option<Duration>,
    fail_build: bool,
    created: AtomicUsize,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockFactory {
    fn new(script: impl Fn(usize, usize) -> Result<HttpReply, ClientError> + Send + Sync + 'static) -> Self {
        Self {
            script: Arc::new(script),
            delay: None,
            fail_build: false,
            created: AtomicUsize::new(0),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn always(status: u16, body: &'static str) -> Self {
        Self::new(move |_, _| Ok(HttpReply::new(status, body)))
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn failing_build() -> Self {
        let mut factory = Self::always(200, "{}");
        factory.fail_build = true;
        factory
    }

    fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl ClientFactory for MockFactory {
    fn create(&self, config: &RequestConfig) -> Result<Arc<dyn GenerateClient>, ClientError> {
        if self.fail_build {
            return Err(ClientError::Build("no TLS backend".into()));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(ScriptedClient {
            script: Arc::clone(&self.script),
            concurrency: config.concurrency,
            delay: self.delay,
            calls: AtomicUsize::new(0),
            in_flight: Arc::clone(&self.in_flight),
            max_in_flight: Arc::clone(&self.max_in_flight),
        }))
    }
}

#[derive(Default)]
struct RecordingObserver {
    started: AtomicUsize,
    records: AtomicUsize,
    failed_seen: AtomicUsize,
    finished: AtomicUsize,
    levels: std::sync::Mutex<Vec<(usize, bool)>>,
}

impl BatchObserver for RecordingObserver {
    fn on_batch_start(&self, _config: &RequestConfig) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn on_record(&self, _record: &ResultRecord, progress: &BatchProgress) {
        self.records.fetch_add(1, Ordering::SeqCst);
        self.failed_seen.store(progress.failed, Ordering::SeqCst);
    }

    fn on_batch_end(&self, _summary: &BatchSummary) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }

    fn on_level_complete(&self, summary: &BatchSummary, ok: bool) {
        self.levels.lock().unwrap().push((summary.concurrency, ok));
    }
}

const COUNTERS_BODY: &str = r#"{"total_duration": 2000000, "eval_count": 50}"#;

fn config(requests: usize, concurrency: usize) -> RequestConfig {
    RequestConfig::new(DEFAULT_HOST, "llama3:8b")
        .with_requests(requests)
        .with_concurrency(concurrency)
}

fn runner(factory: Arc<MockFactory>) -> BatchRunner {
    BatchRunnerBuilder::new().factory(factory).build().unwrap()
}

// ============================================================================
// BatchRunner
// ============================================================================

#[tokio::test]
async fn test_batch_all_success() {
    let factory = Arc::new(MockFactory::always(200, COUNTERS_BODY));
    let report = runner(Arc::clone(&factory)).run(&config(10, 5)).await.unwrap();

    assert_eq!(report.records.len(), 10);
    for record in &report.records {
        assert_eq!(record.outcome, Outcome::Success);
        assert_eq!(record.total_duration_secs, Some(2.0));
        assert_eq!(record.tokens, Some(50));
    }
    assert_eq!(report.summary.error_rate, 0.0);
    assert_eq!(report.summary.concurrency, 5);
    assert_eq!(report.summary.requests, 10);
    assert!(report.summary.p50_latency.is_some());
    assert!(report.summary.p95_latency.is_none());
    assert_eq!(factory.created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_batch_all_transport_failures() {
    let factory = Arc::new(MockFactory::new(|_, _| {
        Err(ClientError::Transport("connection refused".into()))
    }));
    let report = runner(factory).run(&config(5, 2)).await.unwrap();

    assert_eq!(report.records.len(), 5);
    assert!(report
        .records
        .iter()
        .all(|r| r.outcome == Outcome::Exception));
    assert_eq!(report.summary.error_rate, 1.0);
    assert!(report.summary.p50_latency.is_none());
    assert!(report.summary.p95_latency.is_none());
}

#[tokio::test]
async fn test_batch_mixed_outcomes() {
    let factory = Arc::new(MockFactory::new(|call, _| {
        if call % 4 == 3 {
            Ok(HttpReply::new(500, "internal error"))
        } else {
            Ok(HttpReply::new(200, COUNTERS_BODY))
        }
    }));
    let report = runner(factory).run(&config(200, 10)).await.unwrap();

    assert_eq!(report.records.len(), 200);
    assert_eq!(report.stats.successful_requests, 150);
    assert!((report.summary.error_rate - 0.25).abs() < 1e-12);
    let p50 = report.summary.p50_latency.unwrap();
    let p95 = report.summary.p95_latency.unwrap();
    assert!(p50 <= p95);
    assert!(report.summary.rps > 0.0);
}

#[tokio::test]
async fn test_record_ids_cover_every_request() {
    let factory = Arc::new(MockFactory::always(200, "{}"));
    let report = runner(factory).run(&config(25, 4)).await.unwrap();

    let mut ids: Vec<u64> = report.records.iter().map(|r| r.request_id.0).collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..25).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_gate_bounds_in_flight_requests() {
    let factory = Arc::new(MockFactory::always(200, "{}").with_delay(Duration::from_millis(10)));
    let report = runner(Arc::clone(&factory)).run(&config(40, 4)).await.unwrap();

    assert_eq!(report.records.len(), 40);
    let max = factory.max_in_flight();
    assert_eq!(max, 4, "observed {max} concurrent calls");
}

#[tokio::test]
async fn test_concurrency_above_request_count() {
    let factory = Arc::new(MockFactory::always(200, "{}").with_delay(Duration::from_millis(5)));
    let report = runner(Arc::clone(&factory)).run(&config(3, 64)).await.unwrap();

    assert_eq!(report.records.len(), 3);
    assert!(factory.max_in_flight() <= 3);
}

#[tokio::test]
async fn test_panicked_task_still_yields_record() {
    let factory = Arc::new(MockFactory::new(|call, _| {
        if call == 2 {
            panic!("client exploded");
        }
        Ok(HttpReply::new(200, "{}"))
    }));
    let observer = Arc::new(RecordingObserver::default());
    let runner = BatchRunnerBuilder::new()
        .factory(factory)
        .observer(observer.clone())
        .build()
        .unwrap();
    let report = runner.run(&config(6, 1)).await.unwrap();

    assert_eq!(report.records.len(), 6);
    let failed: Vec<_> = report.records.iter().filter(|r| !r.is_success()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].outcome, Outcome::Exception);

    // The synthesized record reaches the observer like any other
    assert_eq!(observer.records.load(Ordering::SeqCst), 6);
    assert_eq!(observer.failed_seen.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_invalid_config_is_rejected_before_dispatch() {
    let factory = Arc::new(MockFactory::always(200, "{}"));
    let runner = runner(Arc::clone(&factory));

    let err = runner.run(&config(10, 0)).await.unwrap_err();
    assert!(err.is_config());

    let err = runner.run(&config(0, 1)).await.unwrap_err();
    assert!(err.is_config());

    let err = runner.run(&config(1, usize::MAX)).await.unwrap_err();
    assert!(err.is_config());

    let err = runner
        .run(&RequestConfig::new(DEFAULT_HOST, "  "))
        .await
        .unwrap_err();
    assert!(err.is_config());

    assert_eq!(factory.created.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_client_build_failure_is_fatal() {
    let factory = Arc::new(MockFactory::failing_build());
    let err = runner(factory).run(&config(1, 1)).await.unwrap_err();
    assert!(matches!(err, crate::error::BenchError::Client(_)));
}

#[tokio::test]
async fn test_observer_sees_every_record() {
    let factory = Arc::new(MockFactory::always(200, "{}"));
    let observer = Arc::new(RecordingObserver::default());
    let runner = BatchRunnerBuilder::new()
        .factory(factory)
        .observer(observer.clone())
        .build()
        .unwrap();

    runner.run(&config(12, 3)).await.unwrap();

    assert_eq!(observer.started.load(Ordering::SeqCst), 1);
    assert_eq!(observer.records.load(Ordering::SeqCst), 12);
    assert_eq!(observer.finished.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_small_channel_buffer_does_not_lose_records() {
    let factory = Arc::new(MockFactory::always(200, "{}"));
    let runner = BatchRunnerBuilder::new()
        .factory(factory)
        .channel_config(crate::channel::ChannelConfig::default().with_records_buffer(1))
        .build()
        .unwrap();

    let report = runner.run(&config(50, 8)).await.unwrap();
    assert_eq!(report.records.len(), 50);
}

// ============================================================================
// SweepController
// ============================================================================

fn degraded_at_two() -> MockFactory {
    MockFactory::new(|_, concurrency| {
        if concurrency == 2 {
            Ok(HttpReply::new(503, "overloaded"))
        } else {
            Ok(HttpReply::new(200, COUNTERS_BODY))
        }
    })
}

#[tokio::test]
async fn test_sweep_reports_first_degraded_level() {
    let factory = Arc::new(degraded_at_two());
    let observer = Arc::new(RecordingObserver::default());
    let runner = BatchRunnerBuilder::new()
        .factory(Arc::clone(&factory) as Arc<dyn ClientFactory>)
        .observer(observer.clone())
        .build()
        .unwrap();

    let mut sweep = SweepController::new(runner, SweepConfig::new(vec![1, 2, 4]));
    let result = sweep.run(&config(100, 1)).await.unwrap();

    assert_eq!(result.first_degraded, Some(2));
    assert_eq!(result.summaries.len(), 3);
    let levels: Vec<usize> = result.summaries.iter().map(|s| s.concurrency).collect();
    assert_eq!(levels, vec![1, 2, 4]);
    assert!(result.summaries[0].p95_latency.is_some());
    assert_eq!(result.summaries[1].error_rate, 1.0);
    assert_eq!(sweep.state(), SweepState::Complete);

    // One fresh client per level
    assert_eq!(factory.created.load(Ordering::SeqCst), 3);
    assert_eq!(
        *observer.levels.lock().unwrap(),
        vec![(1, true), (2, false), (4, true)]
    );
}

#[tokio::test]
async fn test_sweep_without_degradation() {
    let factory = Arc::new(MockFactory::always(200, COUNTERS_BODY));
    let mut sweep = SweepController::new(runner(factory), SweepConfig::new(vec![1, 2]));
    let result = sweep.run(&config(100, 1)).await.unwrap();

    assert_eq!(result.first_degraded, None);
    assert_eq!(result.summaries.len(), 2);
}

#[tokio::test]
async fn test_sweep_small_batches_count_as_degraded() {
    // Fewer than 100 successes: no p95, so the first level already fails
    let factory = Arc::new(MockFactory::always(200, COUNTERS_BODY));
    let mut sweep = SweepController::new(runner(factory), SweepConfig::new(vec![1, 2]));
    let result = sweep.run(&config(10, 1)).await.unwrap();

    assert_eq!(result.first_degraded, Some(1));
    assert_eq!(result.summaries.len(), 2);
}

#[tokio::test]
async fn test_sweep_keeps_plan_order() {
    let factory = Arc::new(MockFactory::always(200, "{}"));
    let mut sweep = SweepController::new(runner(factory), SweepConfig::new(vec![4, 1]));
    let result = sweep.run(&config(5, 1)).await.unwrap();

    let levels: Vec<usize> = result.summaries.iter().map(|s| s.concurrency).collect();
    assert_eq!(levels, vec![4, 1]);
}

#[tokio::test]
async fn test_sweep_rejects_invalid_plan() {
    let factory = Arc::new(MockFactory::always(200, "{}"));

    let mut sweep = SweepController::new(runner(Arc::clone(&factory)), SweepConfig::new(vec![]));
    assert!(sweep.run(&config(5, 1)).await.unwrap_err().is_config());

    let mut sweep = SweepController::new(runner(Arc::clone(&factory)), SweepConfig::new(vec![1, 0]));
    assert!(sweep.run(&config(5, 1)).await.unwrap_err().is_config());
    assert_eq!(sweep.state(), SweepState::Pending { next: 0 });

    assert_eq!(factory.created.load(Ordering::SeqCst), 0);
}
