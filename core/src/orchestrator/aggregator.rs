//! Record collection from executor tasks

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::response::ResultRecord;
use crate::traits::BatchObserver;
use crate::worker::BatchProgress;

/// Drain the record channel until every sender is gone
///
/// Each record updates `progress` and is forwarded to the observer before
/// being kept. Returns the records in arrival order.
pub async fn collect_records(
    mut rx: mpsc::Receiver<ResultRecord>,
    progress: &mut BatchProgress,
    observer: Option<&Arc<dyn BatchObserver>>,
) -> Vec<ResultRecord> {
    let mut records = Vec::with_capacity(progress.expected);

    while let Some(record) = rx.recv().await {
        progress.record(&record);
        if !record.is_success() {
            tracing::debug!(
                request_id = %record.request_id,
                outcome = %record.outcome,
                status = ?record.status,
                error = record.error.as_deref().unwrap_or(""),
                "Request failed"
            );
        }
        if let Some(observer) = observer {
            observer.on_record(&record, progress);
        }
        records.push(record);
    }

    records
}
