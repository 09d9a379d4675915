//! Terminal progress bars driven by the batch observer hooks

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};
use ollama_bench_core::{BatchObserver, BatchProgress, BatchSummary, RequestConfig, ResultRecord};

use super::output::sweep_line;

/// Running error rate and token count shown next to the bar
fn progress_message(progress: &BatchProgress) -> String {
    format!(
        "{} failed ({:.1}% err) | {} tokens",
        progress.failed,
        progress.error_rate() * 100.0,
        progress.output_tokens
    )
}

/// One progress bar per batch; sweep levels are echoed as they finish
#[derive(Default)]
pub struct ProgressReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    /// Create a reporter with no active bar
    pub fn new() -> Self {
        Self::default()
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(bar) = guard.as_ref() {
                f(bar);
            }
        }
    }
}

impl BatchObserver for ProgressReporter {
    fn on_batch_start(&self, config: &RequestConfig) {
        let bar = ProgressBar::new(config.requests as u64);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        ) {
            bar.set_style(style.progress_chars("#>-"));
        }
        bar.set_message(format!("{}-way concurrency", config.concurrency));

        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some(bar);
        }
    }

    fn on_record(&self, _record: &ResultRecord, progress: &BatchProgress) {
        self.with_bar(|bar| {
            bar.inc(1);
            bar.set_message(progress_message(progress));
        });
    }

    fn on_batch_end(&self, _summary: &BatchSummary) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(bar) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }

    fn on_level_complete(&self, summary: &BatchSummary, ok: bool) {
        let marker = if ok { "" } else { "  <- degraded" };
        println!("{}{}", sweep_line(summary), marker);
    }
}
