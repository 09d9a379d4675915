//! Plain-text rendering of summaries

use ollama_bench_core::BatchSummary;

fn seconds(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.3}"))
}

/// Summary fields as `(key, value)` pairs, in column order
pub fn summary_fields(summary: &BatchSummary) -> Vec<(&'static str, String)> {
    vec![
        ("timestamp", summary.timestamp.clone()),
        ("model", summary.model.clone()),
        ("host", summary.host.clone()),
        ("concurrency", summary.concurrency.to_string()),
        ("requests", summary.requests.to_string()),
        ("prompt_len", summary.prompt_len.to_string()),
        ("tokens", summary.tokens.to_string()),
        ("p50_latency", seconds(summary.p50_latency)),
        ("p95_latency", seconds(summary.p95_latency)),
        ("rps", format!("{:.3}", summary.rps)),
        ("error_rate", format!("{:.4}", summary.error_rate)),
        ("total_time", format!("{:.3}", summary.total_time)),
    ]
}

/// Right-aligned `key: value` block
pub fn render_summary(summary: &BatchSummary) -> String {
    summary_fields(summary)
        .into_iter()
        .map(|(key, value)| format!("{key:>15}: {value}\n"))
        .collect()
}

/// One line of the sweep table
pub fn sweep_line(summary: &BatchSummary) -> String {
    let p95 = summary
        .p95_latency
        .map_or_else(|| "n/a".to_string(), |p| format!("{p:.2}s"));
    format!(
        "{:>3}c | p95={} | err={:.1}% | rps={:.2}",
        summary.concurrency,
        p95,
        summary.error_rate * 100.0,
        summary.rps
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(p95: Option<f64>) -> BatchSummary {
        BatchSummary {
            timestamp: "2024-05-01T12:00:00Z".into(),
            model: "gemma3:27b".into(),
            host: "http://127.0.0.1:11434".into(),
            concurrency: 8,
            requests: 100,
            prompt_len: 30,
            tokens: 128,
            p50_latency: Some(1.5),
            p95_latency: p95,
            rps: 3.2051,
            error_rate: 0.0123,
            total_time: 31.8,
        }
    }

    #[test]
    fn test_sweep_line_format() {
        assert_eq!(
            sweep_line(&summary(Some(2.346))),
            "  8c | p95=2.35s | err=1.2% | rps=3.21"
        );
        assert_eq!(
            sweep_line(&summary(None)),
            "  8c | p95=n/a | err=1.2% | rps=3.21"
        );
    }

    #[test]
    fn test_render_summary_alignment() {
        let text = render_summary(&summary(None));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 12);
        assert_eq!(lines[0], "      timestamp: 2024-05-01T12:00:00Z");
        assert_eq!(lines[8], "    p95_latency: n/a");
        assert!(lines.iter().all(|l| l.as_bytes()[15] == b':'));
    }
}
