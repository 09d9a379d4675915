//! Histogram plots for latency distributions

use std::path::Path;

use plotters::prelude::*;

use crate::error::{ReportError, ReportResult};

/// Default number of histogram bins
pub const DEFAULT_BINS: usize = 50;

/// One histogram bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    /// Inclusive lower edge
    pub start: f64,
    /// Upper edge, inclusive only for the last bin
    pub end: f64,
    /// Values falling in the bin
    pub count: usize,
}

/// Split values into `bins` equal-width bins spanning min to max
///
/// When every value is equal the range is widened by 0.5 on each side so the
/// bars still have width.
pub fn histogram_bins(values: &[f64], bins: usize) -> Vec<Bin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }

    let mut min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let mut max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        min -= 0.5;
        max += 0.5;
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for value in finite {
        let idx = (((value - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(idx, count)| Bin {
            start: min + idx as f64 * width,
            end: min + (idx + 1) as f64 * width,
            count,
        })
        .collect()
}

/// Plot a latency histogram as an SVG file
pub fn plot_latency_histogram(
    latencies: &[f64],
    path: impl AsRef<Path>,
    title: &str,
) -> ReportResult<()> {
    let bins = histogram_bins(latencies, DEFAULT_BINS);
    let (first, last) = match (bins.first(), bins.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(ReportError::Empty("no latency values to plot".into())),
    };
    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0);

    let path = path.as_ref();
    let root = SVGBackend::new(path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE).map_err(ReportError::plot)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 40))
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(first.start..last.end, 0f64..(max_count as f64 * 1.1).max(1.0))
        .map_err(ReportError::plot)?;

    chart
        .configure_mesh()
        .x_desc("Latency (s)")
        .y_desc("Frequency")
        .x_label_formatter(&|x| format!("{:.2}", x))
        .draw()
        .map_err(ReportError::plot)?;

    chart
        .draw_series(bins.iter().map(|bin| {
            Rectangle::new(
                [(bin.start, 0.0), (bin.end, bin.count as f64)],
                BLUE.mix(0.6).filled(),
            )
        }))
        .map_err(ReportError::plot)?;

    root.present().map_err(ReportError::plot)?;
    tracing::debug!(path = %path.display(), values = latencies.len(), "Wrote latency histogram");
    Ok(())
}
