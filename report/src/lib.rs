//! Report generation for benchmark results
//!
//! This crate provides:
//!
//! - Detail CSV export (one row per request) and its reader
//! - Sweep summary CSV, appended across invocations
//! - Descriptive statistics over a detail file
//! - Latency histogram plots (SVG)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analyze;
pub mod csv_export;
pub mod error;
pub mod histogram;

pub use analyze::DetailAnalysis;
pub use csv_export::{
    append_sweep_csv, read_detail_csv, read_sweep_csv, write_detail_csv, DetailRow,
};
pub use error::{ReportError, ReportResult};
pub use histogram::{histogram_bins, plot_latency_histogram, Bin};
