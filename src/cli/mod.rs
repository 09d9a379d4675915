//! CLI argument parsing and command dispatch

mod output;
mod progress;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use ollama_bench_core::{
    BatchRunner, BatchRunnerBuilder, BenchFile, RequestConfig, SweepController,
    DEFAULT_SWEEP_REQUESTS,
};
use ollama_bench_report::{
    append_sweep_csv, plot_latency_histogram, read_detail_csv, write_detail_csv, DetailAnalysis,
};
use ollama_bench_vendors::OllamaClientFactory;

use output::{render_summary, sweep_line};
use progress::ProgressReporter;

/// Benchmark how many concurrent requests an Ollama server can handle
#[derive(Parser, Debug)]
#[command(name = "ollama-bench")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one batch at a fixed concurrency
    Run {
        #[command(flatten)]
        target: TargetArgs,

        /// Parallel requests
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Total number of requests to send [default: 100]
        #[arg(short = 'n', long)]
        requests: Option<usize>,

        /// Write per-request detailed metrics to this CSV file
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,
    },
    /// Sweep concurrency levels and detect when latency or errors spike
    Sweep {
        #[command(flatten)]
        target: TargetArgs,

        /// Concurrency levels to visit [default: 1,2,4,8,16,32,64]
        #[arg(short = 'c', long = "concurrency-list", num_args = 1.., value_delimiter = ',')]
        levels: Vec<usize>,

        /// Requests per concurrency level [default: 50]
        #[arg(short = 'n', long)]
        requests: Option<usize>,

        /// p95 latency threshold in seconds [default: 30]
        #[arg(long)]
        latency_threshold: Option<f64>,

        /// Error-rate threshold [default: 0.05]
        #[arg(long)]
        error_threshold: Option<f64>,

        /// Append summary rows to this CSV file
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,
    },
    /// Describe a per-request CSV and optionally plot its latency histogram
    Analyze {
        /// Detail CSV written by `run --csv`
        #[arg(short, long)]
        input: PathBuf,

        /// Write a latency histogram (SVG) to this path
        #[arg(long, value_name = "FILE")]
        plot: Option<PathBuf>,

        /// Label for the plot title
        #[arg(long)]
        label: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        /// Path to configuration file
        #[arg(long)]
        config: PathBuf,
    },
}

/// Server, model and workload options shared by `run` and `sweep`
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Model identifier as known to Ollama, e.g. llama3:8b
    #[arg(short, long)]
    pub model: Option<String>,

    /// Base URL of the Ollama server [default: http://127.0.0.1:11434]
    #[arg(long, env = "OLLAMA_HOST")]
    pub host: Option<String>,

    /// Prompt text [default: Say 'hello, world!' in Korean.]
    #[arg(long)]
    pub prompt: Option<String>,

    /// Maximum tokens per response (num_predict) [default: 128]
    #[arg(long)]
    pub tokens: Option<u32>,

    /// Per-request timeout in seconds; requests wait indefinitely when unset
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// TOML configuration file; flags take precedence over its values
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl TargetArgs {
    /// Load the config file, if any, and lay the flags over it
    fn resolve(&self) -> Result<BenchFile> {
        let mut file = match &self.config {
            Some(path) => BenchFile::from_file(path)
                .with_context(|| format!("Failed to load config from: {}", path.display()))?,
            None => BenchFile::default(),
        };

        if let Some(model) = &self.model {
            file.target.model = Some(model.clone());
        }
        if let Some(host) = &self.host {
            file.target.host = Some(host.clone());
        }
        if let Some(timeout) = self.timeout_secs {
            file.target.timeout_secs = Some(timeout);
        }
        if let Some(prompt) = &self.prompt {
            file.workload.prompt = Some(prompt.clone());
        }
        if let Some(tokens) = self.tokens {
            file.workload.tokens = Some(tokens);
        }
        Ok(file)
    }
}

fn request_config(file: &BenchFile) -> Result<RequestConfig> {
    file.request_config()
        .context("--model is required (or set target.model in the config file)")
}

fn runner() -> Result<(BatchRunner, Arc<ProgressReporter>)> {
    let reporter = Arc::new(ProgressReporter::new());
    let runner = BatchRunnerBuilder::new()
        .factory(Arc::new(OllamaClientFactory::new()))
        .observer(reporter.clone())
        .build()?;
    Ok((runner, reporter))
}

impl Cli {
    /// Dispatch the selected command
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Run {
                target,
                concurrency,
                requests,
                csv,
            } => {
                let mut file = target.resolve()?;
                if let Some(concurrency) = concurrency {
                    file.workload.concurrency = Some(concurrency);
                }
                if let Some(requests) = requests {
                    file.workload.requests = Some(requests);
                }
                run_batch(&request_config(&file)?, csv.as_deref()).await
            }
            Commands::Sweep {
                target,
                levels,
                requests,
                latency_threshold,
                error_threshold,
                csv,
            } => {
                let mut file = target.resolve()?;
                if !levels.is_empty() {
                    file.sweep.levels = Some(levels);
                }
                if let Some(threshold) = latency_threshold {
                    file.sweep.latency_threshold = Some(threshold);
                }
                if let Some(threshold) = error_threshold {
                    file.sweep.error_threshold = Some(threshold);
                }
                let requests = requests
                    .or(file.sweep.requests)
                    .unwrap_or(DEFAULT_SWEEP_REQUESTS);
                let config = request_config(&file)?.with_requests(requests);
                run_sweep(&file, &config, csv.as_deref()).await
            }
            Commands::Analyze {
                input,
                plot,
                label,
            } => analyze(&input, plot.as_deref(), label.as_deref()),
            Commands::Validate { config } => validate(&config),
        }
    }
}

async fn run_batch(config: &RequestConfig, csv: Option<&Path>) -> Result<()> {
    tracing::info!(
        model = %config.model,
        host = %config.host,
        concurrency = config.concurrency,
        requests = config.requests,
        "Running batch"
    );

    let (runner, _reporter) = runner()?;
    let report = runner.run(config).await.context("Batch failed")?;

    println!("\n--- Summary ---");
    print!("{}", render_summary(&report.summary));

    if let Some(path) = csv {
        write_detail_csv(path, &report.records)
            .with_context(|| format!("Failed to export CSV to: {}", path.display()))?;
        println!("\nDetailed metrics written to {}", path.display());
    }
    Ok(())
}

async fn run_sweep(file: &BenchFile, config: &RequestConfig, csv: Option<&Path>) -> Result<()> {
    let plan = file.sweep_config();
    let (runner, _reporter) = runner()?;
    let mut sweep = SweepController::new(runner, plan);

    let result = sweep.run(config).await.context("Sweep failed")?;

    println!("\n--- Sweep Summary ---");
    for summary in &result.summaries {
        println!("{}", sweep_line(summary));
    }
    println!("\n{}", result.verdict());

    if let Some(path) = csv {
        append_sweep_csv(path, &result.summaries)
            .with_context(|| format!("Failed to append summaries to: {}", path.display()))?;
        println!("Summary rows appended to {}", path.display());
    }
    Ok(())
}

fn analyze(input: &Path, plot: Option<&Path>, label: Option<&str>) -> Result<()> {
    let rows = read_detail_csv(input)
        .with_context(|| format!("Failed to read detail CSV: {}", input.display()))?;
    let analysis = DetailAnalysis::from_rows(&rows)
        .with_context(|| format!("Nothing to analyze in: {}", input.display()))?;
    print!("{}", analysis.render());

    if let Some(path) = plot {
        let title = match label {
            Some(label) => format!("Latency distribution ({label})"),
            None => "Latency distribution".to_string(),
        };
        plot_latency_histogram(&DetailAnalysis::latencies(&rows), path, &title)
            .with_context(|| format!("Failed to generate latency histogram: {}", path.display()))?;
        println!("\nLatency histogram: {}", path.display());
    }
    Ok(())
}

fn validate(path: &Path) -> Result<()> {
    let file = BenchFile::from_file(path)
        .with_context(|| format!("Failed to load config from: {}", path.display()))?;
    file.validate()
        .with_context(|| format!("Invalid config: {}", path.display()))?;

    let config = request_config(&file)?;
    let plan = file.sweep_config();
    println!("Configuration is valid: {}", path.display());
    println!("  Host:         {}", config.host);
    println!("  Model:        {}", config.model);
    println!("  Requests:     {}", config.requests);
    println!("  Concurrency:  {}", config.concurrency);
    println!("  Sweep levels: {:?}", plan.levels);
    Ok(())
}
