//! Batch and sweep configuration types

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::BenchResult;

/// Default base URL of a local Ollama server
pub const DEFAULT_HOST: &str = "http://127.0.0.1:11434";

/// Default prompt sent with every request
pub const DEFAULT_PROMPT: &str = "Say 'hello, world!' in Korean.";

/// Default `num_predict` cap
pub const DEFAULT_MAX_TOKENS: u32 = 128;

/// Default concurrency for a single batch
pub const DEFAULT_CONCURRENCY: usize = 32;

/// Default request count for a single batch
pub const DEFAULT_REQUESTS: usize = 100;

/// Default request count per sweep level
pub const DEFAULT_SWEEP_REQUESTS: usize = 50;

/// Largest concurrency the admission gate can hold permits for
pub const MAX_CONCURRENCY: usize = tokio::sync::Semaphore::MAX_PERMITS;

/// Default ascending sweep levels
pub const DEFAULT_SWEEP_LEVELS: [usize; 7] = [1, 2, 4, 8, 16, 32, 64];

/// Default p95 latency ceiling in seconds
pub const DEFAULT_LATENCY_THRESHOLD_SECS: f64 = 30.0;

/// Default error-rate ceiling
pub const DEFAULT_ERROR_THRESHOLD: f64 = 0.05;

/// Immutable configuration for one batch
///
/// Built once per batch; sweep levels derive a fresh copy through
/// [`RequestConfig::at_concurrency`] instead of mutating a shared one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Base URL of the inference server
    pub host: String,

    /// Model identifier as known to the server
    pub model: String,

    /// Prompt text sent with every request
    pub prompt: String,

    /// Maximum output tokens per request (`num_predict`)
    pub max_tokens: u32,

    /// Total number of requests in the batch
    pub requests: usize,

    /// Maximum number of simultaneous in-flight calls
    pub concurrency: usize,

    /// Optional per-request timeout; requests may block indefinitely when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl RequestConfig {
    /// Create a config for `model` on `host` with default workload settings
    pub fn new(host: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            model: model.into(),
            prompt: DEFAULT_PROMPT.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            requests: DEFAULT_REQUESTS,
            concurrency: DEFAULT_CONCURRENCY,
            timeout_secs: None,
        }
    }

    /// Set the prompt
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Set the output token cap
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the total request count
    pub fn with_requests(mut self, requests: usize) -> Self {
        self.requests = requests;
        self
    }

    /// Set the concurrency limit
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set a per-request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: Option<u64>) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Copy of this config with a different concurrency limit
    pub fn at_concurrency(&self, concurrency: usize) -> Self {
        self.clone().with_concurrency(concurrency)
    }

    /// Per-request timeout as a `Duration`
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Prompt length in characters
    pub fn prompt_len(&self) -> usize {
        self.prompt.chars().count()
    }

    /// Full URL of the generation endpoint
    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.host.trim_end_matches('/'))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingField("host"));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::MissingField("model"));
        }
        validate_concurrency(self.concurrency)?;
        if self.requests == 0 {
            return Err(ConfigError::InvalidRequestCount(
                "request count must be at least 1".into(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::InvalidTokenCap(
                "token cap must be at least 1".into(),
            ));
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidTimeout(
                "timeout must be at least 1 second".into(),
            ));
        }
        Ok(())
    }
}

/// Ceilings a sweep level must stay under to count as healthy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DegradationThresholds {
    /// p95 latency ceiling in seconds
    pub latency_secs: f64,

    /// Error-rate ceiling (0.0 - 1.0)
    pub error_rate: f64,
}

impl Default for DegradationThresholds {
    fn default() -> Self {
        Self {
            latency_secs: DEFAULT_LATENCY_THRESHOLD_SECS,
            error_rate: DEFAULT_ERROR_THRESHOLD,
        }
    }
}

impl DegradationThresholds {
    /// Validate the thresholds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.latency_secs.is_finite() || self.latency_secs <= 0.0 {
            return Err(ConfigError::InvalidThreshold(format!(
                "latency threshold must be positive, got {}",
                self.latency_secs
            )));
        }
        if !(self.error_rate > 0.0 && self.error_rate <= 1.0) {
            return Err(ConfigError::InvalidThreshold(format!(
                "error threshold must be in (0, 1], got {}",
                self.error_rate
            )));
        }
        Ok(())
    }
}

/// Sweep plan: the levels to visit and the thresholds to judge them by
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Concurrency levels, visited in the given order (expected ascending)
    pub levels: Vec<usize>,

    /// Degradation thresholds
    pub thresholds: DegradationThresholds,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            levels: DEFAULT_SWEEP_LEVELS.to_vec(),
            thresholds: DegradationThresholds::default(),
        }
    }
}

impl SweepConfig {
    /// Create a sweep over the given levels with default thresholds
    pub fn new(levels: Vec<usize>) -> Self {
        Self {
            levels,
            ..Default::default()
        }
    }

    /// Set the thresholds
    pub fn with_thresholds(mut self, thresholds: DegradationThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Validate the sweep plan
    ///
    /// Ordering is not checked; only empty plans and levels outside
    /// `1..=MAX_CONCURRENCY` are rejected.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.levels.is_empty() {
            return Err(ConfigError::InvalidSweep(
                "at least one concurrency level is required".into(),
            ));
        }
        for &level in &self.levels {
            validate_concurrency(level)?;
        }
        self.thresholds.validate()
    }
}

/// A concurrency level becomes the permit count of the admission gate
fn validate_concurrency(concurrency: usize) -> Result<(), ConfigError> {
    if concurrency == 0 {
        return Err(ConfigError::InvalidConcurrency(
            "concurrency must be at least 1".into(),
        ));
    }
    if concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::InvalidConcurrency(format!(
            "concurrency must be at most {MAX_CONCURRENCY}, got {concurrency}"
        )));
    }
    Ok(())
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A required field is missing or blank
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Invalid concurrency value
    #[error("Invalid concurrency: {0}")]
    InvalidConcurrency(String),

    /// Invalid request count
    #[error("Invalid request count: {0}")]
    InvalidRequestCount(String),

    /// Invalid output token cap
    #[error("Invalid token cap: {0}")]
    InvalidTokenCap(String),

    /// Invalid per-request timeout
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    /// Invalid degradation threshold
    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    /// Invalid sweep plan
    #[error("Invalid sweep: {0}")]
    InvalidSweep(String),

    /// Config file could not be parsed
    #[error("Invalid config file: {0}")]
    Parse(String),
}

// ============================================================================
// Config file
// ============================================================================

/// On-disk TOML configuration
///
/// Every field is optional; command-line flags take precedence over the file.
///
/// ```toml
/// [target]
/// host = "http://127.0.0.1:11434"
/// model = "llama3:8b"
///
/// [workload]
/// prompt = "Explain TCP three-way handshake"
/// tokens = 256
/// requests = 1000
/// concurrency = 64
///
/// [sweep]
/// levels = [1, 2, 4, 8]
/// requests = 50
/// latency_threshold = 30.0
/// error_threshold = 0.05
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BenchFile {
    /// Server and model
    #[serde(default)]
    pub target: TargetSection,

    /// Per-batch workload
    #[serde(default)]
    pub workload: WorkloadSection,

    /// Sweep plan
    #[serde(default)]
    pub sweep: SweepSection,
}

/// `[target]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TargetSection {
    /// Base URL of the server
    pub host: Option<String>,
    /// Model identifier
    pub model: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// `[workload]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkloadSection {
    /// Prompt text
    pub prompt: Option<String>,
    /// Output token cap
    pub tokens: Option<u32>,
    /// Requests per batch
    pub requests: Option<usize>,
    /// Concurrency for single-batch runs
    pub concurrency: Option<usize>,
}

/// `[sweep]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepSection {
    /// Concurrency levels
    pub levels: Option<Vec<usize>>,
    /// Requests per level
    pub requests: Option<usize>,
    /// p95 latency ceiling in seconds
    pub latency_threshold: Option<f64>,
    /// Error-rate ceiling
    pub error_threshold: Option<f64>,
}

impl BenchFile {
    /// Load a config file from disk
    pub fn from_file(path: impl AsRef<Path>) -> BenchResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::parse(&contents)?)
    }

    /// Parse TOML text
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Build a batch config from the file, falling back to defaults
    ///
    /// Returns `None` when the file names no model.
    pub fn request_config(&self) -> Option<RequestConfig> {
        let model = self.target.model.clone()?;
        let host = self
            .target
            .host
            .clone()
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let mut config = RequestConfig::new(host, model)
            .with_timeout_secs(self.target.timeout_secs);
        if let Some(prompt) = &self.workload.prompt {
            config = config.with_prompt(prompt.clone());
        }
        if let Some(tokens) = self.workload.tokens {
            config = config.with_max_tokens(tokens);
        }
        if let Some(requests) = self.workload.requests {
            config = config.with_requests(requests);
        }
        if let Some(concurrency) = self.workload.concurrency {
            config = config.with_concurrency(concurrency);
        }
        Some(config)
    }

    /// Build a sweep plan from the file, falling back to defaults
    pub fn sweep_config(&self) -> SweepConfig {
        let defaults = DegradationThresholds::default();
        SweepConfig {
            levels: self
                .sweep
                .levels
                .clone()
                .unwrap_or_else(|| DEFAULT_SWEEP_LEVELS.to_vec()),
            thresholds: DegradationThresholds {
                latency_secs: self
                    .sweep
                    .latency_threshold
                    .unwrap_or(defaults.latency_secs),
                error_rate: self.sweep.error_threshold.unwrap_or(defaults.error_rate),
            },
        }
    }

    /// Validate everything the file specifies
    pub fn validate(&self) -> Result<(), ConfigError> {
        let config = self
            .request_config()
            .ok_or(ConfigError::MissingField("target.model"))?;
        config.validate()?;
        if let Some(requests) = self.sweep.requests {
            config.with_requests(requests).validate()?;
        }
        self.sweep_config().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RequestConfig::new(DEFAULT_HOST, "llama3:8b");
        assert_eq!(config.concurrency, 32);
        assert_eq!(config.requests, 100);
        assert_eq!(config.max_tokens, 128);
        assert_eq!(config.prompt, DEFAULT_PROMPT);
        assert!(config.timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generate_url_trims_trailing_slash() {
        let config = RequestConfig::new("http://localhost:11434/", "m");
        assert_eq!(config.generate_url(), "http://localhost:11434/api/generate");

        let config = RequestConfig::new("http://localhost:11434", "m");
        assert_eq!(config.generate_url(), "http://localhost:11434/api/generate");
    }

    #[test]
    fn test_prompt_len_counts_characters() {
        let config = RequestConfig::new(DEFAULT_HOST, "m").with_prompt("안녕하세요");
        assert_eq!(config.prompt_len(), 5);
    }

    #[test]
    fn test_at_concurrency_leaves_original_untouched() {
        let base = RequestConfig::new(DEFAULT_HOST, "m").with_concurrency(4);
        let derived = base.at_concurrency(16);
        assert_eq!(base.concurrency, 4);
        assert_eq!(derived.concurrency, 16);
        assert_eq!(derived.model, base.model);
    }

    #[test]
    fn test_config_validation_zero_concurrency() {
        let config = RequestConfig::new(DEFAULT_HOST, "m").with_concurrency(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConcurrency(_))
        ));
    }

    #[test]
    fn test_config_validation_concurrency_ceiling() {
        let at_ceiling = RequestConfig::new(DEFAULT_HOST, "m").with_concurrency(MAX_CONCURRENCY);
        assert!(at_ceiling.validate().is_ok());

        let config = RequestConfig::new(DEFAULT_HOST, "m").with_concurrency(usize::MAX);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConcurrency(_))
        ));
    }

    #[test]
    fn test_config_validation_zero_requests() {
        let config = RequestConfig::new(DEFAULT_HOST, "m").with_requests(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRequestCount(_))
        ));
    }

    #[test]
    fn test_config_validation_blank_model() {
        let config = RequestConfig::new(DEFAULT_HOST, "  ");
        assert_eq!(config.validate(), Err(ConfigError::MissingField("model")));
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let config = RequestConfig::new(DEFAULT_HOST, "m").with_timeout_secs(Some(0));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTimeout(_))
        ));
    }

    #[test]
    fn test_sweep_validation() {
        assert!(SweepConfig::default().validate().is_ok());
        assert!(SweepConfig::new(vec![]).validate().is_err());
        assert!(SweepConfig::new(vec![1, 0, 4]).validate().is_err());
        assert!(matches!(
            SweepConfig::new(vec![1, MAX_CONCURRENCY + 1]).validate(),
            Err(ConfigError::InvalidConcurrency(_))
        ));
        // Ordering is not enforced
        assert!(SweepConfig::new(vec![8, 2, 4]).validate().is_ok());
    }

    #[test]
    fn test_threshold_validation() {
        let bad_latency = DegradationThresholds {
            latency_secs: 0.0,
            error_rate: 0.05,
        };
        assert!(bad_latency.validate().is_err());

        let bad_error = DegradationThresholds {
            latency_secs: 30.0,
            error_rate: 1.5,
        };
        assert!(bad_error.validate().is_err());
    }

    #[test]
    fn test_bench_file_parse() {
        let file = BenchFile::parse(
            r#"
[target]
host = "http://gpu-box:11434"
model = "gemma3:27b"

[workload]
prompt = "Explain TCP three-way handshake"
tokens = 256
requests = 1000
concurrency = 64

[sweep]
levels = [1, 2, 4]
latency_threshold = 10.0
"#,
        )
        .unwrap();

        let config = file.request_config().unwrap();
        assert_eq!(config.host, "http://gpu-box:11434");
        assert_eq!(config.model, "gemma3:27b");
        assert_eq!(config.max_tokens, 256);
        assert_eq!(config.requests, 1000);
        assert_eq!(config.concurrency, 64);

        let sweep = file.sweep_config();
        assert_eq!(sweep.levels, vec![1, 2, 4]);
        assert_eq!(sweep.thresholds.latency_secs, 10.0);
        assert_eq!(sweep.thresholds.error_rate, DEFAULT_ERROR_THRESHOLD);
        assert!(file.validate().is_ok());
    }

    #[test]
    fn test_bench_file_defaults_and_missing_model() {
        let file = BenchFile::parse("").unwrap();
        assert!(file.request_config().is_none());
        assert_eq!(
            file.validate(),
            Err(ConfigError::MissingField("target.model"))
        );
        assert_eq!(file.sweep_config(), SweepConfig::default());
    }

    #[test]
    fn test_bench_file_rejects_unknown_keys() {
        let result = BenchFile::parse("[target]\nmodle = \"typo\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_bench_file_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.toml");
        std::fs::write(&path, "[target]\nmodel = \"llama3:8b\"\n").unwrap();

        let file = BenchFile::from_file(&path).unwrap();
        let config = file.request_config().unwrap();
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.model, "llama3:8b");
    }

    #[test]
    fn test_bench_file_invalid_sweep_requests() {
        let file = BenchFile::parse("[target]\nmodel = \"m\"\n[sweep]\nrequests = 0\n").unwrap();
        assert!(matches!(
            file.validate(),
            Err(ConfigError::InvalidRequestCount(_))
        ));
    }
}
