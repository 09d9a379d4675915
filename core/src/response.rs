//! Result records and the inbound generation response

use serde::{Deserialize, Serialize};

use crate::request::RequestId;

/// Maximum length, in characters, of a diagnostic string
pub const MAX_DIAGNOSTIC_CHARS: usize = 200;

/// Server-reported durations are in microseconds
const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// Classification of a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// HTTP 200 with a parseable body
    Success,
    /// Any other HTTP status
    HttpError,
    /// Transport failure or malformed success body
    Exception,
}

impl Outcome {
    /// Check if this outcome indicates success
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// Stable lowercase name, used in reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::HttpError => "http_error",
            Outcome::Exception => "exception",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters extracted from a successful `/api/generate` body
///
/// Both fields are optional; every other field of the body is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct GenerateReply {
    /// Total generation time in microseconds
    #[serde(default)]
    pub total_duration: Option<u64>,

    /// Number of generated tokens
    #[serde(default)]
    pub eval_count: Option<u64>,
}

impl GenerateReply {
    /// Parse a response body
    ///
    /// The body must be a JSON object; derived struct deserialization would
    /// otherwise also accept an array and read its elements by position.
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        match serde_json::from_str::<serde_json::Value>(body)? {
            value @ serde_json::Value::Object(_) => serde_json::from_value(value),
            other => Err(serde::de::Error::custom(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Total generation time converted to seconds
    pub fn total_duration_secs(&self) -> Option<f64> {
        self.total_duration
            .map(|micros| micros as f64 / MICROS_PER_SECOND)
    }
}

/// Outcome of one dispatched request
///
/// Created exactly once per request by the executor and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Request identifier (submission index)
    pub request_id: RequestId,

    /// Wall-clock latency in seconds, including time spent waiting for admission
    pub latency_secs: f64,

    /// Outcome classification
    pub outcome: Outcome,

    /// HTTP status code, when a response was received
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Bounded diagnostic text for failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Server-reported generation time in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration_secs: Option<f64>,

    /// Server-reported output token count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u64>,
}

impl ResultRecord {
    /// Record a successful request
    pub fn success(request_id: RequestId, latency_secs: f64, reply: GenerateReply) -> Self {
        Self {
            request_id,
            latency_secs,
            outcome: Outcome::Success,
            status: Some(200),
            error: None,
            total_duration_secs: reply.total_duration_secs(),
            tokens: reply.eval_count,
        }
    }

    /// Record a request the server rejected with a non-200 status
    pub fn http_error(request_id: RequestId, latency_secs: f64, status: u16, body: &str) -> Self {
        Self {
            request_id,
            latency_secs,
            outcome: Outcome::HttpError,
            status: Some(status),
            error: Some(truncate_diagnostic(body)),
            total_duration_secs: None,
            tokens: None,
        }
    }

    /// Record a transport failure or an unreadable success body
    pub fn exception(request_id: RequestId, latency_secs: f64, diagnostic: &str) -> Self {
        Self {
            request_id,
            latency_secs,
            outcome: Outcome::Exception,
            status: None,
            error: Some(truncate_diagnostic(diagnostic)),
            total_duration_secs: None,
            tokens: None,
        }
    }

    /// Check if the request succeeded
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Keep at most [`MAX_DIAGNOSTIC_CHARS`] characters
pub fn truncate_diagnostic(text: &str) -> String {
    text.chars().take(MAX_DIAGNOSTIC_CHARS).collect()
}
