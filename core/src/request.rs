//! Wire format of the outbound generation request

use serde::{Deserialize, Serialize};

use crate::config::RequestConfig;

/// Unique request identifier within a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for RequestId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Body of `POST /api/generate`
///
/// The layout is fixed by the server: `{model, prompt, stream: false,
/// options: {num_predict}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Model identifier
    pub model: String,

    /// Prompt text
    pub prompt: String,

    /// Always `false`: the whole response is read in one body
    pub stream: bool,

    /// Generation options
    pub options: GenerateOptions,
}

/// `options` object of a generation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Maximum tokens to generate
    pub num_predict: u32,
}

impl GenerateRequest {
    /// Build the request body shared by every request of a batch
    pub fn from_config(config: &RequestConfig) -> Self {
        Self {
            model: config.model.clone(),
            prompt: config.prompt.clone(),
            stream: false,
            options: GenerateOptions {
                num_predict: config.max_tokens,
            },
        }
    }
}
