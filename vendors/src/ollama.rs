//! Ollama `/api/generate` client.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ollama_bench_core::{
    ClientError, ClientFactory, GenerateClient, GenerateRequest, HttpReply, RequestConfig,
};

use crate::http::{HttpClientPool, HttpConfig};

/// Client for a single Ollama server.
///
/// Posts the non-streaming generation body and reads the whole response.
/// Any status is returned as a reply; only transport failures are errors.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    pool: HttpClientPool,
    url: String,
}

impl OllamaClient {
    /// Create a client posting to `url`.
    pub fn new(url: impl Into<String>, config: &HttpConfig) -> Result<Self, ClientError> {
        let pool = HttpClientPool::new(config).map_err(|e| ClientError::Build(error_chain(&e)))?;
        Ok(Self {
            pool,
            url: url.into(),
        })
    }

    /// Create a client for the server and timeout named in a batch config.
    pub fn from_config(config: &RequestConfig) -> Result<Self, ClientError> {
        let http = HttpConfig::default()
            .with_request_timeout(config.timeout())
            .with_pool_max_idle(config.concurrency);
        Self::new(config.generate_url(), &http)
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn timeout(&self) -> Duration {
        self.pool.config().request_timeout.unwrap_or_default()
    }

    fn map_error(&self, error: reqwest::Error) -> ClientError {
        if error.is_timeout() {
            ClientError::Timeout(self.timeout())
        } else if error.is_body() || error.is_decode() {
            ClientError::Body(error_chain(&error))
        } else {
            ClientError::Transport(error_chain(&error))
        }
    }
}

#[async_trait]
impl GenerateClient for OllamaClient {
    fn client_name(&self) -> &str {
        "ollama"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<HttpReply, ClientError> {
        let response = self
            .pool
            .client()
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| self.map_error(e))?;

        Ok(HttpReply::new(status, body))
    }
}

/// Builds one [`OllamaClient`] per batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct OllamaClientFactory;

impl OllamaClientFactory {
    /// Create a factory.
    pub fn new() -> Self {
        Self
    }
}

impl ClientFactory for OllamaClientFactory {
    fn create(&self, config: &RequestConfig) -> Result<Arc<dyn GenerateClient>, ClientError> {
        let client = OllamaClient::from_config(config)?;
        tracing::debug!(
            url = client.url(),
            concurrency = config.concurrency,
            timeout_secs = ?config.timeout_secs,
            "Created batch client"
        );
        Ok(Arc::new(client))
    }
}

/// Render an error with its sources, outermost first.
fn error_chain(error: &dyn StdError) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.contains(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}
