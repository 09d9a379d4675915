//! Builder pattern for BatchRunner construction

use std::sync::Arc;

use crate::channel::ChannelConfig;
use crate::config::ConfigError;
use crate::error::BenchResult;
use crate::traits::{BatchObserver, ClientFactory};

use super::executor::BatchRunner;

/// Builder for creating a BatchRunner
///
/// # Example
///
/// ```ignore
/// let runner = BatchRunnerBuilder::new()
///     .factory(Arc::new(OllamaClientFactory::new()))
///     .observer(progress_bar)
///     .build()?;
///
/// let report = runner.run(&config).await?;
/// ```
#[derive(Default)]
pub struct BatchRunnerBuilder {
    factory: Option<Arc<dyn ClientFactory>>,
    observer: Option<Arc<dyn BatchObserver>>,
    channel_config: ChannelConfig,
}

impl BatchRunnerBuilder {
    /// Create a new builder with the default channel configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the client factory
    pub fn factory(mut self, factory: Arc<dyn ClientFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Set the progress observer
    pub fn observer(mut self, observer: Arc<dyn BatchObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Set the channel configuration
    pub fn channel_config(mut self, config: ChannelConfig) -> Self {
        self.channel_config = config;
        self
    }

    /// Build the BatchRunner
    ///
    /// # Errors
    /// Returns an error if no client factory was set.
    pub fn build(self) -> BenchResult<BatchRunner> {
        let factory = self.factory.ok_or(ConfigError::MissingField("factory"))?;

        Ok(BatchRunner {
            factory,
            channel_config: self.channel_config,
            observer: self.observer,
        })
    }
}
