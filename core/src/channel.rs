//! Channel configuration for the record collection

/// Channel buffer configuration for the record collection
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Record channel buffer size (executors -> runner)
    pub records_buffer: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            records_buffer: 10_000,
        }
    }
}

impl ChannelConfig {
    /// Create a new channel config with a custom record buffer size
    ///
    /// Sizes below one are raised to one.
    pub fn with_records_buffer(mut self, size: usize) -> Self {
        self.records_buffer = size.max(1);
        self
    }
}
