//! Configuration for the store connection.

use std::time::Duration;

/// Configuration for a store connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Store endpoint (e.g. "http://localhost:9080").
    pub endpoint: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl StoreConfig {
    /// Creates a configuration for the given endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("http://localhost:9080")
    }
}
