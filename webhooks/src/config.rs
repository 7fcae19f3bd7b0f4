use serde::Deserialize;
use std::time::Duration;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("max_concurrent_deliveries must be at least 1")]
    InvalidConcurrency,

    #[error("delivery_timeout_secs must be at least 1")]
    InvalidTimeout,
}

fn default_max_concurrent_deliveries() -> usize {
    32
}

fn default_delivery_timeout_secs() -> u64 {
    10
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct WebhooksConfig {
    /// Upper bound on deliveries in flight across all submissions.
    #[serde(default = "default_max_concurrent_deliveries")]
    pub max_concurrent_deliveries: usize,
    /// Applies to the whole request, connect included.
    #[serde(default = "default_delivery_timeout_secs")]
    pub delivery_timeout_secs: u64,
}

impl Default for WebhooksConfig {
    fn default() -> Self {
        WebhooksConfig {
            max_concurrent_deliveries: default_max_concurrent_deliveries(),
            delivery_timeout_secs: default_delivery_timeout_secs(),
        }
    }
}

impl WebhooksConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_concurrent_deliveries == 0 {
            return Err(ValidationError::InvalidConcurrency);
        }
        if self.delivery_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery_timeout_secs)
    }
}
