use api::config::ApiConfig;
use serde::Deserialize;
use std::fs::File;
use store::StoreConfig;
use webhooks::WebhooksConfig;

#[derive(Debug, Deserialize, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub sentry_dsn: String,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub api: ApiConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub webhooks: WebhooksConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(metrics) = &self.common.metrics
            && (metrics.statsd_host.is_empty() || metrics.statsd_port == 0)
        {
            return Err(ValidationError::Metrics);
        }
        if let Some(logging) = &self.common.logging
            && logging.sentry_dsn.is_empty()
        {
            return Err(ValidationError::Logging);
        }

        self.api.validate()?;
        self.store.validate()?;
        self.webhooks.validate()?;
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("metrics: statsd_host and statsd_port are required")]
    Metrics,
    #[error("logging: sentry_dsn cannot be empty")]
    Logging,
    #[error("api: {0}")]
    Api(#[from] api::config::ValidationError),
    #[error("store: {0}")]
    Store(#[from] store::config::ValidationError),
    #[error("webhooks: {0}")]
    Webhooks(#[from] webhooks::config::ValidationError),
}
