use reqwest::StatusCode;
use std::time::Duration;
use store::StoreError;
use store::types::Id;

#[derive(thiserror::Error, Debug)]
pub enum WebhookError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Id },

    #[error("invalid webhook url: {0}")]
    InvalidUrl(String),

    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for WebhookError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => WebhookError::NotFound { entity, id },
            other => WebhookError::Store(other),
        }
    }
}

/// Why a single delivery did not succeed.
#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("endpoint answered {0}")]
    Status(StatusCode),

    #[error("delivery pool closed")]
    Closed,
}

impl DeliveryError {
    pub fn outcome(&self) -> &'static str {
        match self {
            DeliveryError::Request(_) => "request_error",
            DeliveryError::Timeout(_) => "timeout",
            DeliveryError::Status(_) => "bad_status",
            DeliveryError::Closed => "closed",
        }
    }
}
