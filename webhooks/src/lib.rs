//! Webhook registrations and delivery of submission events.

pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod event;
pub mod metrics_defs;
pub mod registry;
pub mod signature;

#[cfg(test)]
mod testutils;

pub use config::WebhooksConfig;
pub use dispatcher::{DeliveryReport, Dispatcher};
pub use errors::{DeliveryError, WebhookError};
pub use registry::{WebhookInput, Webhooks};
