use crate::config::WebhooksConfig;
use crate::errors::{DeliveryError, WebhookError};
use crate::event::{Payload, WebhookEvent};
use crate::metrics_defs::{DELIVERIES, DELIVERY_DURATION, DISPATCH_FANOUT, DISPATCH_LOOKUP_FAILED};
use crate::signature::{SECRET_HEADER, SIGNATURE_HEADER, sign};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use shared::{counter, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};
use store::Store;
use store::types::{Id, Webhook};
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::timeout;

/// Outcome of one delivery attempt.
#[derive(Debug)]
pub struct DeliveryReport {
    pub webhook_id: Id,
    pub url: String,
    pub result: Result<StatusCode, DeliveryError>,
}

/// Fans submission events out to subscribed endpoints.
///
/// Deliveries from every dispatch share one semaphore, so at most
/// `max_concurrent_deliveries` requests are in flight process wide.
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<dyn Store>,
    client: reqwest::Client,
    permits: Arc<Semaphore>,
    delivery_timeout: Duration,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn Store>, config: &WebhooksConfig) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("surveyx-webhooks/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Dispatcher {
            store,
            client,
            permits: Arc::new(Semaphore::new(config.max_concurrent_deliveries)),
            delivery_timeout: config.delivery_timeout(),
        })
    }

    /// Starts delivering `response_submitted` for the response and returns
    /// at once. The handle resolves when every delivery has finished.
    pub fn dispatch(&self, survey_id: Id, response_id: Id) -> JoinHandle<Vec<DeliveryReport>> {
        let dispatcher = self.clone();
        tokio::spawn(async move { dispatcher.deliver_all(survey_id, response_id).await })
    }

    async fn deliver_all(self, survey_id: Id, response_id: Id) -> Vec<DeliveryReport> {
        let event = WebhookEvent::ResponseSubmitted;

        let webhooks = match self.store.list_webhooks_for_survey(survey_id).await {
            Ok(webhooks) => webhooks,
            Err(e) => {
                counter!(DISPATCH_LOOKUP_FAILED).increment(1);
                tracing::error!(survey_id, response_id, error = %e, "Failed to load webhooks");
                return Vec::new();
            }
        };

        let subscribed: Vec<Webhook> = webhooks
            .into_iter()
            .filter(|webhook| event.accepted_by(&webhook.events))
            .collect();
        histogram!(DISPATCH_FANOUT).record(subscribed.len() as f64);

        if subscribed.is_empty() {
            return Vec::new();
        }

        let payload = Payload {
            event,
            survey_id,
            response_id,
        };
        let body = match serde_json::to_vec(&payload) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(survey_id, response_id, error = %e, "Failed to encode webhook payload");
                return Vec::new();
            }
        };

        let mut join_set = JoinSet::new();
        for webhook in subscribed {
            let client = self.client.clone();
            let permits = self.permits.clone();
            let body = body.clone();
            let delivery_timeout = self.delivery_timeout;

            join_set.spawn(async move {
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => deliver(&client, &webhook, body, delivery_timeout).await,
                    Err(_) => Err(DeliveryError::Closed),
                };
                report(webhook, result)
            });
        }

        let mut reports = Vec::new();
        while let Some(join_result) = join_set.join_next().await {
            match join_result {
                Ok(report) => reports.push(report),
                Err(e) => tracing::error!("Delivery task panicked: {}", e),
            }
        }
        reports
    }
}

/// One POST, no retries.
async fn deliver(
    client: &reqwest::Client,
    webhook: &Webhook,
    body: Vec<u8>,
    delivery_timeout: Duration,
) -> Result<StatusCode, DeliveryError> {
    let started = Instant::now();
    let signature = sign(&webhook.secret, &body);

    let request = client
        .post(&webhook.url)
        .header(CONTENT_TYPE, "application/json")
        .header(SECRET_HEADER, &webhook.secret)
        .header(SIGNATURE_HEADER, signature)
        .body(body);

    let result = match timeout(delivery_timeout, request.send()).await {
        Err(_) => Err(DeliveryError::Timeout(delivery_timeout)),
        Ok(Err(e)) => Err(DeliveryError::Request(e)),
        Ok(Ok(response)) if response.status().is_success() => Ok(response.status()),
        Ok(Ok(response)) => Err(DeliveryError::Status(response.status())),
    };

    histogram!(DELIVERY_DURATION).record(started.elapsed().as_secs_f64());
    result
}

fn report(webhook: Webhook, result: Result<StatusCode, DeliveryError>) -> DeliveryReport {
    match &result {
        Ok(status) => {
            counter!(DELIVERIES, "outcome" => "delivered").increment(1);
            tracing::debug!(webhook_id = webhook.id, status = %status, "Webhook delivered");
        }
        Err(e) => {
            counter!(DELIVERIES, "outcome" => e.outcome()).increment(1);
            tracing::warn!(
                webhook_id = webhook.id,
                url = %webhook.url,
                error = %e,
                "Webhook delivery failed"
            );
        }
    }

    DeliveryReport {
        webhook_id: webhook.id,
        url: webhook.url,
        result,
    }
}
