//! Webhook registrations owned by survey authors.

use crate::errors::WebhookError;
use serde::Deserialize;
use std::sync::Arc;
use store::Store;
use store::types::{Id, Webhook};
use url::Url;

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookInput {
    /// Only read on creation. A webhook stays attached to its survey.
    #[serde(default)]
    pub survey_id: Id,
    pub url: String,
    #[serde(default)]
    pub events: String,
    #[serde(default)]
    pub secret: String,
}

fn validate_url(raw: &str) -> Result<(), WebhookError> {
    let url = Url::parse(raw).map_err(|e| WebhookError::InvalidUrl(format!("{raw}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(WebhookError::InvalidUrl(format!(
            "{raw}: unsupported scheme {scheme}"
        ))),
    }
}

#[derive(Clone)]
pub struct Webhooks {
    store: Arc<dyn Store>,
}

impl Webhooks {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Webhooks { store }
    }

    /// A webhook owned by someone else is reported as missing.
    async fn owned(&self, user_id: Id, webhook_id: Id) -> Result<Webhook, WebhookError> {
        match self.store.find_webhook(webhook_id).await? {
            Some(webhook) if webhook.user_id == user_id => Ok(webhook),
            _ => Err(WebhookError::NotFound {
                entity: "webhook",
                id: webhook_id,
            }),
        }
    }

    pub async fn create(&self, user_id: Id, input: &WebhookInput) -> Result<Webhook, WebhookError> {
        validate_url(&input.url)?;

        match self.store.find_survey(input.survey_id).await? {
            Some(survey) if survey.user_id == user_id => {}
            _ => {
                return Err(WebhookError::NotFound {
                    entity: "survey",
                    id: input.survey_id,
                });
            }
        }

        let mut tx = self.store.begin().await?;
        let webhook = tx
            .insert_webhook(&Webhook {
                id: 0,
                user_id,
                survey_id: input.survey_id,
                url: input.url.clone(),
                events: input.events.clone(),
                secret: input.secret.clone(),
            })
            .await?;
        tx.commit().await?;

        tracing::info!(webhook_id = webhook.id, survey_id = webhook.survey_id, "Created webhook");
        Ok(webhook)
    }

    pub async fn list(&self, user_id: Id) -> Result<Vec<Webhook>, WebhookError> {
        Ok(self.store.list_webhooks_for_user(user_id).await?)
    }

    /// Replaces url, events and secret.
    pub async fn update(
        &self,
        user_id: Id,
        webhook_id: Id,
        input: &WebhookInput,
    ) -> Result<Webhook, WebhookError> {
        validate_url(&input.url)?;
        let mut webhook = self.owned(user_id, webhook_id).await?;

        webhook.url = input.url.clone();
        webhook.events = input.events.clone();
        webhook.secret = input.secret.clone();

        let mut tx = self.store.begin().await?;
        tx.save_webhook(&webhook).await?;
        tx.commit().await?;

        Ok(webhook)
    }

    pub async fn delete(&self, user_id: Id, webhook_id: Id) -> Result<(), WebhookError> {
        self.owned(user_id, webhook_id).await?;

        let mut tx = self.store.begin().await?;
        tx.delete_webhook(webhook_id).await?;
        tx.commit().await?;

        tracing::info!(webhook_id, "Deleted webhook");
        Ok(())
    }
}
