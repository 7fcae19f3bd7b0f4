//! Shareable link aliases.

use crate::errors::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use store::types::{Id, QuestionTree, SurveyGraph, SurveyLink};
use store::{StoreError, Transaction};
use uuid::Uuid;

const ALIAS_LEN: usize = 12;
const MINT_ATTEMPTS: u32 = 3;

fn new_alias() -> String {
    let mut alias = Uuid::new_v4().simple().to_string();
    alias.truncate(ALIAS_LEN);
    alias
}

/// Mints a fresh active link for `survey_id`. Every link minted before it
/// is deactivated.
pub(crate) async fn mint(tx: &mut dyn Transaction, survey_id: Id) -> Result<SurveyLink> {
    let deactivated = tx.deactivate_links(survey_id).await?;

    let mut attempt = 1;
    loop {
        let candidate = SurveyLink {
            id: 0,
            survey_id,
            link: new_alias(),
            is_active: true,
            created_at: Utc::now(),
        };

        match tx.insert_link(&candidate).await {
            Ok(link) => {
                tracing::debug!(survey_id, alias = %link.link, deactivated, "Minted survey link");
                return Ok(link);
            }
            Err(StoreError::Conflict(reason)) if attempt < MINT_ATTEMPTS => {
                tracing::warn!(survey_id, attempt, reason = %reason, "Link alias collision, retrying");
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// What a respondent sees when following a link: no owner, no responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSurvey {
    pub id: Id,
    pub title: String,
    pub description: String,
    pub release_date: Option<DateTime<Utc>>,
    pub close_date: Option<DateTime<Utc>>,
    pub redirect_url: String,
    pub closed_message: String,
    pub custom_styles: String,
    pub is_published: bool,
    pub questions: Vec<QuestionTree>,
}

impl From<SurveyGraph> for PublicSurvey {
    fn from(graph: SurveyGraph) -> Self {
        let survey = graph.survey;
        PublicSurvey {
            id: survey.id,
            title: survey.title,
            description: survey.description,
            release_date: survey.release_date,
            close_date: survey.close_date,
            redirect_url: survey.redirect_url,
            closed_message: survey.closed_message,
            custom_styles: survey.custom_styles,
            is_published: survey.is_published,
            questions: graph.questions,
        }
    }
}
