use crate::analytics::{self, SurveyAnalytics};
use crate::errors::{Result, SurveyError};
use crate::export;
use crate::input::{ClientInfo, SubmissionInput, SurveyInput};
use crate::links::PublicSurvey;
use crate::metrics_defs::{
    ANALYTICS_DURATION, RECONCILE_FAILED, RESPONSES_SUBMITTED, SUBMISSIONS_REJECTED,
    SURVEYS_CREATED, SURVEYS_RECONCILED,
};
use crate::reconciler;
use crate::responses::ResponseDetail;
use crate::submission;
use chrono::Utc;
use shared::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;
use store::types::{Id, Preload, Response, ResponseRecord, Survey, SurveyGraph, SurveyLink};
use store::{Store, Transaction};

/// Commits on success, rolls back otherwise.
async fn finish<T>(tx: Box<dyn Transaction>, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(error = %rollback_err, "Failed to roll back transaction");
            }
            Err(e)
        }
    }
}

/// Entry point to the survey core. Cheap to clone.
#[derive(Clone)]
pub struct Surveys {
    store: Arc<dyn Store>,
}

impl Surveys {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Surveys { store }
    }

    async fn load_owned(&self, user_id: Id, survey_id: Id, preload: Preload) -> Result<SurveyGraph> {
        match self.store.load_survey(survey_id, preload).await? {
            Some(graph) if graph.survey.user_id == user_id => Ok(graph),
            _ => Err(SurveyError::survey_not_found(survey_id)),
        }
    }

    async fn find_owned(&self, user_id: Id, survey_id: Id) -> Result<Survey> {
        match self.store.find_survey(survey_id).await? {
            Some(survey) if survey.user_id == user_id => Ok(survey),
            _ => Err(SurveyError::survey_not_found(survey_id)),
        }
    }

    /// Creates a survey with its questions and mints its first link.
    pub async fn create(&self, user_id: Id, input: &SurveyInput) -> Result<SurveyGraph> {
        input.validate()?;

        let mut tx = self.store.begin().await?;
        let result = reconciler::create(tx.as_mut(), user_id, input, Utc::now()).await;
        let survey = finish(tx, result).await?;

        counter!(SURVEYS_CREATED).increment(1);
        tracing::info!(survey_id = survey.id, user_id, "Created survey");

        self.load_owned(user_id, survey.id, Preload::QUESTIONS).await
    }

    pub async fn list(&self, user_id: Id) -> Result<Vec<Survey>> {
        Ok(self.store.list_surveys(user_id).await?)
    }

    pub async fn get(&self, user_id: Id, survey_id: Id) -> Result<SurveyGraph> {
        self.load_owned(user_id, survey_id, Preload::QUESTIONS).await
    }

    /// Replaces the survey's fields and question subtree with `input` in
    /// one transaction and bumps its version.
    pub async fn update(
        &self,
        user_id: Id,
        survey_id: Id,
        input: &SurveyInput,
    ) -> Result<SurveyGraph> {
        input.validate()?;

        let mut tx = self.store.begin().await?;
        let result = reconciler::reconcile(tx.as_mut(), user_id, survey_id, input, Utc::now()).await;

        match finish(tx, result).await {
            Ok(survey) => {
                counter!(SURVEYS_RECONCILED).increment(1);
                tracing::info!(survey_id, version = survey.version, "Updated survey");
            }
            Err(e) => {
                counter!(RECONCILE_FAILED).increment(1);
                tracing::warn!(survey_id, error = %e, "Survey update rolled back");
                return Err(e);
            }
        }

        self.load_owned(user_id, survey_id, Preload::QUESTIONS).await
    }

    pub async fn duplicate(&self, user_id: Id, survey_id: Id) -> Result<SurveyGraph> {
        let mut tx = self.store.begin().await?;
        let result = reconciler::duplicate(tx.as_mut(), user_id, survey_id, Utc::now()).await;
        let copy = finish(tx, result).await?;

        counter!(SURVEYS_CREATED).increment(1);
        tracing::info!(source_id = survey_id, survey_id = copy.id, "Duplicated survey");

        self.load_owned(user_id, copy.id, Preload::QUESTIONS).await
    }

    /// Toggles publication. Not a structural change, the version stays.
    pub async fn set_published(&self, user_id: Id, survey_id: Id, published: bool) -> Result<Survey> {
        let mut tx = self.store.begin().await?;
        let result = async {
            let mut survey = reconciler::owned_survey(tx.as_mut(), user_id, survey_id).await?;
            tx.set_published(survey_id, published).await?;
            survey.is_published = published;
            Ok::<_, SurveyError>(survey)
        }
        .await;
        let survey = finish(tx, result).await?;

        tracing::info!(survey_id, published, "Changed survey publication");
        Ok(survey)
    }

    /// Deletes a survey with everything it owns.
    pub async fn delete(&self, user_id: Id, survey_id: Id) -> Result<()> {
        let mut tx = self.store.begin().await?;
        let result = async {
            reconciler::owned_survey(tx.as_mut(), user_id, survey_id).await?;
            tx.delete_survey(survey_id).await?;
            Ok::<_, SurveyError>(())
        }
        .await;
        finish(tx, result).await?;

        tracing::info!(survey_id, user_id, "Deleted survey");
        Ok(())
    }

    pub async fn links(&self, user_id: Id, survey_id: Id) -> Result<Vec<SurveyLink>> {
        self.find_owned(user_id, survey_id).await?;
        Ok(self.store.list_links(survey_id).await?)
    }

    /// Resolves an active link alias to the respondent view of its survey.
    pub async fn resolve_link(&self, alias: &str) -> Result<PublicSurvey> {
        let link = self
            .store
            .find_active_link(alias)
            .await?
            .ok_or(SurveyError::LinkNotFound)?;

        let graph = self
            .store
            .load_survey(link.survey_id, Preload::QUESTIONS)
            .await?
            .ok_or_else(|| SurveyError::survey_not_found(link.survey_id))?;

        Ok(graph.into())
    }

    /// Persists a response and its answers. Does not notify webhooks, the
    /// caller does that once this returns.
    pub async fn submit(
        &self,
        survey_id: Id,
        input: &SubmissionInput,
        client: &ClientInfo,
    ) -> Result<Response> {
        let mut tx = self.store.begin().await?;
        let result = submission::submit(tx.as_mut(), survey_id, input, client, Utc::now()).await;

        match finish(tx, result).await {
            Ok(response) => {
                counter!(RESPONSES_SUBMITTED).increment(1);
                tracing::info!(survey_id, response_id = response.id, "Response submitted");
                Ok(response)
            }
            Err(e) => {
                if let Some(reason) = e.rejection_reason() {
                    counter!(SUBMISSIONS_REJECTED, "reason" => reason).increment(1);
                    tracing::debug!(survey_id, reason, "Submission rejected");
                }
                Err(e)
            }
        }
    }

    pub async fn list_responses(&self, user_id: Id, survey_id: Id) -> Result<Vec<ResponseRecord>> {
        self.find_owned(user_id, survey_id).await?;
        Ok(self.store.list_responses(survey_id).await?)
    }

    pub async fn get_response(
        &self,
        user_id: Id,
        survey_id: Id,
        response_id: Id,
    ) -> Result<ResponseDetail> {
        let graph = self.load_owned(user_id, survey_id, Preload::QUESTIONS).await?;
        let record = self
            .store
            .find_response(survey_id, response_id)
            .await?
            .ok_or(SurveyError::NotFound {
                entity: "response",
                id: response_id,
            })?;

        Ok(ResponseDetail::new(record, &graph.questions))
    }

    pub async fn analytics(&self, user_id: Id, survey_id: Id) -> Result<SurveyAnalytics> {
        let graph = self.load_owned(user_id, survey_id, Preload::ALL).await?;

        let start = Instant::now();
        let analytics = analytics::analyze(&graph);
        histogram!(ANALYTICS_DURATION).record(start.elapsed().as_secs_f64());

        Ok(analytics)
    }

    /// Renders all responses as CSV.
    pub async fn export(&self, user_id: Id, survey_id: Id) -> Result<Vec<u8>> {
        let graph = self.load_owned(user_id, survey_id, Preload::ALL).await?;
        Ok(export::to_csv(&graph)?)
    }
}
