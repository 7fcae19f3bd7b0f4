use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::{Arc, Mutex};
use store::types::{
    Answer, ChoiceOption, Condition, Id, Preload, Question, QuestionTree, QuestionType, Response,
    ResponseRecord, Survey, SurveyGraph, SurveyLink, Webhook,
};
use store::{MemoryStore, Result, Store, StoreError, Transaction};

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

pub fn survey(id: Id) -> Survey {
    Survey {
        id,
        user_id: 1,
        title: "Survey".into(),
        description: String::new(),
        release_date: None,
        close_date: None,
        response_limit: None,
        redirect_url: String::new(),
        closed_message: String::new(),
        custom_styles: String::new(),
        version: 1,
        is_published: false,
        created_at: epoch(),
        updated_at: epoch(),
    }
}

pub fn question(id: Id, question_type: QuestionType) -> QuestionTree {
    QuestionTree {
        question: Question {
            id,
            survey_id: 1,
            text: format!("Question {id}"),
            question_type,
            is_required: false,
            order: id,
            min_value: None,
            max_value: None,
            allow_multiple: false,
            max_file_size: None,
        },
        options: Vec::new(),
        conditions: Vec::new(),
    }
}

/// Builds a survey graph with one response per entry of `responses`.
pub fn graph_with_answers(
    questions: Vec<QuestionTree>,
    responses: Vec<Vec<(Id, &str)>>,
) -> SurveyGraph {
    let mut answer_id = 0;
    let responses = responses
        .into_iter()
        .zip(1..)
        .map(|(answers, response_id)| ResponseRecord {
            response: Response {
                id: response_id,
                survey_id: 1,
                ip: "127.0.0.1".into(),
                user_agent: "test".into(),
                created_at: epoch() + Duration::seconds(response_id),
            },
            answers: answers
                .into_iter()
                .map(|(question_id, value)| {
                    answer_id += 1;
                    Answer {
                        id: answer_id,
                        response_id,
                        question_id,
                        value: value.into(),
                    }
                })
                .collect(),
        })
        .collect();

    SurveyGraph {
        survey: survey(1),
        questions,
        responses,
    }
}

/// Write step a [`FailingStore`] transaction can be made to fail at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailPoint {
    SaveSurvey,
    InsertQuestion,
    InsertOption,
    InsertCondition,
}

/// Shared between a [`FailingStore`] and the test driving it.
#[derive(Clone, Default)]
pub struct FailSwitch(Arc<Mutex<Option<FailPoint>>>);

impl FailSwitch {
    pub fn arm(&self, point: FailPoint) {
        *self.0.lock().unwrap() = Some(point);
    }

    pub fn disarm(&self) {
        *self.0.lock().unwrap() = None;
    }

    fn check(&self, point: FailPoint) -> Result<()> {
        match *self.0.lock().unwrap() {
            Some(armed) if armed == point => {
                Err(StoreError::Conflict(format!("injected failure at {point:?}")))
            }
            _ => Ok(()),
        }
    }
}

/// Wraps another store. Its transactions fail at the armed [`FailPoint`].
pub struct FailingStore {
    inner: Arc<dyn Store>,
    pub switch: FailSwitch,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::wrap(Arc::new(MemoryStore::new()))
    }

    pub fn wrap(inner: Arc<dyn Store>) -> Self {
        FailingStore {
            inner,
            switch: FailSwitch::default(),
        }
    }
}

#[async_trait]
impl Store for FailingStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        Ok(Box::new(FailingTransaction {
            inner: self.inner.begin().await?,
            switch: self.switch.clone(),
        }))
    }

    async fn find_survey(&self, id: Id) -> Result<Option<Survey>> {
        self.inner.find_survey(id).await
    }

    async fn list_surveys(&self, user_id: Id) -> Result<Vec<Survey>> {
        self.inner.list_surveys(user_id).await
    }

    async fn load_survey(&self, id: Id, preload: Preload) -> Result<Option<SurveyGraph>> {
        self.inner.load_survey(id, preload).await
    }

    async fn find_active_link(&self, alias: &str) -> Result<Option<SurveyLink>> {
        self.inner.find_active_link(alias).await
    }

    async fn list_links(&self, survey_id: Id) -> Result<Vec<SurveyLink>> {
        self.inner.list_links(survey_id).await
    }

    async fn list_responses(&self, survey_id: Id) -> Result<Vec<ResponseRecord>> {
        self.inner.list_responses(survey_id).await
    }

    async fn find_response(
        &self,
        survey_id: Id,
        response_id: Id,
    ) -> Result<Option<ResponseRecord>> {
        self.inner.find_response(survey_id, response_id).await
    }

    async fn find_webhook(&self, id: Id) -> Result<Option<Webhook>> {
        self.inner.find_webhook(id).await
    }

    async fn list_webhooks_for_user(&self, user_id: Id) -> Result<Vec<Webhook>> {
        self.inner.list_webhooks_for_user(user_id).await
    }

    async fn list_webhooks_for_survey(&self, survey_id: Id) -> Result<Vec<Webhook>> {
        self.inner.list_webhooks_for_survey(survey_id).await
    }
}

struct FailingTransaction {
    inner: Box<dyn Transaction>,
    switch: FailSwitch,
}

#[async_trait]
impl Transaction for FailingTransaction {
    async fn find_survey(&mut self, id: Id) -> Result<Option<Survey>> {
        self.inner.find_survey(id).await
    }

    async fn load_questions(&mut self, survey_id: Id) -> Result<Vec<QuestionTree>> {
        self.inner.load_questions(survey_id).await
    }

    async fn count_responses(&mut self, survey_id: Id) -> Result<i64> {
        self.inner.count_responses(survey_id).await
    }

    async fn insert_survey(&mut self, survey: &Survey) -> Result<Survey> {
        self.inner.insert_survey(survey).await
    }

    async fn save_survey(&mut self, survey: &Survey) -> Result<()> {
        self.switch.check(FailPoint::SaveSurvey)?;
        self.inner.save_survey(survey).await
    }

    async fn set_published(&mut self, survey_id: Id, published: bool) -> Result<()> {
        self.inner.set_published(survey_id, published).await
    }

    async fn delete_survey(&mut self, survey_id: Id) -> Result<()> {
        self.inner.delete_survey(survey_id).await
    }

    async fn insert_question(&mut self, question: &Question) -> Result<Question> {
        self.switch.check(FailPoint::InsertQuestion)?;
        self.inner.insert_question(question).await
    }

    async fn update_question(&mut self, question: &Question) -> Result<()> {
        self.inner.update_question(question).await
    }

    async fn delete_question(&mut self, question_id: Id) -> Result<()> {
        self.inner.delete_question(question_id).await
    }

    async fn insert_option(&mut self, option: &ChoiceOption) -> Result<ChoiceOption> {
        self.switch.check(FailPoint::InsertOption)?;
        self.inner.insert_option(option).await
    }

    async fn delete_options(&mut self, question_id: Id) -> Result<u64> {
        self.inner.delete_options(question_id).await
    }

    async fn insert_condition(&mut self, condition: &Condition) -> Result<Condition> {
        self.switch.check(FailPoint::InsertCondition)?;
        self.inner.insert_condition(condition).await
    }

    async fn delete_conditions(&mut self, question_id: Id) -> Result<u64> {
        self.inner.delete_conditions(question_id).await
    }

    async fn delete_answers(&mut self, question_id: Id) -> Result<u64> {
        self.inner.delete_answers(question_id).await
    }

    async fn insert_link(&mut self, link: &SurveyLink) -> Result<SurveyLink> {
        self.inner.insert_link(link).await
    }

    async fn deactivate_links(&mut self, survey_id: Id) -> Result<u64> {
        self.inner.deactivate_links(survey_id).await
    }

    async fn insert_response(&mut self, response: &Response) -> Result<Response> {
        self.inner.insert_response(response).await
    }

    async fn insert_answer(&mut self, answer: &Answer) -> Result<Answer> {
        self.inner.insert_answer(answer).await
    }

    async fn insert_webhook(&mut self, webhook: &Webhook) -> Result<Webhook> {
        self.inner.insert_webhook(webhook).await
    }

    async fn save_webhook(&mut self, webhook: &Webhook) -> Result<()> {
        self.inner.save_webhook(webhook).await
    }

    async fn delete_webhook(&mut self, webhook_id: Id) -> Result<()> {
        self.inner.delete_webhook(webhook_id).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.inner.commit().await
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.inner.rollback().await
    }
}
