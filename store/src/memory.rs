//! In-process store used by tests and single-node development setups.
//!
//! A transaction holds the only write lock for its whole lifetime and works on
//! a private copy of the tables, so transactions are serializable and an
//! abandoned transaction leaves no trace.

use crate::types::{
    Answer, ChoiceOption, Condition, Id, Preload, Question, QuestionTree, Response,
    ResponseRecord, Survey, SurveyGraph, SurveyLink, Webhook,
};
use crate::{Result, Store, StoreError, Transaction};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Debug)]
struct Table<T> {
    rows: BTreeMap<Id, T>,
    last_id: Id,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Table {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<T: Clone> Table<T> {
    fn insert_with(&mut self, build: impl FnOnce(Id) -> T) -> T {
        self.last_id += 1;
        let row = build(self.last_id);
        self.rows.insert(self.last_id, row.clone());
        row
    }

    fn contains(&self, id: Id) -> bool {
        self.rows.contains_key(&id)
    }

    fn replace(&mut self, id: Id, row: T, entity: &'static str) -> Result<()> {
        match self.rows.get_mut(&id) {
            Some(existing) => {
                *existing = row;
                Ok(())
            }
            None => Err(StoreError::not_found(entity, id)),
        }
    }

    fn remove_where(&mut self, mut matches: impl FnMut(&T) -> bool) -> u64 {
        let before = self.rows.len();
        self.rows.retain(|_, row| !matches(row));
        (before - self.rows.len()) as u64
    }

    fn values(&self) -> impl Iterator<Item = &T> {
        self.rows.values()
    }
}

#[derive(Clone, Debug, Default)]
struct Tables {
    surveys: Table<Survey>,
    questions: Table<Question>,
    options: Table<ChoiceOption>,
    conditions: Table<Condition>,
    responses: Table<Response>,
    answers: Table<Answer>,
    links: Table<SurveyLink>,
    webhooks: Table<Webhook>,
}

impl Tables {
    fn question_trees(&self, survey_id: Id) -> Vec<QuestionTree> {
        let mut questions: Vec<&Question> = self
            .questions
            .values()
            .filter(|q| q.survey_id == survey_id)
            .collect();
        questions.sort_by_key(|q| (q.order, q.id));

        questions
            .into_iter()
            .map(|question| QuestionTree {
                question: question.clone(),
                options: self
                    .options
                    .values()
                    .filter(|o| o.question_id == question.id)
                    .cloned()
                    .collect(),
                conditions: self
                    .conditions
                    .values()
                    .filter(|c| c.question_id == question.id)
                    .cloned()
                    .collect(),
            })
            .collect()
    }

    fn response_record(&self, response: &Response) -> ResponseRecord {
        ResponseRecord {
            response: response.clone(),
            answers: self
                .answers
                .values()
                .filter(|a| a.response_id == response.id)
                .cloned()
                .collect(),
        }
    }

    fn response_records(&self, survey_id: Id) -> Vec<ResponseRecord> {
        self.responses
            .values()
            .filter(|r| r.survey_id == survey_id)
            .map(|r| self.response_record(r))
            .collect()
    }

    fn count_responses(&self, survey_id: Id) -> i64 {
        self.responses
            .values()
            .filter(|r| r.survey_id == survey_id)
            .count() as i64
    }

    fn require_survey(&self, survey_id: Id, entity: &'static str) -> Result<()> {
        if self.surveys.contains(survey_id) {
            Ok(())
        } else {
            Err(StoreError::ForeignKey { entity })
        }
    }

    fn require_question(&self, question_id: Id, entity: &'static str) -> Result<()> {
        if self.questions.contains(question_id) {
            Ok(())
        } else {
            Err(StoreError::ForeignKey { entity })
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        let guard = self.tables.clone().lock_owned().await;
        let working = (*guard).clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }

    async fn find_survey(&self, id: Id) -> Result<Option<Survey>> {
        let tables = self.tables.lock().await;
        Ok(tables.surveys.rows.get(&id).cloned())
    }

    async fn list_surveys(&self, user_id: Id) -> Result<Vec<Survey>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .surveys
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn load_survey(&self, id: Id, preload: Preload) -> Result<Option<SurveyGraph>> {
        let tables = self.tables.lock().await;
        let Some(survey) = tables.surveys.rows.get(&id).cloned() else {
            return Ok(None);
        };

        let questions = match preload.questions {
            true => tables.question_trees(id),
            false => Vec::new(),
        };
        let responses = match preload.responses {
            true => tables.response_records(id),
            false => Vec::new(),
        };

        Ok(Some(SurveyGraph {
            survey,
            questions,
            responses,
        }))
    }

    async fn find_active_link(&self, alias: &str) -> Result<Option<SurveyLink>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .links
            .values()
            .find(|l| l.link == alias && l.is_active)
            .cloned())
    }

    async fn list_links(&self, survey_id: Id) -> Result<Vec<SurveyLink>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .links
            .values()
            .filter(|l| l.survey_id == survey_id)
            .cloned()
            .collect())
    }

    async fn list_responses(&self, survey_id: Id) -> Result<Vec<ResponseRecord>> {
        let tables = self.tables.lock().await;
        Ok(tables.response_records(survey_id))
    }

    async fn find_response(
        &self,
        survey_id: Id,
        response_id: Id,
    ) -> Result<Option<ResponseRecord>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .responses
            .rows
            .get(&response_id)
            .filter(|r| r.survey_id == survey_id)
            .map(|r| tables.response_record(r)))
    }

    async fn find_webhook(&self, id: Id) -> Result<Option<Webhook>> {
        let tables = self.tables.lock().await;
        Ok(tables.webhooks.rows.get(&id).cloned())
    }

    async fn list_webhooks_for_user(&self, user_id: Id) -> Result<Vec<Webhook>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .webhooks
            .values()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_webhooks_for_survey(&self, survey_id: Id) -> Result<Vec<Webhook>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .webhooks
            .values()
            .filter(|w| w.survey_id == survey_id)
            .cloned()
            .collect())
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn find_survey(&mut self, id: Id) -> Result<Option<Survey>> {
        Ok(self.working.surveys.rows.get(&id).cloned())
    }

    async fn load_questions(&mut self, survey_id: Id) -> Result<Vec<QuestionTree>> {
        Ok(self.working.question_trees(survey_id))
    }

    async fn count_responses(&mut self, survey_id: Id) -> Result<i64> {
        Ok(self.working.count_responses(survey_id))
    }

    async fn insert_survey(&mut self, survey: &Survey) -> Result<Survey> {
        Ok(self.working.surveys.insert_with(|id| Survey {
            id,
            ..survey.clone()
        }))
    }

    async fn save_survey(&mut self, survey: &Survey) -> Result<()> {
        self.working
            .surveys
            .replace(survey.id, survey.clone(), "survey")
    }

    async fn set_published(&mut self, survey_id: Id, published: bool) -> Result<()> {
        let survey = self
            .working
            .surveys
            .rows
            .get_mut(&survey_id)
            .ok_or_else(|| StoreError::not_found("survey", survey_id))?;
        survey.is_published = published;
        Ok(())
    }

    async fn delete_survey(&mut self, survey_id: Id) -> Result<()> {
        let tables = &mut self.working;
        if tables.surveys.rows.remove(&survey_id).is_none() {
            return Err(StoreError::not_found("survey", survey_id));
        }

        let question_ids: Vec<Id> = tables
            .questions
            .values()
            .filter(|q| q.survey_id == survey_id)
            .map(|q| q.id)
            .collect();
        let response_ids: Vec<Id> = tables
            .responses
            .values()
            .filter(|r| r.survey_id == survey_id)
            .map(|r| r.id)
            .collect();

        tables
            .answers
            .remove_where(|a| response_ids.contains(&a.response_id));
        tables.responses.remove_where(|r| r.survey_id == survey_id);
        tables
            .options
            .remove_where(|o| question_ids.contains(&o.question_id));
        tables
            .conditions
            .remove_where(|c| question_ids.contains(&c.question_id));
        tables.questions.remove_where(|q| q.survey_id == survey_id);
        tables.links.remove_where(|l| l.survey_id == survey_id);
        tables.webhooks.remove_where(|w| w.survey_id == survey_id);

        Ok(())
    }

    async fn insert_question(&mut self, question: &Question) -> Result<Question> {
        self.working.require_survey(question.survey_id, "question")?;
        Ok(self.working.questions.insert_with(|id| Question {
            id,
            ..question.clone()
        }))
    }

    async fn update_question(&mut self, question: &Question) -> Result<()> {
        self.working.require_survey(question.survey_id, "question")?;
        self.working
            .questions
            .replace(question.id, question.clone(), "question")
    }

    async fn delete_question(&mut self, question_id: Id) -> Result<()> {
        let tables = &mut self.working;
        if !tables.questions.contains(question_id) {
            return Err(StoreError::not_found("question", question_id));
        }

        let referenced = tables.options.values().any(|o| o.question_id == question_id)
            || tables
                .conditions
                .values()
                .any(|c| c.question_id == question_id)
            || tables.answers.values().any(|a| a.question_id == question_id);
        if referenced {
            return Err(StoreError::ForeignKey { entity: "question" });
        }

        tables.questions.rows.remove(&question_id);
        Ok(())
    }

    async fn insert_option(&mut self, option: &ChoiceOption) -> Result<ChoiceOption> {
        self.working.require_question(option.question_id, "option")?;
        Ok(self.working.options.insert_with(|id| ChoiceOption {
            id,
            ..option.clone()
        }))
    }

    async fn delete_options(&mut self, question_id: Id) -> Result<u64> {
        Ok(self
            .working
            .options
            .remove_where(|o| o.question_id == question_id))
    }

    async fn insert_condition(&mut self, condition: &Condition) -> Result<Condition> {
        self.working
            .require_question(condition.question_id, "condition")?;
        Ok(self.working.conditions.insert_with(|id| Condition {
            id,
            ..condition.clone()
        }))
    }

    async fn delete_conditions(&mut self, question_id: Id) -> Result<u64> {
        Ok(self
            .working
            .conditions
            .remove_where(|c| c.question_id == question_id))
    }

    async fn delete_answers(&mut self, question_id: Id) -> Result<u64> {
        Ok(self
            .working
            .answers
            .remove_where(|a| a.question_id == question_id))
    }

    async fn insert_link(&mut self, link: &SurveyLink) -> Result<SurveyLink> {
        self.working.require_survey(link.survey_id, "survey link")?;
        if self.working.links.values().any(|l| l.link == link.link) {
            return Err(StoreError::Conflict(format!(
                "survey link {} already exists",
                link.link
            )));
        }
        Ok(self.working.links.insert_with(|id| SurveyLink {
            id,
            ..link.clone()
        }))
    }

    async fn deactivate_links(&mut self, survey_id: Id) -> Result<u64> {
        let mut deactivated = 0;
        for link in self.working.links.rows.values_mut() {
            if link.survey_id == survey_id && link.is_active {
                link.is_active = false;
                deactivated += 1;
            }
        }
        Ok(deactivated)
    }

    async fn insert_response(&mut self, response: &Response) -> Result<Response> {
        self.working.require_survey(response.survey_id, "response")?;
        Ok(self.working.responses.insert_with(|id| Response {
            id,
            ..response.clone()
        }))
    }

    async fn insert_answer(&mut self, answer: &Answer) -> Result<Answer> {
        if !self.working.responses.contains(answer.response_id) {
            return Err(StoreError::ForeignKey { entity: "answer" });
        }
        self.working.require_question(answer.question_id, "answer")?;
        Ok(self.working.answers.insert_with(|id| Answer {
            id,
            ..answer.clone()
        }))
    }

    async fn insert_webhook(&mut self, webhook: &Webhook) -> Result<Webhook> {
        self.working.require_survey(webhook.survey_id, "webhook")?;
        Ok(self.working.webhooks.insert_with(|id| Webhook {
            id,
            ..webhook.clone()
        }))
    }

    async fn save_webhook(&mut self, webhook: &Webhook) -> Result<()> {
        self.working
            .webhooks
            .replace(webhook.id, webhook.clone(), "webhook")
    }

    async fn delete_webhook(&mut self, webhook_id: Id) -> Result<()> {
        match self.working.webhooks.rows.remove(&webhook_id) {
            Some(_) => Ok(()),
            None => Err(StoreError::not_found("webhook", webhook_id)),
        }
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
