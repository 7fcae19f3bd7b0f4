//! Persistence gateway for surveys, responses and webhooks.
//!
//! Reads go through [`Store`]. Every write happens inside a [`Transaction`]
//! obtained from [`Store::begin`]; nothing is visible to other callers until
//! [`Transaction::commit`] returns. Dropping a transaction without committing
//! discards its changes.

pub mod config;
pub mod memory;
pub mod sqlite;
pub mod types;

use async_trait::async_trait;
use std::sync::Arc;
use types::{
    Answer, ChoiceOption, Condition, Id, Preload, Question, QuestionTree, Response,
    ResponseRecord, Survey, SurveyGraph, SurveyLink, Webhook,
};

pub use config::StoreConfig;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Id },

    #[error("foreign key constraint failed for {entity}")]
    ForeignKey { entity: &'static str },

    #[error("unique constraint violated: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: Id) -> Self {
        StoreError::NotFound { entity, id }
    }
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn Transaction>>;

    async fn find_survey(&self, id: Id) -> Result<Option<Survey>>;

    async fn list_surveys(&self, user_id: Id) -> Result<Vec<Survey>>;

    /// Loads a survey and the relations selected by `preload`. Questions are
    /// ordered by their display order, responses and answers by insertion.
    async fn load_survey(&self, id: Id, preload: Preload) -> Result<Option<SurveyGraph>>;

    async fn find_active_link(&self, alias: &str) -> Result<Option<SurveyLink>>;

    async fn list_links(&self, survey_id: Id) -> Result<Vec<SurveyLink>>;

    async fn list_responses(&self, survey_id: Id) -> Result<Vec<ResponseRecord>>;

    async fn find_response(&self, survey_id: Id, response_id: Id)
    -> Result<Option<ResponseRecord>>;

    async fn find_webhook(&self, id: Id) -> Result<Option<Webhook>>;

    async fn list_webhooks_for_user(&self, user_id: Id) -> Result<Vec<Webhook>>;

    async fn list_webhooks_for_survey(&self, survey_id: Id) -> Result<Vec<Webhook>>;
}

/// A unit of work against the store.
///
/// Insert methods ignore the `id` of the row passed in and return the row
/// with its assigned identifier.
#[async_trait]
pub trait Transaction: Send {
    async fn find_survey(&mut self, id: Id) -> Result<Option<Survey>>;

    /// Current question subtree of a survey, in display order.
    async fn load_questions(&mut self, survey_id: Id) -> Result<Vec<QuestionTree>>;

    async fn count_responses(&mut self, survey_id: Id) -> Result<i64>;

    async fn insert_survey(&mut self, survey: &Survey) -> Result<Survey>;

    async fn save_survey(&mut self, survey: &Survey) -> Result<()>;

    async fn set_published(&mut self, survey_id: Id, published: bool) -> Result<()>;

    /// Removes a survey together with everything it owns, including its
    /// responses, links and webhooks.
    async fn delete_survey(&mut self, survey_id: Id) -> Result<()>;

    async fn insert_question(&mut self, question: &Question) -> Result<Question>;

    async fn update_question(&mut self, question: &Question) -> Result<()>;

    /// Deletes a single question row. Its options, conditions and answers
    /// must already be gone.
    async fn delete_question(&mut self, question_id: Id) -> Result<()>;

    async fn insert_option(&mut self, option: &ChoiceOption) -> Result<ChoiceOption>;

    async fn delete_options(&mut self, question_id: Id) -> Result<u64>;

    async fn insert_condition(&mut self, condition: &Condition) -> Result<Condition>;

    async fn delete_conditions(&mut self, question_id: Id) -> Result<u64>;

    async fn delete_answers(&mut self, question_id: Id) -> Result<u64>;

    async fn insert_link(&mut self, link: &SurveyLink) -> Result<SurveyLink>;

    /// Marks every link of the survey inactive. Returns the number of links
    /// that were active.
    async fn deactivate_links(&mut self, survey_id: Id) -> Result<u64>;

    async fn insert_response(&mut self, response: &Response) -> Result<Response>;

    async fn insert_answer(&mut self, answer: &Answer) -> Result<Answer>;

    async fn insert_webhook(&mut self, webhook: &Webhook) -> Result<Webhook>;

    async fn save_webhook(&mut self, webhook: &Webhook) -> Result<()>;

    async fn delete_webhook(&mut self, webhook_id: Id) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Builds the store selected by the configuration.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn Store>> {
    match config {
        StoreConfig::Memory => {
            tracing::warn!("Using the in-memory store, data is lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreConfig::Sqlite {
            path,
            max_connections,
        } => {
            let store = SqliteStore::connect(path, *max_connections).await?;
            Ok(Arc::new(store))
        }
    }
}
