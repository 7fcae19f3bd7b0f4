//! SQLite backend built on a sqlx connection pool.

use crate::types::{
    Answer, ChoiceOption, Condition, Id, Preload, Question, QuestionTree, Response,
    ResponseRecord, Survey, SurveyGraph, SurveyLink, Webhook,
};
use crate::{Result, Store, StoreError, Transaction};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{FromRow, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS surveys (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        release_date TEXT,
        close_date TEXT,
        response_limit INTEGER,
        redirect_url TEXT NOT NULL DEFAULT '',
        closed_message TEXT NOT NULL DEFAULT '',
        custom_styles TEXT NOT NULL DEFAULT '',
        version INTEGER NOT NULL DEFAULT 1,
        is_published INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_surveys_user ON surveys (user_id)",
    "CREATE TABLE IF NOT EXISTS questions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        survey_id INTEGER NOT NULL REFERENCES surveys (id),
        text TEXT NOT NULL,
        type TEXT NOT NULL,
        is_required INTEGER NOT NULL DEFAULT 0,
        sort_order INTEGER NOT NULL DEFAULT 0,
        min_value INTEGER,
        max_value INTEGER,
        allow_multiple INTEGER NOT NULL DEFAULT 0,
        max_file_size INTEGER
    )",
    "CREATE INDEX IF NOT EXISTS idx_questions_survey ON questions (survey_id)",
    "CREATE TABLE IF NOT EXISTS options (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        question_id INTEGER NOT NULL REFERENCES questions (id),
        text TEXT NOT NULL,
        value TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS conditions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        question_id INTEGER NOT NULL REFERENCES questions (id),
        dependent_on_id INTEGER NOT NULL,
        dependent_on_value TEXT NOT NULL,
        operator TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS responses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        survey_id INTEGER NOT NULL REFERENCES surveys (id),
        ip TEXT NOT NULL,
        user_agent TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_responses_survey ON responses (survey_id)",
    "CREATE TABLE IF NOT EXISTS answers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        response_id INTEGER NOT NULL REFERENCES responses (id),
        question_id INTEGER NOT NULL REFERENCES questions (id),
        value TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS survey_links (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        survey_id INTEGER NOT NULL REFERENCES surveys (id),
        link TEXT NOT NULL UNIQUE,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS webhooks (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        survey_id INTEGER NOT NULL REFERENCES surveys (id),
        url TEXT NOT NULL,
        events TEXT NOT NULL DEFAULT '',
        secret TEXT NOT NULL DEFAULT ''
    )",
];

const SURVEY_COLUMNS: &str = "id, user_id, title, description, release_date, close_date, \
     response_limit, redirect_url, closed_message, custom_styles, version, is_published, \
     created_at, updated_at";

#[derive(FromRow)]
struct SurveyRow {
    id: i64,
    user_id: i64,
    title: String,
    description: String,
    release_date: Option<DateTime<Utc>>,
    close_date: Option<DateTime<Utc>>,
    response_limit: Option<i64>,
    redirect_url: String,
    closed_message: String,
    custom_styles: String,
    version: i64,
    is_published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SurveyRow> for Survey {
    fn from(row: SurveyRow) -> Self {
        Survey {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            description: row.description,
            release_date: row.release_date,
            close_date: row.close_date,
            response_limit: row.response_limit,
            redirect_url: row.redirect_url,
            closed_message: row.closed_message,
            custom_styles: row.custom_styles,
            version: row.version,
            is_published: row.is_published,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct QuestionRow {
    id: i64,
    survey_id: i64,
    text: String,
    r#type: String,
    is_required: bool,
    sort_order: i64,
    min_value: Option<i64>,
    max_value: Option<i64>,
    allow_multiple: bool,
    max_file_size: Option<i64>,
}

impl From<QuestionRow> for Question {
    fn from(row: QuestionRow) -> Self {
        Question {
            id: row.id,
            survey_id: row.survey_id,
            text: row.text,
            question_type: row.r#type.into(),
            is_required: row.is_required,
            order: row.sort_order,
            min_value: row.min_value,
            max_value: row.max_value,
            allow_multiple: row.allow_multiple,
            max_file_size: row.max_file_size,
        }
    }
}

#[derive(FromRow)]
struct OptionRow {
    id: i64,
    question_id: i64,
    text: String,
    value: String,
}

impl From<OptionRow> for ChoiceOption {
    fn from(row: OptionRow) -> Self {
        ChoiceOption {
            id: row.id,
            question_id: row.question_id,
            text: row.text,
            value: row.value,
        }
    }
}

#[derive(FromRow)]
struct ConditionRow {
    id: i64,
    question_id: i64,
    dependent_on_id: i64,
    dependent_on_value: String,
    operator: String,
}

impl From<ConditionRow> for Condition {
    fn from(row: ConditionRow) -> Self {
        Condition {
            id: row.id,
            question_id: row.question_id,
            dependent_on_id: row.dependent_on_id,
            dependent_on_value: row.dependent_on_value,
            operator: row.operator.into(),
        }
    }
}

#[derive(FromRow)]
struct ResponseRow {
    id: i64,
    survey_id: i64,
    ip: String,
    user_agent: String,
    created_at: DateTime<Utc>,
}

impl From<ResponseRow> for Response {
    fn from(row: ResponseRow) -> Self {
        Response {
            id: row.id,
            survey_id: row.survey_id,
            ip: row.ip,
            user_agent: row.user_agent,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct AnswerRow {
    id: i64,
    response_id: i64,
    question_id: i64,
    value: String,
}

impl From<AnswerRow> for Answer {
    fn from(row: AnswerRow) -> Self {
        Answer {
            id: row.id,
            response_id: row.response_id,
            question_id: row.question_id,
            value: row.value,
        }
    }
}

#[derive(FromRow)]
struct LinkRow {
    id: i64,
    survey_id: i64,
    link: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl From<LinkRow> for SurveyLink {
    fn from(row: LinkRow) -> Self {
        SurveyLink {
            id: row.id,
            survey_id: row.survey_id,
            link: row.link,
            is_active: row.is_active,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct WebhookRow {
    id: i64,
    user_id: i64,
    survey_id: i64,
    url: String,
    events: String,
    secret: String,
}

impl From<WebhookRow> for Webhook {
    fn from(row: WebhookRow) -> Self {
        Webhook {
            id: row.id,
            user_id: row.user_id,
            survey_id: row.survey_id,
            url: row.url,
            events: row.events,
            secret: row.secret,
        }
    }
}

/// Maps constraint violations onto the store's error taxonomy.
fn write_error(entity: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |err| {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_foreign_key_violation() {
                return StoreError::ForeignKey { entity };
            }
            if db_err.is_unique_violation() {
                return StoreError::Conflict(db_err.message().to_string());
            }
        }
        StoreError::Database(err)
    }
}

fn expect_one(rows_affected: u64, entity: &'static str, id: Id) -> Result<()> {
    match rows_affected {
        0 => Err(StoreError::not_found(entity, id)),
        _ => Ok(()),
    }
}

async fn fetch_survey(conn: &mut SqliteConnection, id: Id) -> Result<Option<Survey>> {
    let query = format!("SELECT {SURVEY_COLUMNS} FROM surveys WHERE id = ?");
    let row: Option<SurveyRow> = sqlx::query_as(&query)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(Survey::from))
}

async fn fetch_question_trees(
    conn: &mut SqliteConnection,
    survey_id: Id,
) -> Result<Vec<QuestionTree>> {
    let questions: Vec<QuestionRow> = sqlx::query_as(
        "SELECT id, survey_id, text, type, is_required, sort_order, min_value, max_value,
                allow_multiple, max_file_size
         FROM questions WHERE survey_id = ? ORDER BY sort_order, id",
    )
    .bind(survey_id)
    .fetch_all(&mut *conn)
    .await?;

    let options: Vec<OptionRow> = sqlx::query_as(
        "SELECT o.id, o.question_id, o.text, o.value
         FROM options o JOIN questions q ON q.id = o.question_id
         WHERE q.survey_id = ? ORDER BY o.id",
    )
    .bind(survey_id)
    .fetch_all(&mut *conn)
    .await?;

    let conditions: Vec<ConditionRow> = sqlx::query_as(
        "SELECT c.id, c.question_id, c.dependent_on_id, c.dependent_on_value, c.operator
         FROM conditions c JOIN questions q ON q.id = c.question_id
         WHERE q.survey_id = ? ORDER BY c.id",
    )
    .bind(survey_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut options_by_question: HashMap<Id, Vec<ChoiceOption>> = HashMap::new();
    for row in options {
        options_by_question
            .entry(row.question_id)
            .or_default()
            .push(row.into());
    }
    let mut conditions_by_question: HashMap<Id, Vec<Condition>> = HashMap::new();
    for row in conditions {
        conditions_by_question
            .entry(row.question_id)
            .or_default()
            .push(row.into());
    }

    Ok(questions
        .into_iter()
        .map(|row| {
            let question = Question::from(row);
            QuestionTree {
                options: options_by_question.remove(&question.id).unwrap_or_default(),
                conditions: conditions_by_question
                    .remove(&question.id)
                    .unwrap_or_default(),
                question,
            }
        })
        .collect())
}

async fn fetch_response_records(
    conn: &mut SqliteConnection,
    survey_id: Id,
) -> Result<Vec<ResponseRecord>> {
    let responses: Vec<ResponseRow> = sqlx::query_as(
        "SELECT id, survey_id, ip, user_agent, created_at
         FROM responses WHERE survey_id = ? ORDER BY id",
    )
    .bind(survey_id)
    .fetch_all(&mut *conn)
    .await?;

    let answers: Vec<AnswerRow> = sqlx::query_as(
        "SELECT a.id, a.response_id, a.question_id, a.value
         FROM answers a JOIN responses r ON r.id = a.response_id
         WHERE r.survey_id = ? ORDER BY a.id",
    )
    .bind(survey_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut answers_by_response: HashMap<Id, Vec<Answer>> = HashMap::new();
    for row in answers {
        answers_by_response
            .entry(row.response_id)
            .or_default()
            .push(row.into());
    }

    Ok(responses
        .into_iter()
        .map(|row| {
            let response = Response::from(row);
            ResponseRecord {
                answers: answers_by_response.remove(&response.id).unwrap_or_default(),
                response,
            }
        })
        .collect())
}

async fn fetch_webhooks(
    pool: &SqlitePool,
    column: &'static str,
    value: Id,
) -> Result<Vec<Webhook>> {
    let query = format!(
        "SELECT id, user_id, survey_id, url, events, secret FROM webhooks WHERE {column} = ? ORDER BY id"
    );
    let rows: Vec<WebhookRow> = sqlx::query_as(&query).bind(value).fetch_all(pool).await?;
    Ok(rows.into_iter().map(Webhook::from).collect())
}

/// How long a writer waits for the database lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (or creates) the database file and makes sure the schema exists.
    pub async fn connect(path: &Path, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        tracing::info!(path = %path.display(), "Connected to SQLite database");
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        let mut conn = pool.acquire().await?;
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&mut *conn)
                .await
                .map_err(|e| StoreError::Migration(e.to_string()))?;
        }
        drop(conn);

        Ok(SqliteStore { pool })
    }
}

#[async_trait]
impl Store for SqliteStore {
    /// Takes the write lock up front, so reads inside the transaction never
    /// go stale before its first write (SQLITE_BUSY_SNAPSHOT).
    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        let tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        Ok(Box::new(SqliteTransaction { tx }))
    }

    async fn find_survey(&self, id: Id) -> Result<Option<Survey>> {
        let mut conn = self.pool.acquire().await?;
        fetch_survey(&mut conn, id).await
    }

    async fn list_surveys(&self, user_id: Id) -> Result<Vec<Survey>> {
        let query = format!("SELECT {SURVEY_COLUMNS} FROM surveys WHERE user_id = ? ORDER BY id");
        let rows: Vec<SurveyRow> = sqlx::query_as(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Survey::from).collect())
    }

    async fn load_survey(&self, id: Id, preload: Preload) -> Result<Option<SurveyGraph>> {
        let mut conn = self.pool.acquire().await?;
        let Some(survey) = fetch_survey(&mut conn, id).await? else {
            return Ok(None);
        };

        let questions = match preload.questions {
            true => fetch_question_trees(&mut conn, id).await?,
            false => Vec::new(),
        };
        let responses = match preload.responses {
            true => fetch_response_records(&mut conn, id).await?,
            false => Vec::new(),
        };

        Ok(Some(SurveyGraph {
            survey,
            questions,
            responses,
        }))
    }

    async fn find_active_link(&self, alias: &str) -> Result<Option<SurveyLink>> {
        let row: Option<LinkRow> = sqlx::query_as(
            "SELECT id, survey_id, link, is_active, created_at
             FROM survey_links WHERE link = ? AND is_active = 1",
        )
        .bind(alias)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SurveyLink::from))
    }

    async fn list_links(&self, survey_id: Id) -> Result<Vec<SurveyLink>> {
        let rows: Vec<LinkRow> = sqlx::query_as(
            "SELECT id, survey_id, link, is_active, created_at
             FROM survey_links WHERE survey_id = ? ORDER BY id",
        )
        .bind(survey_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(SurveyLink::from).collect())
    }

    async fn list_responses(&self, survey_id: Id) -> Result<Vec<ResponseRecord>> {
        let mut conn = self.pool.acquire().await?;
        fetch_response_records(&mut conn, survey_id).await
    }

    async fn find_response(
        &self,
        survey_id: Id,
        response_id: Id,
    ) -> Result<Option<ResponseRecord>> {
        let mut conn = self.pool.acquire().await?;
        let row: Option<ResponseRow> = sqlx::query_as(
            "SELECT id, survey_id, ip, user_agent, created_at
             FROM responses WHERE survey_id = ? AND id = ?",
        )
        .bind(survey_id)
        .bind(response_id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let answers: Vec<AnswerRow> = sqlx::query_as(
            "SELECT id, response_id, question_id, value FROM answers WHERE response_id = ? ORDER BY id",
        )
        .bind(response_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(Some(ResponseRecord {
            response: row.into(),
            answers: answers.into_iter().map(Answer::from).collect(),
        }))
    }

    async fn find_webhook(&self, id: Id) -> Result<Option<Webhook>> {
        let row: Option<WebhookRow> = sqlx::query_as(
            "SELECT id, user_id, survey_id, url, events, secret FROM webhooks WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Webhook::from))
    }

    async fn list_webhooks_for_user(&self, user_id: Id) -> Result<Vec<Webhook>> {
        fetch_webhooks(&self.pool, "user_id", user_id).await
    }

    async fn list_webhooks_for_survey(&self, survey_id: Id) -> Result<Vec<Webhook>> {
        fetch_webhooks(&self.pool, "survey_id", survey_id).await
    }
}

struct SqliteTransaction {
    tx: sqlx::Transaction<'static, Sqlite>,
}

#[async_trait]
impl Transaction for SqliteTransaction {
    async fn find_survey(&mut self, id: Id) -> Result<Option<Survey>> {
        fetch_survey(&mut self.tx, id).await
    }

    async fn load_questions(&mut self, survey_id: Id) -> Result<Vec<QuestionTree>> {
        fetch_question_trees(&mut self.tx, survey_id).await
    }

    async fn count_responses(&mut self, survey_id: Id) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM responses WHERE survey_id = ?")
            .bind(survey_id)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(count)
    }

    async fn insert_survey(&mut self, survey: &Survey) -> Result<Survey> {
        let result = sqlx::query(
            "INSERT INTO surveys (user_id, title, description, release_date, close_date,
                 response_limit, redirect_url, closed_message, custom_styles, version,
                 is_published, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(survey.user_id)
        .bind(&survey.title)
        .bind(&survey.description)
        .bind(survey.release_date)
        .bind(survey.close_date)
        .bind(survey.response_limit)
        .bind(&survey.redirect_url)
        .bind(&survey.closed_message)
        .bind(&survey.custom_styles)
        .bind(survey.version)
        .bind(survey.is_published)
        .bind(survey.created_at)
        .bind(survey.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(write_error("survey"))?;

        Ok(Survey {
            id: result.last_insert_rowid(),
            ..survey.clone()
        })
    }

    async fn save_survey(&mut self, survey: &Survey) -> Result<()> {
        let result = sqlx::query(
            "UPDATE surveys SET user_id = ?, title = ?, description = ?, release_date = ?,
                 close_date = ?, response_limit = ?, redirect_url = ?, closed_message = ?,
                 custom_styles = ?, version = ?, is_published = ?, created_at = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(survey.user_id)
        .bind(&survey.title)
        .bind(&survey.description)
        .bind(survey.release_date)
        .bind(survey.close_date)
        .bind(survey.response_limit)
        .bind(&survey.redirect_url)
        .bind(&survey.closed_message)
        .bind(&survey.custom_styles)
        .bind(survey.version)
        .bind(survey.is_published)
        .bind(survey.created_at)
        .bind(survey.updated_at)
        .bind(survey.id)
        .execute(&mut *self.tx)
        .await
        .map_err(write_error("survey"))?;

        expect_one(result.rows_affected(), "survey", survey.id)
    }

    async fn set_published(&mut self, survey_id: Id, published: bool) -> Result<()> {
        let result = sqlx::query("UPDATE surveys SET is_published = ? WHERE id = ?")
            .bind(published)
            .bind(survey_id)
            .execute(&mut *self.tx)
            .await?;
        expect_one(result.rows_affected(), "survey", survey_id)
    }

    async fn delete_survey(&mut self, survey_id: Id) -> Result<()> {
        const CASCADE: &[&str] = &[
            "DELETE FROM answers WHERE response_id IN (SELECT id FROM responses WHERE survey_id = ?)",
            "DELETE FROM responses WHERE survey_id = ?",
            "DELETE FROM options WHERE question_id IN (SELECT id FROM questions WHERE survey_id = ?)",
            "DELETE FROM conditions WHERE question_id IN (SELECT id FROM questions WHERE survey_id = ?)",
            "DELETE FROM questions WHERE survey_id = ?",
            "DELETE FROM survey_links WHERE survey_id = ?",
            "DELETE FROM webhooks WHERE survey_id = ?",
        ];

        if fetch_survey(&mut self.tx, survey_id).await?.is_none() {
            return Err(StoreError::not_found("survey", survey_id));
        }

        for statement in CASCADE {
            sqlx::query(statement)
                .bind(survey_id)
                .execute(&mut *self.tx)
                .await?;
        }

        sqlx::query("DELETE FROM surveys WHERE id = ?")
            .bind(survey_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn insert_question(&mut self, question: &Question) -> Result<Question> {
        let result = sqlx::query(
            "INSERT INTO questions (survey_id, text, type, is_required, sort_order, min_value,
                 max_value, allow_multiple, max_file_size)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(question.survey_id)
        .bind(&question.text)
        .bind(question.question_type.as_str())
        .bind(question.is_required)
        .bind(question.order)
        .bind(question.min_value)
        .bind(question.max_value)
        .bind(question.allow_multiple)
        .bind(question.max_file_size)
        .execute(&mut *self.tx)
        .await
        .map_err(write_error("question"))?;

        Ok(Question {
            id: result.last_insert_rowid(),
            ..question.clone()
        })
    }

    async fn update_question(&mut self, question: &Question) -> Result<()> {
        let result = sqlx::query(
            "UPDATE questions SET survey_id = ?, text = ?, type = ?, is_required = ?,
                 sort_order = ?, min_value = ?, max_value = ?, allow_multiple = ?,
                 max_file_size = ?
             WHERE id = ?",
        )
        .bind(question.survey_id)
        .bind(&question.text)
        .bind(question.question_type.as_str())
        .bind(question.is_required)
        .bind(question.order)
        .bind(question.min_value)
        .bind(question.max_value)
        .bind(question.allow_multiple)
        .bind(question.max_file_size)
        .bind(question.id)
        .execute(&mut *self.tx)
        .await
        .map_err(write_error("question"))?;

        expect_one(result.rows_affected(), "question", question.id)
    }

    async fn delete_question(&mut self, question_id: Id) -> Result<()> {
        let result = sqlx::query("DELETE FROM questions WHERE id = ?")
            .bind(question_id)
            .execute(&mut *self.tx)
            .await
            .map_err(write_error("question"))?;
        expect_one(result.rows_affected(), "question", question_id)
    }

    async fn insert_option(&mut self, option: &ChoiceOption) -> Result<ChoiceOption> {
        let result = sqlx::query("INSERT INTO options (question_id, text, value) VALUES (?, ?, ?)")
            .bind(option.question_id)
            .bind(&option.text)
            .bind(&option.value)
            .execute(&mut *self.tx)
            .await
            .map_err(write_error("option"))?;

        Ok(ChoiceOption {
            id: result.last_insert_rowid(),
            ..option.clone()
        })
    }

    async fn delete_options(&mut self, question_id: Id) -> Result<u64> {
        let result = sqlx::query("DELETE FROM options WHERE question_id = ?")
            .bind(question_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_condition(&mut self, condition: &Condition) -> Result<Condition> {
        let result = sqlx::query(
            "INSERT INTO conditions (question_id, dependent_on_id, dependent_on_value, operator)
             VALUES (?, ?, ?, ?)",
        )
        .bind(condition.question_id)
        .bind(condition.dependent_on_id)
        .bind(&condition.dependent_on_value)
        .bind(condition.operator.as_str())
        .execute(&mut *self.tx)
        .await
        .map_err(write_error("condition"))?;

        Ok(Condition {
            id: result.last_insert_rowid(),
            ..condition.clone()
        })
    }

    async fn delete_conditions(&mut self, question_id: Id) -> Result<u64> {
        let result = sqlx::query("DELETE FROM conditions WHERE question_id = ?")
            .bind(question_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_answers(&mut self, question_id: Id) -> Result<u64> {
        let result = sqlx::query("DELETE FROM answers WHERE question_id = ?")
            .bind(question_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert_link(&mut self, link: &SurveyLink) -> Result<SurveyLink> {
        let result = sqlx::query(
            "INSERT INTO survey_links (survey_id, link, is_active, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(link.survey_id)
        .bind(&link.link)
        .bind(link.is_active)
        .bind(link.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(write_error("survey link"))?;

        Ok(SurveyLink {
            id: result.last_insert_rowid(),
            ..link.clone()
        })
    }

    async fn deactivate_links(&mut self, survey_id: Id) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE survey_links SET is_active = 0 WHERE survey_id = ? AND is_active = 1",
        )
        .bind(survey_id)
        .execute(&mut *self.tx)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_response(&mut self, response: &Response) -> Result<Response> {
        let result = sqlx::query(
            "INSERT INTO responses (survey_id, ip, user_agent, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(response.survey_id)
        .bind(&response.ip)
        .bind(&response.user_agent)
        .bind(response.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(write_error("response"))?;

        Ok(Response {
            id: result.last_insert_rowid(),
            ..response.clone()
        })
    }

    async fn insert_answer(&mut self, answer: &Answer) -> Result<Answer> {
        let result =
            sqlx::query("INSERT INTO answers (response_id, question_id, value) VALUES (?, ?, ?)")
                .bind(answer.response_id)
                .bind(answer.question_id)
                .bind(&answer.value)
                .execute(&mut *self.tx)
                .await
                .map_err(write_error("answer"))?;

        Ok(Answer {
            id: result.last_insert_rowid(),
            ..answer.clone()
        })
    }

    async fn insert_webhook(&mut self, webhook: &Webhook) -> Result<Webhook> {
        let result = sqlx::query(
            "INSERT INTO webhooks (user_id, survey_id, url, events, secret) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(webhook.user_id)
        .bind(webhook.survey_id)
        .bind(&webhook.url)
        .bind(&webhook.events)
        .bind(&webhook.secret)
        .execute(&mut *self.tx)
        .await
        .map_err(write_error("webhook"))?;

        Ok(Webhook {
            id: result.last_insert_rowid(),
            ..webhook.clone()
        })
    }

    async fn save_webhook(&mut self, webhook: &Webhook) -> Result<()> {
        let result = sqlx::query(
            "UPDATE webhooks SET user_id = ?, survey_id = ?, url = ?, events = ?, secret = ?
             WHERE id = ?",
        )
        .bind(webhook.user_id)
        .bind(webhook.survey_id)
        .bind(&webhook.url)
        .bind(&webhook.events)
        .bind(&webhook.secret)
        .bind(webhook.id)
        .execute(&mut *self.tx)
        .await
        .map_err(write_error("webhook"))?;

        expect_one(result.rows_affected(), "webhook", webhook.id)
    }

    async fn delete_webhook(&mut self, webhook_id: Id) -> Result<()> {
        let result = sqlx::query("DELETE FROM webhooks WHERE id = ?")
            .bind(webhook_id)
            .execute(&mut *self.tx)
            .await?;
        expect_one(result.rows_affected(), "webhook", webhook_id)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let SqliteTransaction { tx } = *self;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        let SqliteTransaction { tx } = *self;
        tx.rollback().await?;
        Ok(())
    }
}
