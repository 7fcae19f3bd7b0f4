use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Primary key type shared by every table.
pub type Id = i64;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Survey {
    pub id: Id,
    pub user_id: Id,
    pub title: String,
    pub description: String,
    pub release_date: Option<DateTime<Utc>>,
    pub close_date: Option<DateTime<Utc>>,
    pub response_limit: Option<i64>,
    pub redirect_url: String,
    pub closed_message: String,
    pub custom_styles: String,
    /// Incremented exactly once per successful structural update.
    pub version: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The semantic type of a question. Unknown tags are preserved verbatim in
/// `Other` so that surveys written by newer clients survive a round trip.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionType {
    MultipleChoice,
    Checkbox,
    Dropdown,
    Rating,
    Scale,
    Text,
    Textarea,
    Other(String),
}

/// How answers to a question are interpreted when aggregating.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestionKind {
    Choice,
    Numeric,
    FreeText,
    Unknown,
}

impl QuestionType {
    pub fn as_str(&self) -> &str {
        match self {
            QuestionType::MultipleChoice => "multipleChoice",
            QuestionType::Checkbox => "checkbox",
            QuestionType::Dropdown => "dropdown",
            QuestionType::Rating => "rating",
            QuestionType::Scale => "scale",
            QuestionType::Text => "text",
            QuestionType::Textarea => "textarea",
            QuestionType::Other(tag) => tag,
        }
    }

    pub fn kind(&self) -> QuestionKind {
        match self {
            QuestionType::MultipleChoice | QuestionType::Checkbox | QuestionType::Dropdown => {
                QuestionKind::Choice
            }
            QuestionType::Rating | QuestionType::Scale => QuestionKind::Numeric,
            QuestionType::Text | QuestionType::Textarea => QuestionKind::FreeText,
            QuestionType::Other(_) => QuestionKind::Unknown,
        }
    }
}

impl From<String> for QuestionType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "multipleChoice" => QuestionType::MultipleChoice,
            "checkbox" => QuestionType::Checkbox,
            "dropdown" => QuestionType::Dropdown,
            "rating" => QuestionType::Rating,
            "scale" => QuestionType::Scale,
            "text" => QuestionType::Text,
            "textarea" => QuestionType::Textarea,
            _ => QuestionType::Other(tag),
        }
    }
}

impl From<QuestionType> for String {
    fn from(question_type: QuestionType) -> Self {
        match question_type {
            QuestionType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: Id,
    pub survey_id: Id,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub is_required: bool,
    pub order: i64,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
    pub allow_multiple: bool,
    pub max_file_size: Option<i64>,
}

/// A selectable answer for a choice question. `value` is the token stored
/// in submitted answers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOption {
    pub id: Id,
    pub question_id: Id,
    pub text: String,
    pub value: String,
}

/// Comparison applied by a visibility condition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
    Other(String),
}

impl ConditionOperator {
    pub fn as_str(&self) -> &str {
        match self {
            ConditionOperator::Equals => "equals",
            ConditionOperator::NotEquals => "not_equals",
            ConditionOperator::GreaterThan => "greater_than",
            ConditionOperator::LessThan => "less_than",
            ConditionOperator::Contains => "contains",
            ConditionOperator::Other(op) => op,
        }
    }
}

impl From<String> for ConditionOperator {
    fn from(op: String) -> Self {
        // Older clients send "not equals" or "greater-than".
        let normalized = op.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "equals" => ConditionOperator::Equals,
            "not_equals" => ConditionOperator::NotEquals,
            "greater_than" => ConditionOperator::GreaterThan,
            "less_than" => ConditionOperator::LessThan,
            "contains" => ConditionOperator::Contains,
            _ => ConditionOperator::Other(op),
        }
    }
}

impl From<ConditionOperator> for String {
    fn from(op: ConditionOperator) -> Self {
        match op {
            ConditionOperator::Other(op) => op,
            known => known.as_str().to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub id: Id,
    pub question_id: Id,
    pub dependent_on_id: Id,
    pub dependent_on_value: String,
    pub operator: ConditionOperator,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub id: Id,
    pub survey_id: Id,
    pub ip: String,
    pub user_agent: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: Id,
    pub response_id: Id,
    pub question_id: Id,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyLink {
    pub id: Id,
    pub survey_id: Id,
    pub link: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    pub id: Id,
    pub user_id: Id,
    pub survey_id: Id,
    pub url: String,
    /// Comma separated event names. Empty or `*` subscribes to everything.
    pub events: String,
    pub secret: String,
}

/// A question together with its owned children.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionTree {
    #[serde(flatten)]
    pub question: Question,
    pub options: Vec<ChoiceOption>,
    pub conditions: Vec<Condition>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseRecord {
    #[serde(flatten)]
    pub response: Response,
    pub answers: Vec<Answer>,
}

/// A survey with whichever relations were requested through [`Preload`].
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyGraph {
    #[serde(flatten)]
    pub survey: Survey,
    pub questions: Vec<QuestionTree>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub responses: Vec<ResponseRecord>,
}

/// Selects the relations loaded alongside a survey.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Preload {
    pub questions: bool,
    pub responses: bool,
}

impl Preload {
    pub const QUESTIONS: Preload = Preload {
        questions: true,
        responses: false,
    };

    pub const ALL: Preload = Preload {
        questions: true,
        responses: true,
    };
}
