//! Payloads accepted by the survey write paths.

use crate::errors::ValidationError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use store::types::{ConditionOperator, Id, QuestionType};

/// Desired state of a survey and its question subtree.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(default)]
pub struct SurveyInput {
    pub title: String,
    pub description: String,
    pub release_date: Option<DateTime<Utc>>,
    pub close_date: Option<DateTime<Utc>>,
    pub response_limit: Option<i64>,
    pub redirect_url: String,
    pub closed_message: String,
    pub custom_styles: String,
    pub questions: Vec<QuestionInput>,
}

/// `id` of zero (or an id unknown to the survey) marks a new question.
/// Conditions may reference other incoming questions by the id used here.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    #[serde(default)]
    pub id: Id,
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub min_value: Option<i64>,
    #[serde(default)]
    pub max_value: Option<i64>,
    #[serde(default)]
    pub allow_multiple: bool,
    #[serde(default)]
    pub max_file_size: Option<i64>,
    #[serde(default)]
    pub options: Vec<OptionInput>,
    #[serde(default)]
    pub conditions: Vec<ConditionInput>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionInput {
    pub text: String,
    pub value: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionInput {
    pub dependent_on_id: Id,
    pub dependent_on_value: String,
    pub operator: ConditionOperator,
}

impl SurveyInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        if let (Some(release), Some(close)) = (self.release_date, self.close_date)
            && close <= release
        {
            return Err(ValidationError::InvalidSchedule);
        }

        if matches!(self.response_limit, Some(limit) if limit <= 0) {
            return Err(ValidationError::InvalidResponseLimit);
        }

        let mut seen = HashSet::new();
        for (index, question) in self.questions.iter().enumerate() {
            if question.id != 0 && !seen.insert(question.id) {
                return Err(ValidationError::DuplicateQuestion(question.id));
            }

            if let (Some(min), Some(max)) = (question.min_value, question.max_value)
                && min > max
            {
                return Err(ValidationError::InvalidRange { index, min, max });
            }

            if question.conditions.iter().any(|c| c.dependent_on_id == 0) {
                return Err(ValidationError::MissingDependency { index });
            }
        }

        Ok(())
    }
}

/// A submitted response.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionInput {
    #[serde(default)]
    pub answers: Vec<AnswerInput>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerInput {
    pub question_id: Id,
    pub value: String,
}

/// Request metadata recorded with a response.
#[derive(Clone, Debug, Default)]
pub struct ClientInfo {
    pub ip: String,
    pub user_agent: String,
}
