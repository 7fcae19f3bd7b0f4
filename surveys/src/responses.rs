use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use store::types::{Id, QuestionTree, ResponseRecord};

/// A response with each answer annotated with its question's text.
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDetail {
    pub id: Id,
    pub survey_id: Id,
    pub created_at: DateTime<Utc>,
    pub ip: String,
    pub user_agent: String,
    pub answers: Vec<AnswerDetail>,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDetail {
    pub question_id: Id,
    pub question_text: String,
    pub value: String,
}

impl ResponseDetail {
    pub fn new(record: ResponseRecord, questions: &[QuestionTree]) -> Self {
        let texts: HashMap<Id, &str> = questions
            .iter()
            .map(|tree| (tree.question.id, tree.question.text.as_str()))
            .collect();

        let answers = record
            .answers
            .into_iter()
            .map(|answer| AnswerDetail {
                question_text: texts
                    .get(&answer.question_id)
                    .map(|text| text.to_string())
                    .unwrap_or_default(),
                question_id: answer.question_id,
                value: answer.value,
            })
            .collect();

        let response = record.response;
        ResponseDetail {
            id: response.id,
            survey_id: response.survey_id,
            created_at: response.created_at,
            ip: response.ip,
            user_agent: response.user_agent,
            answers,
        }
    }
}
