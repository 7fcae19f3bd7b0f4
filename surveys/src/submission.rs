//! Response submission.

use crate::conditions::{index_answers, is_visible};
use crate::errors::{Result, SurveyError, ValidationError};
use crate::input::{AnswerInput, ClientInfo, SubmissionInput};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use store::Transaction;
use store::types::{Answer, Id, QuestionTree, Response, Survey};

/// Checks that `survey` accepts responses at `now`.
pub fn check_open(survey: &Survey, now: DateTime<Utc>) -> Result<()> {
    if !survey.is_published {
        return Err(SurveyError::Closed);
    }
    if let Some(release) = survey.release_date
        && now < release
    {
        return Err(SurveyError::NotOpen);
    }
    if let Some(close) = survey.close_date
        && now > close
    {
        return Err(SurveyError::Closed);
    }
    Ok(())
}

/// Every answer must target a question of the survey, and every required
/// question that is visible under the submitted answers must have a
/// non-blank answer.
pub fn check_answers(
    questions: &[QuestionTree],
    answers: &[AnswerInput],
) -> Result<(), ValidationError> {
    let known: HashSet<_> = questions.iter().map(|tree| tree.question.id).collect();
    if let Some(stray) = answers.iter().find(|a| !known.contains(&a.question_id)) {
        return Err(ValidationError::UnknownQuestion(stray.question_id));
    }

    let index = index_answers(answers.iter().map(|a| (a.question_id, a.value.as_str())));

    for tree in questions {
        let question = &tree.question;
        if !question.is_required || !is_visible(&tree.conditions, &index) {
            continue;
        }

        let answered = index
            .get(&question.id)
            .is_some_and(|values| values.iter().any(|v| !v.trim().is_empty()));
        if !answered {
            return Err(ValidationError::MissingAnswer(question.id));
        }
    }

    Ok(())
}

pub(crate) async fn submit(
    tx: &mut dyn Transaction,
    survey_id: Id,
    input: &SubmissionInput,
    client: &ClientInfo,
    now: DateTime<Utc>,
) -> Result<Response> {
    let survey = tx
        .find_survey(survey_id)
        .await?
        .ok_or_else(|| SurveyError::survey_not_found(survey_id))?;

    check_open(&survey, now)?;

    if let Some(limit) = survey.response_limit
        && tx.count_responses(survey_id).await? >= limit
    {
        return Err(SurveyError::LimitReached);
    }

    let questions = tx.load_questions(survey_id).await?;
    check_answers(&questions, &input.answers)?;

    let response = tx
        .insert_response(&Response {
            id: 0,
            survey_id,
            ip: client.ip.clone(),
            user_agent: client.user_agent.clone(),
            created_at: now,
        })
        .await?;

    for answer in &input.answers {
        tx.insert_answer(&Answer {
            id: 0,
            response_id: response.id,
            question_id: answer.question_id,
            value: answer.value.clone(),
        })
        .await?;
    }

    Ok(response)
}
