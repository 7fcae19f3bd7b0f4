//! Structural writes on the survey aggregate.
//!
//! Every function here runs inside a caller-owned transaction and leaves
//! committing to the caller, so a failure at any step discards the whole
//! request.

use crate::errors::{Result, SurveyError, ValidationError};
use crate::input::{ConditionInput, OptionInput, QuestionInput, SurveyInput};
use crate::links;
use chrono::{DateTime, Months, Utc};
use std::collections::{HashMap, HashSet};
use store::Transaction;
use store::types::{ChoiceOption, Condition, Id, Question, QuestionTree, Survey};

/// Payload question ids mapped to persisted question ids.
type IdMap = HashMap<Id, Id>;

/// Loads a survey and checks that `user_id` owns it. Someone else's survey
/// is reported as missing.
pub(crate) async fn owned_survey(
    tx: &mut dyn Transaction,
    user_id: Id,
    survey_id: Id,
) -> Result<Survey> {
    match tx.find_survey(survey_id).await? {
        Some(survey) if survey.user_id == user_id => Ok(survey),
        _ => Err(SurveyError::survey_not_found(survey_id)),
    }
}

fn question_row(survey_id: Id, id: Id, input: &QuestionInput) -> Question {
    Question {
        id,
        survey_id,
        text: input.text.clone(),
        question_type: input.question_type.clone(),
        is_required: input.is_required,
        order: input.order,
        min_value: input.min_value,
        max_value: input.max_value,
        allow_multiple: input.allow_multiple,
        max_file_size: input.max_file_size,
    }
}

async fn insert_options(
    tx: &mut dyn Transaction,
    question_id: Id,
    options: &[OptionInput],
) -> Result<()> {
    for option in options {
        tx.insert_option(&ChoiceOption {
            id: 0,
            question_id,
            text: option.text.clone(),
            value: option.value.clone(),
        })
        .await?;
    }
    Ok(())
}

async fn insert_conditions(
    tx: &mut dyn Transaction,
    question_id: Id,
    conditions: &[ConditionInput],
    ids: &IdMap,
) -> Result<()> {
    for condition in conditions {
        let dependent_on_id = ids
            .get(&condition.dependent_on_id)
            .copied()
            .unwrap_or(condition.dependent_on_id);

        tx.insert_condition(&Condition {
            id: 0,
            question_id,
            dependent_on_id,
            dependent_on_value: condition.dependent_on_value.clone(),
            operator: condition.operator.clone(),
        })
        .await?;
    }
    Ok(())
}

/// Removes a question together with everything that references it.
async fn remove_question(tx: &mut dyn Transaction, question_id: Id) -> Result<()> {
    let answers = tx.delete_answers(question_id).await?;
    tx.delete_options(question_id).await?;
    tx.delete_conditions(question_id).await?;
    tx.delete_question(question_id).await?;

    tracing::debug!(question_id, answers, "Removed question");
    Ok(())
}

/// Inserts every payload question as new. Conditions are written once all
/// questions exist so they can point at questions later in the list.
async fn insert_questions(
    tx: &mut dyn Transaction,
    survey_id: Id,
    questions: &[QuestionInput],
) -> Result<()> {
    let mut ids = IdMap::new();
    let mut persisted = Vec::with_capacity(questions.len());

    for input in questions {
        let question = tx.insert_question(&question_row(survey_id, 0, input)).await?;
        insert_options(tx, question.id, &input.options).await?;
        if input.id != 0 {
            ids.insert(input.id, question.id);
        }
        persisted.push(question.id);
    }

    for (input, question_id) in questions.iter().zip(persisted) {
        insert_conditions(tx, question_id, &input.conditions, &ids).await?;
    }
    Ok(())
}

/// Resolves the schedule window of `input`. An omitted release date falls
/// back to `release_fallback`, an omitted close date to one month after
/// the release.
fn schedule(
    input: &SurveyInput,
    release_fallback: DateTime<Utc>,
) -> Result<(DateTime<Utc>, Option<DateTime<Utc>>)> {
    let release_date = input.release_date.unwrap_or(release_fallback);
    let close_date = input
        .close_date
        .or_else(|| release_date.checked_add_months(Months::new(1)));

    if matches!(close_date, Some(close) if close <= release_date) {
        return Err(ValidationError::InvalidSchedule.into());
    }
    Ok((release_date, close_date))
}

pub(crate) async fn create(
    tx: &mut dyn Transaction,
    user_id: Id,
    input: &SurveyInput,
    now: DateTime<Utc>,
) -> Result<Survey> {
    let (release_date, close_date) = schedule(input, now)?;

    let survey = tx
        .insert_survey(&Survey {
            id: 0,
            user_id,
            title: input.title.clone(),
            description: input.description.clone(),
            release_date: Some(release_date),
            close_date,
            response_limit: input.response_limit,
            redirect_url: input.redirect_url.clone(),
            closed_message: input.closed_message.clone(),
            custom_styles: input.custom_styles.clone(),
            version: 1,
            is_published: false,
            created_at: now,
            updated_at: now,
        })
        .await?;

    insert_questions(tx, survey.id, &input.questions).await?;
    links::mint(tx, survey.id).await?;

    Ok(survey)
}

/// Makes the persisted question subtree of `survey_id` equal to
/// `input.questions`.
///
/// Incoming questions whose id matches a persisted question are updated in
/// place and get their options and conditions replaced. All others are
/// inserted as new. Persisted questions missing from the input are removed
/// along with their answers. The survey's own fields and its version are
/// saved last.
pub(crate) async fn reconcile(
    tx: &mut dyn Transaction,
    user_id: Id,
    survey_id: Id,
    input: &SurveyInput,
    now: DateTime<Utc>,
) -> Result<Survey> {
    let mut survey = owned_survey(tx, user_id, survey_id).await?;
    let (release_date, close_date) = schedule(input, survey.release_date.unwrap_or(now))?;

    let existing: HashSet<Id> = tx
        .load_questions(survey_id)
        .await?
        .into_iter()
        .map(|tree| tree.question.id)
        .collect();
    let kept: HashSet<Id> = input
        .questions
        .iter()
        .map(|q| q.id)
        .filter(|id| existing.contains(id))
        .collect();

    for question_id in existing.difference(&kept) {
        remove_question(tx, *question_id).await?;
    }

    let mut ids = IdMap::new();
    let mut persisted = Vec::with_capacity(input.questions.len());

    for question in &input.questions {
        let question_id = match kept.contains(&question.id) {
            true => {
                tx.update_question(&question_row(survey_id, question.id, question))
                    .await?;
                tx.delete_options(question.id).await?;
                tx.delete_conditions(question.id).await?;
                question.id
            }
            false => {
                tx.insert_question(&question_row(survey_id, 0, question))
                    .await?
                    .id
            }
        };

        insert_options(tx, question_id, &question.options).await?;
        if question.id != 0 {
            ids.insert(question.id, question_id);
        }
        persisted.push(question_id);
    }

    for (question, question_id) in input.questions.iter().zip(persisted) {
        insert_conditions(tx, question_id, &question.conditions, &ids).await?;
    }

    survey.title = input.title.clone();
    survey.description = input.description.clone();
    survey.release_date = Some(release_date);
    survey.close_date = close_date;
    survey.response_limit = input.response_limit;
    survey.redirect_url = input.redirect_url.clone();
    survey.closed_message = input.closed_message.clone();
    survey.custom_styles = input.custom_styles.clone();
    survey.version += 1;
    survey.updated_at = now;
    tx.save_survey(&survey).await?;

    tracing::debug!(
        survey_id,
        version = survey.version,
        removed = existing.len() - kept.len(),
        "Reconciled survey"
    );
    Ok(survey)
}

/// Copies a survey and its question subtree into a new, unpublished
/// survey. Responses, links and webhooks are not copied.
pub(crate) async fn duplicate(
    tx: &mut dyn Transaction,
    user_id: Id,
    source_id: Id,
    now: DateTime<Utc>,
) -> Result<Survey> {
    let source = owned_survey(tx, user_id, source_id).await?;
    let questions = tx.load_questions(source_id).await?;

    let copy = tx
        .insert_survey(&Survey {
            id: 0,
            title: format!("Copy of {}", source.title),
            version: 1,
            is_published: false,
            created_at: now,
            updated_at: now,
            ..source
        })
        .await?;

    let mut ids = IdMap::new();
    let mut persisted = Vec::with_capacity(questions.len());
    for QuestionTree {
        question, options, ..
    } in &questions
    {
        let new_question = tx
            .insert_question(&Question {
                id: 0,
                survey_id: copy.id,
                ..question.clone()
            })
            .await?;

        for option in options {
            tx.insert_option(&ChoiceOption {
                id: 0,
                question_id: new_question.id,
                ..option.clone()
            })
            .await?;
        }

        ids.insert(question.id, new_question.id);
        persisted.push(new_question.id);
    }

    for (tree, question_id) in questions.iter().zip(persisted) {
        for condition in &tree.conditions {
            tx.insert_condition(&Condition {
                id: 0,
                question_id,
                dependent_on_id: ids
                    .get(&condition.dependent_on_id)
                    .copied()
                    .unwrap_or(condition.dependent_on_id),
                ..condition.clone()
            })
            .await?;
        }
    }

    links::mint(tx, copy.id).await?;

    tracing::debug!(source_id, copy_id = copy.id, "Duplicated survey");
    Ok(copy)
}
