//! Visibility conditions evaluated against a submission.

use std::collections::HashMap;
use store::types::{Condition, ConditionOperator, Id};

/// Submitted values grouped by question. A question may carry several
/// answers (checkbox questions).
pub type AnswerIndex<'a> = HashMap<Id, Vec<&'a str>>;

pub fn index_answers<'a, I>(answers: I) -> AnswerIndex<'a>
where
    I: IntoIterator<Item = (Id, &'a str)>,
{
    let mut index = AnswerIndex::new();
    for (question_id, value) in answers {
        index.entry(question_id).or_default().push(value);
    }
    index
}

/// A question is visible when every one of its conditions holds.
pub fn is_visible(conditions: &[Condition], answers: &AnswerIndex<'_>) -> bool {
    conditions.iter().all(|condition| {
        let values = answers
            .get(&condition.dependent_on_id)
            .map(Vec::as_slice)
            .unwrap_or_default();
        evaluate(condition, values)
    })
}

/// Evaluates one condition against the values given for its dependency.
///
/// Unknown operators never hide a question. With no answer for the
/// dependency only `not_equals` holds.
pub fn evaluate(condition: &Condition, values: &[&str]) -> bool {
    let expected = condition.dependent_on_value.as_str();

    match &condition.operator {
        ConditionOperator::Other(op) => {
            tracing::debug!(operator = %op, "Unknown condition operator, treating as visible");
            true
        }
        ConditionOperator::NotEquals => values.iter().all(|value| *value != expected),
        ConditionOperator::Equals => values.iter().any(|value| *value == expected),
        ConditionOperator::Contains => values.iter().any(|value| value.contains(expected)),
        ConditionOperator::GreaterThan => values
            .iter()
            .any(|value| matches!(numbers(value, expected), Some((a, b)) if a > b)),
        ConditionOperator::LessThan => values
            .iter()
            .any(|value| matches!(numbers(value, expected), Some((a, b)) if a < b)),
    }
}

fn numbers(value: &str, expected: &str) -> Option<(f64, f64)> {
    let value = value.trim().parse::<f64>().ok()?;
    let expected = expected.trim().parse::<f64>().ok()?;
    Some((value, expected))
}
