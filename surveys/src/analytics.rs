//! Aggregates a survey's responses into per-question summaries.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;
use store::types::{Id, QuestionKind, SurveyGraph};

#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyAnalytics {
    pub total_responses: usize,
    /// Keyed by question id, in survey question order.
    pub question_analytics: IndexMap<Id, QuestionSummary>,
}

#[derive(Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QuestionSummary {
    Choice {
        #[serde(rename = "optionCounts")]
        option_counts: IndexMap<String, u64>,
    },
    Numeric {
        average: f64,
    },
    /// A numeric question without a single parseable answer.
    NoNumericAnswers {},
    FreeText {
        answers: Vec<String>,
    },
}

/// Folds every response of `graph` into a summary per question.
///
/// Questions of an unknown type get no entry. Numeric answers that do not
/// parse as integers are skipped.
pub fn analyze(graph: &SurveyGraph) -> SurveyAnalytics {
    let mut by_question: HashMap<Id, Vec<&str>> = HashMap::new();
    for record in &graph.responses {
        for answer in &record.answers {
            by_question
                .entry(answer.question_id)
                .or_default()
                .push(answer.value.as_str());
        }
    }

    let mut question_analytics = IndexMap::new();
    for tree in &graph.questions {
        let question = &tree.question;
        let values = by_question
            .get(&question.id)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let summary = match question.question_type.kind() {
            QuestionKind::Choice => QuestionSummary::Choice {
                option_counts: count_options(values),
            },
            QuestionKind::Numeric => match average(values) {
                Some(average) => QuestionSummary::Numeric { average },
                None => QuestionSummary::NoNumericAnswers {},
            },
            QuestionKind::FreeText => QuestionSummary::FreeText {
                answers: values.iter().map(|v| v.to_string()).collect(),
            },
            QuestionKind::Unknown => continue,
        };
        question_analytics.insert(question.id, summary);
    }

    SurveyAnalytics {
        total_responses: graph.responses.len(),
        question_analytics,
    }
}

fn count_options(values: &[&str]) -> IndexMap<String, u64> {
    let mut counts = IndexMap::new();
    for value in values {
        *counts.entry(value.to_string()).or_insert(0) += 1;
    }
    counts
}

fn average(values: &[&str]) -> Option<f64> {
    let parsed: Vec<i64> = values
        .iter()
        .filter_map(|value| value.trim().parse::<i64>().ok())
        .collect();

    if parsed.is_empty() {
        return None;
    }
    let sum: f64 = parsed.iter().map(|v| *v as f64).sum();
    Some(sum / parsed.len() as f64)
}
