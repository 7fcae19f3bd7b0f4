//! CSV rendering of a survey's responses.

use std::collections::HashMap;
use store::types::{Id, SurveyGraph};

pub const CONTENT_TYPE: &str = "text/csv";
pub const CONTENT_DISPOSITION: &str = "attachment;filename=survey_data.csv";

/// Multiple answers to one question share a cell, joined with this.
const MULTI_VALUE_SEPARATOR: &str = "; ";

/// One row per response: id, RFC 3339 timestamp, then the answer to each
/// question in survey order (empty when unanswered).
pub fn to_rows(graph: &SurveyGraph) -> Vec<Vec<String>> {
    let mut rows = Vec::with_capacity(graph.responses.len() + 1);

    let mut header = vec!["ResponseID".to_string(), "Timestamp".to_string()];
    header.extend(graph.questions.iter().map(|tree| tree.question.text.clone()));
    rows.push(header);

    for record in &graph.responses {
        let mut answers: HashMap<Id, Vec<&str>> = HashMap::new();
        for answer in &record.answers {
            answers
                .entry(answer.question_id)
                .or_default()
                .push(answer.value.as_str());
        }

        let mut row = vec![
            record.response.id.to_string(),
            record.response.created_at.to_rfc3339(),
        ];
        row.extend(graph.questions.iter().map(|tree| {
            answers
                .get(&tree.question.id)
                .map(|values| values.join(MULTI_VALUE_SEPARATOR))
                .unwrap_or_default()
        }));
        rows.push(row);
    }

    rows
}

pub fn to_csv(graph: &SurveyGraph) -> Result<Vec<u8>, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in to_rows(graph) {
        writer.write_record(&row)?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutils::{graph_with_answers, question};
    use store::types::QuestionType;

    #[test]
    fn test_rows() {
        let mut graph = graph_with_answers(
            vec![
                question(1, QuestionType::Text),
                question(2, QuestionType::Checkbox),
            ],
            vec![vec![(1, "hello")], vec![(2, "a"), (2, "b")]],
        );
        graph.questions[0].question.text = "Greeting".into();
        graph.questions[1].question.text = "Letters".into();

        let rows = to_rows(&graph);
        assert_eq!(rows[0], vec!["ResponseID", "Timestamp", "Greeting", "Letters"]);

        let first = &graph.responses[0].response;
        assert_eq!(
            rows[1],
            vec![
                first.id.to_string(),
                first.created_at.to_rfc3339(),
                "hello".to_string(),
                String::new()
            ]
        );
        assert_eq!(rows[2][2], "");
        assert_eq!(rows[2][3], "a; b");
    }

    #[test]
    fn test_csv_quoting() {
        let mut graph = graph_with_answers(
            vec![question(1, QuestionType::Textarea)],
            vec![vec![(1, "yes, \"really\"")]],
        );
        graph.questions[0].question.text = "Thoughts".into();

        let csv = String::from_utf8(to_csv(&graph).unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("ResponseID,Timestamp,Thoughts"));
        assert!(lines.next().unwrap().ends_with(",\"yes, \"\"really\"\"\""));
        assert_eq!(lines.next(), None);
    }
}
