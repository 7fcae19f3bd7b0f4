use serde::Serialize;
use store::types::Id;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookEvent {
    ResponseSubmitted,
}

impl WebhookEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEvent::ResponseSubmitted => "response_submitted",
        }
    }

    /// `filter` is a comma separated list of event names. An empty filter
    /// or `*` accepts every event.
    pub fn accepted_by(&self, filter: &str) -> bool {
        if filter.trim().is_empty() {
            return true;
        }
        filter
            .split(',')
            .map(str::trim)
            .any(|name| name == "*" || name == self.as_str())
    }
}

/// JSON body posted to subscribers.
#[derive(Debug, Serialize)]
pub struct Payload {
    pub event: WebhookEvent,
    pub survey_id: Id,
    pub response_id: Id,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_filter() {
        let event = WebhookEvent::ResponseSubmitted;
        assert!(event.accepted_by(""));
        assert!(event.accepted_by("  "));
        assert!(event.accepted_by("*"));
        assert!(event.accepted_by("survey_published, response_submitted"));
        assert!(!event.accepted_by("survey_published"));
        assert!(!event.accepted_by("response_submitted_v2"));
    }

    #[test]
    fn test_payload_shape() {
        let payload = Payload {
            event: WebhookEvent::ResponseSubmitted,
            survey_id: 3,
            response_id: 11,
        };
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"event":"response_submitted","survey_id":3,"response_id":11}"#
        );
    }
}
