use crate::AppState;
use crate::errors::ApiError;
use crate::extract::{ActingUser, Client};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use store::types::{Id, Response, ResponseRecord, Survey, SurveyGraph, SurveyLink, Webhook};
use surveys::analytics::SurveyAnalytics;
use surveys::export;
use surveys::input::{SubmissionInput, SurveyInput};
use surveys::links::PublicSurvey;
use surveys::responses::ResponseDetail;
use webhooks::WebhookInput;

type ApiResult<T> = Result<T, ApiError>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/surveys", post(create_survey).get(list_surveys))
        .route(
            "/api/surveys/{id}",
            get(get_survey).put(update_survey).delete(delete_survey),
        )
        .route("/api/surveys/{id}/duplicate", post(duplicate_survey))
        .route("/api/surveys/{id}/publish", post(publish_survey))
        .route("/api/surveys/{id}/unpublish", post(unpublish_survey))
        .route("/api/surveys/{id}/links", get(list_links))
        .route("/api/surveys/{id}/submit", post(submit_response))
        .route("/api/surveys/{id}/responses", get(list_responses))
        .route(
            "/api/surveys/{id}/responses/{response_id}",
            get(get_response),
        )
        .route("/api/surveys/{id}/analytics", get(survey_analytics))
        .route("/api/surveys/{id}/export", get(export_responses))
        .route("/api/s/{alias}", get(resolve_link))
        .route("/api/webhooks", post(create_webhook).get(list_webhooks))
        .route(
            "/api/webhooks/{id}",
            put(update_webhook).delete(delete_webhook),
        )
        .with_state(state)
}

async fn create_survey(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    payload: Result<Json<SurveyInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SurveyGraph>)> {
    let Json(input) = payload?;
    let graph = state.surveys.create(user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(graph)))
}

async fn list_surveys(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
) -> ApiResult<Json<Vec<Survey>>> {
    Ok(Json(state.surveys.list(user_id).await?))
}

async fn get_survey(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    path: Result<Path<Id>, PathRejection>,
) -> ApiResult<Json<SurveyGraph>> {
    let Path(survey_id) = path?;
    Ok(Json(state.surveys.get(user_id, survey_id).await?))
}

async fn update_survey(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    path: Result<Path<Id>, PathRejection>,
    payload: Result<Json<SurveyInput>, JsonRejection>,
) -> ApiResult<Json<SurveyGraph>> {
    let Path(survey_id) = path?;
    let Json(input) = payload?;
    Ok(Json(state.surveys.update(user_id, survey_id, &input).await?))
}

async fn delete_survey(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    path: Result<Path<Id>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(survey_id) = path?;
    state.surveys.delete(user_id, survey_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn duplicate_survey(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    path: Result<Path<Id>, PathRejection>,
) -> ApiResult<(StatusCode, Json<SurveyGraph>)> {
    let Path(survey_id) = path?;
    let copy = state.surveys.duplicate(user_id, survey_id).await?;
    Ok((StatusCode::CREATED, Json(copy)))
}

async fn publish_survey(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    path: Result<Path<Id>, PathRejection>,
) -> ApiResult<Json<Survey>> {
    let Path(survey_id) = path?;
    Ok(Json(state.surveys.set_published(user_id, survey_id, true).await?))
}

async fn unpublish_survey(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    path: Result<Path<Id>, PathRejection>,
) -> ApiResult<Json<Survey>> {
    let Path(survey_id) = path?;
    Ok(Json(state.surveys.set_published(user_id, survey_id, false).await?))
}

async fn list_links(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    path: Result<Path<Id>, PathRejection>,
) -> ApiResult<Json<Vec<SurveyLink>>> {
    let Path(survey_id) = path?;
    Ok(Json(state.surveys.links(user_id, survey_id).await?))
}

/// Public. Webhooks are notified once the response is committed, without
/// holding up the respondent.
async fn submit_response(
    State(state): State<AppState>,
    path: Result<Path<Id>, PathRejection>,
    Client(client): Client,
    payload: Result<Json<SubmissionInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Response>)> {
    let Path(survey_id) = path?;
    let Json(input) = payload?;
    let response = state.surveys.submit(survey_id, &input, &client).await?;

    drop(state.dispatcher.dispatch(survey_id, response.id));

    Ok((StatusCode::CREATED, Json(response)))
}

async fn list_responses(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    path: Result<Path<Id>, PathRejection>,
) -> ApiResult<Json<Vec<ResponseRecord>>> {
    let Path(survey_id) = path?;
    Ok(Json(state.surveys.list_responses(user_id, survey_id).await?))
}

async fn get_response(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    path: Result<Path<(Id, Id)>, PathRejection>,
) -> ApiResult<Json<ResponseDetail>> {
    let Path((survey_id, response_id)) = path?;
    let detail = state
        .surveys
        .get_response(user_id, survey_id, response_id)
        .await?;
    Ok(Json(detail))
}

async fn survey_analytics(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    path: Result<Path<Id>, PathRejection>,
) -> ApiResult<Json<SurveyAnalytics>> {
    let Path(survey_id) = path?;
    Ok(Json(state.surveys.analytics(user_id, survey_id).await?))
}

async fn export_responses(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    path: Result<Path<Id>, PathRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(survey_id) = path?;
    let csv = state.surveys.export(user_id, survey_id).await?;
    Ok((
        [
            (CONTENT_TYPE, export::CONTENT_TYPE),
            (CONTENT_DISPOSITION, export::CONTENT_DISPOSITION),
        ],
        csv,
    ))
}

async fn resolve_link(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<PublicSurvey>> {
    let Path(alias) = path?;
    Ok(Json(state.surveys.resolve_link(&alias).await?))
}

async fn create_webhook(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    payload: Result<Json<WebhookInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Webhook>)> {
    let Json(input) = payload?;
    let webhook = state.webhooks.create(user_id, &input).await?;
    Ok((StatusCode::CREATED, Json(webhook)))
}

async fn list_webhooks(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
) -> ApiResult<Json<Vec<Webhook>>> {
    Ok(Json(state.webhooks.list(user_id).await?))
}

async fn update_webhook(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    path: Result<Path<Id>, PathRejection>,
    payload: Result<Json<WebhookInput>, JsonRejection>,
) -> ApiResult<Json<Webhook>> {
    let Path(webhook_id) = path?;
    let Json(input) = payload?;
    Ok(Json(state.webhooks.update(user_id, webhook_id, &input).await?))
}

async fn delete_webhook(
    State(state): State<AppState>,
    ActingUser(user_id): ActingUser,
    path: Result<Path<Id>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(webhook_id) = path?;
    state.webhooks.delete(user_id, webhook_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::USER_HEADER;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::time::Duration;
    use store::MemoryStore;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;
    use tower::ServiceExt;
    use webhooks::WebhooksConfig;

    const AUTHOR: Id = 7;

    fn app() -> Router {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(store, &WebhooksConfig::default()).unwrap();
        router(state)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        user: Option<Id>,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            request = request.header(USER_HEADER, user.to_string());
        }
        let body = match body {
            Some(json) => {
                request = request.header(CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        app.clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap()
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        user: Option<Id>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let response = send(app, method, uri, user, body).await;
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = match bytes.is_empty() {
            true => Value::Null,
            false => serde_json::from_slice(&bytes).unwrap(),
        };
        (status, json)
    }

    fn survey_payload() -> Value {
        json!({
            "title": "Lunch",
            "questions": [
                {
                    "id": 1,
                    "text": "Where?",
                    "type": "dropdown",
                    "isRequired": true,
                    "options": [
                        {"text": "Cafe", "value": "cafe"},
                        {"text": "Park", "value": "park"}
                    ]
                },
                {"id": 2, "text": "How hungry?", "type": "rating", "minValue": 1, "maxValue": 5},
                {
                    "id": 3,
                    "text": "Why the park?",
                    "type": "text",
                    "isRequired": true,
                    "conditions": [
                        {"dependentOnId": 1, "dependentOnValue": "park", "operator": "equals"}
                    ]
                }
            ]
        })
    }

    /// Creates and publishes a survey, returning its id and question ids.
    async fn published_survey(app: &Router) -> (Id, Vec<Id>) {
        let (status, created) = call(
            app,
            Method::POST,
            "/api/surveys",
            Some(AUTHOR),
            Some(survey_payload()),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let survey_id = created["id"].as_i64().unwrap();
        let questions = created["questions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|q| q["id"].as_i64().unwrap())
            .collect();

        let uri = format!("/api/surveys/{survey_id}/publish");
        let (status, survey) = call(app, Method::POST, &uri, Some(AUTHOR), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(survey["isPublished"], true);

        (survey_id, questions)
    }

    #[tokio::test]
    async fn test_requires_acting_user() {
        let app = app();
        let (status, body) = call(&app, Method::GET, "/api/surveys", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_message"], "missing or invalid x-user-id header");
    }

    #[tokio::test]
    async fn test_malformed_ids_get_json_errors() {
        let app = app();
        for (method, uri) in [
            (Method::GET, "/api/surveys/abc"),
            (Method::POST, "/api/surveys/abc/publish"),
            (Method::GET, "/api/surveys/1/responses/xyz"),
            (Method::DELETE, "/api/webhooks/-"),
        ] {
            let (status, body) = call(&app, method, uri, Some(AUTHOR), None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            let message = body["error_message"].as_str().unwrap();
            assert!(message.starts_with("invalid path"), "{uri}: {message}");
        }

        let (status, body) = call(&app, Method::POST, "/api/surveys/abc/submit", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error_message"].is_string());
    }

    #[tokio::test]
    async fn test_survey_lifecycle() {
        let app = app();
        let (survey_id, questions) = published_survey(&app).await;
        assert_eq!(questions.len(), 3);

        let (status, list) = call(&app, Method::GET, "/api/surveys", Some(AUTHOR), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);

        let uri = format!("/api/surveys/{survey_id}");
        let (status, _) = call(&app, Method::GET, &uri, Some(AUTHOR + 1), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let mut update = survey_payload();
        update["title"] = json!("Dinner");
        update["questions"] = json!([
            {"id": questions[0], "text": "Where now?", "type": "dropdown"}
        ]);
        let (status, updated) = call(&app, Method::PUT, &uri, Some(AUTHOR), Some(update)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], "Dinner");
        assert_eq!(updated["version"], 2);
        assert_eq!(updated["questions"][0]["id"], questions[0]);
        assert_eq!(updated["questions"].as_array().unwrap().len(), 1);

        let (status, copy) = call(
            &app,
            Method::POST,
            &format!("{uri}/duplicate"),
            Some(AUTHOR),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(copy["title"], "Copy of Dinner");
        assert_eq!(copy["isPublished"], false);

        let (status, links) =
            call(&app, Method::GET, &format!("{uri}/links"), Some(AUTHOR), None).await;
        assert_eq!(status, StatusCode::OK);
        let alias = links[0]["link"].as_str().unwrap().to_string();

        let (status, public) =
            call(&app, Method::GET, &format!("/api/s/{alias}"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(public["title"], "Dinner");
        assert!(public.get("userId").is_none());

        let (status, _) = call(&app, Method::DELETE, &uri, Some(AUTHOR), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, Method::GET, &uri, Some(AUTHOR), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, Method::GET, &format!("/api/s/{alias}"), None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_payloads() {
        let app = app();
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/surveys",
            Some(AUTHOR),
            Some(json!({"title": " "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_message"], "invalid input: title cannot be empty");

        let (status, body) = call(
            &app,
            Method::POST,
            "/api/surveys",
            Some(AUTHOR),
            Some(json!({"questions": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error_message"].as_str().unwrap().starts_with("malformed request body"));
    }

    #[tokio::test]
    async fn test_submission_rules() {
        let app = app();
        let (survey_id, questions) = published_survey(&app).await;
        let submit = format!("/api/surveys/{survey_id}/submit");

        let (status, _) = call(
            &app,
            Method::POST,
            &submit,
            None,
            Some(json!({"answers": [{"questionId": questions[1], "value": "4"}]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            Method::POST,
            &submit,
            None,
            Some(json!({"answers": [{"questionId": questions[0], "value": "park"}]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, response) = call(
            &app,
            Method::POST,
            &submit,
            None,
            Some(json!({"answers": [
                {"questionId": questions[0], "value": "cafe"},
                {"questionId": questions[1], "value": "4"}
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let response_id = response["id"].as_i64().unwrap();

        let uri = format!("/api/surveys/{survey_id}/responses/{response_id}");
        let (status, detail) = call(&app, Method::GET, &uri, Some(AUTHOR), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(detail["answers"][0]["questionText"], "Where?");

        let unpublish = format!("/api/surveys/{survey_id}/unpublish");
        call(&app, Method::POST, &unpublish, Some(AUTHOR), None).await;
        let (status, body) = call(
            &app,
            Method::POST,
            &submit,
            None,
            Some(json!({"answers": [{"questionId": questions[0], "value": "cafe"}]})),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error_message"], "survey is closed");

        let (status, _) = call(&app, Method::POST, "/api/surveys/999/submit", None, Some(json!({})))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_analytics_and_export() {
        let app = app();
        let (survey_id, questions) = published_survey(&app).await;
        let submit = format!("/api/surveys/{survey_id}/submit");

        for (place, hunger) in [("cafe", "2"), ("cafe", "5")] {
            let (status, _) = call(
                &app,
                Method::POST,
                &submit,
                None,
                Some(json!({"answers": [
                    {"questionId": questions[0], "value": place},
                    {"questionId": questions[1], "value": hunger}
                ]})),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let uri = format!("/api/surveys/{survey_id}/analytics");
        let (status, analytics) = call(&app, Method::GET, &uri, Some(AUTHOR), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(analytics["totalResponses"], 2);
        let per_question = &analytics["questionAnalytics"];
        assert_eq!(
            per_question[questions[0].to_string()],
            json!({"optionCounts": {"cafe": 2}})
        );
        assert_eq!(per_question[questions[1].to_string()], json!({"average": 3.5}));
        assert_eq!(per_question[questions[2].to_string()], json!({"answers": []}));

        let (status, _) = call(&app, Method::GET, &uri, Some(AUTHOR + 1), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let response = send(
            &app,
            Method::GET,
            &format!("/api/surveys/{survey_id}/export"),
            Some(AUTHOR),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "text/csv");
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment;filename=survey_data.csv"
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let csv = String::from_utf8(bytes.to_vec()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("ResponseID,Timestamp,Where?,How hungry?,Why the park?")
        );
        assert_eq!(lines.count(), 2);
    }

    /// Endpoint that answers 200 and forwards each body it receives.
    async fn start_receiver() -> (String, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let receiver = Router::new().route(
            "/hook",
            post(move |body: String| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(body);
                    StatusCode::OK
                }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move { axum::serve(listener, receiver).await });

        (format!("http://127.0.0.1:{port}/hook"), rx)
    }

    /// Endpoint that accepts connections and never answers.
    async fn start_silent_receiver() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        format!("http://127.0.0.1:{port}/hook")
    }

    async fn register_webhook(app: &Router, survey_id: Id, url: &str) -> Value {
        let (status, webhook) = call(
            app,
            Method::POST,
            "/api/webhooks",
            Some(AUTHOR),
            Some(json!({"surveyId": survey_id, "url": url, "secret": "s3cret"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        webhook
    }

    #[tokio::test]
    async fn test_silent_endpoint_does_not_hold_up_submission() {
        let config = WebhooksConfig {
            delivery_timeout_secs: 30,
            ..WebhooksConfig::default()
        };
        let state = AppState::new(Arc::new(MemoryStore::new()), &config).unwrap();
        let app = router(state);
        let (survey_id, questions) = published_survey(&app).await;

        let silent = start_silent_receiver().await;
        let (reachable, mut rx) = start_receiver().await;
        register_webhook(&app, survey_id, &silent).await;
        register_webhook(&app, survey_id, "http://192.0.2.1:9/hook").await;
        register_webhook(&app, survey_id, &reachable).await;

        let submit_path = format!("/api/surveys/{survey_id}/submit");
        let submit = call(
            &app,
            Method::POST,
            &submit_path,
            None,
            Some(json!({"answers": [{"questionId": questions[0], "value": "cafe"}]})),
        );
        let (status, response) = tokio::time::timeout(Duration::from_secs(2), submit)
            .await
            .expect("submission answered before any delivery finished");
        assert_eq!(status, StatusCode::CREATED);

        let body = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("delivery in time")
            .expect("delivery");
        let payload: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(payload["response_id"], response["id"]);
    }

    #[tokio::test]
    async fn test_submission_notifies_webhooks() {
        let (hook_url, mut rx) = start_receiver().await;
        let app = app();
        let (survey_id, questions) = published_survey(&app).await;

        let (status, webhook) = call(
            &app,
            Method::POST,
            "/api/webhooks",
            Some(AUTHOR),
            Some(json!({
                "surveyId": survey_id,
                "url": hook_url,
                "events": "response_submitted",
                "secret": "s3cret"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, response) = call(
            &app,
            Method::POST,
            &format!("/api/surveys/{survey_id}/submit"),
            None,
            Some(json!({"answers": [{"questionId": questions[0], "value": "cafe"}]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let body = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("delivery in time")
            .expect("delivery");
        let payload: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            payload,
            json!({
                "event": "response_submitted",
                "survey_id": survey_id,
                "response_id": response["id"]
            })
        );

        let uri = format!("/api/webhooks/{}", webhook["id"]);
        let (status, _) = call(
            &app,
            Method::PUT,
            &uri,
            Some(AUTHOR),
            Some(json!({"url": "ftp://nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = call(&app, Method::DELETE, &uri, Some(AUTHOR + 1), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, Method::DELETE, &uri, Some(AUTHOR), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }
}
