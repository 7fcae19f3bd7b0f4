use crate::metrics_defs::REQUEST_ERRORS;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use shared::counter;
use surveys::SurveyError;
use webhooks::WebhookError;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("missing or invalid x-user-id header")]
    Unauthenticated,

    #[error("malformed request body: {0}")]
    BadRequest(#[from] JsonRejection),

    #[error("invalid path: {0}")]
    Path(#[from] PathRejection),

    #[error(transparent)]
    Survey(#[from] SurveyError),

    #[error(transparent)]
    Webhook(#[from] WebhookError),
}

#[derive(Serialize)]
struct ApiErrorResponse {
    error_message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Path(e) => e.status(),
            ApiError::Survey(e) => match e {
                SurveyError::NotFound { .. } | SurveyError::LinkNotFound => StatusCode::NOT_FOUND,
                SurveyError::Invalid(_) => StatusCode::BAD_REQUEST,
                SurveyError::Closed | SurveyError::NotOpen | SurveyError::LimitReached => {
                    StatusCode::FORBIDDEN
                }
                SurveyError::Export(_) | SurveyError::Store(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Webhook(e) => match e {
                WebhookError::NotFound { .. } => StatusCode::NOT_FOUND,
                WebhookError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
                WebhookError::Client(_) | WebhookError::Store(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        counter!(REQUEST_ERRORS, "status" => status.as_str().to_owned()).increment(1);

        // Persistence details stay in the logs.
        let error_message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(error = %self, "Request failed");
                "internal server error".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(ApiErrorResponse { error_message })).into_response()
    }
}
