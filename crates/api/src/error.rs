use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sched_core::ValidationError;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    /// Well-formed JSON describing an unusable instance or overlay.
    Invalid(Vec<String>),
    NotFound(String),
    /// The job exists but has no result to hand out.
    NotReady(jobs::JobStatus),
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Invalid(e.issues().to_vec())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Invalid(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": "invalid", "errors": errors })),
            )
                .into_response(),
            ApiError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "not_found", "id": id })),
            )
                .into_response(),
            ApiError::NotReady(status) => {
                (StatusCode::CONFLICT, Json(json!({ "error": "not_ready", "job": status })))
                    .into_response()
            }
        }
    }
}
