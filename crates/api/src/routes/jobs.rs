use crate::{error::ApiError, state::AppState};
use axum::{
    extract::{Path, State},
    Json,
};
use jobs::JobStatus;
use types::SolveResult;

#[utoipa::path(
    get,
    path = "/v1/jobs/{id}",
    params(("id" = String, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Job status", body = JobStatus),
        (status = 404, description = "Unknown job")
    )
)]
pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobStatus>, ApiError> {
    state.jobs.get(&id).map(Json).ok_or(ApiError::NotFound(id))
}

#[utoipa::path(
    get,
    path = "/v1/jobs/{id}/result",
    params(("id" = String, Path, description = "Job ID")),
    responses(
        (status = 200, description = "Solve result", body = SolveResult),
        (status = 404, description = "Unknown job"),
        (status = 409, description = "Job has no timetable (yet)")
    )
)]
pub async fn result(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SolveResult>, ApiError> {
    match state.jobs.get(&id) {
        Some(JobStatus::Solved { result }) => Ok(Json(result)),
        Some(other) => Err(ApiError::NotReady(other)),
        None => Err(ApiError::NotFound(id)),
    }
}
