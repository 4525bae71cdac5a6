use crate::state::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use types::{Instance, SolveEnvelope, SolveParams};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct SolveIn {
    pub instance: Instance,
    /// Falls back to the server's configured time limit.
    pub params: Option<SolveParams>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobCreated {
    pub job_id: jobs::JobId,
    pub status: &'static str,
}

#[utoipa::path(
    post,
    path = "/v1/solve",
    request_body = SolveIn,
    responses((status = 202, description = "Job enqueued", body = JobCreated))
)]
pub async fn solve(
    State(state): State<AppState>,
    Json(input): Json<SolveIn>,
) -> (StatusCode, Json<JobCreated>) {
    let params = input.params.unwrap_or_else(|| SolveParams {
        time_limit_ms: state.config.time_limit.as_millis() as u64,
        ..SolveParams::default()
    });
    let classes = input.instance.classes.len();
    let job_id = state.jobs.enqueue(SolveEnvelope {
        instance: input.instance,
        params,
    });
    info!(job = %job_id.0, classes, "solve enqueued");
    (
        StatusCode::ACCEPTED,
        Json(JobCreated {
            job_id,
            status: "queued",
        }),
    )
}
