use axum::Json;
use sched_core::scoring::{compute_soft_scores, Scores};
use serde::Deserialize;
use types::{Instance, Timetable};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct ExplainIn {
    pub instance: Instance,
    pub timetable: Timetable,
}

#[utoipa::path(
    post,
    path = "/v1/explain",
    request_body = ExplainIn,
    responses(
        (status = 200, description = "Soft-score breakdown for the provided timetable", body = Scores)
    )
)]
pub async fn explain(Json(input): Json<ExplainIn>) -> Json<Scores> {
    Json(compute_soft_scores(&input.instance, &input.timetable))
}
